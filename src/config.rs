use anyhow::{Context, Result};

/// Application configuration, loaded from the environment.
///
/// Gateway credentials and the JWT secret are required; everything else has
/// a sensible development default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub razorpay: RazorpayConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
    /// Gateway round-trip budget in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

pub fn load() -> Result<AppConfig> {
    Ok(AppConfig {
        server: ServerConfig {
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8000").parse().context("PORT must be a number")?,
        },
        database: DatabaseConfig {
            url: required("DATABASE_URL")?,
        },
        razorpay: RazorpayConfig {
            key_id: required("RAZORPAY_KEY_ID")?,
            key_secret: required("RAZORPAY_KEY_SECRET")?,
            api_base: env_or("RAZORPAY_API_BASE", "https://api.razorpay.com/v1"),
            timeout_secs: env_or("RAZORPAY_TIMEOUT_SECS", "10")
                .parse()
                .context("RAZORPAY_TIMEOUT_SECS must be a number")?,
        },
        jwt: JwtConfig {
            secret: required("JWT_SECRET")?,
            access_ttl_minutes: env_or("JWT_ACCESS_TTL_MINUTES", "15")
                .parse()
                .context("JWT_ACCESS_TTL_MINUTES must be a number")?,
            refresh_ttl_days: env_or("JWT_REFRESH_TTL_DAYS", "7")
                .parse()
                .context("JWT_REFRESH_TTL_DAYS must be a number")?,
        },
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}
