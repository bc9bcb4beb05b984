use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::JwtConfig, error::AppError};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

/// Claims carried by both access and refresh tokens.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: i32,
    pub user_type: String,
    pub token_type: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issue an access/refresh token pair bound to a user id and resolved role.
pub fn issue_pair(config: &JwtConfig, user_id: i32, user_type: &str) -> Result<TokenPair, AppError> {
    let now = Utc::now();

    let access = encode(
        config,
        Claims {
            sub: user_id,
            user_type: user_type.to_string(),
            token_type: ACCESS_TOKEN.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(config.access_ttl_minutes)).timestamp(),
        },
    )?;

    let refresh = encode(
        config,
        Claims {
            sub: user_id,
            user_type: user_type.to_string(),
            token_type: REFRESH_TOKEN.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::days(config.refresh_ttl_days)).timestamp(),
        },
    )?;

    Ok(TokenPair { access, refresh })
}

/// Issue a fresh access token from verified refresh-token claims.
pub fn issue_access(config: &JwtConfig, refresh_claims: &Claims) -> Result<String, AppError> {
    let now = Utc::now();
    encode(
        config,
        Claims {
            sub: refresh_claims.sub,
            user_type: refresh_claims.user_type.clone(),
            token_type: ACCESS_TOKEN.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(config.access_ttl_minutes)).timestamp(),
        },
    )
}

fn encode(config: &JwtConfig, claims: Claims) -> Result<String, AppError> {
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to sign token: {e}")))
}

/// Decode and validate a token, checking signature, expiry and token type.
pub fn decode(config: &JwtConfig, token: &str, expected_type: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // No clock-skew allowance: expiry means expiry.
    validation.leeway = 0;

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized("Token is invalid or expired".to_string()))?;

    if data.claims.token_type != expected_type {
        return Err(AppError::Unauthorized(format!(
            "Token has wrong type, expected '{expected_type}'"
        )));
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        }
    }

    #[test]
    fn pair_round_trips_with_roles_and_types() {
        let config = test_config();
        let pair = issue_pair(&config, 42, "customer").unwrap();

        let access = decode(&config, &pair.access, ACCESS_TOKEN).unwrap();
        assert_eq!(access.sub, 42);
        assert_eq!(access.user_type, "customer");

        let refresh = decode(&config, &pair.refresh, REFRESH_TOKEN).unwrap();
        assert_eq!(refresh.sub, 42);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn access_token_is_rejected_where_refresh_is_expected() {
        let config = test_config();
        let pair = issue_pair(&config, 1, "company").unwrap();

        assert!(decode(&config, &pair.access, REFRESH_TOKEN).is_err());
        assert!(decode(&config, &pair.refresh, ACCESS_TOKEN).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let pair = issue_pair(&config, 1, "chef").unwrap();

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        };
        assert!(decode(&other, &pair.access, ACCESS_TOKEN).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = JwtConfig {
            access_ttl_minutes: -1,
            ..test_config()
        };
        let pair = issue_pair(&config, 1, "customer").unwrap();

        assert!(decode(&config, &pair.access, ACCESS_TOKEN).is_err());
    }

    #[test]
    fn token_expired_by_seconds_is_rejected() {
        let config = test_config();
        let now = Utc::now();
        let token = encode(
            &config,
            Claims {
                sub: 1,
                user_type: "customer".to_string(),
                token_type: ACCESS_TOKEN.to_string(),
                jti: Uuid::new_v4(),
                iat: (now - Duration::minutes(15)).timestamp(),
                exp: (now - Duration::seconds(10)).timestamp(),
            },
        )
        .unwrap();

        assert!(decode(&config, &token, ACCESS_TOKEN).is_err());
    }

    #[test]
    fn refreshed_access_token_keeps_identity() {
        let config = test_config();
        let pair = issue_pair(&config, 7, "customer").unwrap();
        let refresh_claims = decode(&config, &pair.refresh, REFRESH_TOKEN).unwrap();

        let access = issue_access(&config, &refresh_claims).unwrap();
        let claims = decode(&config, &access, ACCESS_TOKEN).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.user_type, "customer");
    }
}
