use anyhow::{Context, Result};
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use homechef_mealkit::{config, db, routes, state::AppState};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa_swagger_ui::SwaggerUi;

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    dotenvy::dotenv().ok();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::connect(&config.database.url).await?;
    let http_client = reqwest::Client::new();
    let state = AppState::new(db_pool, http_client, config.clone());

    let routes = routes::auth::routes_with_openapi()
        .merge(routes::companies::routes_with_openapi())
        .merge(routes::customers::routes_with_openapi())
        .merge(routes::subscription_plans::routes_with_openapi())
        .merge(routes::meal_kits::routes_with_openapi())
        .merge(routes::chef_plans::routes_with_openapi())
        .merge(routes::gift_cards::routes_with_openapi())
        .merge(routes::cart_items::routes_with_openapi())
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::reviews::routes_with_openapi())
        .merge(routes::payments::routes_with_openapi(state.clone()));

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("HomeChef Meal Kit API")
        .version("1.0.0")
        .build();
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi);

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server exited")?;

    Ok(())
}
