use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{auth::jwt, error::AppError, state::AppState};

/// Bearer-token authorization layer. Decoded claims are inserted as a
/// request extension for downstream handlers.
pub async fn authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;

    let claims = jwt::decode(&state.config.jwt, token, jwt::ACCESS_TOKEN)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
