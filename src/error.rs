use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Application error type. Variants map onto the API's error contract:
/// field-level maps for 400 validation failures, `{"detail"}` bodies for
/// auth errors, `{"error"}` bodies for everything else.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    /// A single-field error in a `{field: [message]}` shape, e.g. a
    /// duplicate unique value or a missing required field.
    #[error("{1}")]
    FieldError(String, String),

    #[error("{0} is unreachable")]
    ServiceUnreachable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        let message = rejection.body_text();
        // serde reports absent required fields as "missing field `name`";
        // surface those in the same field map shape as validation errors.
        if let Some(field) = message
            .split("missing field `")
            .nth(1)
            .and_then(|rest| rest.split('`').next())
        {
            return Self::FieldError(field.to_string(), "This field is required.".to_string());
        }
        Self::BadRequest(message)
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound,
            other => Self::Other(other.into()),
        }
    }
}

impl AppError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) | Self::FieldError(..) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ServiceUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::NotFound => json!({ "detail": "Not found." }),
            Self::Unauthorized(detail) => json!({ "detail": detail }),
            Self::Validation(errors) => {
                let mut map = serde_json::Map::new();
                for (field, errs) in errors.field_errors() {
                    let messages: Vec<String> = errs
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map_or_else(|| e.code.to_string(), ToString::to_string)
                        })
                        .collect();
                    map.insert(field.to_string(), json!(messages));
                }
                serde_json::Value::Object(map)
            }
            Self::FieldError(field, message) => {
                let mut map = serde_json::Map::new();
                map.insert(field.clone(), json!([message]));
                serde_json::Value::Object(map)
            }
            Self::BadRequest(message) | Self::ServiceUnreachable(message) => {
                json!({ "error": message })
            }
            Self::Other(err) => {
                tracing::error!(error = ?err, "unhandled internal error");
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("Invalid signature".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("Invalid credentials".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::ServiceUnreachable("Razorpay".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Other(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn field_error_renders_drf_style_map() {
        let err = AppError::FieldError(
            "username".to_string(),
            "A user with that username already exists.".to_string(),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
