use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AppError;

/// `axum::Json` with its rejection folded into the API error contract: a
/// malformed or incomplete body comes back as a 400 field map instead of
/// axum's plain-text 422.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(AppError::from)?;
        Ok(Self(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, StatusCode, header},
        response::IntoResponse,
    };
    use serde::Deserialize;

    use super::Json;

    #[derive(Deserialize)]
    struct SignupBody {
        #[allow(dead_code)]
        username: String,
        #[allow(dead_code)]
        gender: String,
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_parts(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_required_field_becomes_a_field_map_400() {
        let req = json_request(r#"{"username": "someone"}"#);
        let err = Json::<SignupBody>::from_request(req, &())
            .await
            .err()
            .unwrap();

        let (status, body) = response_parts(err.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["gender"][0], "This field is required.");
    }

    #[tokio::test]
    async fn malformed_json_is_a_400() {
        let req = json_request("{not json");
        let err = Json::<SignupBody>::from_request(req, &())
            .await
            .err()
            .unwrap();

        let (status, body) = response_parts(err.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn valid_body_deserializes() {
        let req = json_request(r#"{"username": "someone", "gender": "F"}"#);
        assert!(Json::<SignupBody>::from_request(req, &()).await.is_ok());
    }
}
