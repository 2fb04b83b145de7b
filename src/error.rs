use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::generator::GeneratorError;

// Every handler returns Result<_, ApiError>. The body is plain text, the
// same way the upstream API reports a rejected parameter to curl users.
#[derive(Debug, Error)]
pub enum ApiError {
    // malformed or out-of-range request parameter
    #[error("{0}")]
    Validation(String),

    // tool-call arguments longer than the requested max_tokens
    #[error("{0}")]
    MaxTokensExceeded(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Incorrect API key provided")]
    Unauthorized,

    #[error(transparent)]
    Generation(#[from] GeneratorError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MaxTokensExceeded(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Generation(e) => error!(error = %e, "content generator failed"),
            other => warn!(status = status.as_u16(), message = %other, "request rejected"),
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MaxTokensExceeded("too long".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("gone".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Generation(GeneratorError::Failed("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_plain_text_body() {
        let response = ApiError::Validation("Invalid 'n': 0.".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Invalid 'n': 0.");
    }
}
