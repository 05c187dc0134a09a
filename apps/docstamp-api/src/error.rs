//! Error types for the Docstamp API

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docstamp_core::{ErrorKind, StampError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid JSON body: {0}")]
    Json(JsonRejection),

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// A well-formed body whose fields have the wrong type is bad input to the
/// signing pipeline; everything else stays a transport error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                ApiError::Stamp(StampError::InvalidInput(e.body_text()))
            }
            other => ApiError::Json(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Stamp(e) => match e.kind() {
                ErrorKind::MissingInput
                | ErrorKind::InvalidInput
                | ErrorKind::InvalidImage
                | ErrorKind::InvalidPage => StatusCode::BAD_REQUEST,
                ErrorKind::MalformedDocument => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Json(e) => e.status(),
            ApiError::Upload(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Stamp(e) => e.kind().as_str(),
            ApiError::InvalidRequest(_) | ApiError::Json(_) => "invalid_request",
            ApiError::Upload(_) => "invalid_upload",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Stamp(StampError::Storage(e)) => {
                tracing::error!("Storage error: {}", e);
                "Storage error".to_string()
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal error".to_string()
            }
            ApiError::Json(e) => e.body_text(),
            ApiError::Upload(e) => e.body_text(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_per_kind() {
        let cases = [
            (StampError::MissingInput("x".into()), 400),
            (StampError::InvalidInput("x".into()), 400),
            (StampError::InvalidImage("x".into()), 400),
            (StampError::InvalidPage("x".into()), 400),
            (StampError::MalformedDocument("x".into()), 422),
            (StampError::NotFound("x".into()), 404),
            (StampError::Storage("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status().as_u16(), status);
        }
    }

    #[test]
    fn test_code_keeps_core_kind() {
        let err = ApiError::from(StampError::InvalidImage("bad".into()));
        assert_eq!(err.code(), "invalid_image");
        assert_eq!(err.to_string(), "Invalid signature image: bad");
        assert_eq!(ApiError::InvalidRequest("x".into()).code(), "invalid_request");
    }
}
