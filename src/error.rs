use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("LLM error: {0}")]
    LlmError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("File processing error: {0}")]
    FileProcessingError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidInput(err.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LlmError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::FileProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidInput(msg) => msg,
            AppError::IoError(err) => err.to_string(),
            AppError::LlmError(msg) => msg,
            AppError::Config(msg) => msg,
            AppError::FileProcessingError(msg) => msg,
            AppError::Internal(msg) => msg,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::LlmError("x".into()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::FileProcessingError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_includes_category() {
        let err = AppError::InvalidInput("No file uploaded".into());
        assert_eq!(err.to_string(), "Invalid input: No file uploaded");
    }

    #[test]
    fn response_carries_status() {
        let response = AppError::Config("GROQ_API_KEY is not set".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
