use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollup_fs::StorageError;
use rollup_model::AggregateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub download_url: String,
    pub total_departments: usize,
    pub total_sales: i128,
    /// RFC 3339, UTC.
    pub processed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Failure of one upload request. The `Display` text is what the client sees.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("No file uploaded or invalid file format")]
    MissingFile,
    #[error("{0}")]
    InvalidUpload(#[source] StorageError),
    #[error("Failed to save uploaded file")]
    SaveUpload(#[source] StorageError),
    #[error("Failed to process CSV file: {0}")]
    OpenUpload(#[source] StorageError),
    #[error("Failed to process CSV file: {0}")]
    Process(#[source] AggregateError),
    #[error("Failed to save result file")]
    SaveResult(#[source] StorageError),
    #[error("Internal server error")]
    Worker(#[source] tokio::task::JoinError),
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::SaveUpload(_)
            | ApiError::OpenUpload(_)
            | ApiError::Process(_)
            | ApiError::SaveResult(_)
            | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match std::error::Error::source(self) {
            Some(source) => format!("{self} ({source})"),
            None => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), "upload failed: {}", self.detail());
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
