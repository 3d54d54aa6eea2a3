use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use segmentation::SegmentationError;

/// Every failure is terminal for its request: nothing is retried, nothing
/// is partially applied, and the original error text reaches the caller.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("File \"{0}\" not found.")]
    FileNotFound(String),

    #[error("No valid purchase data available.")]
    NoData,

    #[error("{0}")]
    Computation(String),

    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to store uploaded file: {0}")]
    Upload(#[from] std::io::Error),
}

impl From<SegmentationError> for ApiError {
    fn from(e: SegmentationError) -> Self {
        match e {
            SegmentationError::MissingColumns(_) => ApiError::Validation(e.to_string()),
            SegmentationError::NoEligibleCustomers => ApiError::NoData,
            SegmentationError::InvalidRow(_) | SegmentationError::Clustering(_) => {
                ApiError::Computation(e.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::FileNotFound(_) | ApiError::NoData => StatusCode::NOT_FOUND,
            ApiError::Computation(_) | ApiError::Database(_) | ApiError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
