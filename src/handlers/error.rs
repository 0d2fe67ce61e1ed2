// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::AnalyticsError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        let status = match err {
            AnalyticsError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyticsError::StorageRead(_) | AnalyticsError::Fetch(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AnalyticsError::StorageWrite(_) | AnalyticsError::InvariantViolation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}

/// Logs the error and turns it into a warp rejection.
pub fn reject(err: AnalyticsError) -> warp::Rejection {
    log::error!("Request failed: {}", err);
    warp::reject::custom(ApiError::from(err))
}
