use thiserror::Error;

use crate::api::ApiError;

/// App-level error carried through iced messages. Messages must be `Clone`,
/// so transport errors are flattened to their display text here; the
/// rate-limit case keeps its own variant because the UI surfaces it
/// differently from generic HTTP failures.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AppError {
    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Api(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RateLimited(message) => AppError::RateLimited(message),
            other => AppError::Api(other.to_string()),
        }
    }
}
