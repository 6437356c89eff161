use std::time::Duration;

use thiserror::Error;

use crate::subscription::errors::ValidationError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("date range is required")]
    DateRangeRequired,
    #[error("invalid date range: 'from' is after 'to'")]
    InvalidDateRange,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// True for failures caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::DateRangeRequired | Self::InvalidDateRange)
    }
}
