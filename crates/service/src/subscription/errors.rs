use thiserror::Error;

/// One variant per rejected rule; request-shape rules first, then domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service_name is required")]
    ServiceNameRequired,
    #[error("price must be greater than 0")]
    PriceInvalid,
    #[error("user_id is required")]
    UserIdRequired,
    #[error("invalid user_id format")]
    UserIdMalformed,
    #[error("invalid start_date format (expected MM-YYYY)")]
    StartDateMalformed,
    #[error("invalid end_date format (expected MM-YYYY)")]
    EndDateMalformed,

    #[error("service name must not be empty")]
    EmptyServiceName,
    #[error("price must be greater than 0")]
    NonPositivePrice,
    #[error("user ID must not be empty")]
    NilUserId,
    #[error("start date must not be empty")]
    MissingStartDate,
    #[error("end date must not be before start date")]
    EndBeforeStart,
}

impl ValidationError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ValidationError::ServiceNameRequired => 1001,
            ValidationError::PriceInvalid => 1002,
            ValidationError::UserIdRequired => 1003,
            ValidationError::UserIdMalformed => 1004,
            ValidationError::StartDateMalformed => 1005,
            ValidationError::EndDateMalformed => 1006,
            ValidationError::EmptyServiceName => 1101,
            ValidationError::NonPositivePrice => 1102,
            ValidationError::NilUserId => 1103,
            ValidationError::MissingStartDate => 1104,
            ValidationError::EndBeforeStart => 1105,
        }
    }
}
