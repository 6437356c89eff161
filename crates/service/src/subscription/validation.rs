//! Pure validation: request shape (strings from the wire) and domain invariants
//! (typed fields). Both fail fast on the first violated rule.

use common::utils::dates::parse_month_year;
use tracing::debug;
use uuid::Uuid;

use super::domain::{NewSubscription, SubscriptionInput, SubscriptionRequest};
use super::errors::ValidationError;

/// Check a raw payload and convert it into typed input.
///
/// An absent or empty `end_date` means the subscription is open-ended.
pub fn validate_request(req: &SubscriptionRequest) -> Result<SubscriptionInput, ValidationError> {
    if req.service_name.is_empty() {
        return Err(ValidationError::ServiceNameRequired);
    }
    if req.price <= 0 {
        return Err(ValidationError::PriceInvalid);
    }
    let price = i32::try_from(req.price).map_err(|_| ValidationError::PriceInvalid)?;
    if req.user_id.is_empty() {
        return Err(ValidationError::UserIdRequired);
    }
    let user_id = Uuid::parse_str(&req.user_id).map_err(|_| ValidationError::UserIdMalformed)?;
    let start_date = parse_month_year(&req.start_date).map_err(|_| ValidationError::StartDateMalformed)?;
    let end_date = match req.end_date.as_deref() {
        None | Some("") => None,
        Some(s) => Some(parse_month_year(s).map_err(|_| ValidationError::EndDateMalformed)?),
    };

    debug!(service_name = %req.service_name, "subscription request is well-formed");
    Ok(SubscriptionInput {
        service_name: req.service_name.clone(),
        price,
        user_id,
        start_date: Some(start_date),
        end_date,
    })
}

/// Enforce the subscription invariants before any write.
pub fn validate_subscription(input: &SubscriptionInput) -> Result<NewSubscription, ValidationError> {
    if input.service_name.is_empty() {
        return Err(ValidationError::EmptyServiceName);
    }
    if input.price <= 0 {
        return Err(ValidationError::NonPositivePrice);
    }
    if input.user_id.is_nil() {
        return Err(ValidationError::NilUserId);
    }
    let Some(start_date) = input.start_date else {
        return Err(ValidationError::MissingStartDate);
    };
    if let Some(end) = input.end_date {
        if end < start_date {
            return Err(ValidationError::EndBeforeStart);
        }
    }

    Ok(NewSubscription {
        service_name: input.service_name.clone(),
        price: input.price,
        user_id: input.user_id,
        start_date,
        end_date: input.end_date,
    })
}
