//! Service layer for user subscriptions.
//! - Domain types and validation live under `subscription`.
//! - Persistence sits behind `SubscriptionRepository` (sea-orm and in-memory implementations).
//! - `SubscriptionService` owns the business rules and bounds every store call with a deadline.

pub mod errors;
pub mod subscription;
#[cfg(test)]
pub mod test_support;
