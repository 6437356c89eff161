//! Subscription module: domain, validation, repository and service layers.

pub mod domain;
pub mod errors;
pub mod validation;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::{SubscriptionConfig, SubscriptionService};
