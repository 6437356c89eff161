use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::domain::{NewSubscription, Subscription};
use crate::errors::ServiceError;

/// Repository abstraction for subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a row; the store assigns the id.
    async fn create(&self, sub: &NewSubscription) -> Result<Subscription, ServiceError>;
    /// `ServiceError::NotFound` when no row has this id.
    async fn get_by_id(&self, id: Uuid) -> Result<Subscription, ServiceError>;
    async fn list(&self) -> Result<Vec<Subscription>, ServiceError>;
    /// Overwrite every mutable column of an existing row while holding its row lock.
    async fn update(&self, id: Uuid, sub: &NewSubscription) -> Result<Subscription, ServiceError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
    /// `SUM(price)` for the user with `start_date` in `[from, to]`; 0 when nothing matches.
    async fn total_amount(
        &self,
        user_id: Uuid,
        service_name: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    #[derive(Default)]
    pub struct InMemorySubscriptionRepository {
        rows: Mutex<HashMap<Uuid, Subscription>>,
        latency: Option<Duration>,
    }

    impl InMemorySubscriptionRepository {
        /// Delay every call, to exercise deadlines.
        pub fn with_latency(latency: Duration) -> Self {
            Self { rows: Mutex::default(), latency: Some(latency) }
        }

        fn rows(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Subscription>>, ServiceError> {
            self.rows.lock().map_err(|_| ServiceError::Db("in-memory store poisoned".into()))
        }

        async fn pause(&self) {
            if let Some(d) = self.latency {
                tokio::time::sleep(d).await;
            }
        }
    }

    #[async_trait]
    impl SubscriptionRepository for InMemorySubscriptionRepository {
        async fn create(&self, sub: &NewSubscription) -> Result<Subscription, ServiceError> {
            self.pause().await;
            let created = sub.clone().into_subscription(Uuid::new_v4());
            self.rows()?.insert(created.id, created.clone());
            Ok(created)
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Subscription, ServiceError> {
            self.pause().await;
            self.rows()?.get(&id).cloned().ok_or_else(|| ServiceError::not_found("subscription"))
        }

        async fn list(&self) -> Result<Vec<Subscription>, ServiceError> {
            self.pause().await;
            Ok(self.rows()?.values().cloned().collect())
        }

        async fn update(&self, id: Uuid, sub: &NewSubscription) -> Result<Subscription, ServiceError> {
            self.pause().await;
            // the map lock plays the role of the row lock
            let mut rows = self.rows()?;
            let Some(row) = rows.get_mut(&id) else {
                return Err(ServiceError::not_found("subscription"));
            };
            *row = sub.clone().into_subscription(id);
            Ok(row.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            self.pause().await;
            Ok(self.rows()?.remove(&id).is_some())
        }

        async fn total_amount(
            &self,
            user_id: Uuid,
            service_name: Option<&str>,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<i64, ServiceError> {
            self.pause().await;
            let total = self
                .rows()?
                .values()
                .filter(|s| s.user_id == user_id)
                .filter(|s| s.start_date >= from && s.start_date <= to)
                .filter(|s| service_name.map_or(true, |name| s.service_name == name))
                .map(|s| i64::from(s.price))
                .sum();
            Ok(total)
        }
    }
}
