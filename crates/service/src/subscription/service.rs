use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::domain::{Subscription, SubscriptionInput, TotalAmountQuery};
use super::repository::SubscriptionRepository;
use super::validation::validate_subscription;
use crate::errors::ServiceError;

/// Subscription service configuration
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Deadline for each store call; the call is dropped (and its query aborted) when exceeded.
    pub query_timeout: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self { Self { query_timeout: Duration::from_secs(5) } }
}

impl From<&configs::DatabaseConfig> for SubscriptionConfig {
    fn from(c: &configs::DatabaseConfig) -> Self {
        Self { query_timeout: Duration::from_secs(c.query_timeout_secs) }
    }
}

/// Subscription business service independent of web framework.
/// Holds no mutable state of its own; safe to share across requests behind an `Arc`.
pub struct SubscriptionService<R: SubscriptionRepository + ?Sized> {
    repo: Arc<R>,
    cfg: SubscriptionConfig,
}

impl<R: SubscriptionRepository + ?Sized> SubscriptionService<R> {
    pub fn new(repo: Arc<R>, cfg: SubscriptionConfig) -> Self { Self { repo, cfg } }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T, ServiceError>>) -> Result<T, ServiceError> {
        match tokio::time::timeout(self.cfg.query_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                error!(timeout = ?self.cfg.query_timeout, "store call exceeded deadline");
                Err(ServiceError::Timeout(self.cfg.query_timeout))
            }
        }
    }

    /// Validate and persist a new subscription.
    ///
    /// # Examples
    /// ```
    /// use service::subscription::{SubscriptionConfig, SubscriptionService};
    /// use service::subscription::domain::SubscriptionInput;
    /// use service::subscription::repository::mock::InMemorySubscriptionRepository;
    /// use std::sync::Arc;
    /// let svc = SubscriptionService::new(Arc::new(InMemorySubscriptionRepository::default()), SubscriptionConfig::default());
    /// let input = SubscriptionInput {
    ///     service_name: "Netflix".into(),
    ///     price: 500,
    ///     user_id: uuid::Uuid::new_v4(),
    ///     start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
    ///     end_date: chrono::NaiveDate::from_ymd_opt(2024, 12, 1),
    /// };
    /// let created = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(created.price, 500);
    /// assert!(!created.id.is_nil());
    /// ```
    #[instrument(skip(self, input), fields(user_id = %input.user_id, service_name = %input.service_name))]
    pub async fn create(&self, input: SubscriptionInput) -> Result<Subscription, ServiceError> {
        let valid = validate_subscription(&input).inspect_err(|e| warn!(err = %e, "subscription rejected"))?;
        let created = self.bounded(self.repo.create(&valid)).await.inspect_err(log_store_failure)?;
        info!(id = %created.id, "subscription_created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Subscription, ServiceError> {
        match self.bounded(self.repo.get_by_id(id)).await {
            Ok(found) => Ok(found),
            Err(e @ ServiceError::NotFound(_)) => {
                warn!("subscription not found");
                Err(e)
            }
            Err(e) => {
                log_store_failure(&e);
                Err(e)
            }
        }
    }

    /// Every stored subscription, in no particular order.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Subscription>, ServiceError> {
        let all = self.bounded(self.repo.list()).await.inspect_err(log_store_failure)?;
        info!(count = all.len(), "subscriptions_listed");
        Ok(all)
    }

    /// Replace every mutable field of subscription `id`; the id itself never changes.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn update(&self, id: Uuid, input: SubscriptionInput) -> Result<Subscription, ServiceError> {
        let valid = validate_subscription(&input).inspect_err(|e| warn!(err = %e, "subscription rejected"))?;
        match self.bounded(self.repo.update(id, &valid)).await {
            Ok(updated) => {
                info!("subscription_updated");
                Ok(updated)
            }
            Err(e @ ServiceError::NotFound(_)) => {
                warn!("update target not found");
                Err(e)
            }
            Err(e) => {
                log_store_failure(&e);
                Err(e)
            }
        }
    }

    /// Delete subscription `id`; a missing row is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let removed = self.bounded(self.repo.delete(id)).await.inspect_err(log_store_failure)?;
        if !removed {
            warn!("delete target not found");
            return Err(ServiceError::not_found("subscription"));
        }
        info!("subscription_deleted");
        Ok(())
    }

    /// Sum of prices for the user's subscriptions starting within `[from, to]`.
    #[instrument(skip(self, query), fields(user_id = %query.user_id, service_name = ?query.service_name, from = ?query.from, to = ?query.to))]
    pub async fn total_amount(&self, query: TotalAmountQuery) -> Result<i64, ServiceError> {
        let (Some(from), Some(to)) = (query.from, query.to) else {
            warn!("from or to is missing");
            return Err(ServiceError::DateRangeRequired);
        };
        if from > to {
            warn!("from is after to");
            return Err(ServiceError::InvalidDateRange);
        }
        let total = self
            .bounded(self.repo.total_amount(query.user_id, query.service_name.as_deref(), from, to))
            .await
            .inspect_err(log_store_failure)?;
        info!(total, "total_amount_computed");
        Ok(total)
    }
}

fn log_store_failure(e: &ServiceError) {
    error!(err = %e, "subscription store call failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::errors::ValidationError;
    use crate::subscription::repository::mock::InMemorySubscriptionRepository;
    use chrono::NaiveDate;

    fn svc() -> SubscriptionService<InMemorySubscriptionRepository> {
        SubscriptionService::new(Arc::new(InMemorySubscriptionRepository::default()), SubscriptionConfig::default())
    }

    fn month(y: i32, m: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, 1)
    }

    fn input(user_id: Uuid, name: &str, price: i32, start: Option<NaiveDate>) -> SubscriptionInput {
        SubscriptionInput { service_name: name.into(), price, user_id, start_date: start, end_date: None }
    }

    fn range(user_id: Uuid, service_name: Option<&str>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> TotalAmountQuery {
        TotalAmountQuery { user_id, service_name: service_name.map(str::to_string), from, to }
    }

    #[tokio::test]
    async fn create_then_get_returns_input_with_new_id() {
        let svc = svc();
        let mut i = input(Uuid::new_v4(), "Netflix", 500, month(2024, 1));
        i.end_date = month(2024, 12);
        let created = svc.create(i.clone()).await.unwrap();

        let found = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.service_name, i.service_name);
        assert_eq!(found.price, i.price);
        assert_eq!(found.user_id, i.user_id);
        assert_eq!(Some(found.start_date), i.start_date);
        assert_eq!(found.end_date, i.end_date);
    }

    #[tokio::test]
    async fn create_propagates_domain_validation_errors() {
        let svc = svc();
        let user = Uuid::new_v4();

        let err = svc.create(input(user, "Netflix", 0, month(2024, 1))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::NonPositivePrice)));

        let err = svc.create(input(Uuid::nil(), "Netflix", 100, month(2024, 1))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::NilUserId)));

        let err = svc.create(input(user, "Netflix", 100, None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::MissingStartDate)));

        let mut backwards = input(user, "Netflix", 100, month(2024, 5));
        backwards.end_date = month(2024, 4);
        let err = svc.create(backwards).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::EndBeforeStart)));

        assert!(svc.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let err = svc().get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_all_on_empty_store_is_empty() {
        assert!(svc().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_id_and_replaces_fields() {
        let svc = svc();
        let user = Uuid::new_v4();
        let created = svc.create(input(user, "Netflix", 500, month(2024, 1))).await.unwrap();

        let mut change = input(user, "Netflix Premium", 800, month(2024, 3));
        change.end_date = month(2024, 9);
        let updated = svc.update(created.id, change).await.unwrap();
        assert_eq!(updated.id, created.id);

        let found = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(found, updated);
        assert_eq!(found.service_name, "Netflix Premium");
        assert_eq!(found.price, 800);
        assert_eq!(found.end_date, month(2024, 9));
    }

    #[tokio::test]
    async fn update_missing_is_not_found_and_leaves_store_alone() {
        let svc = svc();
        let user = Uuid::new_v4();
        let existing = svc.create(input(user, "Spotify", 200, month(2024, 1))).await.unwrap();

        let err = svc.update(Uuid::new_v4(), input(user, "Spotify", 999, month(2024, 1))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(svc.get_by_id(existing.id).await.unwrap(), existing);
        assert_eq!(svc.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_invalid_input_before_touching_store() {
        let svc = svc();
        let user = Uuid::new_v4();
        let created = svc.create(input(user, "Spotify", 200, month(2024, 1))).await.unwrap();

        let err = svc.update(created.id, input(user, "", 200, month(2024, 1))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyServiceName)));
        assert_eq!(svc.get_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn delete_then_delete_again_is_not_found() {
        let svc = svc();
        let created = svc.create(input(Uuid::new_v4(), "Okko", 300, month(2024, 1))).await.unwrap();
        svc.delete(created.id).await.unwrap();
        assert!(matches!(svc.get_by_id(created.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete(created.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn total_amount_scenario() {
        let svc = svc();
        let user = Uuid::new_v4();
        let mut netflix = input(user, "Netflix", 500, month(2024, 1));
        netflix.end_date = month(2024, 12);
        let created = svc.create(netflix).await.unwrap();
        assert_eq!(created.price, 500);

        let total = svc
            .total_amount(range(user, None, month(2024, 1), NaiveDate::from_ymd_opt(2024, 12, 31)))
            .await
            .unwrap();
        assert_eq!(total, 500);
    }

    #[tokio::test]
    async fn total_amount_filters_by_service_name_and_range() {
        let svc = svc();
        let user = Uuid::new_v4();
        svc.create(input(user, "Netflix", 500, month(2024, 1))).await.unwrap();
        svc.create(input(user, "Spotify", 200, month(2024, 2))).await.unwrap();
        svc.create(input(user, "Netflix", 700, month(2025, 2))).await.unwrap();
        svc.create(input(Uuid::new_v4(), "Netflix", 900, month(2024, 2))).await.unwrap();

        let year = |name| range(user, name, month(2024, 1), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(svc.total_amount(year(None)).await.unwrap(), 700);
        assert_eq!(svc.total_amount(year(Some("Netflix"))).await.unwrap(), 500);
        assert_eq!(svc.total_amount(year(Some("Okko"))).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn total_amount_without_matches_is_zero() {
        let total = svc()
            .total_amount(range(Uuid::new_v4(), None, month(2020, 1), month(2020, 2)))
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn total_amount_rejects_missing_or_inverted_range() {
        let svc = svc();
        let user = Uuid::new_v4();
        assert!(matches!(
            svc.total_amount(range(user, None, None, month(2024, 1))).await,
            Err(ServiceError::DateRangeRequired)
        ));
        assert!(matches!(
            svc.total_amount(range(user, None, month(2024, 1), None)).await,
            Err(ServiceError::DateRangeRequired)
        ));
        assert!(matches!(
            svc.total_amount(range(user, None, month(2024, 6), month(2024, 1))).await,
            Err(ServiceError::InvalidDateRange)
        ));
    }

    #[tokio::test]
    async fn concurrent_updates_end_in_one_of_the_written_states() {
        let svc = Arc::new(svc());
        let user = Uuid::new_v4();
        let created = svc.create(input(user, "Okko", 300, month(2024, 1))).await.unwrap();

        let mut handles = Vec::new();
        for price in [400, 500] {
            let svc = Arc::clone(&svc);
            let id = created.id;
            handles.push(tokio::spawn(async move { svc.update(id, input(user, "Okko", price, month(2024, 2))).await }));
        }
        let mut written = Vec::new();
        for h in handles {
            written.push(h.await.unwrap().unwrap());
        }

        let stored = svc.get_by_id(created.id).await.unwrap();
        assert!(written.contains(&stored));
        assert_eq!(stored.id, created.id);
    }

    #[tokio::test]
    async fn slow_store_call_times_out() {
        let repo = Arc::new(InMemorySubscriptionRepository::with_latency(Duration::from_millis(200)));
        let svc = SubscriptionService::new(repo, SubscriptionConfig { query_timeout: Duration::from_millis(20) });
        let err = svc.get_all().await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout(_)));
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let repo: Arc<dyn SubscriptionRepository> = Arc::new(InMemorySubscriptionRepository::default());
        let svc = SubscriptionService::new(repo, SubscriptionConfig::default());
        let created = svc.create(input(Uuid::new_v4(), "Kion", 150, month(2024, 4))).await.unwrap();
        assert_eq!(svc.get_by_id(created.id).await.unwrap(), created);
    }
}
