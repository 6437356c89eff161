use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{debug, error};
use uuid::Uuid;

use models::subscription;

use crate::errors::ServiceError;
use crate::subscription::domain::{NewSubscription, Subscription};
use crate::subscription::repository::SubscriptionRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmSubscriptionRepository {
    pub db: DatabaseConnection,
}

fn db_err(e: DbErr) -> ServiceError {
    ServiceError::Db(e.to_string())
}

#[async_trait::async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    async fn create(&self, sub: &NewSubscription) -> Result<Subscription, ServiceError> {
        // id comes from the column default (gen_random_uuid) via RETURNING
        let am = subscription::ActiveModel {
            id: NotSet,
            service_name: Set(sub.service_name.clone()),
            price: Set(sub.price),
            user_id: Set(sub.user_id),
            start_date: Set(sub.start_date),
            end_date: Set(sub.end_date),
        };
        let created = am.insert(&self.db).await.map_err(db_err)?;
        Ok(created.into())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Subscription, ServiceError> {
        subscription::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(Subscription::from)
            .ok_or_else(|| ServiceError::not_found("subscription"))
    }

    async fn list(&self) -> Result<Vec<Subscription>, ServiceError> {
        let rows = subscription::Entity::find().all(&self.db).await.map_err(db_err)?;
        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn update(&self, id: Uuid, sub: &NewSubscription) -> Result<Subscription, ServiceError> {
        // Dropping `txn` without commit rolls it back, so every early return below is a rollback.
        let txn = self.db.begin().await.map_err(db_err)?;

        let locked = subscription::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?;
        let Some(existing) = locked else {
            debug!(%id, "update target missing; rolling back");
            return Err(ServiceError::not_found("subscription"));
        };

        let mut am: subscription::ActiveModel = existing.into();
        am.service_name = Set(sub.service_name.clone());
        am.price = Set(sub.price);
        am.user_id = Set(sub.user_id);
        am.start_date = Set(sub.start_date);
        am.end_date = Set(sub.end_date);
        let updated = am.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(|e| {
            error!(%id, err = %e, "subscription update commit failed");
            ServiceError::Db(format!("failed to commit transaction: {e}"))
        })?;
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = subscription::Entity::delete_by_id(id).exec(&self.db).await.map_err(db_err)?;
        Ok(res.rows_affected > 0)
    }

    async fn total_amount(
        &self,
        user_id: Uuid,
        service_name: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, ServiceError> {
        let mut select = subscription::Entity::find()
            .select_only()
            .column_as(subscription::Column::Price.sum(), "total_amount")
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::StartDate.between(from, to));
        if let Some(name) = service_name {
            select = select.filter(subscription::Column::ServiceName.eq(name));
        }
        // SUM over zero rows is NULL
        let total = select
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await
            .map_err(db_err)?
            .flatten()
            .unwrap_or(0);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn new_sub(user_id: Uuid, name: &str, price: i32, start: NaiveDate) -> NewSubscription {
        NewSubscription { service_name: name.into(), price, user_id, start_date: start, end_date: None }
    }

    #[tokio::test]
    async fn subscription_crud_repository() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmSubscriptionRepository { db };

        let user = Uuid::new_v4();
        let mut input = new_sub(user, "Netflix", 500, month(2024, 1));
        input.end_date = Some(month(2024, 12));
        let created = repo.create(&input).await?;
        assert_eq!(created.price, 500);
        assert!(!created.id.is_nil());
        let second = repo.create(&input).await?;
        assert_ne!(second.id, created.id);
        assert!(repo.delete(second.id).await?);

        let found = repo.get_by_id(created.id).await?;
        assert_eq!(found, created);

        let changed = new_sub(user, "Netflix Premium", 900, month(2024, 2));
        let updated = repo.update(created.id, &changed).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.service_name, "Netflix Premium");
        assert_eq!(updated.end_date, None);
        assert_eq!(repo.get_by_id(created.id).await?, updated);

        assert!(repo.list().await?.iter().any(|s| s.id == created.id));

        assert!(repo.delete(created.id).await?);
        assert!(!repo.delete(created.id).await?);
        assert!(matches!(repo.get_by_id(created.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmSubscriptionRepository { db };

        let res = repo.update(Uuid::new_v4(), &new_sub(Uuid::new_v4(), "Spotify", 199, month(2024, 5))).await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn total_amount_filters_user_range_and_service() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmSubscriptionRepository { db };

        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = repo.create(&new_sub(user, "Netflix", 500, month(2024, 1))).await?;
        let b = repo.create(&new_sub(user, "Spotify", 200, month(2024, 6))).await?;
        let c = repo.create(&new_sub(user, "Netflix", 700, month(2025, 1))).await?;
        let d = repo.create(&new_sub(other, "Netflix", 1000, month(2024, 3))).await?;

        let from = month(2024, 1);
        let to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(repo.total_amount(user, None, from, to).await?, 700);
        assert_eq!(repo.total_amount(user, Some("Netflix"), from, to).await?, 500);
        assert_eq!(repo.total_amount(user, Some("Kinopoisk"), from, to).await?, 0);
        assert_eq!(repo.total_amount(Uuid::new_v4(), None, from, to).await?, 0);
        // bounds are inclusive
        assert_eq!(repo.total_amount(user, None, month(2024, 6), month(2024, 6)).await?, 200);

        for id in [a.id, b.id, c.id, d.id] {
            repo.delete(id).await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_updates_serialize_on_row_lock() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = std::sync::Arc::new(SeaOrmSubscriptionRepository { db });

        let user = Uuid::new_v4();
        let created = repo.create(&new_sub(user, "Okko", 300, month(2024, 1))).await?;

        let first = new_sub(user, "Okko", 400, month(2024, 2));
        let second = new_sub(user, "Okko", 500, month(2024, 3));
        let (r1, r2) = tokio::join!(
            { let repo = repo.clone(); let id = created.id; async move { repo.update(id, &first).await } },
            { let repo = repo.clone(); let id = created.id; async move { repo.update(id, &second).await } },
        );
        let (u1, u2) = (r1?, r2?);

        let stored = repo.get_by_id(created.id).await?;
        assert!(stored == u1 || stored == u2);
        assert!(stored.price == 400 || stored.price == 500);

        repo.delete(created.id).await?;
        Ok(())
    }
}
