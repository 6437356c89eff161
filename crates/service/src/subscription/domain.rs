use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored subscription (business view). Dates are month-granular: day is always 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<models::subscription::Model> for Subscription {
    fn from(m: models::subscription::Model) -> Self {
        Self {
            id: m.id,
            service_name: m.service_name,
            price: m.price,
            user_id: m.user_id,
            start_date: m.start_date,
            end_date: m.end_date,
        }
    }
}

/// Raw create/update payload as it arrives on the wire; dates are `MM-YYYY` strings.
/// Missing fields decode to their zero values so validation can name the first bad one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionRequest {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Typed create/update input, before domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInput {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input that passed domain validation; the only shape the repository writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewSubscription {
    pub fn into_subscription(self, id: Uuid) -> Subscription {
        Subscription {
            id,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Total-amount query. `from`/`to` are inclusive bounds on `start_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalAmountQuery {
    pub user_id: Uuid,
    pub service_name: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
