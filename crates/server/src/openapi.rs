use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::routes::subscriptions::{SubscriptionView, TotalAmountResponse};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Create/update body; dates are `MM-YYYY`.
#[derive(ToSchema)]
pub struct SubscriptionRequestDoc {
    #[schema(example = "Netflix")]
    pub service_name: String,
    #[schema(example = 500)]
    pub price: i64,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "01-2024")]
    pub start_date: String,
    #[schema(example = "12-2024")]
    pub end_date: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::subscriptions::create,
        crate::routes::subscriptions::list,
        crate::routes::subscriptions::get,
        crate::routes::subscriptions::update,
        crate::routes::subscriptions::delete,
        crate::routes::subscriptions::total_amount,
    ),
    components(
        schemas(
            HealthResponse,
            SubscriptionRequestDoc,
            SubscriptionView,
            TotalAmountResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "subscription")
    )
)]
pub struct ApiDoc;
