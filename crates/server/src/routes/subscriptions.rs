use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use common::utils::dates::{format_month_year, parse_iso_date};
use service::subscription::domain::{Subscription, SubscriptionInput, SubscriptionRequest, TotalAmountQuery};
use service::subscription::validation::validate_request;

use crate::{errors::JsonApiError, routes::ServerState};

/// Subscription as rendered on the wire; dates use the `MM-YYYY` input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubscriptionView {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    #[schema(example = "01-2024")]
    pub start_date: String,
    #[schema(example = "12-2024")]
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionView {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_name: s.service_name,
            price: s.price,
            user_id: s.user_id,
            start_date: format_month_year(s.start_date),
            end_date: s.end_date.map(format_month_year),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalAmountParams {
    /// Owner of the subscriptions
    pub user_id: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub to: Option<String>,
    /// Only sum this service; empty means all
    pub service_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TotalAmountResponse {
    pub total_amount: i64,
}

fn parse_id(raw: &str) -> Result<Uuid, JsonApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(id = %raw, "malformed subscription id");
        JsonApiError::bad_request("invalid id")
    })
}

/// Decode and shape-check a create/update body.
fn parse_body(body: Result<Json<SubscriptionRequest>, JsonRejection>) -> Result<SubscriptionInput, JsonApiError> {
    let Json(req) = body.map_err(|e| {
        warn!(err = %e, "undecodable subscription body");
        JsonApiError::bad_request("invalid JSON body")
    })?;
    validate_request(&req).map_err(|e| {
        warn!(err = %e, code = e.code(), "subscription request rejected");
        JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string()))
    })
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[utoipa::path(
    post, path = "/subscription", tag = "subscription",
    request_body = crate::openapi::SubscriptionRequestDoc,
    responses(
        (status = 201, description = "Created", body = SubscriptionView),
        (status = 400, description = "Validation Error"),
        (status = 500, description = "Create Failed")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    body: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriptionView>), JsonApiError> {
    let input = parse_body(body)?;
    let created = state.subscriptions.create(input).await?;
    info!(id = %created.id, "created subscription");
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get, path = "/subscription", tag = "subscription",
    responses(
        (status = 200, description = "List OK", body = [SubscriptionView]),
        (status = 500, description = "List Failed")
    )
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<SubscriptionView>>, JsonApiError> {
    let all = state.subscriptions.get_all().await?;
    Ok(Json(all.into_iter().map(SubscriptionView::from).collect()))
}

#[utoipa::path(
    get, path = "/subscription/{id}", tag = "subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "OK", body = SubscriptionView),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<SubscriptionView>, JsonApiError> {
    let id = parse_id(&id)?;
    let found = state.subscriptions.get_by_id(id).await?;
    Ok(Json(found.into()))
}

#[utoipa::path(
    patch, path = "/subscription/{id}", tag = "subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = crate::openapi::SubscriptionRequestDoc,
    responses(
        (status = 200, description = "Updated", body = SubscriptionView),
        (status = 400, description = "Invalid ID or body"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Update Failed")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<Json<SubscriptionView>, JsonApiError> {
    let id = parse_id(&id)?;
    let input = parse_body(body)?;
    let updated = state.subscriptions.update(id, input).await?;
    info!(%id, "updated subscription");
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete, path = "/subscription/{id}", tag = "subscription",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Delete Failed")
    )
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<String>) -> Result<StatusCode, JsonApiError> {
    let id = parse_id(&id)?;
    state.subscriptions.delete(id).await?;
    info!(%id, "deleted subscription");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/subscription/total_amount", tag = "subscription",
    params(TotalAmountParams),
    responses(
        (status = 200, description = "Sum of prices in range", body = TotalAmountResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Aggregation Failed")
    )
)]
pub async fn total_amount(
    State(state): State<ServerState>,
    Query(q): Query<TotalAmountParams>,
) -> Result<Json<TotalAmountResponse>, JsonApiError> {
    let Some(raw_user) = non_empty(q.user_id) else {
        return Err(JsonApiError::bad_request("user_id is required"));
    };
    let user_id = Uuid::parse_str(&raw_user).map_err(|_| JsonApiError::bad_request("invalid user_id"))?;
    let from = non_empty(q.from)
        .map(|s| parse_iso_date(&s))
        .transpose()
        .map_err(|e| JsonApiError::bad_request(format!("invalid from date: {e}")))?;
    let to = non_empty(q.to)
        .map(|s| parse_iso_date(&s))
        .transpose()
        .map_err(|e| JsonApiError::bad_request(format!("invalid to date: {e}")))?;

    let query = TotalAmountQuery { user_id, service_name: non_empty(q.service_name), from, to };
    let total = state.subscriptions.total_amount(query).await?;
    info!(%user_id, total, "computed total amount");
    Ok(Json(TotalAmountResponse { total_amount: total }))
}
