use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::subscription::repository::SubscriptionRepository;
use service::subscription::SubscriptionService;

use crate::openapi::ApiDoc;

pub mod subscriptions;

/// Shared handler state; the repository is erased so handlers stay non-generic.
#[derive(Clone)]
pub struct ServerState {
    pub subscriptions: Arc<SubscriptionService<dyn SubscriptionRepository>>,
}

impl ServerState {
    pub fn new(subscriptions: SubscriptionService<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions: Arc::new(subscriptions) }
    }
}

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is alive", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, subscription CRUD, total amount and API docs.
pub fn build_router(state: ServerState, cors: CorsLayer, request_timeout: Duration) -> Router {
    let subscription_routes = Router::new()
        .route("/subscription", get(subscriptions::list).post(subscriptions::create))
        // static segment wins over `:id`
        .route("/subscription/total_amount", get(subscriptions::total_amount))
        .route(
            "/subscription/:id",
            get(subscriptions::get).patch(subscriptions::update).delete(subscriptions::delete),
        );

    Router::new()
        .route("/health", get(health))
        .merge(subscription_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
