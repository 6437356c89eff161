use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::subscription::{
    repo::seaorm::SeaOrmSubscriptionRepository, repository::SubscriptionRepository, SubscriptionConfig,
    SubscriptionService,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// `RUN_MIGRATIONS=false` (or `0`) skips applying pending migrations at boot.
fn migrations_enabled() -> bool {
    !matches!(std::env::var("RUN_MIGRATIONS").as_deref(), Ok("false") | Ok("0"))
}

async fn connect_db(cfg: &AppConfig) -> Result<DatabaseConnection, StartupError> {
    let db_cfg = models::db::DatabaseConfig::from(&cfg.database);
    let db = models::db::connect_with_config(&db_cfg)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if migrations_enabled() {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Migration(e.to_string()))?;
        info!("migrations applied");
    } else {
        warn!("RUN_MIGRATIONS disabled; assuming schema is current");
    }
    Ok(db)
}

/// Wire a repository into the service and router.
pub fn build_app(repo: Arc<dyn SubscriptionRepository>, cfg: &AppConfig) -> Router {
    let svc = SubscriptionService::new(repo, SubscriptionConfig::from(&cfg.database));
    routes::build_router(
        ServerState::new(svc),
        build_cors(),
        Duration::from_secs(cfg.server.request_timeout_secs),
    )
}

/// Public entry: load config, connect and migrate the database, then serve HTTP
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let db = connect_db(&cfg).await?;
    let app = build_app(Arc::new(SeaOrmSubscriptionRepository { db }), &cfg);

    let addr = bind_addr(&cfg)?;
    info!(%addr, query_timeout_secs = cfg.database.query_timeout_secs, "starting subscriptions server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
