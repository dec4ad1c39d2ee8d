use std::sync::Arc;

use featreq_api::app::{self, SharedAuthStore, SharedDatabase};
use featreq_auth::SessionManager;
use featreq_core::Registry;
use featreq_infra::db::{PostgresDatabase, SqlAuthStore};
use featreq_infra::{AppConfig, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    featreq_observability::init();

    let config = AppConfig::from_env()?;

    let db: SharedDatabase =
        Arc::new(PostgresDatabase::connect(&config.database_url, config.max_connections).await?);
    let store: SharedAuthStore = Arc::new(SqlAuthStore::new(db.clone()));
    let sessions = Arc::new(SessionManager::with_config(store, config.session));

    let mut registry = Registry::new();
    app::routes::register_all(&mut registry, db, sessions.clone());
    let routes = registry.len();

    let app = app::build_app(Dispatcher::new(registry, sessions));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, routes, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
