use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use service::todo::repo::SeaOrmTodoRepository;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::{errors::StartupError, routes, state::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the pool and bring the schema up to date. Both failures are fatal.
pub async fn prepare_database(cfg: &AppConfig) -> Result<DatabaseConnection, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Migration(e.to_string()))?;
    info!(event = "migrated", "database schema up to date");
    Ok(db)
}

/// Wire repository → service → router around an open pool.
pub fn build_app(db: DatabaseConnection) -> Router {
    let repo = Arc::new(SeaOrmTodoRepository::new(db));
    routes::build_router(ServerState::with_repository(repo), build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = prepare_database(&cfg).await?;
    let app = build_app(db);

    let bind = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot bind {bind}: {e}")))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "todo server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
