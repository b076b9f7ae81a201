//! CodeQuest Judge - Application Entry Point
//!
//! This is the main entry point for the CodeQuest Judge server.

use std::{net::SocketAddr, sync::Arc};

use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codequest_judge::{
    config::CONFIG,
    create_router,
    db::{self, PgStore},
    judge::Judge0Client,
    services::{MountedProblemCatalog, ReconciliationService, SubmissionService},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CodeQuest Judge server...");

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    // Judge0 and the problem mount
    let judge = Arc::new(Judge0Client::new(&CONFIG.judge0)?);
    let catalog = Arc::new(MountedProblemCatalog::new(
        db_pool.clone(),
        CONFIG.problems.mount_path.clone(),
    ));
    let store = Arc::new(PgStore::new(db_pool.clone()));

    match &CONFIG.judge0.callback_url {
        Some(url) => tracing::info!(judge0 = %CONFIG.judge0.uri, callback = %url, "Judge0 configured"),
        None => tracing::warn!(
            judge0 = %CONFIG.judge0.uri,
            "No JUDGE0_CALLBACK_URL set; verdicts arrive only through refresh"
        ),
    }

    let submissions = SubmissionService::new(
        store.clone(),
        judge.clone(),
        catalog,
        CONFIG.judge0.callback_url.clone(),
    );
    let reconciliation = ReconciliationService::new(store, judge);

    // Create application state
    let state = AppState::new(
        db_pool,
        redis_conn,
        submissions,
        reconciliation,
        CONFIG.clone(),
    );

    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
