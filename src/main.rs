use pairwatch::{ Config, Result };
use axum::{ Router, routing::{ get, post } };
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "pairwatch=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| pairwatch::AppError::Config(e.to_string()))?;

    // Initialize database connection
    let db = pairwatch::db::connect(&config).await?;

    tracing::info!("Database connected successfully");

    // Run migrations
    migration::Migrator::up(&db, None).await.map_err(|e| pairwatch::AppError::Database(e))?;

    tracing::info!("Migrations completed successfully");

    // Initialize stores
    let alert_store = Arc::new(pairwatch::db::AlertStore::new(db.clone()));
    let account_store = Arc::new(pairwatch::db::AccountStore::new(db));

    // Initialize outbound clients
    let oracle = Arc::new(
        pairwatch::uniswap::UniswapClient::new(config.graph_url.clone(), config.oracle_timeout)
    );
    let notifier = Arc::new(pairwatch::notify::FcmClient::new(config.fcm_server_key.clone()));

    // Start the background evaluator
    let evaluator = pairwatch::evaluator::AlertEvaluator::new(
        alert_store.clone(),
        oracle,
        notifier,
        config.evaluator.clone()
    );
    let evaluator_handle = evaluator.spawn();

    // Initialize services
    let alert_service = Arc::new(pairwatch::services::AlertService::new(alert_store));

    // Create app state
    let app_state = pairwatch::api::AppState::new(alert_service, account_store);

    // Build application router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/accounts", post(pairwatch::api::account::save_account))
        .route(
            "/api/alerts",
            post(pairwatch::api::alert::save_alert).get(pairwatch::api::alert::alerts)
        )
        .route(
            "/api/alerts/{slug}",
            get(pairwatch::api::alert::alert_by_slug).delete(pairwatch::api::alert::delete_alert)
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| pairwatch::AppError::Internal(e.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal()).await
        .map_err(|e| pairwatch::AppError::Internal(e.to_string()))?;

    // Let the in-flight evaluation pass finish before exiting
    evaluator_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
