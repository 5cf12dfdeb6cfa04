use std::sync::Arc;

use anyhow::Context;

use biofeedback_api::config::Config;
use biofeedback_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biofeedback_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    // Database
    let db = db::create_pool(&config).await?;
    db::run_migrations(&db).await?;
    tracing::info!("Database migrations applied");

    let state = AppState {
        db,
        config: config.clone(),
    };
    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
