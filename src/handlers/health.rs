use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "biofeedback-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await;
    let pool = json!({ "size": state.db.size(), "idle": state.db.num_idle() });

    match ping {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": "ok", "pool": pool })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "database": "failed", "pool": pool })),
            )
        }
    }
}
