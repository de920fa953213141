/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "queue": "connected"
/// }
/// ```
///
/// `status` is `degraded` when either dependency is unreachable. The endpoint
/// itself always answers 200 so that the body can be inspected.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use payorder_shared::db::pool;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    /// `connected` or `disconnected`
    pub queue: String,
}

fn connection_status(ok: bool) -> &'static str {
    if ok {
        "connected"
    } else {
        "disconnected"
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (database_ok, queue_ok) = tokio::join!(
        async { pool::health_check(&state.db).await.is_ok() },
        state.jobs.is_healthy(),
    );

    if !database_ok || !queue_ok {
        tracing::warn!(database_ok, queue_ok, "Health check degraded");
    }

    Ok(Json(HealthResponse {
        status: if database_ok && queue_ok {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: connection_status(database_ok).to_string(),
        queue: connection_status(queue_ok).to_string(),
    }))
}
