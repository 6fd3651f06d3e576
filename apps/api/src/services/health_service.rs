//! Health check service.
//!
//! Unauthenticated; used by load balancers and uptime probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServingStatus,
    pub message: String,
    pub version: String,
    pub server_time: DateTime<Utc>,
}

/// `GET /health`
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, message) = if state.db.health_check().await {
        (StatusCode::OK, ServingStatus::Serving, "All systems operational")
    } else {
        warn!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ServingStatus::NotServing,
            "Database unhealthy",
        )
    };

    (
        code,
        Json(HealthResponse {
            status,
            message: message.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_time: Utc::now(),
        }),
    )
}
