//! Health and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
///
/// Liveness: the process is up. Never touches the database.
pub async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(
        "ok",
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// GET /health/ready
///
/// Readiness: the database answers a trivial query. Unreachable database
/// means 503 so load balancers pull the instance.
pub async fn ready(State(state): State<AppState>) -> Response {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => ApiResponse::ok(
            "ready",
            HealthStatus {
                status: "ready",
                version: env!("CARGO_PKG_VERSION"),
            },
        )
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::error("database not ready"),
            )
                .into_response()
        }
    }
}
