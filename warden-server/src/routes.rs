//! HTTP surface for the supervision runtime
//!
//! Three read-only endpoints over the registry: `/agents` (snapshots),
//! `/health` (aggregate fleet health), and `/ready` (readiness gate). The
//! host reflects degraded or erroring agents in its health endpoint instead
//! of crashing the process.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;
use warden_core::prelude::*;

pub fn router(registry: Arc<AgentRegistry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/agents", get(agents))
        .with_state(registry)
}

/// Snapshot every registered agent
async fn agents(State(registry): State<Arc<AgentRegistry>>) -> impl IntoResponse {
    Json(registry.get_all().await)
}

/// Aggregate fleet health.
///
/// `unhealthy` (503) when any agent is in the error state or probes
/// unhealthy; `degraded` (200) when any probe is degraded or still unknown;
/// `healthy` (200) otherwise.
async fn health(State(registry): State<Arc<AgentRegistry>>) -> impl IntoResponse {
    let infos = registry.get_all().await;

    let mut status = HealthStatus::Healthy;
    for info in &infos {
        if info.state == AgentState::Error || info.health.status == HealthStatus::Unhealthy {
            status = HealthStatus::Unhealthy;
            break;
        }
        if matches!(
            info.health.status,
            HealthStatus::Degraded | HealthStatus::Unknown
        ) {
            status = HealthStatus::Degraded;
        }
    }

    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "agents": infos,
        })),
    )
}

/// Ready once every enabled registered agent is running
async fn ready(State(registry): State<Arc<AgentRegistry>>) -> impl IntoResponse {
    let mut ready = true;
    for agent in registry.agents().await {
        if agent.is_enabled() && agent.state().await != AgentState::Running {
            ready = false;
            break;
        }
    }

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(serde_json::json!({ "ready": ready })))
}
