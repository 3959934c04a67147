use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;

use crate::controller::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    store: ComponentHealth,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy",
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            latency_ms: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// GET /api/v1/healthz - liveness
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /api/v1/health - store reachability
pub async fn health_check(State(st): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let store = match st.store.health_check().await {
        Ok(()) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };

    let healthy = store.is_healthy();
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    tracing::debug!(healthy, "health check completed");

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" },
            timestamp: chrono::Utc::now(),
            store,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_health() {
        assert!(ComponentHealth::healthy(3).is_healthy());
        let down = ComponentHealth::unhealthy("pool timed out".to_string());
        assert!(!down.is_healthy());
        assert_eq!(down.status, "unhealthy");
    }
}
