use axum::{
    routing::{get, post},
    Router,
};

use super::{events, flisr, health, topology};
use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/health", get(health::health_check))
        .route("/zones", get(topology::list_zones))
        .route("/connections", get(topology::list_connections))
        .route("/events", get(events::list_events))
        .route("/faults", post(events::register_fault))
        .route("/flisr/:fault_event_id", post(flisr::trigger_flisr))
        .with_state(state)
}
