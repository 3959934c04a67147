use axum::{extract::State, response::IntoResponse};

use super::{error::ApiError, response::success};
use crate::controller::AppState;

/// GET /api/v1/zones
pub async fn list_zones(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let topology = st.store.topology().await?;
    let count = topology.zones.len();
    Ok(success(topology.zones).with_count(count))
}

/// GET /api/v1/connections
pub async fn list_connections(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let topology = st.store.topology().await?;
    let count = topology.connections.len();
    Ok(success(topology.connections).with_count(count))
}
