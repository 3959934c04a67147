//! Event log and fault registration endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use super::{error::ApiError, response::success};
use crate::{
    auth::AuthBearer,
    controller::AppState,
    domain::{EventId, FaultReport},
};

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/events?limit=N
pub async fn list_events(
    State(st): State<AppState>,
    Query(q): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let start = Instant::now();
    let limit = q.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT);
    let events = st.store.recent_events(limit).await?;
    let count = events.len();
    Ok(success(events)
        .with_count(count)
        .with_duration(start.elapsed().as_millis() as u64))
}

#[derive(Debug, Serialize)]
pub struct FaultRegistered {
    pub event_id: EventId,
}

/// POST /api/v1/faults
pub async fn register_fault(
    State(st): State<AppState>,
    _auth: AuthBearer,
    payload: Result<Json<FaultReport>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(report) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    report.validate()?;
    let event_id = st.store.record_fault(&report).await?;
    tracing::info!(event_id, connection_id = report.connection_id, "fault event registered");
    Ok((StatusCode::CREATED, Json(success(FaultRegistered { event_id }))))
}
