//! Fault location, isolation and service restoration trigger

use axum::{
    extract::{Path, State},
    Json,
};

use super::error::ApiError;
use crate::{auth::AuthBearer, controller::AppState, domain::EventId, flisr::FlisrOutcome};

/// POST /api/v1/flisr/:fault_event_id
///
/// The workflow runs on its own task so a client disconnect cannot abort a
/// restoration between dispatch and commit.
pub async fn trigger_flisr(
    State(st): State<AppState>,
    _auth: AuthBearer,
    Path(raw_id): Path<String>,
) -> Result<Json<FlisrOutcome>, ApiError> {
    let fault_event_id = parse_event_id(&raw_id)?;

    let workflow = st.workflow.clone();
    let outcome = tokio::spawn(async move { workflow.run(fault_event_id).await })
        .await
        .map_err(|e| ApiError::InternalError(format!("FLISR task aborted: {}", e)))??;

    Ok(Json(outcome))
}

fn parse_event_id(raw: &str) -> Result<EventId, ApiError> {
    match raw.trim().parse::<EventId>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(ApiError::BadRequest(format!(
            "fault event id must be positive, got {}",
            raw
        ))),
        Err(_) => Err(ApiError::BadRequest(format!(
            "fault event id must be an integer, got {:?}",
            raw
        ))),
    }
}
