use serde::Serialize;
use std::sync::Arc;
use strum::Display;
use tracing::{info, instrument, warn};

use super::{distance, planner, DistanceResult, FlisrError};
use crate::commands::CommandChannel;
use crate::domain::{EventId, FaultContext, RestorationPlan};
use crate::repo::GridStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    LoadContext,
    ComputeDistance,
    LoadTopology,
    Plan,
    Persist,
    Done,
    Failed,
}

/// Result of a completed FLISR run
#[derive(Debug, Clone, Serialize)]
pub struct FlisrOutcome {
    pub fault: FaultContext,
    pub distance: DistanceResult,
    pub plan: RestorationPlan,
}

/// Runs one FLISR pass per fault event.
///
/// Holds no state between runs; concurrent runs are serialised by the store's
/// transaction isolation, not here.
pub struct FlisrWorkflow {
    store: Arc<dyn GridStore>,
    commands: Arc<dyn CommandChannel>,
}

impl FlisrWorkflow {
    pub fn new(store: Arc<dyn GridStore>, commands: Arc<dyn CommandChannel>) -> Self {
        Self { store, commands }
    }

    /// Locate, isolate and restore around the fault recorded as `fault_event_id`.
    ///
    /// Errors are returned as-is from the failing stage. Nothing is written
    /// unless the persist stage commits.
    #[instrument(skip(self), fields(stage))]
    pub async fn run(&self, fault_event_id: EventId) -> Result<FlisrOutcome, FlisrError> {
        let mut stage = WorkflowStage::LoadContext;
        let result = self.execute(fault_event_id, &mut stage).await;

        match &result {
            Ok(outcome) => {
                tracing::Span::current().record("stage", tracing::field::display(WorkflowStage::Done));
                info!(
                    connection_id = outcome.fault.connection_id,
                    distance_m = outcome.distance.distance_from_source_m,
                    actions = outcome.plan.actions.len(),
                    escalated = outcome.plan.is_escalated(),
                    "FLISR run completed"
                );
            }
            Err(e) => {
                tracing::Span::current().record("stage", tracing::field::display(WorkflowStage::Failed));
                warn!(failed_stage = %stage, error = %e, "FLISR run failed");
            }
        }
        result
    }

    async fn execute(
        &self,
        fault_event_id: EventId,
        stage: &mut WorkflowStage,
    ) -> Result<FlisrOutcome, FlisrError> {
        let fault = self.store.fault_context(fault_event_id).await?;

        *stage = WorkflowStage::ComputeDistance;
        let distance = distance::estimate_for(&fault)?;

        *stage = WorkflowStage::LoadTopology;
        let topology = self.store.topology().await?;

        *stage = WorkflowStage::Plan;
        let plan = planner::plan(&fault, &topology.zones, &topology.connections);
        for line in &plan.rationale {
            info!(rationale = %line, "restoration plan");
        }

        *stage = WorkflowStage::Persist;
        self.store
            .apply_restoration(&fault, &plan, &distance, self.commands.as_ref())
            .await?;

        *stage = WorkflowStage::Done;
        Ok(FlisrOutcome {
            fault,
            distance,
            plan,
        })
    }
}
