use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::{CommandChannel, SwitchAction, SwitchCommand};
use crate::config::Config;
use crate::domain::{
    ActionKind, EventId, EventLogEntry, EventType, FaultContext, FaultReport, NewEvent,
    RestorationPlan, Topology,
};
use crate::flisr::{DistanceResult, FlisrError};

pub mod memory;
pub use memory::{InMemoryGridStore, TopologySeed};

#[cfg(feature = "db")]
pub mod connections;
#[cfg(feature = "db")]
pub mod events;
#[cfg(feature = "db")]
pub mod pg;
#[cfg(feature = "db")]
pub mod zones;

/// Persistent zone/connection/event state used by the FLISR workflow.
///
/// Reads are plain snapshots. `apply_restoration` is all-or-nothing: on any
/// error, including a failed command dispatch, no write is visible afterwards.
#[async_trait]
pub trait GridStore: Send + Sync {
    /// Unresolved FAULT event joined with its connection and endpoint zone names
    async fn fault_context(&self, event_id: EventId) -> Result<FaultContext, FlisrError>;

    async fn topology(&self) -> Result<Topology, FlisrError>;

    async fn apply_restoration(
        &self,
        fault: &FaultContext,
        plan: &RestorationPlan,
        distance: &DistanceResult,
        commands: &dyn CommandChannel,
    ) -> Result<(), FlisrError>;

    /// Append a FAULT event for an existing connection
    async fn record_fault(&self, report: &FaultReport) -> Result<EventId, FlisrError>;

    /// Most recent event log entries first
    async fn recent_events(&self, limit: usize) -> Result<Vec<EventLogEntry>, FlisrError>;

    async fn health_check(&self) -> Result<(), FlisrError>;
}

pub struct Repositories {
    pub store: Arc<dyn GridStore>,
}

impl Repositories {
    /// PostgreSQL with the `db` feature, otherwise the seeded in-memory grid
    pub async fn new(cfg: &Config) -> Result<Self> {
        #[cfg(feature = "db")]
        let store: Arc<dyn GridStore> = Arc::new(pg::PgGridStore::connect(&cfg.db).await?);

        #[cfg(not(feature = "db"))]
        let store: Arc<dyn GridStore> = Arc::new(InMemoryGridStore::from_seed(
            TopologySeed::load(&cfg.grid.topology_file)?,
        )?);

        Ok(Self { store })
    }
}

/// OPEN command isolating the faulted connection
pub(crate) fn isolation_command(fault: &FaultContext, plan: &RestorationPlan) -> SwitchCommand {
    let reason = plan
        .actions
        .iter()
        .find(|a| matches!(a.kind, ActionKind::OpenSwitch { .. }))
        .map(|a| a.reason.clone())
        .unwrap_or_else(|| crate::flisr::planner::ISOLATE_REASON.to_string());
    SwitchCommand::new(fault.connection_id, SwitchAction::Open, reason)
}

/// Audit entries written by a restoration: one per action, then the analysis summary
pub(crate) fn restoration_entries(
    fault: &FaultContext,
    plan: &RestorationPlan,
    distance: &DistanceResult,
) -> Vec<NewEvent> {
    let mut entries: Vec<NewEvent> = plan
        .actions
        .iter()
        .map(|action| {
            NewEvent::record(
                EventType::ServiceRestoration,
                action.connection_id,
                action.describe(),
            )
        })
        .collect();

    entries.push(NewEvent::record(
        EventType::FaultAnalysis,
        fault.connection_id,
        format!(
            "Fault on connection {} located {:.1} m from {} ({:.1} m from {}); line {:.1} m, v = {:.4e} m/s, dt = {:.3e} s, clamped = {}, confidence = {:.2}",
            fault.connection_id,
            distance.distance_from_source_m,
            fault.from_zone_label(),
            distance.distance_from_end_m,
            fault.to_zone_label(),
            distance.line_length_m,
            distance.propagation_speed_m_per_s,
            distance.time_delta_s,
            distance.clamped,
            distance.confidence,
        ),
    ));
    entries
}

pub(crate) fn dispatch_failed(command: &SwitchCommand, err: anyhow::Error) -> FlisrError {
    FlisrError::Transaction(format!(
        "{} command for connection {} could not be dispatched: {:#}",
        command.command, command.connection_id, err
    ))
}
