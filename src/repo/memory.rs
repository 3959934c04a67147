use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{dispatch_failed, isolation_command, restoration_entries, GridStore};
use crate::commands::{CommandChannel, SwitchAction, SwitchCommand};
use crate::domain::{
    ActionKind, Connection, ConnectionId, ConnectionStatus, EventId, EventLedger, EventLogEntry,
    FaultContext, FaultReport, NewEvent, RestorationPlan, Topology, Zone,
};
use crate::flisr::{DistanceResult, FlisrError};

/// Topology provisioning file, e.g. `config/topology.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologySeed {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl TopologySeed {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topology file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid topology file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let seed: Self = toml::from_str(raw)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Unique ids, known endpoints and physically valid lines
    pub fn validate(&self) -> Result<()> {
        let mut zone_ids = HashSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                bail!("duplicate zone id {}", zone.id);
            }
        }

        let mut connection_ids = HashSet::new();
        for conn in &self.connections {
            if !connection_ids.insert(conn.id) {
                bail!("duplicate connection id {}", conn.id);
            }
            for endpoint in [conn.from_zone_id, conn.to_zone_id] {
                if !zone_ids.contains(&endpoint) {
                    bail!("connection {} references unknown zone {}", conn.id, endpoint);
                }
            }
            conn.validate().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct GridState {
    zones: Vec<Zone>,
    connections: Vec<Connection>,
    ledger: EventLedger,
}

impl GridState {
    fn connection_mut(&mut self, id: ConnectionId) -> Result<&mut Connection, FlisrError> {
        self.connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FlisrError::Transaction(format!("connection {} no longer exists", id)))
    }

    fn zone_name(&self, id: i64) -> Option<String> {
        self.zones.iter().find(|z| z.id == id).map(|z| z.location.clone())
    }
}

/// Process-local store backing simulation mode and tests.
///
/// Each restoration is applied to a private copy of the state and swapped in
/// only when every step succeeded, so readers never observe a partial persist.
/// Writers serialise on `writer`, which is held across command dispatch;
/// readers only take the `state` lock for the length of a copy.
pub struct InMemoryGridStore {
    state: RwLock<GridState>,
    writer: Mutex<()>,
}

impl InMemoryGridStore {
    pub fn new(zones: Vec<Zone>, connections: Vec<Connection>) -> Self {
        Self {
            state: RwLock::new(GridState {
                zones,
                connections,
                ledger: EventLedger::new(),
            }),
            writer: Mutex::new(()),
        }
    }

    pub fn from_seed(seed: TopologySeed) -> Result<Self> {
        seed.validate()?;
        info!(
            zones = seed.zones.len(),
            connections = seed.connections.len(),
            "loaded grid topology"
        );
        Ok(Self::new(seed.zones, seed.connections))
    }

    /// Entry by id, whatever its type
    pub async fn event(&self, id: EventId) -> Option<EventLogEntry> {
        self.state.read().ledger.get(id).cloned()
    }

    pub async fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.state
            .read()
            .connections
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn event_count(&self) -> usize {
        self.state.read().ledger.len()
    }
}

#[async_trait]
impl GridStore for InMemoryGridStore {
    async fn fault_context(&self, event_id: EventId) -> Result<FaultContext, FlisrError> {
        let state = self.state.read();
        let not_found =
            || FlisrError::NotFound(format!("no unresolved fault event with id {}", event_id));

        let event = state
            .ledger
            .get(event_id)
            .filter(|e| e.is_open_fault())
            .ok_or_else(not_found)?;
        let (Some(connection_id), Some(timestamp_a), Some(timestamp_b)) =
            (event.connection_id, event.timestamp_a, event.timestamp_b)
        else {
            return Err(not_found());
        };
        let conn = state
            .connections
            .iter()
            .find(|c| c.id == connection_id)
            .ok_or_else(not_found)?;

        Ok(FaultContext {
            event_id,
            connection_id,
            from_zone_id: conn.from_zone_id,
            from_zone_name: state.zone_name(conn.from_zone_id),
            to_zone_id: conn.to_zone_id,
            to_zone_name: state.zone_name(conn.to_zone_id),
            length_km: conn.length_km,
            inductance_h_per_km: conn.inductance_h_per_km,
            capacitance_f_per_km: conn.capacitance_f_per_km,
            timestamp_a,
            timestamp_b,
        })
    }

    async fn topology(&self) -> Result<Topology, FlisrError> {
        let state = self.state.read();
        Ok(Topology {
            zones: state.zones.clone(),
            connections: state.connections.clone(),
        })
    }

    async fn apply_restoration(
        &self,
        fault: &FaultContext,
        plan: &RestorationPlan,
        distance: &DistanceResult,
        commands: &dyn CommandChannel,
    ) -> Result<(), FlisrError> {
        let _writer = self.writer.lock().await;
        let mut draft = self.state.read().clone();

        // claim the fault before any command leaves
        if !draft.ledger.mark_resolved(fault.event_id) {
            return Err(FlisrError::Transaction(format!(
                "fault event {} was resolved concurrently",
                fault.event_id
            )));
        }

        let faulted = draft.connection_mut(fault.connection_id)?;
        faulted.status = ConnectionStatus::Cut;
        faulted.is_faulty = true;

        let open = isolation_command(fault, plan);
        commands
            .send_switch_command(&open)
            .await
            .map_err(|e| dispatch_failed(&open, e))?;

        for action in &plan.actions {
            match &action.kind {
                ActionKind::CloseSwitch { .. } => {
                    let tie = draft.connection_mut(action.connection_id)?;
                    if !tie.is_available_tie() {
                        return Err(FlisrError::Transaction(format!(
                            "topology changed: tie connection {} is {} (faulty = {})",
                            tie.id, tie.status, tie.is_faulty
                        )));
                    }
                    tie.status = ConnectionStatus::Active;
                    tie.is_faulty = false;

                    let close =
                        SwitchCommand::new(action.connection_id, SwitchAction::Close, &action.reason);
                    commands
                        .send_switch_command(&close)
                        .await
                        .map_err(|e| dispatch_failed(&close, e))?;
                }
                ActionKind::OpenSwitch { .. } | ActionKind::Notify { .. } => {}
            }
        }

        let now = Utc::now();
        for entry in restoration_entries(fault, plan, distance) {
            draft.ledger.append(entry, now);
        }

        *self.state.write() = draft;
        debug!(fault_event_id = fault.event_id, "restoration committed");
        Ok(())
    }

    async fn record_fault(&self, report: &FaultReport) -> Result<EventId, FlisrError> {
        let _writer = self.writer.lock().await;
        let mut state = self.state.write();
        if !state.connections.iter().any(|c| c.id == report.connection_id) {
            return Err(FlisrError::NotFound(format!(
                "connection {} does not exist",
                report.connection_id
            )));
        }
        Ok(state.ledger.append(NewEvent::fault(report), Utc::now()))
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<EventLogEntry>, FlisrError> {
        Ok(self.state.read().ledger.recent(limit))
    }

    async fn health_check(&self) -> Result<(), FlisrError> {
        Ok(())
    }
}
