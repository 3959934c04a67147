#![cfg(feature = "db")]

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{debug, info};

use super::connections::ConnectionRepository;
use super::events::EventRepository;
use super::zones::ZoneRepository;
use super::{dispatch_failed, isolation_command, restoration_entries, GridStore};
use crate::commands::{CommandChannel, SwitchAction, SwitchCommand};
use crate::config::DbConfig;
use crate::domain::{
    ActionKind, EventId, EventLogEntry, FaultContext, FaultReport, NewEvent, RestorationPlan,
    Topology,
};
use crate::flisr::{DistanceResult, FlisrError};

pub struct PgGridStore {
    pub pool: PgPool,
}

fn tx_error(step: &'static str) -> impl FnOnce(sqlx::Error) -> FlisrError {
    move |e| FlisrError::Transaction(format!("{}: {}", step, e))
}

impl PgGridStore {
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await
            .context("Failed to create database pool")?;
        info!(max_connections = cfg.max_connections, "database pool ready");
        Ok(Self { pool })
    }

    pub fn zones(&self) -> ZoneRepository<'_> {
        ZoneRepository::new(&self.pool)
    }

    pub fn connections(&self) -> ConnectionRepository<'_> {
        ConnectionRepository::new(&self.pool)
    }

    pub fn events(&self) -> EventRepository<'_> {
        EventRepository::new(&self.pool)
    }
}

#[async_trait]
impl GridStore for PgGridStore {
    async fn fault_context(&self, event_id: EventId) -> Result<FaultContext, FlisrError> {
        self.events()
            .find_fault_context(event_id)
            .await?
            .ok_or_else(|| {
                FlisrError::NotFound(format!("no unresolved fault event with id {}", event_id))
            })
    }

    async fn topology(&self) -> Result<Topology, FlisrError> {
        Ok(Topology {
            zones: self.zones().list_all().await?,
            connections: self.connections().list_all().await?,
        })
    }

    async fn apply_restoration(
        &self,
        fault: &FaultContext,
        plan: &RestorationPlan,
        distance: &DistanceResult,
        commands: &dyn CommandChannel,
    ) -> Result<(), FlisrError> {
        // dropping `tx` on any early return rolls the transaction back
        let mut tx = self.pool.begin().await.map_err(tx_error("begin"))?;

        // row lock on the fault event serialises concurrent runs before any dispatch
        let resolved = EventRepository::mark_resolved(&mut *tx, fault.event_id)
            .await
            .map_err(tx_error("resolve fault event"))?;
        if resolved != 1 {
            return Err(FlisrError::Transaction(format!(
                "fault event {} was resolved concurrently",
                fault.event_id
            )));
        }

        let cut = ConnectionRepository::mark_cut(&mut *tx, fault.connection_id)
            .await
            .map_err(tx_error("mark faulted connection CUT"))?;
        if cut != 1 {
            return Err(FlisrError::Transaction(format!(
                "connection {} no longer exists",
                fault.connection_id
            )));
        }

        let open = isolation_command(fault, plan);
        commands
            .send_switch_command(&open)
            .await
            .map_err(|e| dispatch_failed(&open, e))?;

        for action in &plan.actions {
            match &action.kind {
                ActionKind::CloseSwitch { .. } => {
                    let closed = ConnectionRepository::close_tie(&mut *tx, action.connection_id)
                        .await
                        .map_err(tx_error("close tie connection"))?;
                    if closed != 1 {
                        return Err(FlisrError::Transaction(format!(
                            "topology changed: tie connection {} is no longer INACTIVE and healthy",
                            action.connection_id
                        )));
                    }

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

        for entry in restoration_entries(fault, plan, distance) {
            EventRepository::append(&mut *tx, &entry)
                .await
                .map_err(tx_error("append event log entry"))?;
        }

        tx.commit().await.map_err(tx_error("commit"))?;
        debug!(fault_event_id = fault.event_id, "restoration committed");
        Ok(())
    }

    async fn record_fault(&self, report: &FaultReport) -> Result<EventId, FlisrError> {
        if !self.connections().exists(report.connection_id).await? {
            return Err(FlisrError::NotFound(format!(
                "connection {} does not exist",
                report.connection_id
            )));
        }
        Ok(self.events().insert(&NewEvent::fault(report)).await?)
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<EventLogEntry>, FlisrError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self.events().recent(limit).await?)
    }

    async fn health_check(&self) -> Result<(), FlisrError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}
