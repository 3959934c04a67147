use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use super::fault::{FaultReport, NanoTimestamp};
use super::grid::ConnectionId;

pub type EventId = i64;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Fault,
    ServiceRestoration,
    FaultAnalysis,
}

/// Immutable audit record. Only `resolved` ever changes after insertion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventLogEntry {
    pub id: EventId,
    pub event_type: EventType,
    pub connection_id: Option<ConnectionId>,
    pub timestamp_a: Option<NanoTimestamp>,
    pub timestamp_b: Option<NanoTimestamp>,
    pub description: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl EventLogEntry {
    /// An unresolved fault carrying both arrival timestamps
    pub fn is_open_fault(&self) -> bool {
        self.event_type == EventType::Fault
            && !self.resolved
            && self.connection_id.is_some()
            && self.timestamp_a.is_some()
            && self.timestamp_b.is_some()
    }
}

/// Entry to append; the ledger assigns id and creation time
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: EventType,
    pub connection_id: Option<ConnectionId>,
    pub timestamp_a: Option<NanoTimestamp>,
    pub timestamp_b: Option<NanoTimestamp>,
    pub description: String,
}

impl NewEvent {
    pub fn fault(report: &FaultReport) -> Self {
        let description = if report.description.trim().is_empty() {
            format!("Overcurrent detected on connection {}", report.connection_id)
        } else {
            report.description.clone()
        };
        Self {
            event_type: EventType::Fault,
            connection_id: Some(report.connection_id),
            timestamp_a: Some(report.timestamp_a),
            timestamp_b: Some(report.timestamp_b),
            description,
        }
    }

    pub fn record(
        event_type: EventType,
        connection_id: ConnectionId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            connection_id: Some(connection_id),
            timestamp_a: None,
            timestamp_b: None,
            description: description.into(),
        }
    }
}

/// Append-only event ledger.
///
/// Entries can be appended and faults marked resolved; nothing is ever removed
/// or rewritten.
#[derive(Debug, Clone, Default)]
pub struct EventLedger {
    entries: Vec<EventLogEntry>,
    next_id: EventId,
}

impl EventLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn append(&mut self, event: NewEvent, now: DateTime<Utc>) -> EventId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.entries.push(EventLogEntry {
            id,
            event_type: event.event_type,
            connection_id: event.connection_id,
            timestamp_a: event.timestamp_a,
            timestamp_b: event.timestamp_b,
            description: event.description,
            resolved: false,
            created_at: now,
        });
        id
    }

    /// Flip an open fault to resolved. Returns false if it is missing or already resolved.
    pub fn mark_resolved(&mut self, id: EventId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.resolved => {
                entry.resolved = true;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: EventId) -> Option<&EventLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Most recent entries first
    pub fn recent(&self, limit: usize) -> Vec<EventLogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
