use itertools::Itertools;
use serde::Serialize;
use strum::IntoStaticStr;

use super::event_log::EventId;
use super::grid::{ConnectionId, ConnectionStatus, ZoneId};

/// Escalation requested when no automated restoration path exists
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Escalation {
    DispatchCrew,
}

/// Switching step kind, with the metadata each kind carries
#[derive(Debug, Clone, Serialize, PartialEq, IntoStaticStr)]
#[serde(tag = "action", content = "metadata", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    OpenSwitch {
        fault_event_id: EventId,
        from_zone_id: ZoneId,
        to_zone_id: ZoneId,
    },
    CloseSwitch {
        from_zone_id: ZoneId,
        to_zone_id: ZoneId,
        from_zone_name: Option<String>,
        to_zone_name: Option<String>,
        prior_status: ConnectionStatus,
    },
    Notify {
        escalation: Escalation,
    },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Metadata as `key=value` pairs for audit descriptions
    pub fn metadata_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            ActionKind::OpenSwitch {
                fault_event_id,
                from_zone_id,
                to_zone_id,
            } => vec![
                ("fault_event_id", fault_event_id.to_string()),
                ("from_zone_id", from_zone_id.to_string()),
                ("to_zone_id", to_zone_id.to_string()),
            ],
            ActionKind::CloseSwitch {
                from_zone_id,
                to_zone_id,
                from_zone_name,
                to_zone_name,
                prior_status,
            } => {
                let mut pairs = vec![
                    ("from_zone_id", from_zone_id.to_string()),
                    ("to_zone_id", to_zone_id.to_string()),
                ];
                if let Some(name) = from_zone_name {
                    pairs.push(("from_zone_name", name.clone()));
                }
                if let Some(name) = to_zone_name {
                    pairs.push(("to_zone_name", name.clone()));
                }
                pairs.push(("prior_status", prior_status.to_string()));
                pairs
            }
            ActionKind::Notify { escalation } => {
                let value = match escalation {
                    Escalation::DispatchCrew => "dispatch_crew",
                };
                vec![("escalation", value.to_string())]
            }
        }
    }
}

/// One ordered step of a restoration plan
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RestorationAction {
    #[serde(flatten)]
    pub kind: ActionKind,
    pub connection_id: ConnectionId,
    pub reason: String,
}

impl RestorationAction {
    /// Audit line: kind, target, reason and metadata
    pub fn describe(&self) -> String {
        let metadata = self
            .kind
            .metadata_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .join(", ");
        format!(
            "{} connection {}: {} [{}]",
            self.kind.label(),
            self.connection_id,
            self.reason,
            metadata
        )
    }
}

/// Ordered switching actions plus a human-readable rationale trail
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RestorationPlan {
    pub actions: Vec<RestorationAction>,
    pub rationale: Vec<String>,
}

impl RestorationPlan {
    /// Connections the plan closes to backfeed healthy zones
    pub fn close_targets(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.actions.iter().filter_map(|a| match a.kind {
            ActionKind::CloseSwitch { .. } => Some(a.connection_id),
            ActionKind::OpenSwitch { .. } | ActionKind::Notify { .. } => None,
        })
    }

    pub fn is_escalated(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a.kind, ActionKind::Notify { .. }))
    }
}
