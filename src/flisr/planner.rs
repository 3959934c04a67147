use crate::domain::{
    zone_label, ActionKind, Connection, Escalation, FaultContext, RestorationAction,
    RestorationPlan, Zone, ZoneId,
};

pub const ISOLATE_REASON: &str = "isolate the faulted segment";
pub const BACKFEED_REASON: &str = "backfeed through alternate healthy path";
pub const ESCALATE_REASON: &str = "no automated restoration path; dispatch crew";

/// Build the switching plan for a located fault.
///
/// The faulted segment is always opened first. A backfeed is then attempted
/// through a normally-open, healthy connection sharing an endpoint with the
/// fault; among several candidates the lowest connection id wins. Without a
/// candidate the plan escalates to an operator.
pub fn plan(fault: &FaultContext, zones: &[Zone], connections: &[Connection]) -> RestorationPlan {
    let mut actions = vec![RestorationAction {
        kind: ActionKind::OpenSwitch {
            fault_event_id: fault.event_id,
            from_zone_id: fault.from_zone_id,
            to_zone_id: fault.to_zone_id,
        },
        connection_id: fault.connection_id,
        reason: ISOLATE_REASON.to_string(),
    }];

    let mut rationale = vec![format!(
        "Fault isolated on connection {} between {} and {}",
        fault.connection_id,
        fault.from_zone_label(),
        fault.to_zone_label()
    )];

    match find_tie(fault, connections) {
        Some(tie) => {
            let from_zone_name = zone_name(zones, tie.from_zone_id);
            let to_zone_name = zone_name(zones, tie.to_zone_id);
            rationale.push(format!(
                "Closing tie connection {} between {} and {} (previously {})",
                tie.id,
                zone_label(tie.from_zone_id, from_zone_name.as_deref()),
                zone_label(tie.to_zone_id, to_zone_name.as_deref()),
                tie.status
            ));
            actions.push(RestorationAction {
                kind: ActionKind::CloseSwitch {
                    from_zone_id: tie.from_zone_id,
                    to_zone_id: tie.to_zone_id,
                    from_zone_name,
                    to_zone_name,
                    prior_status: tie.status,
                },
                connection_id: tie.id,
                reason: BACKFEED_REASON.to_string(),
            });
        }
        None => {
            rationale.push(format!(
                "No INACTIVE healthy connection adjacent to {} or {}; no automated restoration path, crew dispatch required",
                fault.from_zone_label(),
                fault.to_zone_label()
            ));
            actions.push(RestorationAction {
                kind: ActionKind::Notify {
                    escalation: Escalation::DispatchCrew,
                },
                connection_id: fault.connection_id,
                reason: ESCALATE_REASON.to_string(),
            });
        }
    }

    RestorationPlan { actions, rationale }
}

/// Lowest-id connection eligible to backfeed around the fault
fn find_tie<'a>(fault: &FaultContext, connections: &'a [Connection]) -> Option<&'a Connection> {
    connections
        .iter()
        .filter(|c| c.id != fault.connection_id)
        .filter(|c| c.is_available_tie())
        .filter(|c| c.touches(fault.from_zone_id) || c.touches(fault.to_zone_id))
        .min_by_key(|c| c.id)
}

fn zone_name(zones: &[Zone], id: ZoneId) -> Option<String> {
    zones.iter().find(|z| z.id == id).map(|z| z.location.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionStatus, NanoTimestamp, ZoneStatus};

    fn zone(id: ZoneId, feeder: i32, location: &str) -> Zone {
        Zone {
            id,
            feeder_number: feeder,
            location: location.to_string(),
            status: ZoneStatus::Normal,
        }
    }

    fn conn(id: i64, from: ZoneId, to: ZoneId, status: ConnectionStatus, faulty: bool) -> Connection {
        Connection {
            id,
            from_zone_id: from,
            to_zone_id: to,
            status,
            is_faulty: faulty,
            length_km: 5.0,
            resistance_ohm_per_km: 0.3,
            inductance_h_per_km: 1.2e-3,
            capacitance_f_per_km: 9e-9,
        }
    }

    fn fault_on_c1() -> FaultContext {
        FaultContext {
            event_id: 42,
            connection_id: 1,
            from_zone_id: 1,
            from_zone_name: Some("Feeder 1 Head".to_string()),
            to_zone_id: 2,
            to_zone_name: Some("Feeder 1 Tail".to_string()),
            length_km: 10.0,
            inductance_h_per_km: 1.2e-3,
            capacitance_f_per_km: 9e-9,
            timestamp_a: NanoTimestamp(1_000_000_000),
            timestamp_b: NanoTimestamp(999_999_000),
        }
    }

    fn zones() -> Vec<Zone> {
        vec![
            zone(1, 1, "Feeder 1 Head"),
            zone(2, 1, "Feeder 1 Tail"),
            zone(3, 0, "Tie Point"),
            zone(4, 2, "Feeder 2 Head"),
            zone(5, 2, "Feeder 2 Tail"),
        ]
    }

    #[test]
    fn test_picks_adjacent_tie() {
        let connections = vec![
            conn(1, 1, 2, ConnectionStatus::Active, false),
            conn(3, 4, 5, ConnectionStatus::Inactive, false),
            conn(2, 2, 3, ConnectionStatus::Inactive, false),
        ];
        let plan = plan(&fault_on_c1(), &zones(), &connections);

        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.actions[0].connection_id, 1);
        assert!(matches!(
            plan.actions[0].kind,
            ActionKind::OpenSwitch { fault_event_id: 42, from_zone_id: 1, to_zone_id: 2 }
        ));
        assert_eq!(plan.actions[1].connection_id, 2);
        match &plan.actions[1].kind {
            ActionKind::CloseSwitch {
                from_zone_name,
                to_zone_name,
                prior_status,
                ..
            } => {
                assert_eq!(from_zone_name.as_deref(), Some("Feeder 1 Tail"));
                assert_eq!(to_zone_name.as_deref(), Some("Tie Point"));
                assert_eq!(*prior_status, ConnectionStatus::Inactive);
            }
            other => panic!("expected CLOSE_SWITCH, got {:?}", other),
        }
        assert_eq!(plan.actions[1].reason, BACKFEED_REASON);
        assert_eq!(plan.rationale.len(), 2);
        assert!(plan.rationale[1].contains("previously INACTIVE"));
    }

    #[test]
    fn test_escalates_without_candidate() {
        let connections = vec![
            conn(1, 1, 2, ConnectionStatus::Active, false),
            conn(2, 2, 3, ConnectionStatus::Inactive, true),
            conn(3, 2, 4, ConnectionStatus::Active, false),
            conn(4, 4, 5, ConnectionStatus::Inactive, false),
        ];
        let plan = plan(&fault_on_c1(), &zones(), &connections);

        assert_eq!(plan.actions.len(), 2);
        assert_eq!(plan.actions[0].kind.label(), "OPEN_SWITCH");
        assert_eq!(plan.actions[1].connection_id, 1);
        assert_eq!(
            plan.actions[1].kind,
            ActionKind::Notify {
                escalation: Escalation::DispatchCrew
            }
        );
        assert!(plan.is_escalated());
        assert!(plan.rationale.last().unwrap().contains("no automated restoration path"));
    }

    #[test]
    fn test_tie_break_is_lowest_id_regardless_of_order() {
        let connections = vec![
            conn(9, 1, 3, ConnectionStatus::Inactive, false),
            conn(1, 1, 2, ConnectionStatus::Active, false),
            conn(5, 2, 4, ConnectionStatus::Inactive, false),
        ];
        let plan = plan(&fault_on_c1(), &zones(), &connections);
        assert_eq!(plan.close_targets().collect::<Vec<_>>(), vec![5]);

        let mut reversed = connections.clone();
        reversed.reverse();
        let plan = super::plan(&fault_on_c1(), &zones(), &reversed);
        assert_eq!(plan.close_targets().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_faulted_connection_never_selected_as_tie() {
        let connections = vec![conn(1, 1, 2, ConnectionStatus::Inactive, false)];
        let plan = plan(&fault_on_c1(), &zones(), &connections);
        assert!(plan.is_escalated());
    }

    #[test]
    fn test_missing_zone_names_stay_empty() {
        let connections = vec![conn(2, 2, 77, ConnectionStatus::Inactive, false)];
        let plan = plan(&fault_on_c1(), &zones(), &connections);
        match &plan.actions[1].kind {
            ActionKind::CloseSwitch { to_zone_name, .. } => assert!(to_zone_name.is_none()),
            other => panic!("expected CLOSE_SWITCH, got {:?}", other),
        }
        assert!(plan.rationale[1].contains("zone 77"));
    }

    #[test]
    fn test_does_not_mutate_inputs() {
        let zones = zones();
        let connections = vec![
            conn(1, 1, 2, ConnectionStatus::Active, false),
            conn(2, 2, 3, ConnectionStatus::Inactive, false),
        ];
        let before = connections.clone();
        let _ = plan(&fault_on_c1(), &zones, &connections);
        assert_eq!(connections, before);
    }
}
