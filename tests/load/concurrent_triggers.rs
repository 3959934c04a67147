//! Many operators triggering the same fault at once must produce exactly one
//! restoration and exactly one set of switch commands.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use flisr_grid_controller::{
    commands::LoggingCommandChannel,
    domain::{Connection, ConnectionStatus, FaultReport, NanoTimestamp, Zone, ZoneStatus},
    flisr::{FlisrError, FlisrWorkflow},
    repo::{GridStore, InMemoryGridStore},
};

const CONCURRENT_TRIGGERS: usize = 32;

fn store() -> InMemoryGridStore {
    let zone = |id: i64, feeder_number: i32| Zone {
        id,
        feeder_number,
        location: format!("Zone {id}"),
        status: ZoneStatus::Normal,
    };
    let line = |id: i64, from: i64, to: i64, status: ConnectionStatus| Connection {
        id,
        from_zone_id: from,
        to_zone_id: to,
        status,
        is_faulty: false,
        length_km: 5.0,
        resistance_ohm_per_km: 0.2,
        inductance_h_per_km: 1.1e-3,
        capacitance_f_per_km: 1.0e-8,
    };
    InMemoryGridStore::new(
        vec![zone(1, 1), zone(2, 1), zone(3, 0)],
        vec![
            line(1, 1, 2, ConnectionStatus::Active),
            line(2, 2, 3, ConnectionStatus::Inactive),
        ],
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_restore_once() {
    let store = Arc::new(store());
    let event_id = store
        .record_fault(&FaultReport {
            connection_id: 1,
            timestamp_a: NanoTimestamp(2_000_000_000),
            timestamp_b: NanoTimestamp(2_000_001_500),
            description: String::new(),
        })
        .await
        .unwrap();

    let channel = Arc::new(LoggingCommandChannel::new());
    let workflow = Arc::new(FlisrWorkflow::new(store.clone(), channel.clone()));

    let start = Instant::now();
    let mut tasks = JoinSet::new();
    for _ in 0..CONCURRENT_TRIGGERS {
        let workflow = workflow.clone();
        tasks.spawn(async move { workflow.run(event_id).await });
    }

    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => succeeded += 1,
            Err(FlisrError::NotFound(_)) | Err(FlisrError::Transaction(_)) => {}
            Err(other) => panic!("unexpected failure: {other}"),
        }
    }
    let elapsed = start.elapsed();

    assert_eq!(succeeded, 1);
    assert_eq!(channel.sent().len(), 2);
    // one FAULT, two SERVICE_RESTORATION, one FAULT_ANALYSIS
    assert_eq!(store.event_count().await, 4);
    assert!(store.event(event_id).await.unwrap().resolved);
    assert!(
        elapsed < Duration::from_secs(5),
        "concurrent triggers took {elapsed:?}"
    );
}
