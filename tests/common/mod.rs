#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use flisr_grid_controller::{
    api,
    commands::{CommandChannel, SwitchCommand},
    config::Config,
    controller::AppState,
    domain::{Connection, ConnectionStatus, EventId, FaultReport, NanoTimestamp, Zone, ZoneStatus},
    repo::{GridStore, InMemoryGridStore},
};

pub const TOKEN: &str = "integration-test-token";

pub fn test_config() -> Config {
    Config::from_toml_str(&format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [auth]
        token = "{TOKEN}"

        [db]
        url = "postgres://unused"

        [commands]
        mode = "log"

        [grid]
        topology_file = "config/topology.toml"
        "#
    ))
    .expect("test config parses")
}

pub fn zone(id: i64, feeder_number: i32, location: &str) -> Zone {
    Zone {
        id,
        feeder_number,
        location: location.to_string(),
        status: ZoneStatus::Normal,
    }
}

pub fn line(id: i64, from: i64, to: i64, status: ConnectionStatus) -> Connection {
    Connection {
        id,
        from_zone_id: from,
        to_zone_id: to,
        status,
        is_faulty: false,
        length_km: 10.0,
        resistance_ohm_per_km: 0.25,
        inductance_h_per_km: 1.2e-3,
        capacitance_f_per_km: 9e-9,
    }
}

/// Feeder 1 (zones 1-2) with a normally-open tie from zone 2 to tie point 3
pub fn feeder_with_tie() -> InMemoryGridStore {
    InMemoryGridStore::new(
        vec![
            zone(1, 1, "Substation A"),
            zone(2, 1, "Feeder 1 End"),
            zone(3, 0, "Tie Point"),
        ],
        vec![
            line(1, 1, 2, ConnectionStatus::Active),
            line(2, 2, 3, ConnectionStatus::Inactive),
        ],
    )
}

pub fn fault_on(connection_id: i64) -> FaultReport {
    FaultReport {
        connection_id,
        timestamp_a: NanoTimestamp(1_000_000_000),
        timestamp_b: NanoTimestamp(999_999_000),
        description: String::new(),
    }
}

pub async fn record(store: &InMemoryGridStore, connection_id: i64) -> EventId {
    store
        .record_fault(&fault_on(connection_id))
        .await
        .expect("fault recorded")
}

pub fn app(store: Arc<InMemoryGridStore>, commands: Arc<dyn CommandChannel>) -> Router {
    let cfg = test_config();
    let store: Arc<dyn GridStore> = store;
    api::router(AppState::from_parts(cfg.clone(), store, commands), &cfg)
}

pub fn post(uri: &str, body: Option<serde_json::Value>, authorized: bool) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if authorized {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub async fn send(app: &Router, req: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
    let resp: Response<Body> = app.clone().oneshot(req).await.expect("router is infallible");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Channel whose gateway rejects every CLOSE
pub struct RejectingCloseChannel;

#[async_trait]
impl CommandChannel for RejectingCloseChannel {
    async fn send_switch_command(&self, command: &SwitchCommand) -> Result<()> {
        match command.command {
            flisr_grid_controller::commands::SwitchAction::Open => Ok(()),
            flisr_grid_controller::commands::SwitchAction::Close => {
                anyhow::bail!("gateway returned 503 for connection {}", command.connection_id)
            }
        }
    }
}
