#![cfg(feature = "db")]

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    EventId, EventLogEntry, EventType, FaultContext, NanoTimestamp, NewEvent,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub event_type: String,
    pub connection_id: Option<i64>,
    pub timestamp_a: Option<i64>,
    pub timestamp_b: Option<i64>,
    pub description: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for EventLogEntry {
    type Error = anyhow::Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let event_type: EventType = row
            .event_type
            .parse()
            .with_context(|| format!("event {} has unknown type {:?}", row.id, row.event_type))?;
        Ok(EventLogEntry {
            id: row.id,
            event_type,
            connection_id: row.connection_id,
            timestamp_a: row.timestamp_a.map(NanoTimestamp),
            timestamp_b: row.timestamp_b.map(NanoTimestamp),
            description: row.description,
            resolved: row.resolved,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaultContextRow {
    pub event_id: i64,
    pub connection_id: i64,
    pub from_zone_id: i64,
    pub from_zone_name: Option<String>,
    pub to_zone_id: i64,
    pub to_zone_name: Option<String>,
    pub length_km: f64,
    pub inductance_h_per_km: f64,
    pub capacitance_f_per_km: f64,
    pub timestamp_a: i64,
    pub timestamp_b: i64,
}

impl From<FaultContextRow> for FaultContext {
    fn from(row: FaultContextRow) -> Self {
        FaultContext {
            event_id: row.event_id,
            connection_id: row.connection_id,
            from_zone_id: row.from_zone_id,
            from_zone_name: row.from_zone_name,
            to_zone_id: row.to_zone_id,
            to_zone_name: row.to_zone_name,
            length_km: row.length_km,
            inductance_h_per_km: row.inductance_h_per_km,
            capacitance_f_per_km: row.capacitance_f_per_km,
            timestamp_a: NanoTimestamp(row.timestamp_a),
            timestamp_b: NanoTimestamp(row.timestamp_b),
        }
    }
}

/// Append-only access to the `events` table
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Unresolved FAULT event with its line parameters and endpoint zone names
    pub async fn find_fault_context(&self, event_id: EventId) -> Result<Option<FaultContext>> {
        let row = sqlx::query_as::<_, FaultContextRow>(
            r#"
            SELECT e.id AS event_id,
                   c.id AS connection_id,
                   c.from_zone_id,
                   fz.location AS from_zone_name,
                   c.to_zone_id,
                   tz.location AS to_zone_name,
                   c.length_km,
                   c.inductance_h_per_km,
                   c.capacitance_f_per_km,
                   e.timestamp_a,
                   e.timestamp_b
            FROM events e
            JOIN connections c ON c.id = e.connection_id
            LEFT JOIN zones fz ON fz.id = c.from_zone_id
            LEFT JOIN zones tz ON tz.id = c.to_zone_id
            WHERE e.id = $1
              AND e.event_type = 'FAULT'
              AND e.resolved = FALSE
              AND e.timestamp_a IS NOT NULL
              AND e.timestamp_b IS NOT NULL
            "#,
        )
        .bind(event_id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to load fault context")?;

        Ok(row.map(FaultContext::from))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<EventLogEntry>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, event_type, connection_id, timestamp_a, timestamp_b,
                   description, resolved, created_at
            FROM events
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .context("Failed to fetch events")?;

        rows.into_iter().map(EventLogEntry::try_from).collect()
    }

    pub async fn insert(&self, event: &NewEvent) -> Result<EventId> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::append(&mut *conn, event)
            .await
            .context("Failed to insert event")
    }

    pub async fn append(conn: &mut PgConnection, event: &NewEvent) -> sqlx::Result<EventId> {
        sqlx::query_scalar(
            r#"
            INSERT INTO events (event_type, connection_id, timestamp_a, timestamp_b, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(event.event_type.to_string())
        .bind(event.connection_id)
        .bind(event.timestamp_a.map(i64::from))
        .bind(event.timestamp_b.map(i64::from))
        .bind(&event.description)
        .fetch_one(conn)
        .await
    }

    /// Resolve an open fault. Zero rows affected means it was already resolved.
    pub async fn mark_resolved(conn: &mut PgConnection, id: EventId) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET resolved = TRUE
            WHERE id = $1 AND resolved = FALSE
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
