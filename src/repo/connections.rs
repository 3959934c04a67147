#![cfg(feature = "db")]

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};

use crate::domain::{Connection, ConnectionId, ConnectionStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConnectionRow {
    pub id: i64,
    pub from_zone_id: i64,
    pub to_zone_id: i64,
    pub connection_status: String,
    pub is_faulty: bool,
    pub length_km: f64,
    pub resistance_ohm_per_km: f64,
    pub inductance_h_per_km: f64,
    pub capacitance_f_per_km: f64,
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = anyhow::Error;

    fn try_from(row: ConnectionRow) -> Result<Self> {
        let status: ConnectionStatus = row.connection_status.parse().with_context(|| {
            format!(
                "connection {} has unknown status {:?}",
                row.id, row.connection_status
            )
        })?;
        Ok(Connection {
            id: row.id,
            from_zone_id: row.from_zone_id,
            to_zone_id: row.to_zone_id,
            status,
            is_faulty: row.is_faulty,
            length_km: row.length_km,
            resistance_ohm_per_km: row.resistance_ohm_per_km,
            inductance_h_per_km: row.inductance_h_per_km,
            capacitance_f_per_km: row.capacitance_f_per_km,
        })
    }
}

pub struct ConnectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConnectionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(
            r#"
            SELECT id, from_zone_id, to_zone_id, connection_status, is_faulty,
                   length_km, resistance_ohm_per_km, inductance_h_per_km, capacitance_f_per_km
            FROM connections
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to fetch connections")?;

        rows.into_iter().map(Connection::try_from).collect()
    }

    pub async fn exists(&self, id: ConnectionId) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM connections WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .context("Failed to look up connection")?;
        Ok(found.is_some())
    }

    /// Isolate a faulted segment. Returns rows affected.
    pub async fn mark_cut(conn: &mut PgConnection, id: ConnectionId) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE connections
            SET connection_status = 'CUT', is_faulty = TRUE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Close a tie switch only if it is still open and healthy. Returns rows affected.
    pub async fn close_tie(conn: &mut PgConnection, id: ConnectionId) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE connections
            SET connection_status = 'ACTIVE', is_faulty = FALSE
            WHERE id = $1
              AND connection_status = 'INACTIVE'
              AND is_faulty = FALSE
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
