#![cfg(feature = "db")]

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::domain::{Zone, ZoneStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneRow {
    pub id: i64,
    pub feeder_number: i32,
    pub location: String,
    pub status: String,
}

impl TryFrom<ZoneRow> for Zone {
    type Error = anyhow::Error;

    fn try_from(row: ZoneRow) -> Result<Self> {
        let status: ZoneStatus = row
            .status
            .parse()
            .with_context(|| format!("zone {} has unknown status {:?}", row.id, row.status))?;
        Ok(Zone {
            id: row.id,
            feeder_number: row.feeder_number,
            location: row.location,
            status,
        })
    }
}

pub struct ZoneRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ZoneRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Zone>> {
        let rows = sqlx::query_as::<_, ZoneRow>(
            r#"
            SELECT id, feeder_number, location, status
            FROM zones
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to fetch zones")?;

        rows.into_iter().map(Zone::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = ZoneRow {
            id: 1,
            feeder_number: 0,
            location: "Tie Point".to_string(),
            status: "MANUAL".to_string(),
        };
        let zone = Zone::try_from(row).unwrap();
        assert_eq!(zone.status, ZoneStatus::Manual);
        assert!(zone.is_tie_point());
    }
}
