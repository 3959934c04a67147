use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::event_log::EventId;
use super::grid::{ConnectionId, ZoneId};
use crate::flisr::FlisrError;

/// Traveling-wave arrival time in nanoseconds.
///
/// Deserializes from a JSON integer or a numeric string; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp", into = "i64")]
pub struct NanoTimestamp(pub i64);

impl NanoTimestamp {
    pub fn as_nanos(self) -> i64 {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Integer(i64),
    Text(String),
}

impl TryFrom<RawTimestamp> for NanoTimestamp {
    type Error = FlisrError;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        match raw {
            RawTimestamp::Integer(ns) => Ok(Self(ns)),
            RawTimestamp::Text(s) => s.parse(),
        }
    }
}

impl FromStr for NanoTimestamp {
    type Err = FlisrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| {
            FlisrError::InvalidParameter(format!("timestamp {:?} is not an integer", s))
        })
    }
}

impl From<i64> for NanoTimestamp {
    fn from(ns: i64) -> Self {
        Self(ns)
    }
}

impl From<NanoTimestamp> for i64 {
    fn from(ts: NanoTimestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for NanoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Fault event joined with its connection parameters and endpoint zone names
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FaultContext {
    pub event_id: EventId,
    pub connection_id: ConnectionId,
    pub from_zone_id: ZoneId,
    pub from_zone_name: Option<String>,
    pub to_zone_id: ZoneId,
    pub to_zone_name: Option<String>,
    pub length_km: f64,
    pub inductance_h_per_km: f64,
    pub capacitance_f_per_km: f64,
    pub timestamp_a: NanoTimestamp,
    pub timestamp_b: NanoTimestamp,
}

impl FaultContext {
    pub fn from_zone_label(&self) -> String {
        zone_label(self.from_zone_id, self.from_zone_name.as_deref())
    }

    pub fn to_zone_label(&self) -> String {
        zone_label(self.to_zone_id, self.to_zone_name.as_deref())
    }
}

pub(crate) fn zone_label(id: ZoneId, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} (zone {})", name, id),
        None => format!("zone {}", id),
    }
}

/// Overcurrent detection reported by telemetry ingestion
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FaultReport {
    #[validate(range(min = 1))]
    pub connection_id: ConnectionId,
    pub timestamp_a: NanoTimestamp,
    pub timestamp_b: NanoTimestamp,
    #[validate(length(max = 512))]
    #[serde(default)]
    pub description: String,
}
