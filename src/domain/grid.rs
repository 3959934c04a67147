use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub type ZoneId = i64;
pub type ConnectionId = i64;

/// Feeder number reserved for the tie point between feeders.
pub const TIE_FEEDER_NUMBER: i32 = 0;

/// Zone operational status, written by telemetry ingestion and the FLISR workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ZoneStatus {
    Normal,
    Fault,
    Isolated,
    Offline,
    Manual,
}

/// Switch state of a line segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ConnectionStatus {
    Active,
    Inactive,
    Cut,
}

/// A feeder segment or tie point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub feeder_number: i32,
    pub location: String,
    pub status: ZoneStatus,
}

impl Zone {
    pub fn is_tie_point(&self) -> bool {
        self.feeder_number == TIE_FEEDER_NUMBER
    }
}

/// A line segment with a switch between two zones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub from_zone_id: ZoneId,
    pub to_zone_id: ZoneId,
    pub status: ConnectionStatus,
    pub is_faulty: bool,
    pub length_km: f64,
    pub resistance_ohm_per_km: f64,
    pub inductance_h_per_km: f64,
    pub capacitance_f_per_km: f64,
}

impl Connection {
    /// True when either endpoint is `zone_id`
    pub fn touches(&self, zone_id: ZoneId) -> bool {
        self.from_zone_id == zone_id || self.to_zone_id == zone_id
    }

    /// Normally-open switch that is healthy enough to close for a backfeed
    pub fn is_available_tie(&self) -> bool {
        self.status == ConnectionStatus::Inactive && !self.is_faulty
    }

    /// Check the physical and state invariants of a provisioned connection
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!(
                    "connection {}: {} must be positive, got {}",
                    self.id, name, value
                ))
            }
        };
        positive("length_km", self.length_km)?;
        positive("inductance_h_per_km", self.inductance_h_per_km)?;
        positive("capacitance_f_per_km", self.capacitance_f_per_km)?;

        if self.resistance_ohm_per_km < 0.0 {
            return Err(format!(
                "connection {}: resistance_ohm_per_km must not be negative",
                self.id
            ));
        }
        if self.from_zone_id == self.to_zone_id {
            return Err(format!("connection {}: endpoints must differ", self.id));
        }
        if self.status == ConnectionStatus::Cut && !self.is_faulty {
            return Err(format!("connection {}: CUT requires is_faulty", self.id));
        }
        Ok(())
    }
}

/// Point-in-time copy of all zones and connections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    pub zones: Vec<Zone>,
    pub connections: Vec<Connection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: ConnectionId, from: ZoneId, to: ZoneId) -> Connection {
        Connection {
            id,
            from_zone_id: from,
            to_zone_id: to,
            status: ConnectionStatus::Active,
            is_faulty: false,
            length_km: 10.0,
            resistance_ohm_per_km: 0.2,
            inductance_h_per_km: 1.2e-3,
            capacitance_f_per_km: 9e-9,
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!(ConnectionStatus::Inactive.to_string(), "INACTIVE");
        assert_eq!("cut".parse::<ConnectionStatus>().unwrap(), ConnectionStatus::Cut);
        assert_eq!("MANUAL".parse::<ZoneStatus>().unwrap(), ZoneStatus::Manual);
        assert!("OPEN".parse::<ConnectionStatus>().is_err());
    }

    #[test]
    fn test_touches_and_tie_availability() {
        let mut c = line(1, 1, 2);
        assert!(c.touches(1));
        assert!(c.touches(2));
        assert!(!c.touches(3));
        assert!(!c.is_available_tie());

        c.status = ConnectionStatus::Inactive;
        assert!(c.is_available_tie());
        c.is_faulty = true;
        assert!(!c.is_available_tie());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(line(1, 1, 2).validate().is_ok());

        let mut c = line(1, 1, 2);
        c.inductance_h_per_km = 0.0;
        assert!(c.validate().unwrap_err().contains("inductance"));

        let mut c = line(1, 1, 1);
        c.length_km = 1.0;
        assert!(c.validate().is_err());

        let mut c = line(1, 1, 2);
        c.status = ConnectionStatus::Cut;
        assert!(c.validate().is_err());
        c.is_faulty = true;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_tie_point_detection() {
        let zone = Zone {
            id: 9,
            feeder_number: TIE_FEEDER_NUMBER,
            location: "Tie".to_string(),
            status: ZoneStatus::Normal,
        };
        assert!(zone.is_tie_point());
    }
}
