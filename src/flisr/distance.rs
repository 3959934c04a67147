//! Double-ended traveling-wave fault location.
//!
//! A transient launched at the fault reaches both line ends; the difference of
//! the two arrival times together with the line's propagation speed places the
//! fault:
//!
//! ```text
//! v      = 1 / sqrt(L' * C')            (L', C' per meter)
//! d_raw  = 0.5 * (length_m + v * Δt)    (Δt = t_a - t_b)
//! ```

use serde::Serialize;

use super::FlisrError;
use crate::domain::{FaultContext, NanoTimestamp};

/// Largest integer an f64 represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i128 = (1 << 53) - 1;

/// Confidence floor for a clamped location
pub const MIN_CLAMPED_CONFIDENCE: f64 = 0.4;

const NANOS_PER_SECOND: f64 = 1e9;
const METERS_PER_KM: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DistanceResult {
    pub distance_from_source_m: f64,
    pub distance_from_end_m: f64,
    pub line_length_m: f64,
    pub propagation_speed_m_per_s: f64,
    pub time_delta_s: f64,
    pub clamped: bool,
    pub confidence: f64,
}

/// Locate a fault on a line from the two arrival timestamps.
pub fn estimate(
    length_km: f64,
    inductance_h_per_km: f64,
    capacitance_f_per_km: f64,
    timestamp_a: NanoTimestamp,
    timestamp_b: NanoTimestamp,
) -> Result<DistanceResult, FlisrError> {
    require_positive("length_km", length_km)?;
    require_positive("inductance_h_per_km", inductance_h_per_km)?;
    require_positive("capacitance_f_per_km", capacitance_f_per_km)?;

    let time_delta_s = time_delta_seconds(timestamp_a, timestamp_b)?;
    let speed = propagation_speed(inductance_h_per_km, capacitance_f_per_km)?;

    let line_length_m = length_km * METERS_PER_KM;
    if !line_length_m.is_finite() {
        return Err(FlisrError::InvalidParameter(format!(
            "line length of {} km overflows when expressed in meters",
            length_km
        )));
    }
    let raw = 0.5 * (line_length_m + speed * time_delta_s);
    if !raw.is_finite() {
        return Err(FlisrError::InvalidParameter(format!(
            "fault distance is not finite for a {} m line",
            line_length_m
        )));
    }
    let distance = raw.clamp(0.0, line_length_m);
    let clamped = distance != raw;

    let confidence = if clamped {
        let penalty = (raw - distance).abs() / line_length_m;
        let rounded = round2((1.0 - penalty).max(MIN_CLAMPED_CONFIDENCE));
        // keep `confidence == 1` reserved for unclamped results
        rounded.min(0.99)
    } else {
        1.0
    };

    Ok(DistanceResult {
        distance_from_source_m: distance,
        distance_from_end_m: line_length_m - distance,
        line_length_m,
        propagation_speed_m_per_s: speed,
        time_delta_s,
        clamped,
        confidence,
    })
}

/// Run the estimator with the line parameters and timestamps of a loaded fault
pub fn estimate_for(fault: &FaultContext) -> Result<DistanceResult, FlisrError> {
    estimate(
        fault.length_km,
        fault.inductance_h_per_km,
        fault.capacitance_f_per_km,
        fault.timestamp_a,
        fault.timestamp_b,
    )
}

/// Wave speed in m/s from per-km inductance and capacitance
pub fn propagation_speed(
    inductance_h_per_km: f64,
    capacitance_f_per_km: f64,
) -> Result<f64, FlisrError> {
    let lc = (inductance_h_per_km / METERS_PER_KM) * (capacitance_f_per_km / METERS_PER_KM);
    if !(lc > 0.0) {
        return Err(FlisrError::InvalidParameter(format!(
            "L*C product must be positive, got {}",
            lc
        )));
    }
    let speed = 1.0 / lc.sqrt();
    if !speed.is_finite() {
        return Err(FlisrError::InvalidParameter(format!(
            "propagation speed is not finite for L*C = {}",
            lc
        )));
    }
    Ok(speed)
}

/// `t_a - t_b` in seconds. The subtraction is exact; conversion happens once.
pub fn time_delta_seconds(
    timestamp_a: NanoTimestamp,
    timestamp_b: NanoTimestamp,
) -> Result<f64, FlisrError> {
    let delta_ns = i128::from(timestamp_a.as_nanos()) - i128::from(timestamp_b.as_nanos());
    if delta_ns.abs() > MAX_SAFE_INTEGER {
        return Err(FlisrError::Precision(format!(
            "timestamp delta of {} ns exceeds the exact f64 range",
            delta_ns
        )));
    }
    Ok(delta_ns as f64 / NANOS_PER_SECOND)
}

fn require_positive(name: &str, value: f64) -> Result<(), FlisrError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlisrError::InvalidParameter(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const L: f64 = 1.2e-3;
    const C: f64 = 9e-9;

    fn ts(ns: i64) -> NanoTimestamp {
        NanoTimestamp(ns)
    }

    #[test]
    fn test_reference_line_small_offset() {
        let r = estimate(10.0, L, C, ts(1_000_000_000), ts(999_999_000)).unwrap();

        let expected_speed = 1.0 / (1.2e-6_f64 * 9e-12).sqrt();
        assert!((r.propagation_speed_m_per_s - expected_speed).abs() < 1e-3);
        assert!((r.propagation_speed_m_per_s - 3.043e8).abs() < 1e6);
        assert!((r.time_delta_s - 1e-6).abs() < 1e-15);
        assert!(r.distance_from_source_m > 5000.0);
        assert!((r.distance_from_source_m - 0.5 * (10_000.0 + expected_speed * 1e-6)).abs() < 1e-6);
        assert!(!r.clamped);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.line_length_m, 10_000.0);
    }

    #[test]
    fn test_clamps_beyond_far_end() {
        let r = estimate(10.0, L, C, ts(1_000_050_000), ts(1_000_000_000)).unwrap();
        assert_eq!(r.distance_from_source_m, 10_000.0);
        assert_eq!(r.distance_from_end_m, 0.0);
        assert!(r.clamped);
        assert!(r.confidence >= MIN_CLAMPED_CONFIDENCE && r.confidence < 1.0);
        assert_eq!(r.confidence, 0.74);
    }

    #[test]
    fn test_clamps_before_source() {
        let r = estimate(10.0, L, C, ts(0), ts(200_000)).unwrap();
        assert_eq!(r.distance_from_source_m, 0.0);
        assert!(r.clamped);
        assert_eq!(r.confidence, MIN_CLAMPED_CONFIDENCE);
    }

    #[test]
    fn test_marginal_clamp_never_reports_full_confidence() {
        // raw overshoot of ~20 m on a 10 km line rounds to 1.00 before the cap
        let r = estimate(10.0, L, C, ts(33_000), ts(0)).unwrap();
        assert!(r.clamped);
        assert!(r.confidence < 1.0);
    }

    #[rstest]
    #[case(0.0, L, C)]
    #[case(-1.0, L, C)]
    #[case(10.0, 0.0, C)]
    #[case(10.0, L, 0.0)]
    #[case(10.0, f64::NAN, C)]
    #[case(f64::INFINITY, L, C)]
    #[case(1e306, L, C)]
    #[case(f64::MAX, L, C)]
    fn test_rejects_invalid_parameters(#[case] len: f64, #[case] l: f64, #[case] c: f64) {
        let err = estimate(len, l, c, ts(1), ts(0)).unwrap_err();
        assert!(matches!(err, FlisrError::InvalidParameter(_)), "{err}");
    }

    #[test]
    fn test_underflowing_lc_product_is_invalid() {
        let err = propagation_speed(1e-200, 1e-200).unwrap_err();
        assert!(matches!(err, FlisrError::InvalidParameter(_)));
    }

    #[rstest]
    #[case(i64::MAX, 0)]
    #[case(0, i64::MIN)]
    #[case(1 << 53, 0)]
    fn test_rejects_imprecise_delta(#[case] a: i64, #[case] b: i64) {
        let err = estimate(10.0, L, C, ts(a), ts(b)).unwrap_err();
        assert!(matches!(err, FlisrError::Precision(_)));
    }

    #[test]
    fn test_delta_at_safe_boundary_is_accepted() {
        let delta = time_delta_seconds(ts((1 << 53) - 1), ts(0)).unwrap();
        assert_eq!(delta, ((1_i64 << 53) - 1) as f64 / 1e9);
    }

    #[test]
    fn test_large_absolute_timestamps_keep_exact_delta() {
        let base = 1_700_000_000_000_000_000_i64;
        let delta = time_delta_seconds(ts(base + 1_000), ts(base)).unwrap();
        assert_eq!(delta, 1e-6);
    }

    proptest! {
        #[test]
        fn prop_distance_within_line(
            length_km in 0.1f64..100.0,
            l in 1e-4f64..5e-3,
            c in 1e-9f64..5e-8,
            b in -1_000_000_000i64..1_000_000_000,
            offset in -1_000_000i64..1_000_000,
        ) {
            let r = estimate(length_km, l, c, ts(b + offset), ts(b)).unwrap();
            prop_assert!(r.distance_from_source_m >= 0.0);
            prop_assert!(r.distance_from_source_m <= r.line_length_m);
            let total = r.distance_from_source_m + r.distance_from_end_m;
            prop_assert!((total - r.line_length_m).abs() <= 1e-9 * r.line_length_m);
            if r.clamped {
                prop_assert!(r.confidence >= MIN_CLAMPED_CONFIDENCE && r.confidence < 1.0);
            } else {
                prop_assert_eq!(r.confidence, 1.0);
            }
        }

        #[test]
        fn prop_estimate_is_deterministic(
            length_km in 0.1f64..100.0,
            a in any::<i32>(),
            b in any::<i32>(),
        ) {
            let first = estimate(length_km, L, C, ts(a as i64), ts(b as i64)).unwrap();
            let second = estimate(length_km, L, C, ts(a as i64), ts(b as i64)).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
