//! Fixed-point scaling between floating-point sensor values and the
//! integer representation the ledger contract stores.
//!
//! The factors are part of the wire contract with the deployed contract
//! and must not drift: pH, temperature, salinity and water level are
//! stored at one decimal of precision, turbidity at three.

use common::domain::{DomainError, DomainResult, LedgerSample};

pub const PH_SCALE: f64 = 10.0;
pub const TEMPERATURE_SCALE: f64 = 10.0;
pub const TURBIDITY_SCALE: f64 = 1000.0;
pub const SALINITY_SCALE: f64 = 10.0;
pub const WATER_LEVEL_SCALE: f64 = 10.0;

/// A reading scaled to the contract's integer representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledReading {
    pub sensor_id: String,
    pub ph: u64,
    pub temperature: u64,
    pub turbidity: u64,
    pub salinity: u64,
    pub water_level: u64,
}

/// A historical reading recovered from the ledger, back in floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReading {
    pub sensor_id: String,
    pub ph: f64,
    pub temperature: f64,
    pub turbidity: f64,
    pub salinity: f64,
    pub water_level: f64,
    /// Block timestamp recorded by the contract, epoch seconds.
    pub timestamp: i64,
}

/// The contract stores unsigned integers, so a reading that scales below
/// zero cannot be anchored and must abort the message.
fn to_fixed(field: &str, value: f64, factor: f64) -> DomainResult<u64> {
    let scaled = (value * factor).round();
    if scaled < 0.0 {
        return Err(DomainError::Anchoring(format!(
            "{field} value {value} is negative and cannot be stored by the contract"
        )));
    }
    Ok(scaled as u64)
}

pub fn scale_sample(sample: &LedgerSample) -> DomainResult<ScaledReading> {
    Ok(ScaledReading {
        sensor_id: sample.sensor_id.clone(),
        ph: to_fixed("pH", sample.ph, PH_SCALE)?,
        temperature: to_fixed("temperature", sample.temperature, TEMPERATURE_SCALE)?,
        turbidity: to_fixed("turbidity", sample.turbidity, TURBIDITY_SCALE)?,
        salinity: to_fixed("salinity", sample.salinity, SALINITY_SCALE)?,
        water_level: to_fixed("waterLevel", sample.water_level, WATER_LEVEL_SCALE)?,
    })
}

/// Inverse of [`scale_sample`] for values read back from the contract.
pub fn unscale_reading(
    sensor_id: String,
    ph: u64,
    temperature: u64,
    turbidity: u64,
    salinity: u64,
    water_level: u64,
    timestamp: i64,
) -> LedgerReading {
    LedgerReading {
        sensor_id,
        ph: ph as f64 / PH_SCALE,
        temperature: temperature as f64 / TEMPERATURE_SCALE,
        turbidity: turbidity as f64 / TURBIDITY_SCALE,
        salinity: salinity as f64 / SALINITY_SCALE,
        water_level: water_level as f64 / WATER_LEVEL_SCALE,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ph: f64, temperature: f64, turbidity: f64, salinity: f64, water_level: f64) -> LedgerSample {
        LedgerSample {
            sensor_id: "sensor-1".to_string(),
            ph,
            temperature,
            turbidity,
            salinity,
            water_level,
        }
    }

    #[test]
    fn scales_each_field_by_its_documented_factor() {
        let scaled = scale_sample(&sample(7.2, 25.5, 3.456, 0.5, 1.8)).unwrap();

        assert_eq!(scaled.ph, 72);
        assert_eq!(scaled.temperature, 255);
        assert_eq!(scaled.turbidity, 3456);
        assert_eq!(scaled.salinity, 5);
        assert_eq!(scaled.water_level, 18);
    }

    #[test]
    fn rounds_to_nearest_integer() {
        let scaled = scale_sample(&sample(6.94, 6.95, 0.0004, 0.04, 0.06)).unwrap();

        assert_eq!(scaled.ph, 69); // 69.4 rounds down
        assert_eq!(scaled.temperature, 70); // 69.5 rounds up
        assert_eq!(scaled.turbidity, 0); // 0.4 rounds down
        assert_eq!(scaled.salinity, 0);
        assert_eq!(scaled.water_level, 1); // 0.6 rounds up
    }

    #[test]
    fn zero_filled_fields_scale_to_zero() {
        let scaled = scale_sample(&sample(0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(scaled.ph, 0);
        assert_eq!(scaled.turbidity, 0);
    }

    #[test]
    fn negative_temperature_is_rejected_not_truncated() {
        let result = scale_sample(&sample(7.0, -2.0, 3.0, 0.5, 1.0));

        match result {
            Err(DomainError::Anchoring(msg)) => {
                assert!(msg.contains("temperature"));
                assert!(msg.contains("-2"));
            }
            other => panic!("expected anchoring error, got {other:?}"),
        }
    }

    #[test]
    fn negative_water_level_is_rejected() {
        let result = scale_sample(&sample(7.0, 25.0, 3.0, 0.5, -0.3));
        assert!(matches!(result, Err(DomainError::Anchoring(_))));
    }

    #[test]
    fn values_rounding_to_negative_zero_are_acceptable() {
        // -0.004 scales to -0.04, which rounds to zero
        let scaled = scale_sample(&sample(7.0, -0.004, 3.0, 0.5, 1.0)).unwrap();
        assert_eq!(scaled.temperature, 0);
    }

    #[test]
    fn read_path_recovers_rounded_input() {
        let original = sample(7.2, 25.5, 3.456, 33.1, 1.8);
        let scaled = scale_sample(&original).unwrap();
        let recovered = unscale_reading(
            scaled.sensor_id,
            scaled.ph,
            scaled.temperature,
            scaled.turbidity,
            scaled.salinity,
            scaled.water_level,
            0,
        );

        assert!((recovered.ph - original.ph).abs() < 1e-9);
        assert!((recovered.temperature - original.temperature).abs() < 1e-9);
        assert!((recovered.turbidity - original.turbidity).abs() < 1e-9);
        assert!((recovered.salinity - original.salinity).abs() < 1e-9);
        assert!((recovered.water_level - original.water_level).abs() < 1e-9);
    }
}
