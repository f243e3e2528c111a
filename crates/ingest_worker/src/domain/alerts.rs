use common::domain::{SensorReading, Threshold};

/// Evaluate a reading against its sensor's configured ranges.
///
/// Checks run in a fixed order (pH, temperature, turbidity, salinity,
/// water level) so alert text is stable for identical inputs. A field the
/// device did not report is never out of range, and a value sitting
/// exactly on a bound is acceptable.
pub fn evaluate_thresholds(reading: &SensorReading, threshold: &Threshold) -> Vec<String> {
    let mut alerts = Vec::new();

    if let Some(ph) = reading.ph {
        if ph < threshold.ph_min || ph > threshold.ph_max {
            alerts.push(format!("pH out of range: {ph}"));
        }
    }
    if let Some(temperature) = reading.temperature {
        if temperature < threshold.temp_min || temperature > threshold.temp_max {
            alerts.push(format!("Temperature out of range: {temperature}"));
        }
    }
    if let Some(turbidity) = reading.turbidity {
        if turbidity > threshold.turbidity_max {
            alerts.push(format!("Turbidity too high: {turbidity}"));
        }
    }
    if let Some(salinity) = reading.salinity {
        if salinity > threshold.salinity_max {
            alerts.push(format!("Salinity too high: {salinity}"));
        }
    }
    if let Some(water_level) = reading.water_level {
        if water_level < threshold.water_level_min {
            alerts.push(format!("Water Level too low: {water_level}"));
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold() -> Threshold {
        Threshold {
            sensor_id: "sensor-1".to_string(),
            ph_min: 6.5,
            ph_max: 8.5,
            temp_min: 20.0,
            temp_max: 30.0,
            turbidity_max: 5.0,
            salinity_max: 35.0,
            water_level_min: 0.5,
            created_at: None,
            updated_at: None,
        }
    }

    fn reading() -> SensorReading {
        SensorReading {
            sensor_id: "sensor-1".to_string(),
            ph: Some(7.0),
            temperature: Some(25.0),
            turbidity: Some(3.0),
            salinity: Some(20.0),
            water_level: Some(1.0),
        }
    }

    #[test]
    fn in_range_reading_raises_nothing() {
        assert!(evaluate_thresholds(&reading(), &threshold()).is_empty());
    }

    #[test]
    fn high_ph_raises_exactly_one_alert() {
        let mut r = reading();
        r.ph = Some(9.0);

        let alerts = evaluate_thresholds(&r, &threshold());
        assert_eq!(alerts, vec!["pH out of range: 9".to_string()]);
    }

    #[test]
    fn low_ph_raises_the_same_alert() {
        let mut r = reading();
        r.ph = Some(5.0);

        let alerts = evaluate_thresholds(&r, &threshold());
        assert_eq!(alerts, vec!["pH out of range: 5".to_string()]);
    }

    #[test]
    fn boundary_values_are_acceptable() {
        let mut r = reading();
        r.ph = Some(8.5);
        r.temperature = Some(20.0);
        r.turbidity = Some(5.0);
        r.salinity = Some(35.0);
        r.water_level = Some(0.5);

        assert!(evaluate_thresholds(&r, &threshold()).is_empty());
    }

    #[test]
    fn absent_fields_never_alert() {
        let r = SensorReading {
            sensor_id: "sensor-1".to_string(),
            ph: None,
            temperature: None,
            turbidity: None,
            salinity: None,
            water_level: None,
        };

        assert!(evaluate_thresholds(&r, &threshold()).is_empty());
    }

    #[test]
    fn multiple_violations_report_in_fixed_order() {
        let mut r = reading();
        r.ph = Some(9.2);
        r.turbidity = Some(8.0);
        r.water_level = Some(0.1);

        let alerts = evaluate_thresholds(&r, &threshold());
        assert_eq!(
            alerts,
            vec![
                "pH out of range: 9.2".to_string(),
                "Turbidity too high: 8".to_string(),
                "Water Level too low: 0.1".to_string(),
            ]
        );
    }

    #[test]
    fn fractional_values_keep_their_precision() {
        let mut r = reading();
        r.temperature = Some(30.75);

        let alerts = evaluate_thresholds(&r, &threshold());
        assert_eq!(alerts, vec!["Temperature out of range: 30.75".to_string()]);
    }
}
