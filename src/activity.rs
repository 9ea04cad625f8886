//! The record shape shared by every generated activity module.

use serde::{Deserialize, Serialize};

/// One selectable activity in the calculator's catalogue.
///
/// Serialized field order is the declaration order below; the generated
/// modules rely on it being stable so re-runs produce identical files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,
    pub activity: String,
    pub category: String,
    pub unit: String,
    /// kg CO2e per one `unit` of the activity.
    pub emission_factor: f64,
    pub source: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_inputs: Option<Vec<String>>,
}

/// Round to `places` decimal places, half away from zero.
pub fn round_dp(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_dp_six_places() {
        assert_eq!(round_dp(0.123_456_789, 6), 0.123_457);
        assert_eq!(round_dp(26.123_400_000_1, 6), 26.123_4);
    }

    #[test]
    fn test_round_dp_negative_value() {
        assert_eq!(round_dp(-0.000_000_49, 6), -0.0);
        assert_eq!(round_dp(-1.234_567_8, 6), -1.234_568);
    }

    #[test]
    fn test_serialize_field_order_and_renames() {
        let record = ActivityRecord {
            id: "food_tofu".to_string(),
            activity: "Eat Tofu".to_string(),
            category: "food".to_string(),
            unit: "kg".to_string(),
            emission_factor: 3.160_493,
            source: "Clark et al. 2022".to_string(),
            activity_type: Some("ate".to_string()),
            user_inputs: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"id":"food_tofu""#));
        assert!(json.contains(r#""emissionFactor":3.160493"#));
        assert!(json.contains(r#""type":"ate""#));
        assert!(!json.contains("userInputs"));
    }

    #[test]
    fn test_serialize_user_inputs_when_present() {
        let record = ActivityRecord {
            id: "delivery_vehicles_electric_van_kgkm".to_string(),
            activity: "Receive a delivery (electric van)".to_string(),
            category: "Delivery vehicles".to_string(),
            unit: "kg·km".to_string(),
            emission_factor: 0.000_1,
            source: "DEFRA 2025".to_string(),
            activity_type: None,
            user_inputs: Some(vec!["weight_kg".to_string(), "distance_km".to_string()]),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""userInputs":["weight_kg","distance_km"]"#));
        assert!(!json.contains(r#""type""#));
    }
}
