//! Builds `generalActivities.js`: household actions priced off three base
//! factors pulled from the tidy DEFRA table.
//!
//! Each entry is a hand-authored usage assumption (kWh of electricity, kWh of
//! gas, litres of water per unit of the activity); the emission factor is the
//! linear combination of those with the derived base factors.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::activity::{round_dp, ActivityRecord};
use crate::defra::tidy::{read_tidy_csv, TidyRow};
use crate::defra::GenerateError;
use crate::emit::write_activity_module;

/// Name of the emitted module (and of the const it exports).
pub const GENERAL_MODULE_NAME: &str = "generalActivities";

const GENERAL_CATEGORY: &str = "general";

/// Water factors above this are taken to be per cubic metre and rescaled to
/// per litre. The tidy table can carry either base unit; a genuine per-litre
/// factor is orders of magnitude below this line.
const WATER_UNIT_SCALE_THRESHOLD: f64 = 10.0;

const SOURCE_ELECTRICITY: &str = "Estimated using DEFRA 2025 electricity factor";
const SOURCE_GAS: &str = "Estimated using DEFRA 2025 natural gas factor";
const SOURCE_WATER: &str = "Estimated using DEFRA 2025 water factor";
const SOURCE_WATER_ELECTRICITY: &str = "Estimated using DEFRA 2025 water and electricity factors";
const SOURCE_ELECTRICITY_WATER: &str = "Estimated using DEFRA 2025 electricity and water factors";

/// Scalars extracted from the tidy table by filtering and averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseFactors {
    /// kg CO2e per kWh of grid electricity.
    pub electricity_per_kwh: f64,
    /// kg CO2e per kWh of natural gas.
    pub gas_per_kwh: f64,
    /// kg CO2e per litre of supplied water.
    pub water_per_litre: f64,
}

/// One household activity and its usage assumption. The coefficients are
/// multiplied with the corresponding [`BaseFactors`] fields.
struct GeneralActivitySpec {
    id: &'static str,
    activity: &'static str,
    unit: &'static str,
    electricity_kwh: f64,
    gas_kwh: f64,
    water_litres: f64,
    source: &'static str,
}

const GENERAL_ACTIVITIES: &[GeneralActivitySpec] = &[
    // 9.5 kW electric shower, 12 L/min flow
    GeneralActivitySpec {
        id: "shower_hot_per_min",
        activity: "Take a Hot Shower",
        unit: "minutes",
        electricity_kwh: 0.158,
        gas_kwh: 0.0,
        water_litres: 12.0,
        source: SOURCE_WATER_ELECTRICITY,
    },
    // 160 L tub, ~4 kWh to heat
    GeneralActivitySpec {
        id: "bath_hot_avg",
        activity: "Take a Hot Bath (Full Tub)",
        unit: "uses",
        electricity_kwh: 4.0,
        gas_kwh: 0.0,
        water_litres: 80.0,
        source: SOURCE_WATER_ELECTRICITY,
    },
    // 1.5 L boil
    GeneralActivitySpec {
        id: "boil_kettle_full",
        activity: "Boil Electric Kettle (Full 1.5L)",
        unit: "uses",
        electricity_kwh: 0.1,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "microwave_per_min",
        activity: "Use Microwave",
        unit: "minutes",
        electricity_kwh: 0.1,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "electric_hob_per_min",
        activity: "Cook Using Electric Hob",
        unit: "minutes",
        electricity_kwh: 0.16,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 0.17 kWh of gas per minute
    GeneralActivitySpec {
        id: "gas_hob_per_min",
        activity: "Cook Using Gas Hob",
        unit: "minutes",
        electricity_kwh: 0.0,
        gas_kwh: 0.17,
        water_litres: 0.0,
        source: SOURCE_GAS,
    },
    // 1.1 kWh + 10 L per cycle
    GeneralActivitySpec {
        id: "dishwasher_use",
        activity: "Run Dishwasher",
        unit: "uses",
        electricity_kwh: 1.1,
        gas_kwh: 0.0,
        water_litres: 10.0,
        source: SOURCE_ELECTRICITY_WATER,
    },
    // 0.8 kWh + 50 L per cycle
    GeneralActivitySpec {
        id: "washing_machine_use",
        activity: "Run Washing Machine",
        unit: "uses",
        electricity_kwh: 0.8,
        gas_kwh: 0.0,
        water_litres: 50.0,
        source: SOURCE_ELECTRICITY_WATER,
    },
    GeneralActivitySpec {
        id: "tumble_dryer_use",
        activity: "Use Tumble Dryer",
        unit: "uses",
        electricity_kwh: 2.2,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 0.04 kWh per full charge
    GeneralActivitySpec {
        id: "charge_phone",
        activity: "Charge Smartphone",
        unit: "charges",
        electricity_kwh: 0.04,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 100 W set
    GeneralActivitySpec {
        id: "use_tv_per_min",
        activity: "Watch TV",
        unit: "minutes",
        electricity_kwh: 0.01,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "use_laptop_per_min",
        activity: "Use Laptop",
        unit: "minutes",
        electricity_kwh: 0.003,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "use_desktop_pc_per_min",
        activity: "Use Desktop PC",
        unit: "minutes",
        electricity_kwh: 0.004,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 1.2 kW dryer for the full ten minutes
    GeneralActivitySpec {
        id: "hairdryer_10_min",
        activity: "Dry Hair with Hairdryer",
        unit: "10 minutes",
        electricity_kwh: 0.2,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // running tap, ~6 L/min
    GeneralActivitySpec {
        id: "brush_teeth_tap_per_min",
        activity: "Brush Teeth with Tap Running",
        unit: "minutes",
        electricity_kwh: 0.0,
        gas_kwh: 0.0,
        water_litres: 6.0,
        source: SOURCE_WATER,
    },
    GeneralActivitySpec {
        id: "electric_toothbrush_charge",
        activity: "Use Electric Toothbrush",
        unit: "charges",
        electricity_kwh: 0.003,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "vacuum_clean_per_room",
        activity: "Vacuum a Room",
        unit: "uses",
        electricity_kwh: 0.3,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 2.4 kW iron
    GeneralActivitySpec {
        id: "iron_clothes_per_hour",
        activity: "Iron Clothes",
        unit: "hours",
        electricity_kwh: 2.4,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "use_ac_heater_per_hour",
        activity: "Use Air Conditioner or Heater",
        unit: "hours",
        electricity_kwh: 2.0,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "fridge_daily",
        activity: "Use Fridge (Daily)",
        unit: "days",
        electricity_kwh: 1.2,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "freezer_daily",
        activity: "Use Freezer (Daily)",
        unit: "days",
        electricity_kwh: 1.0,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // ~5 minutes per use
    GeneralActivitySpec {
        id: "toaster_use",
        activity: "Use Toaster",
        unit: "uses",
        electricity_kwh: 0.05,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 3 kW oven
    GeneralActivitySpec {
        id: "oven_electric_per_min",
        activity: "Use Electric Oven",
        unit: "minutes",
        electricity_kwh: 0.05,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "coffee_machine_use",
        activity: "Use Coffee Machine",
        unit: "uses",
        electricity_kwh: 0.05,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "hair_straighteners_10min",
        activity: "Use Hair Straighteners",
        unit: "10 minutes",
        electricity_kwh: 0.1,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "gaming_console_per_hour",
        activity: "Use Gaming Console",
        unit: "hours",
        electricity_kwh: 0.1,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 5 W continuous
    GeneralActivitySpec {
        id: "wifi_router_daily",
        activity: "Use Wi-Fi Router",
        unit: "days",
        electricity_kwh: 0.12,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "charge_tablet",
        activity: "Charge Tablet",
        unit: "charges",
        electricity_kwh: 0.02,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 3 W continuous
    GeneralActivitySpec {
        id: "smart_speaker_daily",
        activity: "Use Smart Speaker (Daily)",
        unit: "days",
        electricity_kwh: 0.072,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 120 W panel
    GeneralActivitySpec {
        id: "smart_tv_per_hour",
        activity: "Use Smart TV",
        unit: "hours",
        electricity_kwh: 0.12,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // network and device overhead
    GeneralActivitySpec {
        id: "streaming_video_per_hour",
        activity: "Stream Video Content",
        unit: "hours",
        electricity_kwh: 0.015,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 9 W bulb
    GeneralActivitySpec {
        id: "lighting_led_per_hour",
        activity: "Use LED Lighting",
        unit: "hours",
        electricity_kwh: 0.009,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 60 W bulb
    GeneralActivitySpec {
        id: "lighting_incandescent_per_hour",
        activity: "Use Incandescent Lighting",
        unit: "hours",
        electricity_kwh: 0.06,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    GeneralActivitySpec {
        id: "printer_use",
        activity: "Use Home Printer",
        unit: "uses",
        electricity_kwh: 0.05,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 50 W fan
    GeneralActivitySpec {
        id: "fan_per_hour",
        activity: "Use Electric Fan",
        unit: "hours",
        electricity_kwh: 0.05,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // full cleaning cycle
    GeneralActivitySpec {
        id: "robot_vacuum_per_use",
        activity: "Use Robot Vacuum",
        unit: "uses",
        electricity_kwh: 0.3,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // hot tap, ~2 L/min
    GeneralActivitySpec {
        id: "dish_handwash_hot_per_min",
        activity: "Handwash Dishes with Hot Water",
        unit: "minutes",
        electricity_kwh: 0.12,
        gas_kwh: 0.0,
        water_litres: 2.0,
        source: SOURCE_WATER_ELECTRICITY,
    },
    // 12 L/min, unheated
    GeneralActivitySpec {
        id: "shower_cold_per_min",
        activity: "Take a Cold Shower",
        unit: "minutes",
        electricity_kwh: 0.0,
        gas_kwh: 0.0,
        water_litres: 12.0,
        source: SOURCE_WATER,
    },
    GeneralActivitySpec {
        id: "bidet_use",
        activity: "Use Smart Toilet/Bidet",
        unit: "uses",
        electricity_kwh: 0.03,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
    // 200 W unit
    GeneralActivitySpec {
        id: "humidifier_per_hour",
        activity: "Run Humidifier/Dehumidifier",
        unit: "hours",
        electricity_kwh: 0.2,
        gas_kwh: 0.0,
        water_litres: 0.0,
        source: SOURCE_ELECTRICITY,
    },
];

/// Mean factor over rows matching `predicate`, `None` when nothing matches.
/// Rows without a factor never match.
fn mean_where<F>(rows: &[TidyRow], predicate: F) -> Option<f64>
where
    F: Fn(&TidyRow) -> bool,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in rows.iter().filter(|row| predicate(row)) {
        let Some(factor) = row.emission_factor else {
            continue;
        };
        sum += factor;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn lower(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_lowercase()
}

/// Filter and average the tidy table into the three base factors.
///
/// Matching mirrors how the factors appear in the DEFRA table: grid
/// electricity by exact category, natural gas by fuels rows, water by unit.
/// An empty match for any of the three is fatal since every downstream
/// factor is built from them.
pub fn derive_base_factors(rows: &[TidyRow]) -> Result<BaseFactors, GenerateError> {
    let electricity_per_kwh = mean_where(rows, |row| {
        row.category.trim().to_lowercase() == "uk electricity" && lower(&row.unit).contains("kwh")
    })
    .ok_or(GenerateError::MissingBaseFactor("electricity"))?;

    let gas_per_kwh = mean_where(rows, |row| {
        row.category.trim().to_lowercase().contains("fuels")
            && lower(&row.detail).contains("natural gas")
            && lower(&row.unit).contains("kwh")
    })
    .ok_or(GenerateError::MissingBaseFactor("natural gas"))?;

    let raw_water = mean_where(rows, |row| {
        let unit = lower(&row.unit);
        row.category.trim().to_lowercase().contains("water")
            && (unit.contains("litre") || unit.contains("cubic metre"))
    })
    .ok_or(GenerateError::MissingBaseFactor("water"))?;
    // TODO: the threshold test below misreads a per-m3 factor that happens to
    // fall under 10; derive the scale from the row units instead.
    let water_per_litre = if raw_water > WATER_UNIT_SCALE_THRESHOLD {
        raw_water / 1000.0
    } else {
        raw_water
    };

    info!(
        "Base factors: electricity={:.6} gas={:.6} water={:.6}",
        electricity_per_kwh, gas_per_kwh, water_per_litre
    );
    Ok(BaseFactors {
        electricity_per_kwh,
        gas_per_kwh,
        water_per_litre,
    })
}

/// Evaluate the activity table against the base factors.
pub fn build_general_records(base: &BaseFactors) -> Vec<ActivityRecord> {
    GENERAL_ACTIVITIES
        .iter()
        .map(|spec| {
            let factor = base.electricity_per_kwh * spec.electricity_kwh
                + base.gas_per_kwh * spec.gas_kwh
                + base.water_per_litre * spec.water_litres;
            ActivityRecord {
                id: spec.id.to_string(),
                activity: spec.activity.to_string(),
                category: GENERAL_CATEGORY.to_string(),
                unit: spec.unit.to_string(),
                emission_factor: round_dp(factor, 6),
                source: spec.source.to_string(),
                activity_type: None,
                user_inputs: None,
            }
        })
        .collect()
}

/// Run the whole general-activities build: tidy CSV in, module out.
pub fn generate_general_activities(
    tidy_path: &Path,
    output_dir: &Path,
) -> Result<PathBuf, GenerateError> {
    let rows = read_tidy_csv(tidy_path)?;
    let base = derive_base_factors(&rows)?;
    let records = build_general_records(&base);
    Ok(write_activity_module(
        output_dir,
        GENERAL_MODULE_NAME,
        &records,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(category: &str, detail: Option<&str>, unit: &str, factor: f64) -> TidyRow {
        TidyRow {
            category: category.to_string(),
            subcategory: None,
            detail: detail.map(str::to_string),
            activity: None,
            description: None,
            unit: Some(unit.to_string()),
            emission_factor: Some(factor),
        }
    }

    fn sample_rows() -> Vec<TidyRow> {
        vec![
            row("UK electricity", None, "kWh", 0.2),
            row("UK electricity", None, "kWh", 0.1),
            row("Fuels", Some("Natural gas"), "kWh (Net CV)", 0.18),
            row("Fuels", Some("Diesel"), "kWh (Net CV)", 0.25),
            row("Water supply", None, "cubic metres", 150.0),
        ]
    }

    #[test]
    fn test_base_factors_average_matching_rows() {
        let base = derive_base_factors(&sample_rows()).unwrap();
        assert!((base.electricity_per_kwh - 0.15).abs() < 1e-12);
        assert_eq!(base.gas_per_kwh, 0.18);
    }

    #[test]
    fn test_water_factor_rescaled_from_cubic_metres() {
        let base = derive_base_factors(&sample_rows()).unwrap();
        // 150 per m3 is over the threshold, so it becomes per litre
        assert!((base.water_per_litre - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_water_factor_kept_when_already_per_litre() {
        let mut rows = sample_rows();
        rows.pop();
        rows.push(row("Water supply", None, "litres", 0.000_15));
        let base = derive_base_factors(&rows).unwrap();
        assert_eq!(base.water_per_litre, 0.000_15);
    }

    #[test]
    fn test_missing_electricity_rows_is_fatal() {
        let rows = vec![row("Fuels", Some("Natural gas"), "kWh", 0.18)];
        match derive_base_factors(&rows) {
            Err(GenerateError::MissingBaseFactor(which)) => assert_eq!(which, "electricity"),
            other => panic!("expected MissingBaseFactor, got {other:?}"),
        }
    }

    #[test]
    fn test_gas_filter_requires_natural_gas_detail() {
        let rows = vec![
            row("UK electricity", None, "kWh", 0.2),
            row("Fuels", Some("Diesel"), "kWh", 0.25),
            row("Water supply", None, "litres", 0.000_15),
        ];
        match derive_base_factors(&rows) {
            Err(GenerateError::MissingBaseFactor(which)) => assert_eq!(which, "natural gas"),
            other => panic!("expected MissingBaseFactor, got {other:?}"),
        }
    }

    #[test]
    fn test_shower_factor_formula() {
        let base = BaseFactors {
            electricity_per_kwh: 0.2,
            gas_per_kwh: 0.18,
            water_per_litre: 0.000_15,
        };
        let records = build_general_records(&base);
        let shower = records.iter().find(|r| r.id == "shower_hot_per_min").unwrap();
        assert_eq!(shower.emission_factor, round_dp(0.2 * 0.158 + 0.000_15 * 12.0, 6));
        assert_eq!(shower.unit, "minutes");
    }

    #[test]
    fn test_gas_hob_uses_gas_factor_only() {
        let base = BaseFactors {
            electricity_per_kwh: 0.2,
            gas_per_kwh: 0.18,
            water_per_litre: 0.000_15,
        };
        let records = build_general_records(&base);
        let hob = records.iter().find(|r| r.id == "gas_hob_per_min").unwrap();
        assert_eq!(hob.emission_factor, round_dp(0.18 * 0.17, 6));
        assert_eq!(hob.source, "Estimated using DEFRA 2025 natural gas factor");
    }

    #[test]
    fn test_table_ids_are_unique_slugs() {
        let mut seen = HashSet::new();
        for spec in GENERAL_ACTIVITIES {
            assert!(seen.insert(spec.id), "duplicate id {}", spec.id);
            assert!(
                spec.id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "id {} breaks the slug grammar",
                spec.id
            );
        }
        assert_eq!(GENERAL_ACTIVITIES.len(), 40);
    }

    #[test]
    fn test_records_are_tagged_general() {
        let base = BaseFactors {
            electricity_per_kwh: 0.2,
            gas_per_kwh: 0.18,
            water_per_litre: 0.000_15,
        };
        for record in build_general_records(&base) {
            assert_eq!(record.category, "general");
            assert!(record.emission_factor.is_finite());
            assert!(record.emission_factor >= 0.0);
        }
    }
}
