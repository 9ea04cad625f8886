//! Builds one activity module per retained DEFRA category.
//!
//! The tidy table is cleaned, filtered against the exclusion lists, averaged
//! over (category, label, unit), harmonized to the calculator's unit set,
//! then written out as `{categorySlug}Activities.js` files. Harmonization is
//! order-sensitive: unit rewrites run before the delivery payload rescale,
//! the electric-van merge regroups, and deduplication comes last.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::activity::{round_dp, ActivityRecord};
use crate::defra::tidy::{read_tidy_csv, TidyRow};
use crate::defra::titles::friendly_name;
use crate::defra::GenerateError;
use crate::emit::write_activity_module;
use crate::slug::{category_slug, slugify};

/// Provenance string written into every record.
pub const SOURCE_LABEL: &str = "DEFRA 2025";

/// Used to convert delivery factors from per km to per kg·km.
const AVERAGE_VAN_PAYLOAD_KG: f64 = 500.0;
const MILES_PER_KM: f64 = 0.621371;

/// Categories dropped entirely (case-insensitive exact match). Mostly
/// well-to-tank and upstream rows the calculator does not surface.
const EXCLUDED_CATEGORIES: &[&str] = &[
    "WTT- fuels",
    "WTT- heat and steam",
    "WTT- UK electricity",
    "Transmission and distribution",
    "Heat and steam",
    "UK electricity T&D for EVs",
    "Managed assets- electricity",
    "Refrigerant & other",
    "Material use",
    "WTT- bioenergy",
    "WTT- delivery vehs & freight",
    "WTT- pass vehs & travel- land",
    "WTT- business travel- air",
    "WTT- business travel- sea",
    "Bioenergy",
    "Managed assets- vehicles",
    "Business travel- land",
    "Fuels",
    "Water treatment",
    "Freighting goods",
];

/// Categories kept even when their label reads as unspecified/unknown.
const KEEP_UNSPECIFIED_CATEGORIES: &[&str] =
    &["homeworking", "hotel stay", "water supply", "business travel- sea"];

/// Keywords marking a delivery row as fuel-specific.
const FUEL_KEYWORDS: &[&str] = &[
    "electric",
    "diesel",
    "petrol",
    "plug-in hybrid",
    "plugin hybrid",
    "cng",
    "lpg",
];

/// Delivery labels folded into the single "electric van" bucket.
const ELECTRIC_VAN_LABELS: &[&str] = &["battery electric", "plugin hybrid", "plug-in hybrid"];

/// Label-only unit-string normalisations, keyed on the original unit.
const UNIT_NORMALISATIONS: &[(&str, &str)] = &[
    ("per fte working hour", "FTE working hour"),
    ("fte working hour", "FTE working hour"),
];

struct UnitConversion {
    from: &'static str,
    to: &'static str,
    factor_multiplier: f64,
    /// Matches the old unit text inside labels, case-insensitively.
    label_pattern: Regex,
}

fn conversion(from: &'static str, to: &'static str, factor_multiplier: f64) -> UnitConversion {
    UnitConversion {
        from,
        to,
        factor_multiplier,
        label_pattern: Regex::new(&format!("(?i){}", regex::escape(from))).unwrap(),
    }
}

/// Factor unit rewrites: found unit -> (canonical unit, multiplier on the
/// factor). Multipliers follow from the factor being "per unit".
static UNIT_CONVERSIONS: Lazy<Vec<UnitConversion>> = Lazy::new(|| {
    vec![
        conversion("million litres", "litres", 1.0 / 1_000_000.0),
        conversion("cubic metres", "litres", 1.0 / 1000.0),
        conversion("tonnes", "kilograms", 1.0 / 1000.0),
        conversion("grams", "kilograms", 1000.0),
        conversion("kwh", "wh", 1.0 / 1000.0),
        conversion("mwh", "wh", 1.0 / 1_000_000.0),
    ]
});

static USELESS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(unspecified|unknown|na|n/?a|not\s+applicable|not\s+specified|none)\s*$")
        .unwrap()
});

static EXCLUDED_SET: Lazy<HashSet<String>> = Lazy::new(|| {
    EXCLUDED_CATEGORIES
        .iter()
        .map(|category| category.to_lowercase())
        .collect()
});

/// A (category, label, unit) group carrying its averaged factor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub category: String,
    pub label: String,
    pub unit: String,
    pub factor: f64,
}

/// Trimmed value, with empty strings and the stringified-missing sentinel
/// "nan" treated as absent.
fn clean_value(value: &Option<String>) -> Option<String> {
    let trimmed = value.as_deref()?.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First pass over the tidy rows: derive the display label, drop useless and
/// excluded rows. Rows without a unit cannot be grouped and are dropped too.
fn clean_rows(rows: &[TidyRow]) -> Vec<GroupedRow> {
    let mut cleaned = Vec::new();
    for row in rows {
        let category = row.category.trim();
        if category.is_empty() || category == "nan" {
            continue;
        }
        let Some(factor) = row.emission_factor else {
            continue;
        };

        // Label preference: description, then activity, then the sentinel
        let label = clean_value(&row.description)
            .or_else(|| clean_value(&row.activity))
            .unwrap_or_else(|| "Unspecified".to_string());

        let catnorm = category.to_lowercase();
        if USELESS_LABEL_RE.is_match(&label)
            && !KEEP_UNSPECIFIED_CATEGORIES.contains(&catnorm.as_str())
        {
            continue;
        }
        if EXCLUDED_SET.contains(&catnorm) {
            continue;
        }

        let Some(unit) = clean_value(&row.unit) else {
            continue;
        };
        cleaned.push(GroupedRow {
            category: category.to_string(),
            label,
            unit,
            factor,
        });
    }
    cleaned
}

/// Average factors over (category, label, unit). Output is sorted by the
/// group key, which fixes the record order inside each emitted module.
fn average_groups(rows: Vec<GroupedRow>) -> Vec<GroupedRow> {
    let mut groups: BTreeMap<(String, String, String), (f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry((row.category, row.label, row.unit))
            .or_insert((0.0, 0));
        entry.0 += row.factor;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((category, label, unit), (sum, count))| GroupedRow {
            category,
            label,
            unit,
            factor: sum / count as f64,
        })
        .collect()
}

fn convert_miles_to_km(row: &mut GroupedRow) {
    if row.unit.trim().to_lowercase() == "miles" {
        // factor is per mile; a km is shorter, so the factor shrinks
        row.factor /= MILES_PER_KM;
        row.unit = "km".to_string();
    }
}

fn normalise_units(row: &mut GroupedRow) {
    let unit_original = row.unit.trim().to_lowercase();
    for conversion in UNIT_CONVERSIONS.iter() {
        if unit_original == conversion.from {
            row.unit = conversion.to.to_string();
            row.factor *= conversion.factor_multiplier;
            // Carry the rewrite into labels quoting the old unit
            if row.label.to_lowercase().contains(conversion.from) {
                row.label = conversion
                    .label_pattern
                    .replace_all(&row.label, conversion.to)
                    .into_owned();
            }
            break;
        }
    }
    for (from, to) in UNIT_NORMALISATIONS {
        if unit_original == *from {
            row.unit = (*to).to_string();
            break;
        }
    }
}

/// One parcel's share of a shared van: delivery factors per km are divided
/// by the average payload so they price per kg·km instead.
fn rescale_delivery_per_parcel(row: &mut GroupedRow) {
    if row.category.trim().to_lowercase() == "delivery vehicles"
        && row.unit.trim().to_lowercase() == "km"
    {
        row.factor /= AVERAGE_VAN_PAYLOAD_KG;
        row.unit = "kg·km".to_string();
    }
}

fn merge_electric_van_labels(row: &mut GroupedRow) {
    if row.category.trim().to_lowercase() == "delivery vehicles" {
        let label = row.label.to_lowercase();
        if ELECTRIC_VAN_LABELS
            .iter()
            .any(|needle| label.contains(needle))
        {
            row.label = "electric van".to_string();
        }
    }
}

/// Generic undifferentiated delivery rows are dropped once fuel-specific
/// rows exist, so the same activity is not represented at two granularities.
fn is_fuel_specific_delivery(row: &GroupedRow) -> bool {
    if row.category.trim().to_lowercase() != "delivery vehicles" {
        return true;
    }
    let label = row.label.to_lowercase();
    FUEL_KEYWORDS.iter().any(|fuel| label.contains(fuel))
}

/// Round factors for stability and drop exact duplicate tuples, keeping the
/// first occurrence.
fn dedupe_rows(rows: Vec<GroupedRow>) -> Vec<GroupedRow> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(rows.len());
    for mut row in rows {
        row.factor = round_dp(row.factor, 8);
        let key = (
            row.category.clone(),
            row.label.clone(),
            row.unit.clone(),
            row.factor.to_bits(),
        );
        if seen.insert(key) {
            deduped.push(row);
        }
    }
    deduped
}

/// Run the whole row pipeline: clean, group, harmonize, merge, regroup,
/// filter, dedupe.
pub fn build_grouped_rows(rows: &[TidyRow]) -> Vec<GroupedRow> {
    let mut grouped = average_groups(clean_rows(rows));
    for row in &mut grouped {
        convert_miles_to_km(row);
        normalise_units(row);
        rescale_delivery_per_parcel(row);
        merge_electric_van_labels(row);
    }
    // The van merge changed grouping keys; average again before filtering
    let regrouped = average_groups(grouped);
    let retained = regrouped
        .into_iter()
        .filter(is_fuel_specific_delivery)
        .collect();
    dedupe_rows(retained)
}

/// Turn one grouped row into its activity record.
///
/// Ids are `{categorySlug}_{labelSlug}_{unitSlug}`, except the electrified
/// UK-electricity rows which keep their historical short ids, split into
/// freight and passenger variants by unit.
pub fn record_for(row: &GroupedRow) -> ActivityRecord {
    let cat_slug = category_slug(&row.category);
    let unit_slug = slugify(&row.unit);
    let label = row.label.to_lowercase();

    let id = if cat_slug == "uk_electricity_for_evs" {
        let id_str = if label.contains("battery electric") {
            if unit_slug.contains("tonne") {
                "electric_freight_bev".to_string()
            } else {
                "electric_car".to_string()
            }
        } else if label.contains("plugin hybrid") || label.contains("plug-in hybrid") {
            if unit_slug.contains("tonne") {
                "plugin_hybrid_freight".to_string()
            } else {
                "plugin_hybrid_car".to_string()
            }
        } else {
            format!("{}_{}", slugify(&label), unit_slug)
        };
        format!("{cat_slug}_{id_str}")
    } else {
        format!("{}_{}_{}", cat_slug, slugify(&row.label), unit_slug)
    };

    // Compound per-mass-per-distance rows need two quantities from the user
    let user_inputs = if row.unit.to_lowercase() == "kg·km" {
        Some(vec!["weight_kg".to_string(), "distance_km".to_string()])
    } else {
        None
    };

    ActivityRecord {
        id,
        activity: friendly_name(row),
        category: cat_slug,
        unit: row.unit.clone(),
        emission_factor: round_dp(row.factor, 8),
        source: SOURCE_LABEL.to_string(),
        activity_type: None,
        user_inputs,
    }
}

/// Run the whole category build: tidy CSV in, one module per category out.
///
/// Returns the written paths in category order.
pub fn generate_category_activities(
    tidy_path: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, GenerateError> {
    let rows = read_tidy_csv(tidy_path)?;
    let grouped = build_grouped_rows(&rows);

    let mut by_category: BTreeMap<String, Vec<&GroupedRow>> = BTreeMap::new();
    for row in &grouped {
        by_category.entry(row.category.clone()).or_default().push(row);
    }
    info!(
        "Final rows: {} across {} categories",
        grouped.len(),
        by_category.len()
    );
    for (category, group) in &by_category {
        debug!("  {}: {} rows", category, group.len());
    }

    let mut written = Vec::with_capacity(by_category.len());
    for (category, group) in &by_category {
        let module_name = format!("{}Activities", category_slug(category));
        let records: Vec<ActivityRecord> = group.iter().map(|row| record_for(row)).collect();
        written.push(write_activity_module(output_dir, &module_name, &records)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tidy(category: &str, description: Option<&str>, unit: &str, factor: f64) -> TidyRow {
        TidyRow {
            category: category.to_string(),
            subcategory: None,
            detail: None,
            activity: None,
            description: description.map(str::to_string),
            unit: Some(unit.to_string()),
            emission_factor: Some(factor),
        }
    }

    fn grouped(category: &str, label: &str, unit: &str, factor: f64) -> GroupedRow {
        GroupedRow {
            category: category.to_string(),
            label: label.to_string(),
            unit: unit.to_string(),
            factor,
        }
    }

    #[test]
    fn test_grouping_averages_and_sorts() {
        let rows = vec![
            tidy("Waste disposal", Some("Landfill"), "tonnes", 400.0),
            tidy("Waste disposal", Some("Landfill"), "tonnes", 600.0),
            tidy("Hotel stay", None, "Room per night", 10.0),
        ];
        let grouped = build_grouped_rows(&rows);
        assert_eq!(grouped.len(), 2);
        // Sorted by category ascending
        assert_eq!(grouped[0].category, "Hotel stay");
        assert_eq!(grouped[1].label, "Landfill");
        // mean(400, 600) / 1000 after the tonnes rewrite
        assert_eq!(grouped[1].factor, 0.5);
        assert_eq!(grouped[1].unit, "kilograms");
    }

    #[test]
    fn test_miles_to_km() {
        let mut row = grouped("Passenger vehicles", "Diesel", "miles", 0.621371);
        convert_miles_to_km(&mut row);
        assert_eq!(row.unit, "km");
        assert!((row.factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_conversion_rewrites_label_text() {
        let mut row = grouped(
            "Water supply",
            "Volume (Million Litres)",
            "Million litres",
            1_000_000.0,
        );
        normalise_units(&mut row);
        assert_eq!(row.unit, "litres");
        assert_eq!(row.label, "Volume (litres)");
        assert!((row.factor - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_kwh_rows_become_wh() {
        let mut row = grouped("UK electricity", "Average", "kWh", 0.177);
        normalise_units(&mut row);
        assert_eq!(row.unit, "wh");
        assert!((row.factor - 0.000_177).abs() < 1e-12);
    }

    #[test]
    fn test_fte_unit_normalisation_keeps_factor() {
        let mut row = grouped("Homeworking", "Office equipment", "Per FTE Working Hour", 0.3);
        normalise_units(&mut row);
        assert_eq!(row.unit, "FTE working hour");
        assert_eq!(row.factor, 0.3);
    }

    #[test]
    fn test_delivery_payload_rescale() {
        let mut row = grouped("Delivery vehicles", "Diesel van", "km", 0.5);
        rescale_delivery_per_parcel(&mut row);
        assert_eq!(row.unit, "kg·km");
        assert_eq!(row.factor, 0.001);
    }

    #[test]
    fn test_electric_van_merge_and_generic_drop() {
        let rows = vec![
            tidy("Delivery vehicles", Some("Battery Electric van"), "km", 100.0),
            tidy("Delivery vehicles", Some("Plug-in Hybrid van"), "km", 200.0),
            tidy("Delivery vehicles", Some("Average van"), "km", 300.0),
        ];
        let grouped = build_grouped_rows(&rows);
        // Generic "Average van" has no fuel keyword and is dropped
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].label, "electric van");
        // mean(100, 200) per km, then per kg·km
        assert_eq!(grouped[0].factor, round_dp(150.0 / 500.0, 8));
        assert_eq!(grouped[0].unit, "kg·km");
    }

    #[test]
    fn test_excluded_categories_are_dropped() {
        let rows = vec![
            tidy("WTT- fuels", Some("Petrol"), "litres", 0.6),
            tidy("Fuels", Some("Petrol"), "litres", 2.1),
            tidy("Waste disposal", Some("Landfill"), "tonnes", 400.0),
        ];
        let grouped = build_grouped_rows(&rows);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].category, "Waste disposal");
    }

    #[test]
    fn test_useless_labels_dropped_unless_kept() {
        let rows = vec![
            tidy("Waste disposal", Some("Unknown"), "tonnes", 400.0),
            tidy("Water supply", None, "cubic metres", 150.0),
        ];
        let grouped = build_grouped_rows(&rows);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].category, "Water supply");
        assert_eq!(grouped[0].label, "Unspecified");
    }

    #[test]
    fn test_rows_without_unit_or_factor_are_dropped() {
        let mut no_unit = tidy("Hotel stay", None, "x", 10.0);
        no_unit.unit = None;
        let mut no_factor = tidy("Hotel stay", None, "Room per night", 0.0);
        no_factor.emission_factor = None;
        let grouped = build_grouped_rows(&[no_unit, no_factor]);
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_record_ids_follow_slug_pattern() {
        let record = record_for(&grouped("Waste disposal", "Glass recycling", "kilograms", 0.02));
        assert_eq!(record.id, "waste_disposal_glass_recycling_kilograms");
        assert_eq!(record.category, "waste_disposal");
        assert_eq!(record.source, "DEFRA 2025");
        assert_eq!(record.user_inputs, None);
    }

    #[test]
    fn test_ev_record_ids_are_special_cased() {
        let freight = record_for(&grouped(
            "UK electricity for EVs",
            "Battery Electric",
            "tonne.km",
            0.05,
        ));
        assert_eq!(freight.id, "uk_electricity_for_evs_electric_freight_bev");
        let car = record_for(&grouped("UK electricity for EVs", "Battery Electric", "km", 0.05));
        assert_eq!(car.id, "uk_electricity_for_evs_electric_car");
        let hybrid = record_for(&grouped("UK electricity for EVs", "Plug-in Hybrid", "km", 0.05));
        assert_eq!(hybrid.id, "uk_electricity_for_evs_plugin_hybrid_car");
    }

    #[test]
    fn test_kg_km_records_need_two_user_inputs() {
        let record = record_for(&grouped("Delivery vehicles", "electric van", "kg·km", 0.0003));
        assert_eq!(
            record.user_inputs,
            Some(vec!["weight_kg".to_string(), "distance_km".to_string()])
        );
        assert_eq!(record.activity, "Receive a delivery (electric van)");
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let rows = vec![
            tidy("Waste disposal", Some("Landfill"), "tonnes", 400.0),
            tidy("Delivery vehicles", Some("Battery Electric van"), "km", 100.0),
            tidy("Hotel stay", None, "Room per night", 10.0),
            tidy("Passenger vehicles", Some("Diesel (average)"), "miles", 0.3),
        ];
        assert_eq!(build_grouped_rows(&rows), build_grouped_rows(&rows));
    }
}
