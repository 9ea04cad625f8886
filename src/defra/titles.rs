//! Human-readable titles for the category-scoped records.
//!
//! An ordered rule table maps (category pattern, optional label pattern) to a
//! title; the first matching rule wins, so more specific rules sit above the
//! catch-alls for the same category. Passenger vehicles and the electrified
//! UK-electricity rows need fuel-specific phrasing and are handled ahead of
//! the table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defra::categories::GroupedRow;
use crate::slug::{a_or_an, normalise_text, title_tidy};

/// Canonical passenger-vehicle names, scanned in order. Longer keys sit
/// before their substrings ("battery electric" before "hybrid") so the first
/// hit is the most specific one.
const VEHICLE_TERMS: &[(&str, &str)] = &[
    ("battery electric vehicle", "electric car"),
    ("battery electric", "electric car"),
    ("bev", "electric car"),
    ("plugin hybrid electric vehicle", "plug-in hybrid car"),
    ("plug-in hybrid", "plug-in hybrid car"),
    ("plugin hybrid", "plug-in hybrid car"),
    ("phev", "plug-in hybrid car"),
    ("hybrid", "hybrid car"),
    ("petrol", "petrol car"),
    ("diesel", "diesel car"),
    ("cng", "CNG car"),
    ("lpg", "LPG car"),
];

enum TitleTemplate {
    Literal(&'static str),
    FromRow(fn(&GroupedRow) -> String),
}

impl TitleTemplate {
    fn render(&self, row: &GroupedRow) -> String {
        match self {
            TitleTemplate::Literal(text) => (*text).to_string(),
            TitleTemplate::FromRow(build) => build(row),
        }
    }
}

struct TitleRule {
    category: Regex,
    label: Option<Regex>,
    template: TitleTemplate,
}

fn rule(category: &str, label: Option<&str>, template: TitleTemplate) -> TitleRule {
    TitleRule {
        category: Regex::new(category).unwrap(),
        label: label.map(|pattern| Regex::new(pattern).unwrap()),
        template,
    }
}

fn sail_title(row: &GroupedRow) -> String {
    let label = row.label.to_lowercase();
    if matches!(label.as_str(), "unspecified" | "unknown" | "nan") {
        "Sail".to_string()
    } else {
        format!("Sail ({})", row.label)
    }
}

static RULES: Lazy<Vec<TitleRule>> = Lazy::new(|| {
    use TitleTemplate::{FromRow, Literal};
    vec![
        // Delivery vehicles
        rule(r"delivery vehicles?", Some(r"\belectric\b"), Literal("Receive a delivery (electric van)")),
        rule(r"delivery vehicles?", Some(r"\bdiesel\b"), Literal("Receive a delivery (diesel van)")),
        rule(r"delivery vehicles?", Some(r"\bpetrol\b"), Literal("Receive a delivery (petrol van)")),
        rule(r"delivery vehicles?", Some(r"\bplug-?in hybrid\b"), Literal("Receive a delivery (plug-in hybrid van)")),
        rule(r"delivery vehicles?", Some(r"\bcng\b"), Literal("Receive a delivery (CNG van)")),
        rule(r"delivery vehicles?", Some(r"\blpg\b"), Literal("Receive a delivery (LPG van)")),
        rule(r"delivery vehicles?", None, Literal("Receive a delivery")),
        // Homeworking
        rule(r"homeworking", Some(r"\belectricity\b"), Literal("Homeworking (electricity)")),
        rule(r"homeworking", Some(r"\bheating\b"), Literal("Homeworking (heating)")),
        rule(r"homeworking", None, Literal("Homeworking")),
        // Business travel - air
        rule(r"business travel.*air|air travel|flight", Some(r"with\s*rf"), Literal("Fly with Radiative Forcing")),
        rule(r"business travel.*air|air travel|flight", Some(r"without\s*rf"), Literal("Fly without Radiative Forcing")),
        rule(r"business travel.*air|air travel|flight", None, Literal("Distance travelled by plane")),
        // Business travel - sea
        rule(r"business travel.*sea|sea travel|boat|ferry", Some(r".+"), FromRow(sail_title)),
        rule(r"business travel.*sea|sea travel|boat|ferry", None, Literal("Distance travelled by boat")),
        // Hotel
        rule(r"hotel|hotel stay", None, Literal("Stay in a hotel")),
        // UK electricity
        rule(r"^uk electricity$", None, Literal("Use electricity")),
        rule(r"^uk electricity for evs$", Some(r"battery electric"), Literal("Electric freight (BEV)")),
        rule(r"^uk electricity for evs$", Some(r"plug-?in hybrid"), Literal("Plug-in hybrid freight")),
        // Water
        rule(r"water|water supply", None, Literal("Use water")),
        // Waste
        rule(r"waste", Some(r"landfill"), Literal("Send to landfill")),
        rule(r"waste", Some(r"closed"), Literal("Recycle (closed-loop)")),
        rule(r"waste", Some(r"open"), Literal("Recycle (open-loop)")),
        rule(r"waste", Some(r"compost"), Literal("Compost waste")),
        rule(r"waste", Some(r"incineration"), Literal("Incinerate waste (with energy recovery)")),
        rule(r"waste", Some(r"anaerobic"), Literal("Dispose via anaerobic digestion")),
        rule(r"waste", None, Literal("Dispose of waste")),
    ]
});

static BATTERY_ELECTRIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"battery electric").unwrap());
static PLUGIN_HYBRID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"plug-?in hybrid").unwrap());

fn scan_rules(category: &str, label: &str, row: &GroupedRow) -> Option<String> {
    for rule in RULES.iter() {
        if !rule.category.is_match(category) {
            continue;
        }
        if let Some(pattern) = &rule.label {
            if !pattern.is_match(label) {
                continue;
            }
        }
        return Some(title_tidy(&rule.template.render(row)));
    }
    None
}

/// Title for one grouped row: special cases first, then the rule table, then
/// the cleaned label itself.
pub(super) fn friendly_name(row: &GroupedRow) -> String {
    let category = normalise_text(&row.category);
    let label = normalise_text(&row.label);
    let unit = normalise_text(&row.unit);

    // Useless labels are suppressed rather than shown verbatim
    let label_clean = if matches!(label.as_str(), "unspecified" | "unknown" | "nan") {
        ""
    } else {
        label.as_str()
    };

    if category.contains("passenger vehicle") {
        for (key, nice) in VEHICLE_TERMS {
            if label.contains(key) {
                return title_tidy(&format!("Drive {} {}", a_or_an(nice), nice));
            }
        }
        return if label_clean.is_empty() {
            "Drive a car".to_string()
        } else {
            title_tidy(&format!("Drive {} {} car", a_or_an(label_clean), label_clean))
        };
    }

    // Electrified grid rows split into freight (per tonne-distance) and
    // passenger phrasing by unit.
    if category == "uk electricity for evs" {
        if unit.contains("tonne") {
            return scan_rules(&category, &label, row)
                .unwrap_or_else(|| "Electric freight".to_string());
        }
        if BATTERY_ELECTRIC_RE.is_match(&label) {
            return "Drive an electric car".to_string();
        }
        if PLUGIN_HYBRID_RE.is_match(&label) {
            return "Drive a plug-in hybrid".to_string();
        }
        return "Drive an EV".to_string();
    }

    if let Some(title) = scan_rules(&category, &label, row) {
        return title;
    }

    if label_clean.is_empty() {
        "Other activity".to_string()
    } else {
        title_tidy(label_clean)
    }
}
