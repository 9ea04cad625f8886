//! Shared text helpers for identifiers and display titles.
//!
//! Every generated record id and output filename is built from these, so the
//! rules here define the identifier grammar for the whole repository:
//! lowercase letters, digits and underscores, nothing else.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());
static DASH_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(–\s*)(\w)").unwrap());

/// Category labels whose slug is pinned for stable output filenames.
const CATEGORY_SLUG_OVERRIDES: &[(&str, &str)] = &[
    ("business travel- sea", "business_travel_sea"),
    ("hotel stay", "hotel_stay"),
    ("water supply", "water_supply"),
];

/// Lowercase, collapse whitespace runs to underscores, keep `[a-z0-9_]` only.
///
/// # Examples
///
/// ```
/// use carbon_factors::slug::slugify;
///
/// assert_eq!(slugify("Delivery vehicles"), "delivery_vehicles");
/// assert_eq!(slugify("kg·km"), "kgkm");
/// assert_eq!(slugify("  Porridge (oatmeal) "), "porridge_oatmeal");
/// ```
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let underscored = WHITESPACE_RE.replace_all(&lowered, "_");
    NON_SLUG_RE.replace_all(&underscored, "").into_owned()
}

/// Category to filesystem-friendly slug, honoring the override table.
pub fn category_slug(category: &str) -> String {
    let lowered = category.trim().to_lowercase();
    for (raw, pinned) in CATEGORY_SLUG_OVERRIDES {
        if lowered == *raw {
            return (*pinned).to_string();
        }
    }
    slugify(category)
}

/// Normalize text for rule matching: trimmed, lowercased, single spaces.
pub fn normalise_text(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    WHITESPACE_RE.replace_all(&lowered, " ").into_owned()
}

/// "an" before a (lowercase) leading vowel, "a" otherwise.
pub fn a_or_an(noun: &str) -> &'static str {
    match noun.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Capitalise the first letter and the first word character after an en-dash.
pub fn title_tidy(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut tidied = String::with_capacity(text.len());
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        tidied.extend(first.to_uppercase());
    }
    tidied.push_str(chars.as_str());
    DASH_WORD_RE
        .replace_all(&tidied, |caps: &Captures| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}
