//! Converts the Clark et al. 2022 food-impact CSV into `foodActivities.js`.
//!
//! Each row names a food or drink and its lifecycle greenhouse-gas factor per
//! kilogram. The converter classifies every item into an action verb and unit
//! by scanning ordered keyword lists, then emits one activity record per row.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::activity::{round_dp, ActivityRecord};
use crate::emit::{write_activity_module, EmitError};
use crate::slug::slugify;

/// Default input path, as shipped alongside the generator.
pub const DEFAULT_FOOD_CSV: &str = "Environmental impacts of food (Clark et al. 2022).csv";
/// Name of the emitted module (and of the const it exports).
pub const FOOD_MODULE_NAME: &str = "foodActivities";

const FOOD_SOURCE: &str =
    "Clark et al. 2022 (kg CO₂e per kg product; litres assumed equivalent for drinks)";
const ENTITY_COLUMN: &str = "entity";
const FACTOR_COLUMN: &str = "ghg_kg";

#[derive(Error, Debug)]
pub enum FoodError {
    #[error("failed to read {}: {}", path.display(), source)]
    Read {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("missing column '{}' in {}", column, path.display())]
    MissingColumn { column: &'static str, path: PathBuf },
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// How an item is consumed. Decides the display verb and the unit the
/// emission factor is expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodKind {
    Drank,
    Ate,
    Used,
    Other,
}

impl FoodKind {
    pub fn verb(self) -> &'static str {
        match self {
            FoodKind::Drank => "Drink",
            FoodKind::Ate => "Eat",
            FoodKind::Used => "Use",
            FoodKind::Other => "Consume",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            FoodKind::Drank => "litres",
            _ => "kg",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            FoodKind::Drank => "drank",
            FoodKind::Ate => "ate",
            FoodKind::Used => "used",
            FoodKind::Other => "other",
        }
    }
}

const DRINK_KEYWORDS: &[&str] = &[
    // Alcoholic beverages
    "ale", "beer", "cider", "wine",
    // Juices & smoothies
    "apple juice", "orange juice", "grape juice", "pineapple juice", "fruit smoothies",
    // Milk & plant-based milks
    "almond milk", "coconut milk", "cow's milk", "oat milk", "rice milk", "soy milk",
    // Hot drinks
    "coffee beans", "coffee pods", "instant coffee", "tea",
    // Other drinks
    "protein shake", "milkshake",
];

const FOOD_KEYWORDS: &[&str] = &[
    "almond butter", "almonds", "apple pie", "apples", "asparagus", "avocados", "bagels", "baguette",
    "bacon", "banana loaf", "bananas", "beans", "beef burger", "beef curry", "beef meatballs",
    "beef mince", "beef noodles", "beef steak", "beetroot", "biscuits", "blue cheese", "brazil nuts",
    "bread", "breakfast cereal", "brie", "broccoli", "butter", "cabbage", "caesar salad", "camembert",
    "carrot cake", "carrots", "cashew nuts", "cauliflower", "cereal bars", "cheddar cheese",
    "cheesecake", "cherry tomatoes", "chia seeds", "chicken breast", "chicken burger", "chicken curry",
    "chicken noodles", "chicken pasta", "chicken sausages", "chicken thighs", "chicken wings",
    "chickpeas", "chilli con carne", "chocolate biscuits", "chocolate cake", "chocolate cereals",
    "chocolate cheesecake", "cookies", "cottage cheese", "courgettes", "cracker biscuits", "crisps",
    "croissants", "dark chocolate", "doughnuts", "egg noodles", "eggs", "falafels", "feta cheese",
    "flapjack", "frozen jacket potatoes", "frozen mashed potato", "frozen onion rings",
    "frozen potato wedges", "frozen roast potatoes", "frozen sweet potato fries", "fruit cake",
    "garden peas", "goat's cheese", "grapes", "granola", "haddock risotto", "halloumi cheese",
    "ice cream", "ice lollies", "kale", "kiwis", "lamb (leg)", "lamb burgers", "lamb casserole",
    "lamb chops", "lamb curry", "lamb hotpot", "lamb moussaka", "lasagne sheets", "lemon", "lentils",
    "lettuce", "lime", "macaroni cheese", "mackerel", "meat pizza", "meat-free burger",
    "meat-free mince", "meat-free nuggets", "meat-free sausages", "melon", "milk chocolate", "mixed salad",
    "mozzarella cheese", "muesli", "muffins", "mushrooms", "naan", "nut loaf", "onions", "oranges",
    "pain au chocolat", "pancakes", "parmesan cheese", "parsnips", "pasta shells", "peanut butter",
    "peanuts", "pears", "pecan nuts", "penne pasta", "peppers", "pineapple", "pitta bread", "pizza",
    "poppadoms", "popcorn", "pork chops", "pork loin", "pork sausage rolls", "pork sausages",
    "porridge (oatmeal)", "potato croquettes", "potatoes", "prawns", "protein bar", "quiche", "quinoa",
    "raspberries", "rice", "rice noodles", "ricotta cheese", "salmon", "salmon fishcakes", "sandwich",
    "sausage", "sausage rolls", "shepherd's pie", "shortbread biscuits", "sourdough bread", "soy desert",
    "soy yoghurt", "spaghetti", "spaghetti bolognese", "spinach", "sponge cake", "strawberries",
    "strawberry jam", "sugar", "sweetcorn", "tofu", "tomato ketchup", "tomatoes", "tortilla wraps",
    "tuna", "vegetable lasagne", "vegetarian chilli con carne", "vegetarian curry", "vegetarian pizza",
    "walnuts", "watermelon", "yoghurt", "steak pie",
];

const CONDIMENT_KEYWORDS: &[&str] = &[
    "apricot jam", "raspberry jam", "jam", "marmalade", "olive oil", "rapeseed oil", "sunflower oil",
    "chocolate spread", "coconut oil", "spread",
];

/// Ordered classification table. Earlier lists win on overlap, so "Kale"
/// classifies as a drink (it contains "ale") while "Green tea" never reaches
/// the food list.
const TYPE_KEYWORDS: &[(FoodKind, &[&str])] = &[
    (FoodKind::Drank, DRINK_KEYWORDS),
    (FoodKind::Ate, FOOD_KEYWORDS),
    (FoodKind::Used, CONDIMENT_KEYWORDS),
];

/// First keyword list containing a substring of the lowercased name wins.
pub fn classify(entity: &str) -> FoodKind {
    let lowered = entity.to_lowercase();
    for (kind, keywords) in TYPE_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return *kind;
        }
    }
    FoodKind::Other
}

/// Read the food CSV and build one activity record per usable row.
///
/// Rows with an empty name or a missing/non-finite factor are skipped and
/// counted; the skip total is logged once at the end.
pub fn read_food_records(csv_path: &Path) -> Result<Vec<ActivityRecord>, FoodError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)
        .map_err(|source| FoodError::Read {
            path: csv_path.to_path_buf(),
            source,
        })?;

    // Header lookup is by normalized name so the source surviving a
    // re-export with different casing or padding still parses.
    let headers = reader
        .headers()
        .map_err(|source| FoodError::Read {
            path: csv_path.to_path_buf(),
            source,
        })?
        .clone();
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase().replace(' ', "_"))
        .collect();
    let entity_idx = column_index(&normalized, ENTITY_COLUMN, csv_path)?;
    let factor_idx = column_index(&normalized, FACTOR_COLUMN, csv_path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row.map_err(|source| FoodError::Read {
            path: csv_path.to_path_buf(),
            source,
        })?;
        let entity = row.get(entity_idx).unwrap_or("").trim();
        if entity.is_empty() {
            debug!("Skipping row with empty entity name");
            skipped += 1;
            continue;
        }
        let factor = match row.get(factor_idx).unwrap_or("").trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                debug!("Skipping '{}': missing or non-numeric factor", entity);
                skipped += 1;
                continue;
            }
        };

        let kind = classify(entity);
        records.push(ActivityRecord {
            id: format!("food_{}", slugify(entity)),
            activity: format!("{} {}", kind.verb(), entity),
            category: "food".to_string(),
            unit: kind.unit().to_string(),
            emission_factor: round_dp(factor, 6),
            source: FOOD_SOURCE.to_string(),
            activity_type: Some(kind.tag().to_string()),
            user_inputs: None,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} food rows without a usable factor", skipped);
    }
    info!("Parsed {} food activities from {}", records.len(), csv_path.display());
    Ok(records)
}

fn column_index(
    normalized: &[String],
    column: &'static str,
    path: &Path,
) -> Result<usize, FoodError> {
    normalized
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| FoodError::MissingColumn {
            column,
            path: path.to_path_buf(),
        })
}

/// Run the whole food conversion: read, classify, emit.
pub fn generate_food_activities(csv_path: &Path, output_dir: &Path) -> Result<PathBuf, FoodError> {
    let records = read_food_records(csv_path)?;
    Ok(write_activity_module(output_dir, FOOD_MODULE_NAME, &records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::tempdir;

    #[test]
    fn test_classify_drinks() {
        assert_eq!(classify("Red wine"), FoodKind::Drank);
        assert_eq!(classify("Oat milk"), FoodKind::Drank);
        assert_eq!(classify("Tea"), FoodKind::Drank);
    }

    #[test]
    fn test_classify_overlap_prefers_earlier_list() {
        // "Kale" contains "ale" and the drink list is scanned first.
        assert_eq!(classify("Kale"), FoodKind::Drank);
    }

    #[test]
    fn test_classify_food_and_condiments() {
        assert_eq!(classify("Cheddar cheese"), FoodKind::Ate);
        assert_eq!(classify("Olive oil"), FoodKind::Used);
    }

    #[test]
    fn test_classify_fallback() {
        assert_eq!(classify("Dilithium crystals"), FoodKind::Other);
        assert_eq!(FoodKind::Other.verb(), "Consume");
        assert_eq!(FoodKind::Other.unit(), "kg");
    }

    fn write_csv(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("food.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_food_records() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "Entity,GHG kg\nTofu,3.1604926\nRed wine,1.5\n",
        );
        let records = read_food_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "food_tofu");
        assert_eq!(records[0].activity, "Eat Tofu");
        assert_eq!(records[0].unit, "kg");
        assert_eq!(records[0].emission_factor, 3.160_493);
        assert_eq!(records[0].activity_type.as_deref(), Some("ate"));
        assert_eq!(records[1].id, "food_red_wine");
        assert_eq!(records[1].unit, "litres");
    }

    #[test]
    fn test_rows_without_factor_are_skipped() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "entity,ghg_kg\nTofu,3.2\nMystery,\nGhost,not-a-number\n",
        );
        let records = read_food_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "food_tofu");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "name,factor\nTofu,3.2\n");
        match read_food_records(&path) {
            Err(FoodError::MissingColumn { column, .. }) => assert_eq!(column, "entity"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_writes_module() {
        let dir = tempdir().unwrap();
        let csv_path = write_csv(dir.path(), "entity,ghg_kg\nApples,0.351619\n");
        let out_dir = dir.path().join("Activities");
        let module = generate_food_activities(&csv_path, &out_dir).unwrap();
        let contents = std::fs::read_to_string(module).unwrap();
        assert!(contents.starts_with("const foodActivities = [\n"));
        assert!(contents.contains("\"id\": \"food_apples\""));
        assert!(contents.contains("\"type\": \"ate\""));
        assert!(contents.ends_with("export default foodActivities;\n"));
    }
}
