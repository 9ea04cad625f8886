//! Writes activity catalogues out as ES-module source files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::activity::ActivityRecord;

/// Default directory the generated modules land in.
pub const DEFAULT_OUTPUT_DIR: &str = "Activities";

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("failed to write {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("duplicate activity id '{id}' in module '{module}'")]
    DuplicateId { id: String, module: String },
    #[error("failed to serialize activity record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Render `records` as `const <name> = [...]; export default <name>;` and
/// write it to `<dir>/<name>.js`.
///
/// The output is deterministic: records are emitted in the order given, each
/// as a two-space-indented JSON object literal with a trailing comma. Ids
/// must be unique within the module.
pub fn write_activity_module(
    dir: &Path,
    name: &str,
    records: &[ActivityRecord],
) -> Result<PathBuf, EmitError> {
    let mut seen_ids = HashSet::new();
    for record in records {
        if !seen_ids.insert(record.id.as_str()) {
            return Err(EmitError::DuplicateId {
                id: record.id.clone(),
                module: name.to_string(),
            });
        }
    }

    let mut body = format!("const {name} = [\n");
    for record in records {
        body.push_str(&indent_json(record)?);
        body.push_str(",\n");
    }
    body.push_str("];\n\n");
    body.push_str(&format!("export default {name};\n"));

    fs::create_dir_all(dir).map_err(|source| EmitError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{name}.js"));
    fs::write(&path, body).map_err(|source| EmitError::Io {
        path: path.clone(),
        source,
    })?;
    info!("Wrote {} activities to {}", records.len(), path.display());
    Ok(path)
}

/// Pretty-print one record with every line indented two spaces.
fn indent_json(record: &ActivityRecord) -> Result<String, EmitError> {
    let json = serde_json::to_string_pretty(record)?;
    let indented: Vec<String> = json.lines().map(|line| format!("  {line}")).collect();
    Ok(indented.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(id: &str) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            activity: "Eat Tofu".to_string(),
            category: "food".to_string(),
            unit: "kg".to_string(),
            emission_factor: 3.160_493,
            source: "Clark et al. 2022".to_string(),
            activity_type: Some("ate".to_string()),
            user_inputs: None,
        }
    }

    #[test]
    fn test_module_shape() {
        let dir = tempdir().unwrap();
        let path =
            write_activity_module(dir.path(), "foodActivities", &[sample_record("food_tofu")])
                .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("const foodActivities = [\n"));
        assert!(contents.ends_with("];\n\nexport default foodActivities;\n"));
        assert!(contents.contains("  {\n    \"id\": \"food_tofu\",\n"));
        assert!(contents.contains("\"emissionFactor\": 3.160493"));
        assert!(contents.contains("  },\n];"));
    }

    #[test]
    fn test_empty_module_still_valid() {
        let dir = tempdir().unwrap();
        let path = write_activity_module(dir.path(), "wasteActivities", &[]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "const wasteActivities = [\n];\n\nexport default wasteActivities;\n"
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempdir().unwrap();
        let result = write_activity_module(
            dir.path(),
            "foodActivities",
            &[sample_record("food_tofu"), sample_record("food_tofu")],
        );
        match result {
            Err(EmitError::DuplicateId { id, module }) => {
                assert_eq!(id, "food_tofu");
                assert_eq!(module, "foodActivities");
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = tempdir().unwrap();
        let records = [sample_record("food_tofu"), sample_record("food_peas")];
        let path = write_activity_module(dir.path(), "foodActivities", &records).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        write_activity_module(dir.path(), "foodActivities", &records).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("out").join("Activities");
        let path =
            write_activity_module(&nested, "generalActivities", &[sample_record("general_x")])
                .unwrap();
        assert!(path.exists());
    }
}
