// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Exercise reference catalog.
//!
//! A [`Catalog`] is built once, then frozen and shared read-only (usually
//! behind an `Arc`) by every video of a run. Names are keyed case- and
//! whitespace-insensitively; duplicate and empty names are reported once and
//! the offending entry is discarded, first entry wins.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentRecord;
use crate::error::{Result, RuleError};
use crate::rules::RuleStructure;
use crate::{verbose, warn};

/// Built-in reference catalog.
const BUILTIN_CATALOG: &str = include_str!("../assets/exercises.json");

/// Normalize an activity name into its catalog key.
///
/// Trims, lower-cases and collapses inner whitespace.
#[must_use]
pub fn normalize_activity(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expected rules for one named exercise.
///
/// Also reads the legacy `"mirrored motion": {"mirrored": "true"}` flag and
/// string booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReferenceRecord")]
pub struct ExerciseReference {
    /// Display name.
    pub activity: String,
    /// Expected per-landmark labels.
    #[serde(rename = "body_landmarks", default)]
    pub rules: RuleStructure,
    /// Expected equipment.
    #[serde(default)]
    pub equipment: EquipmentRecord,
    /// Whether the exercise may be performed with sides swapped.
    #[serde(default)]
    pub mirrored: bool,
}

impl ExerciseReference {
    /// Create a reference with no equipment constraint.
    #[must_use]
    pub fn new(activity: impl Into<String>, rules: RuleStructure) -> Self {
        Self {
            activity: activity.into(),
            rules,
            equipment: EquipmentRecord::default(),
            mirrored: false,
        }
    }

    /// Set the expected equipment.
    #[must_use]
    pub fn with_equipment(mut self, equipment: EquipmentRecord) -> Self {
        self.equipment = equipment;
        self
    }

    /// Mark the exercise as mirrorable.
    #[must_use]
    pub const fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    /// Catalog key of this reference.
    #[must_use]
    pub fn key(&self) -> String {
        normalize_activity(&self.activity)
    }
}

/// A boolean written as `true` or as `"true"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => matches!(text.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MirroredMotion {
    #[serde(default)]
    mirrored: Option<Flag>,
}

/// On-disk reference shape.
#[derive(Debug, Deserialize)]
struct ReferenceRecord {
    activity: String,
    #[serde(rename = "body_landmarks", default)]
    rules: RuleStructure,
    #[serde(default)]
    equipment: EquipmentRecord,
    #[serde(default)]
    mirrored: Option<Flag>,
    #[serde(rename = "mirrored motion", default)]
    mirrored_motion: Option<MirroredMotion>,
}

impl From<ReferenceRecord> for ExerciseReference {
    fn from(record: ReferenceRecord) -> Self {
        let mirrored = record
            .mirrored
            .or_else(|| record.mirrored_motion.and_then(|m| m.mirrored))
            .is_some_and(|flag| flag.is_set());
        Self {
            activity: record.activity,
            rules: record.rules,
            equipment: record.equipment,
            mirrored,
        }
    }
}

/// On-disk catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile<T> {
    #[serde(default)]
    version: String,
    exercises: Vec<T>,
}

/// Frozen collection of exercise references.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: String,
    entries: Vec<ExerciseReference>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, discarding duplicate or empty names.
    ///
    /// # Returns
    ///
    /// * The catalog and one diagnostic per discarded entry, in input order.
    pub fn build(references: impl IntoIterator<Item = ExerciseReference>) -> (Self, Vec<RuleError>) {
        let mut catalog = Self::default();
        let mut diagnostics = Vec::new();

        for mut reference in references {
            let key = reference.key();
            if key.is_empty() {
                warn!("Catalog entry discarded: activity name is empty");
                diagnostics.push(RuleError::EmptyActivityName);
                continue;
            }
            if catalog.index.contains_key(&key) {
                warn!("Catalog entry discarded: duplicate activity name '{}'", reference.activity.trim());
                diagnostics.push(RuleError::DuplicateActivity(key));
                continue;
            }
            reference.activity = reference.activity.trim().to_string();
            reference.equipment = reference.equipment.normalized();
            catalog.index.insert(key, catalog.entries.len());
            catalog.entries.push(reference);
        }

        (catalog, diagnostics)
    }

    /// Set the catalog version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from JSON text.
    ///
    /// Entries that fail to parse (e.g. a label outside the vocabulary) are
    /// reported and skipped like duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::CatalogError`] if the document itself is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| RuleError::CatalogError(format!("invalid catalog document: {e}")))?;

        let mut references = Vec::with_capacity(file.exercises.len());
        for (i, raw) in file.exercises.into_iter().enumerate() {
            match serde_json::from_value::<ExerciseReference>(raw) {
                Ok(reference) => references.push(reference),
                Err(e) => warn!("Catalog entry {i} skipped: {e}"),
            }
        }

        let (catalog, _) = Self::build(references);
        verbose!(
            "Loaded catalog v{} with {} exercises",
            if file.version.is_empty() { "?" } else { file.version.as_str() },
            catalog.len()
        );
        Ok(catalog.with_version(file.version))
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RuleError::CatalogError(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize the catalog in its file shape.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let file = CatalogFile {
            version: self.version.clone(),
            exercises: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Look up a reference by name.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UnknownActivity`] if no entry matches.
    pub fn lookup(&self, name: &str) -> Result<&ExerciseReference> {
        self.get(name)
            .ok_or_else(|| RuleError::UnknownActivity(name.trim().to_string()))
    }

    /// Look up a reference by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExerciseReference> {
        self.index
            .get(&normalize_activity(name))
            .map(|&i| &self.entries[i])
    }

    /// References in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ExerciseReference> {
        self.entries.iter()
    }

    /// Catalog version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
