//! Per-form-version translation files.
//!
//! All locales of one form version share a file, `<translations_dir>/<formName>_<version>.json`:
//!
//! ```json
//! {
//!   "en": { "labels": { "LABEL_1": "Pulse" }, "concepts": { "PULSE": "Pulse" } },
//!   "fr": { "labels": { "LABEL_1": "Pouls" }, "concepts": { "PULSE": "Pouls" } }
//! }
//! ```
//!
//! Saving a locale replaces that locale's entry as a whole and keeps every other locale.
//!
//! Form name, version and locale only need to be non-empty; they are not trimmed.
//!
//! Saves are read-modify-write without locking. Two concurrent saves to the same file race and
//! the last writer wins, which can drop the other writer's locale.

use crate::constants::{CONCEPTS_KEY, LABELS_KEY};
use crate::model::FormTranslation;
use crate::paths::translation_file_path;
use crate::{FormError, FormResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads and writes translation files under one directory.
#[derive(Debug, Clone)]
pub struct TranslationStore {
    root: PathBuf,
}

impl TranslationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Merges `translation` into its form version's translation file.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] (and writes nothing) unless form name, version and
    /// locale are all present. Directory creation, read, parse and write failures are returned
    /// as the matching [`FormError`] variant.
    pub fn save(&self, translation: FormTranslation) -> FormResult<FormTranslation> {
        validate(&translation)?;

        let path = translation_file_path(&self.root, &translation.form_name, &translation.version)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(FormError::DirCreation)?;
        }

        let mut document = read_document(&path)?;

        let mut entry = Map::new();
        entry.insert(LABELS_KEY.into(), string_map(&translation.labels));
        entry.insert(CONCEPTS_KEY.into(), string_map(&translation.concepts));
        document.insert(translation.locale.clone(), Value::Object(entry));

        let contents = serde_json::to_string(&document).map_err(FormError::Serialization)?;
        fs::write(&path, contents).map_err(FormError::FileWrite)?;

        tracing::info!(
            "saved {} translations for {} v{} to {}",
            translation.locale,
            translation.form_name,
            translation.version,
            path.display()
        );

        Ok(translation)
    }

    /// Loads the whole locale-keyed document of a form version; empty when no file exists.
    pub fn load(&self, form_name: &str, version: &str) -> FormResult<Map<String, Value>> {
        let path = translation_file_path(&self.root, form_name, version)?;
        read_document(&path)
    }
}

fn validate(translation: &FormTranslation) -> FormResult<()> {
    let missing: Vec<&str> = [
        ("formName", &translation.form_name),
        ("locale", &translation.locale),
        ("version", &translation.version),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FormError::InvalidInput(format!(
            "translation is missing {}",
            missing.join(", ")
        )))
    }
}

fn read_document(path: &Path) -> FormResult<Map<String, Value>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(FormError::FileRead(e)),
    };

    if contents.is_empty() {
        return Ok(Map::new());
    }

    serde_json::from_str(&contents).map_err(FormError::Deserialization)
}

fn string_map(values: &std::collections::BTreeMap<String, String>) -> Value {
    Value::Object(
        values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
