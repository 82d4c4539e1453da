//! On-disk locations of form payloads and translations.
//!
//! This module contains **no I/O logic**, only path construction.

use crate::constants::JSON_EXTENSION;
use crate::{FormError, FormResult};
use std::path::{Path, PathBuf};

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Form names are free text ("Vital Signs (Adult)"); file names are not.
pub fn normalize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<forms_dir>/<normalized-name>_<version>.json`
pub fn form_storage_path(forms_dir: &Path, form_name: &str, version: &str) -> PathBuf {
    forms_dir.join(format!(
        "{}_{}.{}",
        normalize_file_name(form_name),
        version,
        JSON_EXTENSION
    ))
}

/// `<translations_dir>/<form_name>_<version>.json`
///
/// The form name is used verbatim, so names that would leave the translations directory are
/// rejected.
///
/// # Errors
///
/// Returns [`FormError::InvalidInput`] when the name or version contains a path separator or is
/// `.` or `..` on its own.
pub fn translation_file_path(
    translations_dir: &Path,
    form_name: &str,
    version: &str,
) -> FormResult<PathBuf> {
    for (field, value) in [("formName", form_name), ("version", version)] {
        if value.contains(['/', '\\']) || matches!(value, "." | "..") {
            return Err(FormError::InvalidInput(format!(
                "{} is not usable in a file name: '{}'",
                field, value
            )));
        }
    }

    Ok(translations_dir.join(format!("{}_{}.{}", form_name, version, JSON_EXTENSION)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_replaces_unsafe_characters() {
        assert_eq!(
            normalize_file_name("Vital Signs (Adult)"),
            "Vital_Signs__Adult_"
        );
        assert_eq!(normalize_file_name("Pre-Op_Check"), "Pre-Op_Check");
        assert_eq!(normalize_file_name("a/b.c"), "a_b_c");
    }

    #[test]
    fn form_storage_path_joins_normalized_name_and_version() {
        let path = form_storage_path(Path::new("/home/bahmni/clinical_forms/"), "Vital Signs", "3");
        assert_eq!(
            path,
            PathBuf::from("/home/bahmni/clinical_forms/Vital_Signs_3.json")
        );
    }

    #[test]
    fn translation_path_keeps_form_name_verbatim() {
        let path = translation_file_path(Path::new("/t"), "Vital Signs", "2").unwrap();
        assert_eq!(path, PathBuf::from("/t/Vital Signs_2.json"));
    }

    #[test]
    fn translation_path_rejects_traversal() {
        assert!(translation_file_path(Path::new("/t"), "../etc/passwd", "1").is_err());
        assert!(translation_file_path(Path::new("/t"), "Vitals", "1/..").is_err());
        assert!(translation_file_path(Path::new("/t"), "..\\secrets", "1").is_err());
        assert!(translation_file_path(Path::new("/t"), "..", "1").is_err());
    }

    #[test]
    fn translation_path_allows_dots_inside_names() {
        let path = translation_file_path(Path::new("/t"), "Pre..Op Notes", "1").unwrap();
        assert_eq!(path, PathBuf::from("/t/Pre..Op Notes_1.json"));
    }
}
