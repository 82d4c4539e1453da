//! Constants used throughout the forms core crate.
//!
//! This module contains path, filename and document-key constants so that the storage layout
//! is defined in one place.

/// Default root directory for form payload files when none is configured.
pub const DEFAULT_FORMS_DIR: &str = "/home/bahmni/clinical_forms/";

/// Default root directory for form translation files when none is configured.
pub const DEFAULT_TRANSLATIONS_DIR: &str = "/var/www/bahmni_config/openmrs/apps/forms/translations/";

/// Default location of the JSON catalog file used by the binaries.
pub const DEFAULT_CATALOG_FILE: &str = "forms_catalog.json";

/// Extension of form payload and translation files.
pub const JSON_EXTENSION: &str = "json";

/// Key holding label translations inside a locale entry.
pub const LABELS_KEY: &str = "labels";

/// Key holding concept translations inside a locale entry.
pub const CONCEPTS_KEY: &str = "concepts";
