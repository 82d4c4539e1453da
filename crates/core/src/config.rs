//! Core runtime configuration.
//!
//! Storage roots are resolved once at process startup and passed into core services. Nothing
//! in the core reads environment variables or global properties while handling a request, so
//! tests can point a service at a temporary directory without any shared state.

use crate::constants::{DEFAULT_FORMS_DIR, DEFAULT_TRANSLATIONS_DIR};
use crate::{FormError, FormResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    forms_dir: PathBuf,
    translations_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if either directory is an empty path.
    pub fn new(forms_dir: PathBuf, translations_dir: PathBuf) -> FormResult<Self> {
        if forms_dir.as_os_str().is_empty() {
            return Err(FormError::InvalidInput("forms_dir cannot be empty".into()));
        }
        if translations_dir.as_os_str().is_empty() {
            return Err(FormError::InvalidInput(
                "translations_dir cannot be empty".into(),
            ));
        }

        Ok(Self {
            forms_dir,
            translations_dir,
        })
    }

    /// Build a configuration from optional setting values, falling back to the defaults for
    /// values that are missing or blank.
    pub fn from_setting_values(
        forms_dir: Option<String>,
        translations_dir: Option<String>,
    ) -> FormResult<Self> {
        fn setting_or(value: Option<String>, default: &str) -> PathBuf {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        }

        Self::new(
            setting_or(forms_dir, DEFAULT_FORMS_DIR),
            setting_or(translations_dir, DEFAULT_TRANSLATIONS_DIR),
        )
    }

    /// Root directory of form payload files.
    pub fn forms_dir(&self) -> &Path {
        &self.forms_dir
    }

    /// Root directory of translation files.
    pub fn translations_dir(&self) -> &Path {
        &self.translations_dir
    }
}
