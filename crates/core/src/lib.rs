//! # Forms Core
//!
//! Core business logic for the clinical form registry.
//!
//! This crate owns form versioning and everything that depends on it:
//! - Next-version computation and the edit-after-publish draft cycle
//! - Publishing, including version renumbering when versions were skipped
//! - Selecting the latest published version of every form
//! - Reconciling that selection with the versions an encounter's observations were recorded on
//! - Per-form-version translation files
//!
//! Storage sits behind the [`FormCatalog`] and [`EncounterStore`] traits. [`MemoryCatalog`]
//! keeps everything in memory and [`JsonCatalog`] persists it to a JSON document.
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `forms-cli`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod latest;
pub mod model;
pub mod paths;
pub mod publisher;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod translation;
pub mod version;
pub mod views;

pub use catalog::{EncounterStore, FormCatalog, MemoryCatalog};
pub use config::CoreConfig;
pub use error::{FormError, FormResult};
pub use latest::LatestForms;
pub use model::{Encounter, Form, FormResource, FormTranslation, Obs, StorageDatatype};
pub use publisher::{FormPublisher, SavedResource};
pub use service::FormService;
pub use store::JsonCatalog;
pub use translation::TranslationStore;
pub use version::next_version;
pub use views::{FormRef, FormResourceView, FormView, SaveFormResource};

pub use forms_files::FormFileStore;
pub use forms_types::FormVersion;
pub use forms_uuid::RegistryUuid;
