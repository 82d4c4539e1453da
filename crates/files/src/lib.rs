//! Form payload file storage.
//!
//! Form layouts are JSON documents kept on disk, one file per form version:
//!
//! ```text
//! <forms_root>/
//! ├── Vital_Signs_1.json
//! ├── Vital_Signs_2.json
//! └── History_and_Examination_1.json
//! ```
//!
//! The catalog records each file's location in the form resource's storage descriptor. This
//! crate only moves bytes: it never parses the payload and never decides file names.
//!
//! ## Example Usage
//!
//! ```no_run
//! use forms_files::FormFileStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FormFileStore::new(Path::new("/home/bahmni/clinical_forms"))?;
//! let stored = store.write(Path::new("Vital_Signs_1.json"), br#"{"controls":[]}"#)?;
//! println!("stored {} bytes at {}", stored.size_bytes, stored.path.display());
//! # Ok(())
//! # }
//! ```

mod files;

pub use files::{FormFileStore, StoredFile};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root path exists but is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (directory traversal or a path outside the root)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
