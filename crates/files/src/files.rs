//! Root-scoped payload store implementation.
//!
//! [`FormFileStore`] writes and removes form payload files beneath a single root directory.
//!
//! # Security Model
//!
//! - Paths that already start with the root are used as given, other relative paths are
//!   resolved against the root, and absolute paths must lie inside the root
//! - Paths containing `..` components are rejected before touching the file system
//! - Parent directories are created on demand, so the root itself may not exist yet
//!
//! Payload files are not content-addressed: saving a draft again overwrites the file for that
//! form version. Published versions are never rewritten because edits to a published form go to
//! a new draft version with its own file name.

use crate::FilesError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Metadata for a stored payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    /// Absolute location of the written file
    pub path: PathBuf,

    /// Hexadecimal SHA-256 digest of the written bytes
    pub sha256: String,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// UTC timestamp of the write
    pub stored_at: DateTime<Utc>,
}

/// Store for form payload files under one root directory.
#[derive(Debug, Clone)]
pub struct FormFileStore {
    root_directory: PathBuf,
}

impl FormFileStore {
    /// Creates a store rooted at `root_directory`.
    ///
    /// The directory does not need to exist yet; it is created by the first write.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the path exists but is not a directory.
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        Ok(Self {
            root_directory: root_directory.to_path_buf(),
        })
    }

    /// Writes `contents` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `path` escapes the root directory ([`FilesError::InvalidPath`])
    /// - parent directory creation fails (I/O)
    /// - the write fails (I/O)
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<StoredFile, FilesError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        fs::write(&target, contents).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file to {}: {}", target.display(), e),
            ))
        })?;

        let digest = Sha256::digest(contents);

        Ok(StoredFile {
            path: target,
            sha256: hex::encode(digest),
            size_bytes: contents.len() as u64,
            stored_at: Utc::now(),
        })
    }

    /// Deletes the payload stored at `path`.
    ///
    /// Returns `false` when there was no file to delete.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the path escapes the root or the file cannot be removed.
    pub fn remove(&self, path: &Path) -> Result<bool, FilesError> {
        let target = self.resolve(path)?;

        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to remove file {}: {}", target.display(), e),
            ))),
        }
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf, FilesError> {
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(FilesError::InvalidPath(format!(
                "Parent directory components are not allowed: {}",
                path.display()
            )));
        }

        let target = if path.is_absolute() || path.starts_with(&self.root_directory) {
            path.to_path_buf()
        } else {
            self.root_directory.join(path)
        };

        if !target.starts_with(&self.root_directory) || target == self.root_directory {
            return Err(FilesError::InvalidPath(format!(
                "Path is outside the store root {}: {}",
                self.root_directory.display(),
                path.display()
            )));
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_accepts_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("not-yet-created");

        let store = FormFileStore::new(&root).unwrap();

        assert!(!root.exists());
        let stored = store.write(Path::new("Vitals_1.json"), b"{}").unwrap();
        assert_eq!(stored.path, root.join("Vitals_1.json"));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();

        let store = FormFileStore::new(&root);

        assert!(matches!(store, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_write_creates_root_and_reports_metadata() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("forms");
        let store = FormFileStore::new(&root).unwrap();

        let stored = store
            .write(Path::new("Vitals_1.json"), b"{\"controls\":[]}")
            .unwrap();

        assert_eq!(stored.path, root.join("Vitals_1.json"));
        assert_eq!(stored.size_bytes, 15);
        assert_eq!(stored.sha256.len(), 64);
        assert_eq!(
            fs::read_to_string(&stored.path).unwrap(),
            "{\"controls\":[]}"
        );
    }

    #[test]
    fn test_write_overwrites_existing_payload() {
        let temp = TempDir::new().unwrap();
        let store = FormFileStore::new(temp.path()).unwrap();

        let first = store.write(Path::new("Vitals_1.json"), b"{}").unwrap();
        let second = store
            .write(Path::new("Vitals_1.json"), b"{\"v\":2}")
            .unwrap();

        assert_eq!(first.path, second.path);
        assert_ne!(first.sha256, second.sha256);
        assert_eq!(fs::read(&second.path).unwrap(), b"{\"v\":2}".to_vec());
    }

    #[test]
    fn test_absolute_path_inside_root_is_accepted() {
        let temp = TempDir::new().unwrap();
        let store = FormFileStore::new(temp.path()).unwrap();
        let absolute = temp.path().join("nested").join("Vitals_3.json");

        let stored = store.write(&absolute, b"[]").unwrap();

        assert_eq!(stored.path, absolute);
        assert_eq!(fs::read(&absolute).unwrap(), b"[]".to_vec());
    }

    #[test]
    fn test_relative_root_prefixed_path_is_not_joined_twice() {
        let store = FormFileStore::new(Path::new("relative-forms-root")).unwrap();

        let resolved = store
            .resolve(Path::new("relative-forms-root/Vitals_1.json"))
            .unwrap();

        assert_eq!(resolved, PathBuf::from("relative-forms-root/Vitals_1.json"));
    }

    #[test]
    fn test_rejects_traversal_and_foreign_paths() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("forms");
        let store = FormFileStore::new(&root).unwrap();

        assert!(matches!(
            store.write(Path::new("../escape.json"), b"{}"),
            Err(FilesError::InvalidPath(_))
        ));
        assert!(matches!(
            store.write(&temp.path().join("elsewhere.json"), b"{}"),
            Err(FilesError::InvalidPath(_))
        ));
        assert!(!temp.path().join("escape.json").exists());
    }

    #[test]
    fn test_remove_deletes_payload_once() {
        let temp = TempDir::new().unwrap();
        let store = FormFileStore::new(temp.path()).unwrap();
        let stored = store.write(Path::new("Vitals_2.json"), b"{}").unwrap();

        assert!(store.remove(Path::new("Vitals_2.json")).unwrap());
        assert!(!stored.path.exists());
        assert!(!store.remove(Path::new("Vitals_2.json")).unwrap());
    }

    #[test]
    fn test_remove_rejects_paths_outside_root() {
        let temp = TempDir::new().unwrap();
        let store = FormFileStore::new(&temp.path().join("forms")).unwrap();
        let outside = temp.path().join("keep.json");
        fs::write(&outside, "{}").unwrap();

        assert!(matches!(
            store.remove(&outside),
            Err(FilesError::InvalidPath(_))
        ));
        assert!(outside.exists());
    }
}
