//! File-backed catalog.
//!
//! [`JsonCatalog`] keeps the catalog state as a single JSON document and writes form payloads
//! whose resources use file-system storage to their storage path through a
//! [`FormFileStore`].
//!
//! Inside [`FormCatalog::transaction`] nothing touches the disk until the work succeeds: payload
//! writes are queued and the catalog document is flushed once at the end. The document is
//! written to a sibling temporary file and renamed over the old one, so readers never see a
//! half-written catalog.
//!
//! When a saved resource's storage path changes (publishing renumbers a draft), the payload is
//! written at the new path and the file at the old path is deleted in the same commit. If a
//! payload write fails at commit time the in-memory state is rolled back, but payload files
//! already written by that commit stay on disk.

use crate::catalog::{EncounterStore, FormCatalog, MemoryCatalog};
use crate::model::{Encounter, Form, FormResource, StorageDatatype};
use crate::{FormError, FormResult};
use forms_files::FormFileStore;
use forms_uuid::RegistryUuid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    state: MemoryCatalog,
    files: FormFileStore,
    pending_payloads: Vec<(PathBuf, String)>,
    superseded_payloads: Vec<PathBuf>,
    in_transaction: bool,
}

impl JsonCatalog {
    /// Opens the catalog stored at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::FileRead`] or [`FormError::Deserialization`] when an existing file
    /// cannot be loaded.
    pub fn open(path: &Path, files: FormFileStore) -> FormResult<Self> {
        let state = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => MemoryCatalog::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(FormError::Deserialization)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => MemoryCatalog::new(),
            Err(e) => return Err(FormError::FileRead(e)),
        };

        tracing::debug!(
            "opened catalog {} with {} forms",
            path.display(),
            state.forms().len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            state,
            files,
            pending_payloads: Vec::new(),
            superseded_payloads: Vec::new(),
            in_transaction: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read access to the underlying state.
    pub fn state(&self) -> &MemoryCatalog {
        &self.state
    }

    /// Adds or replaces an encounter and persists the catalog.
    pub fn insert_encounter(&mut self, encounter: Encounter) -> FormResult<()> {
        self.state.insert_encounter(encounter);
        self.commit()
    }

    fn commit(&mut self) -> FormResult<()> {
        if self.in_transaction {
            return Ok(());
        }

        let mut written = Vec::with_capacity(self.pending_payloads.len());
        for (path, value) in self.pending_payloads.drain(..) {
            let stored = self.files.write(&path, value.as_bytes())?;
            tracing::debug!(
                "stored form payload {} ({} bytes, sha256 {})",
                stored.path.display(),
                stored.size_bytes,
                stored.sha256
            );
            written.push(path);
        }

        for path in self.superseded_payloads.drain(..) {
            if written.contains(&path) {
                continue;
            }
            if self.files.remove(&path)? {
                tracing::debug!("removed superseded form payload {}", path.display());
            }
        }

        self.flush()
    }

    fn flush(&self) -> FormResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(FormError::DirCreation)?;
        }

        let contents =
            serde_json::to_string_pretty(&self.state).map_err(FormError::Serialization)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, contents).map_err(FormError::FileWrite)?;
        fs::rename(&temp, &self.path).map_err(FormError::FileWrite)
    }
}

impl FormCatalog for JsonCatalog {
    fn get_form_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Form>> {
        self.state.get_form_by_uuid(uuid)
    }

    fn get_form_resource_by_uuid(
        &self,
        uuid: &RegistryUuid,
    ) -> FormResult<Option<FormResource>> {
        self.state.get_form_resource_by_uuid(uuid)
    }

    fn save_form(&mut self, form: Form) -> FormResult<Form> {
        let saved = self.state.save_form(form)?;
        self.commit()?;
        Ok(saved)
    }

    fn save_form_resource(&mut self, resource: FormResource) -> FormResult<FormResource> {
        if let Some(old_path) = self
            .state
            .get_form_resource_by_uuid(&resource.uuid)?
            .and_then(|previous| file_system_path(&previous))
            .filter(|old| Some(old) != file_system_path(&resource).as_ref())
        {
            self.superseded_payloads.push(old_path);
        }

        if let (Some(StorageDatatype::FileSystem), Some(config), Some(value)) =
            (&resource.datatype, &resource.datatype_config, &resource.value)
        {
            self.pending_payloads
                .push((PathBuf::from(config), value.clone()));
        }

        let saved = self.state.save_form_resource(resource)?;
        self.commit()?;
        Ok(saved)
    }

    fn get_form_resources_for_form(&self, form: &Form) -> FormResult<Vec<FormResource>> {
        self.state.get_form_resources_for_form(form)
    }

    fn get_all_forms(
        &self,
        name: Option<&str>,
        include_retired: bool,
        include_unpublished: bool,
    ) -> FormResult<Vec<Form>> {
        self.state
            .get_all_forms(name, include_retired, include_unpublished)
    }

    fn get_all_published_forms(&self, include_retired: bool) -> FormResult<Vec<Form>> {
        self.state.get_all_published_forms(include_retired)
    }

    fn transaction<T, F>(&mut self, work: F) -> FormResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> FormResult<T>,
    {
        if self.in_transaction {
            return work(self);
        }

        let snapshot = self.state.clone();
        self.in_transaction = true;
        let result = work(self);
        self.in_transaction = false;

        match result {
            Ok(value) => match self.commit() {
                Ok(()) => Ok(value),
                Err(e) => {
                    self.state = snapshot;
                    Err(e)
                }
            },
            Err(e) => {
                self.pending_payloads.clear();
                self.superseded_payloads.clear();
                self.state = snapshot;
                Err(e)
            }
        }
    }
}

fn file_system_path(resource: &FormResource) -> Option<PathBuf> {
    match (&resource.datatype, &resource.datatype_config) {
        (Some(StorageDatatype::FileSystem), Some(config)) => Some(PathBuf::from(config)),
        _ => None,
    }
}

impl EncounterStore for JsonCatalog {
    fn get_encounter_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Encounter>> {
        self.state.get_encounter_by_uuid(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms_types::FormVersion;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> JsonCatalog {
        let files = FormFileStore::new(&temp.path().join("forms")).unwrap();
        JsonCatalog::open(&temp.path().join("catalog.json"), files).unwrap()
    }

    #[test]
    fn missing_file_opens_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = open(&temp);

        assert!(catalog.state().forms().is_empty());
        assert!(!catalog.path().exists());
    }

    #[test]
    fn saves_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let form = catalog
            .save_form(Form::new("Vitals", FormVersion::INITIAL))
            .unwrap();

        let reopened = open(&temp);

        assert_eq!(
            reopened.get_form_by_uuid(&form.uuid).unwrap(),
            Some(form)
        );
    }

    #[test]
    fn file_system_payloads_are_written() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let payload_path = temp.path().join("forms").join("Vitals_1.json");

        let mut resource = FormResource::shell();
        resource.datatype = Some(StorageDatatype::FileSystem);
        resource.datatype_config = Some(payload_path.to_string_lossy().into_owned());
        resource.value = Some("{\"controls\":[]}".into());
        catalog.save_form_resource(resource).unwrap();

        assert_eq!(
            fs::read_to_string(&payload_path).unwrap(),
            "{\"controls\":[]}"
        );
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let payload_path = temp.path().join("forms").join("Vitals_1.json");

        let result: FormResult<()> = catalog.transaction(|c| {
            c.save_form(Form::new("Vitals", FormVersion::INITIAL))?;
            let mut resource = FormResource::shell();
            resource.datatype = Some(StorageDatatype::FileSystem);
            resource.datatype_config = Some(payload_path.to_string_lossy().into_owned());
            resource.value = Some("{}".into());
            c.save_form_resource(resource)?;
            Err(FormError::InvalidInput("abort".into()))
        });

        assert!(result.is_err());
        assert!(catalog.state().forms().is_empty());
        assert!(!catalog.path().exists());
        assert!(!payload_path.exists());
    }

    #[test]
    fn payload_outside_forms_root_fails_and_rolls_back() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);

        let result = catalog.transaction(|c| {
            c.save_form(Form::new("Vitals", FormVersion::INITIAL))?;
            let mut resource = FormResource::shell();
            resource.datatype = Some(StorageDatatype::FileSystem);
            resource.datatype_config = Some("/elsewhere/Vitals_1.json".into());
            resource.value = Some("{}".into());
            c.save_form_resource(resource)
        });

        assert!(matches!(result, Err(FormError::Files(_))));
        assert!(catalog.state().forms().is_empty());
    }

    #[test]
    fn moved_payload_leaves_no_stale_file() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let draft_path = temp.path().join("forms").join("Vitals_2.json");
        let final_path = temp.path().join("forms").join("Vitals_4.json");

        let mut resource = FormResource::shell();
        resource.datatype = Some(StorageDatatype::FileSystem);
        resource.datatype_config = Some(draft_path.to_string_lossy().into_owned());
        resource.value = Some("{\"v\":2}".into());
        let mut resource = catalog.save_form_resource(resource).unwrap();
        assert!(draft_path.is_file());

        resource.datatype_config = Some(final_path.to_string_lossy().into_owned());
        catalog.save_form_resource(resource).unwrap();

        assert!(!draft_path.exists());
        assert_eq!(fs::read_to_string(&final_path).unwrap(), "{\"v\":2}");
    }

    #[test]
    fn resaving_at_same_path_keeps_the_file() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let path = temp.path().join("forms").join("Vitals_1.json");

        let mut resource = FormResource::shell();
        resource.datatype = Some(StorageDatatype::FileSystem);
        resource.datatype_config = Some(path.to_string_lossy().into_owned());
        resource.value = Some("{}".into());
        let mut resource = catalog.save_form_resource(resource).unwrap();
        resource.value = Some("{\"v\":1}".into());
        catalog.save_form_resource(resource).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"v\":1}");
    }

    #[test]
    fn encounters_are_persisted() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open(&temp);
        let uuid = RegistryUuid::new();
        catalog
            .insert_encounter(Encounter {
                uuid,
                observations: vec![],
            })
            .unwrap();

        let reopened = open(&temp);

        assert!(reopened.get_encounter_by_uuid(&uuid).unwrap().is_some());
    }

    #[test]
    fn corrupt_catalog_file_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("catalog.json"), "{ nope").unwrap();
        let files = FormFileStore::new(&temp.path().join("forms")).unwrap();

        let result = JsonCatalog::open(&temp.path().join("catalog.json"), files);

        assert!(matches!(result, Err(FormError::Deserialization(_))));
    }
}
