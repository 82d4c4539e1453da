//! Persistence collaborators of the form registry.
//!
//! The core decides *what* the next persisted state is; a [`FormCatalog`] stores it. An
//! [`EncounterStore`] supplies recorded observations, which the core only reads.
//!
//! [`MemoryCatalog`] implements both traits in memory. It backs the tests and is the state
//! container of the file-backed [`JsonCatalog`](crate::store::JsonCatalog).

use crate::model::{Encounter, Form, FormResource};
use crate::FormResult;
use forms_uuid::RegistryUuid;
use serde::{Deserialize, Serialize};

/// Lookup, listing and storage of forms and form resources.
///
/// Listings return forms in the order the catalog first stored them.
pub trait FormCatalog {
    fn get_form_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Form>>;

    fn get_form_resource_by_uuid(&self, uuid: &RegistryUuid)
        -> FormResult<Option<FormResource>>;

    /// Inserts or replaces (by uuid) a form and returns the stored record, id assigned.
    fn save_form(&mut self, form: Form) -> FormResult<Form>;

    /// Inserts or replaces (by uuid) a resource and returns the stored record, id assigned.
    fn save_form_resource(&mut self, resource: FormResource) -> FormResult<FormResource>;

    fn get_form_resources_for_form(&self, form: &Form) -> FormResult<Vec<FormResource>>;

    /// Lists forms, optionally restricted to one name.
    ///
    /// Retired forms are included only with `include_retired`, unpublished drafts only with
    /// `include_unpublished`.
    fn get_all_forms(
        &self,
        name: Option<&str>,
        include_retired: bool,
        include_unpublished: bool,
    ) -> FormResult<Vec<Form>>;

    /// Lists every published form version.
    fn get_all_published_forms(&self, include_retired: bool) -> FormResult<Vec<Form>>;

    /// Runs `work` as one unit: when it fails, none of its saves remain visible.
    ///
    /// The default runs `work` directly and is only correct for catalogs whose individual
    /// saves cannot fail part-way through a sequence.
    fn transaction<T, F>(&mut self, work: F) -> FormResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> FormResult<T>,
    {
        work(self)
    }
}

/// Read access to encounters and their observations.
pub trait EncounterStore {
    fn get_encounter_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Encounter>>;
}

/// In-memory catalog and encounter store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    forms: Vec<Form>,
    #[serde(default)]
    resources: Vec<FormResource>,
    #[serde(default)]
    encounters: Vec<Encounter>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces (by uuid) an encounter.
    pub fn insert_encounter(&mut self, encounter: Encounter) {
        match self
            .encounters
            .iter_mut()
            .find(|existing| existing.uuid == encounter.uuid)
        {
            Some(existing) => *existing = encounter,
            None => self.encounters.push(encounter),
        }
    }

    /// Every stored form, in storage order.
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    /// Every stored resource, in storage order.
    pub fn resources(&self) -> &[FormResource] {
        &self.resources
    }

    fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

impl FormCatalog for MemoryCatalog {
    fn get_form_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Form>> {
        Ok(self.forms.iter().find(|f| &f.uuid == uuid).cloned())
    }

    fn get_form_resource_by_uuid(
        &self,
        uuid: &RegistryUuid,
    ) -> FormResult<Option<FormResource>> {
        Ok(self.resources.iter().find(|r| &r.uuid == uuid).cloned())
    }

    fn save_form(&mut self, mut form: Form) -> FormResult<Form> {
        match self.forms.iter().position(|f| f.uuid == form.uuid) {
            Some(index) => {
                form.id = self.forms[index].id;
                self.forms[index] = form.clone();
            }
            None => {
                form.id = Some(self.allocate_id());
                self.forms.push(form.clone());
            }
        }
        Ok(form)
    }

    fn save_form_resource(&mut self, mut resource: FormResource) -> FormResult<FormResource> {
        match self.resources.iter().position(|r| r.uuid == resource.uuid) {
            Some(index) => {
                resource.id = self.resources[index].id;
                self.resources[index] = resource.clone();
            }
            None => {
                resource.id = Some(self.allocate_id());
                self.resources.push(resource.clone());
            }
        }
        Ok(resource)
    }

    fn get_form_resources_for_form(&self, form: &Form) -> FormResult<Vec<FormResource>> {
        Ok(self
            .resources
            .iter()
            .filter(|r| r.form_uuid == Some(form.uuid))
            .cloned()
            .collect())
    }

    fn get_all_forms(
        &self,
        name: Option<&str>,
        include_retired: bool,
        include_unpublished: bool,
    ) -> FormResult<Vec<Form>> {
        Ok(self
            .forms
            .iter()
            .filter(|f| name.map_or(true, |n| f.name == n))
            .filter(|f| include_retired || !f.retired)
            .filter(|f| include_unpublished || f.published)
            .cloned()
            .collect())
    }

    fn get_all_published_forms(&self, include_retired: bool) -> FormResult<Vec<Form>> {
        self.get_all_forms(None, include_retired, false)
    }

    fn transaction<T, F>(&mut self, work: F) -> FormResult<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> FormResult<T>,
    {
        let snapshot = self.clone();
        let result = work(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

impl EncounterStore for MemoryCatalog {
    fn get_encounter_by_uuid(&self, uuid: &RegistryUuid) -> FormResult<Option<Encounter>> {
        Ok(self.encounters.iter().find(|e| &e.uuid == uuid).cloned())
    }
}
