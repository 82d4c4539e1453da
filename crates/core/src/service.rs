//! Public operations of the form registry.

use crate::catalog::{EncounterStore, FormCatalog};
use crate::config::CoreConfig;
use crate::latest::LatestForms;
use crate::model::FormTranslation;
use crate::publisher::FormPublisher;
use crate::reconcile::reconcile;
use crate::translation::TranslationStore;
use crate::views::{FormResourceView, FormView, SaveFormResource};
use crate::FormResult;
use forms_uuid::RegistryUuid;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Form registry service over a catalog that also stores encounters.
///
/// Mutating operations take `&mut self`; callers sharing a service across threads wrap it in a
/// lock.
#[derive(Debug)]
pub struct FormService<C> {
    cfg: Arc<CoreConfig>,
    catalog: C,
    translations: TranslationStore,
}

impl<C> FormService<C>
where
    C: FormCatalog + EncounterStore,
{
    pub fn new(cfg: Arc<CoreConfig>, catalog: C) -> Self {
        let translations = TranslationStore::new(cfg.translations_dir());
        Self {
            cfg,
            catalog,
            translations,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    /// Registers a new draft form at the next free version of `name`.
    pub fn create_form(&mut self, name: &str) -> FormResult<FormView> {
        let form = FormPublisher::new(&self.cfg).create_form(&mut self.catalog, name)?;
        Ok(FormView::from(form))
    }

    /// Saves a form layout, creating a new draft version when the target form is published.
    pub fn save_form_resource(&mut self, request: SaveFormResource) -> FormResult<FormResourceView> {
        let saved = FormPublisher::new(&self.cfg).save_form_resource(&mut self.catalog, request)?;
        Ok(FormResourceView::new(&saved.form, &saved.resource))
    }

    /// Publishes a form; `None` when no form has that uuid.
    pub fn publish(&mut self, form_uuid: &RegistryUuid) -> FormResult<Option<FormView>> {
        let form = FormPublisher::new(&self.cfg).publish(&mut self.catalog, form_uuid)?;
        Ok(form.map(FormView::from))
    }

    /// Latest published version of every form, reconciled with the observations of
    /// `encounter_uuid` when given.
    pub fn get_all_latest_published_forms(
        &self,
        include_retired: bool,
        encounter_uuid: Option<&RegistryUuid>,
    ) -> FormResult<Vec<FormView>> {
        let all_published = self.catalog.get_all_published_forms(include_retired)?;
        let latest = LatestForms::select(all_published.iter().cloned())?;
        let forms = reconcile(&self.catalog, &all_published, latest, encounter_uuid)?;
        Ok(forms.into_iter().map(FormView::from).collect())
    }

    /// Every published, non-retired form version.
    pub fn get_all_forms(&self) -> FormResult<Vec<FormView>> {
        let forms = self.catalog.get_all_forms(None, false, false)?;
        Ok(forms.into_iter().map(FormView::from).collect())
    }

    /// Stores one locale's translations for a form version.
    pub fn save_translation(&self, translation: FormTranslation) -> FormResult<FormTranslation> {
        self.translations.save(translation)
    }

    /// Every locale's translations for a form version, keyed by locale; empty when none were
    /// saved.
    pub fn get_translations(&self, form_name: &str, version: &str) -> FormResult<Map<String, Value>> {
        self.translations.load(form_name, version)
    }
}
