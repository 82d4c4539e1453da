//! Draft, clone-on-edit and publish transitions of form versions.
//!
//! A published form version is frozen. Saving a layout against it creates a new draft version
//! carrying a copy of the resource instead of editing it. Publishing freezes a draft and, if
//! sibling drafts have claimed higher numbers in the meantime, moves it to the true next
//! version first.
//!
//! Every transition runs inside [`FormCatalog::transaction`], so a failure part-way through
//! leaves the catalog as it was.

use crate::catalog::FormCatalog;
use crate::config::CoreConfig;
use crate::model::{Form, FormResource, StorageDatatype};
use crate::paths::form_storage_path;
use crate::version::next_version;
use crate::views::SaveFormResource;
use crate::{FormError, FormResult};
use forms_types::NonEmptyText;
use forms_uuid::RegistryUuid;

/// A resource as stored by [`FormPublisher::save_form_resource`], with the form it now belongs
/// to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedResource {
    pub form: Form,
    pub resource: FormResource,
}

/// Applies version transitions to a catalog.
#[derive(Debug, Clone, Copy)]
pub struct FormPublisher<'a> {
    cfg: &'a CoreConfig,
}

impl<'a> FormPublisher<'a> {
    pub fn new(cfg: &'a CoreConfig) -> Self {
        Self { cfg }
    }

    /// Registers a new, empty draft form at the next free version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Text`] for a blank name, and propagates catalog and version errors.
    pub fn create_form<C: FormCatalog>(&self, catalog: &mut C, name: &str) -> FormResult<Form> {
        let name = NonEmptyText::new(name)?;
        catalog.transaction(|catalog| {
            let version = next_version(catalog, name.as_str())?;
            let form = catalog.save_form(Form::new(name.as_str(), version))?;
            tracing::info!("created form {} v{} ({})", form.name, form.version, form.uuid);
            Ok(form)
        })
    }

    /// Stores a form layout.
    ///
    /// When the target form is still a draft the layout is saved in place. When it is
    /// published, a new draft version is created first and the layout is saved against that,
    /// so the uuid in the request may not be the uuid of the form that ends up holding it.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::FormNotFound`] if the request names an unknown form, and propagates
    /// catalog and version errors.
    pub fn save_form_resource<C: FormCatalog>(
        &self,
        catalog: &mut C,
        request: SaveFormResource,
    ) -> FormResult<SavedResource> {
        catalog.transaction(|catalog| {
            let mut form = catalog
                .get_form_by_uuid(&request.form.uuid)?
                .ok_or(FormError::FormNotFound(request.form.uuid))?;

            let mut resource = match &request.uuid {
                Some(uuid) => catalog.get_form_resource_by_uuid(uuid)?,
                None => None,
            }
            .unwrap_or_else(FormResource::shell);

            if form.published {
                let version = next_version(catalog, &form.name)?;
                let previous = form.version.clone();
                form = catalog.save_form(form.draft_successor(version))?;
                resource = resource.unsaved_copy();
                tracing::info!(
                    "form {} v{} is published; editing continues in new draft v{} ({})",
                    form.name,
                    previous,
                    form.version,
                    form.uuid
                );
            }

            resource.form_uuid = Some(form.uuid);
            resource.name = Some(request.form.name.clone());
            self.store_on_file_system(&mut resource, &form);
            resource.value = Some(request.value);

            let resource = catalog.save_form_resource(resource)?;
            Ok(SavedResource { form, resource })
        })
    }

    /// Publishes a form version.
    ///
    /// Returns `Ok(None)` without touching the catalog when the form does not exist.
    ///
    /// If the form's version is not immediately below the next free version of its name (a
    /// sibling draft holds a higher number), it is renumbered to that next free version before
    /// being marked published. The form's resource then has its storage path recomputed for
    /// the final version. This happens only when the form has exactly one resource; with zero
    /// or several the resources are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidVersion`] if the form's version is not an integer, and
    /// propagates catalog errors.
    pub fn publish<C: FormCatalog>(
        &self,
        catalog: &mut C,
        form_uuid: &RegistryUuid,
    ) -> FormResult<Option<Form>> {
        catalog.transaction(|catalog| {
            let Some(mut form) = catalog.get_form_by_uuid(form_uuid)? else {
                return Ok(None);
            };

            let expected = next_version(catalog, &form.name)?;
            let current = form.parsed_version()?;
            if current.successor() != expected {
                tracing::info!(
                    "renumbering form {} from v{} to v{} before publishing",
                    form.name,
                    current,
                    expected
                );
                form.version = expected.to_string();
            }

            form.published = true;
            let form = catalog.save_form(form)?;
            tracing::info!("published form {} v{} ({})", form.name, form.version, form.uuid);

            let resources = catalog.get_form_resources_for_form(&form)?;
            match <[FormResource; 1]>::try_from(resources) {
                Ok([mut resource]) => {
                    self.store_on_file_system(&mut resource, &form);
                    catalog.save_form_resource(resource)?;
                }
                Err(resources) => {
                    tracing::debug!(
                        "form {} has {} resources; storage paths left unchanged",
                        form.uuid,
                        resources.len()
                    );
                }
            }

            Ok(Some(form))
        })
    }

    fn store_on_file_system(&self, resource: &mut FormResource, form: &Form) {
        let path = form_storage_path(self.cfg.forms_dir(), &form.name, &form.version);
        resource.datatype = Some(StorageDatatype::FileSystem);
        resource.datatype_config = Some(path.to_string_lossy().into_owned());
    }
}
