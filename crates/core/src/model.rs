//! Records handled by the form registry.
//!
//! These are the catalog's persistent shapes. They carry catalog-assigned ids so that a
//! persisted record can be told apart from a freshly built shell, and they keep versions in
//! their stored string form; [`FormVersion`] is used whenever a version has to be compared or
//! computed.

use crate::FormResult;
use forms_types::FormVersion;
use forms_uuid::RegistryUuid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, versioned clinical data-entry template.
///
/// `name` is stable across versions and `uuid` identifies one version-instance. Once
/// `published` is set the (name, version) content must not change again; edits go to a new
/// form with a greater version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub uuid: RegistryUuid,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub encounter_type: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

impl Form {
    /// Builds an unsaved, unpublished form with a fresh uuid.
    pub fn new(name: impl Into<String>, version: FormVersion) -> Self {
        Self {
            id: None,
            uuid: RegistryUuid::new(),
            name: name.into(),
            version: version.to_string(),
            published: false,
            retired: false,
            build_number: None,
            encounter_type: None,
            creator: None,
        }
    }

    /// Builds the unsaved draft that replaces this form when a published version is edited.
    ///
    /// Name, build number, encounter type and creator carry over. Identity, version and
    /// publication state do not.
    pub fn draft_successor(&self, version: FormVersion) -> Self {
        Self {
            build_number: self.build_number.clone(),
            encounter_type: self.encounter_type.clone(),
            creator: self.creator.clone(),
            ..Self::new(self.name.clone(), version)
        }
    }

    /// The stored version as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FormError::InvalidVersion`] when the stored value is not an integer.
    pub fn parsed_version(&self) -> FormResult<FormVersion> {
        Ok(FormVersion::parse(&self.version)?)
    }

    /// True when this form is exactly `name` at `version`, compared as stored strings.
    pub fn is(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }
}

/// How a form resource's value is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageDatatype {
    /// The value lives in a JSON file whose path is the resource's `datatype_config`.
    FileSystem,
    /// Any other datatype, identified by its class name.
    Other(String),
}

impl StorageDatatype {
    pub const FILE_SYSTEM_CLASSNAME: &'static str =
        "org.bahmni.customdatatype.datatype.FileSystemStorageDatatype";

    /// Class name reported to API clients.
    pub fn classname(&self) -> &str {
        match self {
            StorageDatatype::FileSystem => Self::FILE_SYSTEM_CLASSNAME,
            StorageDatatype::Other(name) => name,
        }
    }
}

/// The JSON layout and storage descriptor of one form version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub uuid: RegistryUuid,
    #[serde(default)]
    pub form_uuid: Option<RegistryUuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub datatype: Option<StorageDatatype>,
    #[serde(default)]
    pub datatype_config: Option<String>,
    #[serde(default)]
    pub preferred_handler: Option<String>,
    #[serde(default)]
    pub handler_config: Option<String>,
}

impl Default for FormResource {
    fn default() -> Self {
        Self::shell()
    }
}

impl FormResource {
    /// An empty, unsaved resource with a fresh uuid.
    pub fn shell() -> Self {
        Self {
            id: None,
            uuid: RegistryUuid::new(),
            form_uuid: None,
            name: None,
            value: None,
            datatype: None,
            datatype_config: None,
            preferred_handler: None,
            handler_config: None,
        }
    }

    /// True once the catalog has stored this resource.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Builds an unsaved copy for a new form version.
    ///
    /// Content and storage metadata are copied only from a persisted resource; copying an
    /// unsaved shell yields another empty shell.
    pub fn unsaved_copy(&self) -> Self {
        let shell = Self::shell();
        if !self.is_persisted() {
            return shell;
        }

        Self {
            name: self.name.clone(),
            value: self.value.clone(),
            datatype: self.datatype.clone(),
            datatype_config: self.datatype_config.clone(),
            preferred_handler: self.preferred_handler.clone(),
            handler_config: self.handler_config.clone(),
            ..shell
        }
    }
}

/// A recorded clinical observation, tagged with the form field it was captured from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obs {
    pub uuid: RegistryUuid,
    /// `"<formName>.<formVersion>/<field-path>"`, absent for observations captured outside a form.
    #[serde(default)]
    pub form_field_path: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl Obs {
    /// The `"<formName>.<formVersion>"` token before the first `/` of the form-field path.
    pub fn form_key(&self) -> Option<&str> {
        self.form_field_path
            .as_deref()
            .and_then(|path| path.split('/').next())
    }
}

/// A clinical encounter and its observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub uuid: RegistryUuid,
    #[serde(default)]
    pub observations: Vec<Obs>,
}

/// Translations of one form version's labels and concepts into one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FormTranslation {
    #[serde(default)]
    pub form_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub concepts: BTreeMap<String, String>,
}
