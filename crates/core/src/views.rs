//! API-facing views of catalog records and the save request.
//!
//! Catalog records keep internal fields (catalog ids, handler metadata) that callers never see.
//! Views are what the service returns; they serialise with camelCase keys.

use crate::model::{Form, FormResource};
use forms_uuid::RegistryUuid;
use serde::{Deserialize, Serialize};

/// External view of a form version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub uuid: RegistryUuid,
    pub name: String,
    pub version: String,
    pub published: bool,
}

impl From<&Form> for FormView {
    fn from(form: &Form) -> Self {
        Self {
            id: form.id,
            uuid: form.uuid,
            name: form.name.clone(),
            version: form.version.clone(),
            published: form.published,
        }
    }
}

impl From<Form> for FormView {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            uuid: form.uuid,
            name: form.name,
            version: form.version,
            published: form.published,
        }
    }
}

/// External view of a saved form resource together with the form it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FormResourceView {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub uuid: RegistryUuid,
    pub form: FormView,
    pub value: Option<String>,
    pub data_type: Option<String>,
}

impl FormResourceView {
    pub fn new(form: &Form, resource: &FormResource) -> Self {
        Self {
            uuid: resource.uuid,
            form: FormView::from(form),
            value: resource.value.clone(),
            data_type: resource
                .datatype
                .as_ref()
                .map(|datatype| datatype.classname().to_string()),
        }
    }
}

/// The form a save request targets: its catalog uuid and the display name to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FormRef {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub uuid: RegistryUuid,
    pub name: String,
}

/// Request to save a form layout.
///
/// `uuid` names an existing resource to update; when absent or unknown a new resource is
/// created for the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SaveFormResource {
    pub form: FormRef,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub uuid: Option<RegistryUuid>,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageDatatype;
    use forms_types::FormVersion;

    #[test]
    fn resource_view_reports_datatype_classname() {
        let mut form = Form::new("Vitals", FormVersion::new(2));
        form.id = Some(1);
        let mut resource = FormResource::shell();
        resource.value = Some("{\"controls\":[]}".into());
        resource.datatype = Some(StorageDatatype::FileSystem);

        let view = FormResourceView::new(&form, &resource);

        assert_eq!(view.form.version, "2");
        assert_eq!(
            view.data_type.as_deref(),
            Some(StorageDatatype::FILE_SYSTEM_CLASSNAME)
        );
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("dataType").is_some());
        assert_eq!(json["form"]["published"], false);
    }

    #[test]
    fn save_request_resource_uuid_is_optional() {
        let request: SaveFormResource = serde_json::from_str(
            r#"{"form":{"uuid":"550e8400-e29b-41d4-a716-446655440000","name":"Vitals"},"value":"{}"}"#,
        )
        .unwrap();

        assert_eq!(request.uuid, None);
        assert_eq!(request.form.name, "Vitals");
    }
}
