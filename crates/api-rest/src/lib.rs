//! # API REST
//!
//! REST API implementation for the form registry.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! The router is built by [`router`] so that both the standalone `forms-api-rest` binary and
//! the workspace's `forms-run` binary serve the same endpoints.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use forms_core::{
    constants::DEFAULT_CATALOG_FILE, CoreConfig, FormError, FormFileStore, FormResourceView,
    FormService, FormTranslation, FormView, JsonCatalog, RegistryUuid, SaveFormResource,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared by the REST handlers.
///
/// Every operation goes through one [`FormService`]; the mutex serialises catalog writes.
#[derive(Clone)]
pub struct AppState {
    service: Arc<Mutex<FormService<JsonCatalog>>>,
}

impl AppState {
    pub fn new(service: FormService<JsonCatalog>) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
        }
    }

    fn service(&self) -> Result<MutexGuard<'_, FormService<JsonCatalog>>, ApiError> {
        self.service.lock().map_err(|_| {
            tracing::error!("form service lock poisoned");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Request body for registering a new form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateFormReq {
    pub name: String,
}

/// Query parameters of the latest-forms listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct LatestQuery {
    /// Include retired forms (default false)
    pub include_retired: Option<bool>,
    /// Encounter whose observations pin form versions
    pub encounter_uuid: Option<String>,
}

/// Query parameters of the translations lookup.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TranslationsQuery {
    /// Form name
    #[serde(default)]
    pub form_name: String,
    /// Form version
    #[serde(default)]
    pub version: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_forms,
        create_form,
        latest_forms,
        save_form_resource,
        publish_form,
        save_translation,
        get_translations,
    ),
    components(schemas(
        HealthRes,
        CreateFormReq,
        FormView,
        FormResourceView,
        forms_core::FormRef,
        SaveFormResource,
        FormTranslation,
    ))
)]
pub struct ApiDoc;

/// Builds the configured form service from the process environment.
///
/// # Environment Variables
/// - `FORMS_DIRECTORY`: root of form payload files
/// - `FORMS_TRANSLATIONS_DIRECTORY`: root of translation files
/// - `FORMS_CATALOG_FILE`: JSON catalog document (default: `forms_catalog.json`)
///
/// # Errors
/// Returns an error if the configuration is invalid or the catalog cannot be opened.
pub fn service_from_env() -> anyhow::Result<FormService<JsonCatalog>> {
    let cfg = Arc::new(CoreConfig::from_setting_values(
        std::env::var("FORMS_DIRECTORY").ok(),
        std::env::var("FORMS_TRANSLATIONS_DIRECTORY").ok(),
    )?);

    let catalog_file = std::env::var("FORMS_CATALOG_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE));

    let files = FormFileStore::new(cfg.forms_dir())?;
    let catalog = JsonCatalog::open(&catalog_file, files)?;

    tracing::info!(
        "-- Forms directory {}, catalog {}",
        cfg.forms_dir().display(),
        catalog_file.display()
    );

    Ok(FormService::new(cfg, catalog))
}

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forms", get(list_forms).post(create_form))
        .route("/forms/latest", get(latest_forms))
        .route("/forms/resources", post(save_form_resource))
        .route("/forms/:uuid/publish", post(publish_form))
        .route("/forms/translations", get(get_translations).post(save_translation))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(context: &str, e: FormError) -> ApiError {
    match e {
        FormError::InvalidInput(_) | FormError::Text(_) | FormError::Uuid(_) => {
            tracing::warn!("{} rejected: {}", context, e);
            (StatusCode::BAD_REQUEST, "Bad request")
        }
        FormError::FormNotFound(_) => {
            tracing::warn!("{}: {}", context, e);
            (StatusCode::NOT_FOUND, "Form not found")
        }
        FormError::EncounterNotFound(_) => {
            tracing::warn!("{}: {}", context, e);
            (StatusCode::NOT_FOUND, "Encounter not found")
        }
        other => {
            tracing::error!("{} error: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn parse_uuid(value: &str) -> Result<RegistryUuid, ApiError> {
    RegistryUuid::parse(value).map_err(|e| {
        tracing::warn!("invalid uuid '{}': {}", value, e);
        (StatusCode::BAD_REQUEST, "Invalid UUID")
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Forms REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/forms",
    responses(
        (status = 200, description = "Published, non-retired form versions", body = [FormView]),
        (status = 500, description = "Internal server error")
    )
)]
/// List every published, non-retired form version.
#[axum::debug_handler]
async fn list_forms(State(state): State<AppState>) -> Result<Json<Vec<FormView>>, ApiError> {
    let service = state.service()?;
    service
        .get_all_forms()
        .map(Json)
        .map_err(|e| error_response("List forms", e))
}

#[utoipa::path(
    post,
    path = "/forms",
    request_body = CreateFormReq,
    responses(
        (status = 201, description = "Draft form created", body = FormView),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new draft form at the next free version of its name.
#[axum::debug_handler]
async fn create_form(
    State(state): State<AppState>,
    Json(req): Json<CreateFormReq>,
) -> Result<(StatusCode, Json<FormView>), ApiError> {
    let mut service = state.service()?;
    let form = service
        .create_form(&req.name)
        .map_err(|e| error_response("Create form", e))?;
    Ok((StatusCode::CREATED, Json(form)))
}

#[utoipa::path(
    get,
    path = "/forms/latest",
    params(LatestQuery),
    responses(
        (status = 200, description = "Latest published version of every form", body = [FormView]),
        (status = 400, description = "Invalid encounter UUID"),
        (status = 404, description = "Encounter not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Latest published version of every form.
///
/// With `encounterUuid`, forms the encounter already recorded observations against are
/// returned at the recorded version instead.
#[axum::debug_handler]
async fn latest_forms(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<FormView>>, ApiError> {
    let encounter = query
        .encounter_uuid
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(parse_uuid)
        .transpose()?;

    let service = state.service()?;
    service
        .get_all_latest_published_forms(query.include_retired.unwrap_or(false), encounter.as_ref())
        .map(Json)
        .map_err(|e| error_response("Latest forms", e))
}

#[utoipa::path(
    post,
    path = "/forms/resources",
    request_body = SaveFormResource,
    responses(
        (status = 200, description = "Form layout saved", body = FormResourceView),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Form not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Save a form layout.
///
/// Saving against a published form creates the next draft version and saves the layout there.
#[axum::debug_handler]
async fn save_form_resource(
    State(state): State<AppState>,
    Json(req): Json<SaveFormResource>,
) -> Result<Json<FormResourceView>, ApiError> {
    let mut service = state.service()?;
    service
        .save_form_resource(req)
        .map(Json)
        .map_err(|e| error_response("Save form resource", e))
}

#[utoipa::path(
    post,
    path = "/forms/{uuid}/publish",
    params(("uuid" = String, Path, description = "Form UUID")),
    responses(
        (status = 200, description = "Published form, or null when no form has this UUID", body = Option<FormView>),
        (status = 400, description = "Invalid form UUID"),
        (status = 500, description = "Internal server error")
    )
)]
/// Publish a form, renumbering it when versions were skipped since the last published one.
///
/// Publishing an unknown form is a no-op answered with a `null` body.
#[axum::debug_handler]
async fn publish_form(
    State(state): State<AppState>,
    AxumPath(uuid): AxumPath<String>,
) -> Result<Json<Option<FormView>>, ApiError> {
    let uuid = parse_uuid(&uuid)?;
    let mut service = state.service()?;
    service
        .publish(&uuid)
        .map(Json)
        .map_err(|e| error_response("Publish form", e))
}

#[utoipa::path(
    post,
    path = "/forms/translations",
    request_body = FormTranslation,
    responses(
        (status = 200, description = "Translations saved", body = FormTranslation),
        (status = 400, description = "Missing form name, version or locale"),
        (status = 500, description = "Internal server error")
    )
)]
/// Store one locale's translations for a form version.
#[axum::debug_handler]
async fn save_translation(
    State(state): State<AppState>,
    Json(req): Json<FormTranslation>,
) -> Result<Json<FormTranslation>, ApiError> {
    let service = state.service()?;
    service
        .save_translation(req)
        .map(Json)
        .map_err(|e| error_response("Save translation", e))
}

#[utoipa::path(
    get,
    path = "/forms/translations",
    params(TranslationsQuery),
    responses(
        (status = 200, description = "Translations of the form version keyed by locale", body = Object),
        (status = 400, description = "Missing or unusable form name or version"),
        (status = 500, description = "Internal server error")
    )
)]
/// Every locale's translations for a form version.
#[axum::debug_handler]
async fn get_translations(
    State(state): State<AppState>,
    Query(query): Query<TranslationsQuery>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    if query.form_name.is_empty() || query.version.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "formName and version are required"));
    }

    let service = state.service()?;
    service
        .get_translations(&query.form_name, &query.version)
        .map(Json)
        .map_err(|e| error_response("Get translations", e))
}
