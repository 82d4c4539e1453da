use api_rest::{AppState, router, service_from_env};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter from `RUST_LOG`, plus `info` for the registry crates and the REST layer.
fn env_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("forms=info".parse()?)
        .add_directive("api_rest=info".parse()?))
}

/// Main entry point for the form registry
///
/// Serves the REST API with its Swagger UI on port 3000 (configurable via FORMS_REST_ADDR)
/// until interrupted.
///
/// # Environment Variables
/// - `FORMS_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FORMS_DIRECTORY`: Directory for form payload files (default: "/home/bahmni/clinical_forms/")
/// - `FORMS_TRANSLATIONS_DIRECTORY`: Directory for translation files
/// - `FORMS_CATALOG_FILE`: JSON catalog document (default: "forms_catalog.json")
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("FORMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let service = service_from_env()?;
    tracing::info!(
        "++ Catalog {} holds {} form versions",
        service.catalog().path().display(),
        service.catalog().state().forms().len()
    );

    tracing::info!("++ Starting forms REST on {}", rest_addr);

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("-- Shutting down forms REST");
        })
        .await?;

    Ok(())
}
