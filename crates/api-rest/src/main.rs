//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the form registry REST API on its own.
//!
//! ## Intended use
//! Development and debugging. The workspace's main `forms-run` binary serves the same router.

use api_rest::{router, service_from_env, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the forms REST API server
///
/// # Environment Variables
/// - `FORMS_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `FORMS_DIRECTORY`, `FORMS_TRANSLATIONS_DIRECTORY`, `FORMS_CATALOG_FILE`: storage locations
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the form service cannot be configured,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("forms_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FORMS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting forms REST API on {}", addr);

    let app = router(AppState::new(service_from_env()?));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
