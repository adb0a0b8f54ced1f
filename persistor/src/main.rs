//! Persistor Main Entry Point
//!
//! Serves document-store index requests from the configured message bus.

use dotenv::dotenv;
use persistor::{Dependencies, PersistorConfig, PersistorError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("persistor=info,persistor_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "persistor",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), PersistorError> {
    dotenv().ok();

    init_tracing();

    let config = PersistorConfig::from_env()
        .and_then(|config| config.ensure_standalone().map(|()| config))
        .inspect_err(|e| {
            error!(error = %e, "Failed to load configuration");
        })?;

    info!(address = %config.address, "Starting persistor");

    let mut deps = match Dependencies::new(&config) {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Persistor stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Persistor failed");
            Err(e)
        }
    }
}
