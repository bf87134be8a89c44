use anyhow::Result;
use axum::serve;
use pulse_core::{config::AppConfig, pipeline::CollectionOrchestrator, registry::MetricRegistry};
use rustls::crypto::{ring::default_provider, CryptoProvider};
use server::{create_router, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes logging. `RUST_LOG` overrides the configured level.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("warn,pulse_core={level},server={level}"))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CryptoProvider::install_default(default_provider())
        .map_err(|e| anyhow::anyhow!("Failed to install crypto provider: {e:?}"))?;

    let config = AppConfig::load()?;
    config.validate().map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    init_logging(&config);
    info!("Starting pulse collection server");

    let registry = Arc::new(MetricRegistry::with_defaults());
    let orchestrator = CollectionOrchestrator::from_config(&config, registry)?;
    debug!(
        blockchains = ?orchestrator.registry().blockchains(),
        push_enabled = config.push_settings().credentials().is_some(),
        auth_configured = config.auth.api_secret.is_some(),
        "Configuration loaded"
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        endpoints: config.endpoints_source(),
        api_secret: config.auth.api_secret.clone().map(Arc::new),
    };

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Collection server listening");

    let server = serve(listener, create_router(state)).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        error!(error = %e, "Server error occurred");
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight collections");
}
