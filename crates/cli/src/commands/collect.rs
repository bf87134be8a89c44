use anyhow::{Context, Result};
use pulse_core::{
    chains::Blockchain,
    config::{AppConfig, EndpointsSource},
    pipeline::CollectionOrchestrator,
    push::PushOutcome,
    registry::MetricRegistry,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};

use super::utils::{print_info, print_success, print_warning};

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub blockchain: String,
    /// Overrides the configured endpoints source.
    pub endpoints: Option<PathBuf>,
    pub no_push: bool,
}

/// `--endpoints` wins over the configured source.
pub fn endpoints_source(endpoints: Option<PathBuf>, config: &AppConfig) -> EndpointsSource {
    endpoints.map_or_else(|| config.endpoints_source(), EndpointsSource::File)
}

/// Runs one invocation and prints the payload on stdout.
pub async fn handle_collect_command(
    options: CollectOptions,
    config: &AppConfig,
    registry: Arc<MetricRegistry>,
) -> Result<()> {
    let blockchain: Blockchain = options.blockchain.parse()?;
    registry.ensure_registered(blockchain)?;

    let source = endpoints_source(options.endpoints, config);
    debug!(source = ?source, "loading endpoints document");
    let endpoints = source.load().context("failed to load endpoints document")?;

    let mut orchestrator = CollectionOrchestrator::from_config(config, registry)?;
    if options.no_push {
        orchestrator = orchestrator.without_push();
    }

    print_info(&format!(
        "Collecting {blockchain} metrics from {} provider(s)...",
        endpoints.providers_for(blockchain).count()
    ));
    let report = orchestrator.run(blockchain, &endpoints).await?;
    info!(
        blockchain = %blockchain,
        run_id = %report.run_id,
        reported = report.reported,
        failed = report.failed,
        "collect command finished"
    );

    if !report.payload.is_empty() {
        println!("{}", report.payload);
    }

    print_info(&format!(
        "{} of {} metric(s) reported, {} failed",
        report.reported, report.instances, report.failed
    ));
    match report.push {
        PushOutcome::Delivered { attempts } => {
            print_success(&format!("Metrics pushed after {attempts} attempt(s)"));
        }
        PushOutcome::Skipped(reason) => print_info(&format!("Push skipped: {reason:?}")),
        PushOutcome::Abandoned { attempts } => {
            print_warning(&format!("Push abandoned after {attempts} attempt(s)"));
        }
    }

    Ok(())
}
