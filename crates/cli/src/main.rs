use anyhow::Result;
use clap::{Parser, Subcommand};
use pulse_core::{config::AppConfig, registry::MetricRegistry};
use rustls::crypto::{ring::default_provider, CryptoProvider};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::{handle_chains_command, handle_collect_command, CollectOptions};

#[derive(Parser)]
#[command(name = "pulse-cli")]
#[command(about = "Pulse CLI - measure RPC provider latency and push it to a metrics backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(long, global = true, env = "PULSE_CONFIG", default_value = "config/config.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection for a blockchain and print the payload
    Collect {
        /// Blockchain name (case insensitive)
        #[arg(short, long)]
        blockchain: String,

        /// Endpoints document file; defaults to the configured source
        #[arg(short, long)]
        endpoints: Option<PathBuf>,

        /// Measure and print without pushing
        #[arg(long)]
        no_push: bool,
    },

    /// List registered blockchains and their metrics
    Chains,
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,pulse_core={}", config.logging.level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = Arc::new(MetricRegistry::with_defaults());

    match cli.command {
        Commands::Chains => handle_chains_command(&registry),

        Commands::Collect { blockchain, endpoints, no_push } => {
            CryptoProvider::install_default(default_provider())
                .map_err(|e| anyhow::anyhow!("Failed to install crypto provider: {e:?}"))?;

            let config = AppConfig::from_file(&cli.config)?;
            config.validate()?;
            init_logging(&config);

            let options = CollectOptions { blockchain, endpoints, no_push };
            handle_collect_command(options, &config, registry).await?;
        }
    }

    Ok(())
}
