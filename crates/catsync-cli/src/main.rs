use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod sync;

#[derive(Debug, Parser)]
#[command(name = "catsync")]
#[command(about = "Supplier catalog ingestion and reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pull supplier feeds, normalize them, and reconcile against the
    /// remote catalog.
    Sync {
        /// Only process the supplier with this slug.
        #[arg(long)]
        supplier: Option<String>,
        /// Compute and report the diff without issuing any write.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate environment configuration and the supplier registry, then
    /// exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = catsync_core::load_app_config_from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync { supplier, dry_run } => {
            sync::run_sync(&config, supplier.as_deref(), dry_run).await
        }
        Commands::CheckConfig => sync::run_check_config(&config),
    }
}
