use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod accounts;
mod collect;
mod fields;

#[derive(Debug, Parser)]
#[command(name = "kolstat")]
#[command(about = "Creator analytics collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect analytics for every creator id in the targets file.
    Collect {
        /// File with one creator id per line; blank lines and `#` comments
        /// are skipped. Defaults to the configured targets path.
        #[arg(long)]
        targets: Option<PathBuf>,
        /// Comma-separated performance-variant labels overriding the stored
        /// selection (see `kolstat fields` for the full list).
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
        /// Print what would be collected and exit without touching the network.
        #[arg(long)]
        dry_run: bool,
    },
    /// Credential management.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// List the selectable performance-variant labels.
    Fields,
}

#[derive(Debug, Subcommand)]
enum AccountsCommands {
    /// Validate every stored credential against the platform and update its
    /// status and display name.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = kolstat_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect {
            targets,
            fields,
            dry_run,
        } => {
            let targets = targets.unwrap_or_else(|| config.targets_path.clone());
            collect::run_collect(&config, &targets, fields.as_deref(), dry_run).await
        }
        Commands::Accounts {
            command: AccountsCommands::Check,
        } => accounts::run_accounts_check(&config).await,
        Commands::Fields => {
            fields::print_labels();
            Ok(())
        }
    }
}
