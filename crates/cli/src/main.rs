//! Switchyard CLI entry point.
//!
//! Commands:
//! - `select`   Pick an engine for a test's metadata
//! - `classify` Classify a failure message
//! - `rules`    List rules in evaluation order
//! - `config`   Validate, show or locate the configuration
//! - `init`     Write the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "switchyard",
    about = "Switchyard: engine selection and fallback for browser tests",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.switchyard/config.toml
    #[arg(short, long, global = true, env = "SWITCHYARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select an engine for a unit of work
    Select {
        /// Work metadata as a JSON object
        #[arg(short, long)]
        metadata: String,
    },

    /// Classify a failure message and report fallback eligibility
    Classify {
        /// The failure message
        message: String,
    },

    /// List rules in evaluation order
    Rules,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Write the default configuration file
    Init,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate the configuration
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Select { metadata } => commands::select::run(config_path, &metadata).await?,
        Commands::Classify { message } => commands::classify::run(config_path, &message).await?,
        Commands::Rules => commands::rules::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
        Commands::Init => commands::init::run(config_path).await?,
    }

    Ok(())
}
