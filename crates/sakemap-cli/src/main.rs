#![allow(clippy::doc_markdown)]
//! `sakemap` - questionnaire-driven sake recommendations from the terminal.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sakemap_core::config::CONFIG_FILE_NAME;
use sakemap_core::SakemapConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sakemap - match sake brands to your taste
#[derive(Parser, Debug)]
#[command(name = "sakemap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME, env = "SAKEMAP_CONFIG", global = true)]
    config: PathBuf,

    /// Directory holding the catalog JSON files (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for the stored preference (overrides the config file)
    #[arg(long, global = true)]
    preference_dir: Option<PathBuf>,

    /// Seed for cluster initialization (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// JSON on stdout
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recommend brands from questionnaire answers
    Recommend {
        /// Answer as question=value (repeatable), e.g. -a aroma=華やか
        #[arg(short, long = "answer", value_name = "QUESTION=VALUE")]
        answers: Vec<String>,

        /// JSON file with an object of answers
        #[arg(long)]
        answers_file: Option<PathBuf>,

        /// Do not store the derived preference
        #[arg(long)]
        no_save: bool,
    },

    /// Show the cluster model built from the flavor charts
    Clusters,

    /// Write cluster assignments as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the questionnaire, or the questions still open for some answers
    Questions {
        /// Answers given so far, as question=value
        #[arg(short, long = "answer", value_name = "QUESTION=VALUE")]
        answers: Vec<String>,
    },

    /// Show, set or clear the stored preference vector
    Preference {
        #[command(subcommand)]
        action: PreferenceAction,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand, Debug)]
enum PreferenceAction {
    /// Print the stored preference
    Show,
    /// Store a preference (six values, clamped to [0, 1])
    Set {
        /// Floral, mellow, rich, mild, dry, light
        #[arg(num_args = 6, value_name = "VALUE", allow_negative_numbers = true)]
        values: Vec<f32>,
    },
    /// Delete the stored preference
    Clear,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<SakemapConfig> {
    let mut config = SakemapConfig::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.catalog.data_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.preference_dir {
        config.storage.preference_dir = Some(dir.clone());
    }
    if cli.seed.is_some() {
        config.clustering.seed = cli.seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    tracing::debug!(data_dir = %config.catalog.data_dir.display(), "configuration ready");
    let format = cli.format;

    match cli.command {
        Commands::Recommend {
            answers,
            answers_file,
            no_save,
        } => commands::recommend(&config, &answers, answers_file.as_deref(), no_save, format),
        Commands::Clusters => commands::clusters(&config, format),
        Commands::Export { output } => commands::export(&config, output.as_deref()),
        Commands::Questions { answers } => commands::questions(&answers, format),
        Commands::Preference { action } => match action {
            PreferenceAction::Show => commands::preference_show(&config, format),
            PreferenceAction::Set { values } => commands::preference_set(&config, &values),
            PreferenceAction::Clear => commands::preference_clear(&config),
        },
        Commands::Config => commands::print_config(&config),
    }
}
