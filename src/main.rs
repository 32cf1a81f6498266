use std::path::PathBuf;

use clap::{Parser, Subcommand};

use json_version_checker::config::{CheckerConfig, log_path};
use json_version_checker::logging::init_logging;
use json_version_checker::runner::run_manifest;

#[derive(Parser)]
#[command(name = "json-version-checker")]
#[command(version, about = "Look up new versions of external data from JSON documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to the log file in the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check every source with checker data in a manifest
    Check {
        /// Flatpak-style JSON manifest
        manifest: PathBuf,

        /// jq executable
        #[arg(long)]
        jq: Option<PathBuf>,

        /// git executable
        #[arg(long)]
        git: Option<PathBuf>,

        /// Timeout per source in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.then(log_path);
    let log_guard = init_logging(log_file.as_deref(), cli.log_json)?;

    let mut config = match &cli.config {
        Some(path) => CheckerConfig::load(path)?,
        None => CheckerConfig::default(),
    };

    match cli.command {
        Command::Check {
            manifest,
            jq,
            git,
            timeout_ms,
        } => {
            if let Some(jq) = jq {
                config.jq_path = jq;
            }
            if let Some(git) = git {
                config.git_path = git;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.fetch_timeout = timeout_ms;
            }

            let run = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run_manifest(&config, &manifest))?;

            println!("{}", serde_json::to_string_pretty(&run.reports)?);

            if run.summary.has_failures() {
                tracing::error!(
                    "{} of {} sources could not be checked",
                    run.summary.failed.len(),
                    run.summary.total()
                );
                // exit() skips destructors, flush file logs first
                drop(log_guard);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
