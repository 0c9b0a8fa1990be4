// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Litebook - keeps a local SQLite file mirrored to a durable mount.
//!
//! This is the binary entry point.

mod serve;
mod status;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use litebook_config::model::LitebookConfig;
use litebook_core::{CheckpointMode, LitebookError};

/// Litebook - keeps a local SQLite file mirrored to a durable mount.
#[derive(Parser, Debug)]
#[command(name = "litebook", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore from the mirror, sync periodically, and flush on SIGTERM/SIGINT.
    Serve,
    /// Run one sync attempt and exit.
    Sync {
        /// Checkpoint mode (passive, full, restart, truncate).
        #[arg(long)]
        mode: Option<CheckpointMode>,
        /// Treat this attempt as the final flush.
        #[arg(long)]
        finalize: bool,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Show local file, mirror and baseline status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => litebook_config::load_and_validate_path(path),
        None => litebook_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            litebook_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.daemon.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sync {
            mode,
            finalize,
            json,
        }) => sync::run_sync(&config, mode, finalize, json).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        None => {
            println!("litebook: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("litebook: {e}");
        std::process::exit(1);
    }
}

/// `litebook config`: the merged configuration plus the paths it resolves to.
fn print_config(config: &LitebookConfig) -> Result<(), LitebookError> {
    let rendered = config
        .to_toml()
        .map_err(|e| LitebookError::Config(format!("cannot render configuration: {e}")))?;
    println!("# local database: {}", config.local_path().display());
    println!("# remote mirror:  {}", config.remote_path().display());
    println!("# checksum file:  {}", config.checksum_path().display());
    println!("# snapshot file:  {}", config.snapshot_path().display());
    println!();
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber. Logs go to stderr so `--json` output
/// on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("litebook={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from(["litebook", "sync", "--mode", "TRUNCATE", "--finalize"])
            .unwrap();
        match cli.command {
            Some(Commands::Sync {
                mode,
                finalize,
                json,
            }) => {
                assert_eq!(mode, Some(CheckpointMode::Truncate));
                assert!(finalize);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["litebook", "sync", "--mode", "eventually"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["litebook", "status", "--json", "--config", "/tmp/x.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Status {
                json: true,
                plain: false
            })
        ));
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["litebook"]).unwrap();
        assert!(cli.command.is_none());
    }
}
