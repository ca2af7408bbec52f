// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arcane Relay - a session-based collaborative storytelling service.
//!
//! This is the binary entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;

/// Arcane Relay - a session-based collaborative storytelling service.
#[derive(Parser, Debug)]
#[command(name = "arcane", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Arcane Relay server.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            arcane_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("arcane serve failed: {e}");
                std::process::exit(1);
            }
        }
        None => {
            eprintln!("arcane: use --help for available commands");
        }
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<arcane_config::ArcaneConfig, Vec<arcane_config::ConfigError>> {
    match path {
        Some(path) => {
            let config = arcane_config::load_config_from_path(path)
                .map_err(|e| vec![arcane_config::ConfigError::Load(Box::new(e))])?;
            arcane_config::validate_config(&config)?;
            Ok(config)
        }
        None => arcane_config::load_and_validate(),
    }
}
