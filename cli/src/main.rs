// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # NetServa CLI
//!
//! The `netserva` binary answers "which fleet entity does this name refer
//! to?" for credential commands, and manages the fleet store behind it.
//!
//! ## Commands
//!
//! - `netserva owner resolve <NAME> [DOMAIN]` - Resolve a credential owner
//! - `netserva fleet import|nodes|hosts` - Fleet store operations
//! - `netserva config show|validate|generate` - Configuration management
//! - `netserva update` - Apply database migrations
//!
//! ## Fleet store
//!
//! With the default in-memory backend the store is populated from the fleet
//! inventory (`--inventory` or `spec.inventory`) on every invocation. With
//! the PostgreSQL backend the inventory is written once with
//! `netserva fleet import`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use netserva_cli::commands::{self, ConfigCommand, FleetCommand, OwnerCommand};
use netserva_core::domain::config::NetServaConfig;

/// NetServa - Fleet owner resolution for credential management
#[derive(Parser)]
#[command(name = "netserva")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "NETSERVA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Fleet inventory file (overrides spec.inventory)
    #[arg(long, global = true, env = "NETSERVA_INVENTORY", value_name = "FILE")]
    inventory: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), default from config
    #[arg(long, global = true, env = "NETSERVA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Credential owner resolution
    #[command(name = "owner")]
    Owner {
        #[command(subcommand)]
        command: OwnerCommand,
    },

    /// Fleet store operations
    #[command(name = "fleet")]
    Fleet {
        #[command(subcommand)]
        command: FleetCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Update NetServa database
    #[command(name = "update")]
    Update {
        #[command(flatten)]
        command: commands::UpdateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging settings come from the config file when it parses; a broken
    // file is reported by the command that needs it.
    let observability = NetServaConfig::load_or_default(cli.config.clone())
        .map(|config| config.spec.observability)
        .unwrap_or_default();
    let level = cli.log_level.as_deref().unwrap_or(&observability.log_level);
    init_logging(level, &observability.log_format)?;

    match cli.command {
        Some(Commands::Owner { command }) => {
            commands::owner::handle_command(command, cli.config, cli.inventory).await
        }
        Some(Commands::Fleet { command }) => {
            commands::fleet::handle_command(command, cli.config, cli.inventory).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Update { command }) => {
            commands::update::execute(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
