// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fleet store commands
//!
//! Commands: import, nodes, hosts, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use netserva_core::application::diagnostics::TracingDiagnostics;
use netserva_core::domain::config::NetServaConfig;
use netserva_core::domain::fleet::NodeId;
use netserva_core::infrastructure::{FleetInventory, InventorySummary};

use crate::fleet_context::FleetContext;

const SAMPLE_INVENTORY: &str = include_str!("../../templates/fleet-inventory.yaml");

#[derive(Subcommand)]
pub enum FleetCommand {
    /// Import a fleet inventory into the configured store
    Import {
        /// Inventory YAML file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List nodes
    Nodes,

    /// List hosts with the node they run on
    Hosts,

    /// Generate a sample fleet inventory
    Generate {
        /// Output path (default: ./fleet.yaml)
        #[arg(short, long, default_value = "./fleet.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: FleetCommand,
    config_override: Option<PathBuf>,
    inventory_override: Option<PathBuf>,
) -> Result<()> {
    let load_config = move || {
        NetServaConfig::load_or_default(config_override).context("Failed to load configuration")
    };

    match command {
        FleetCommand::Import { file } => import(&load_config()?, file).await,
        FleetCommand::Nodes => nodes(&load_config()?, inventory_override).await,
        FleetCommand::Hosts => hosts(&load_config()?, inventory_override).await,
        FleetCommand::Generate { output } => generate(output).await,
    }
}

async fn import(config: &NetServaConfig, file: PathBuf) -> Result<()> {
    let inventory = FleetInventory::from_yaml_file(&file)?;

    // Parents may already exist in the store or the configured inventory
    let context = FleetContext::new(config, None, Arc::new(TracingDiagnostics)).await?;
    let summary = inventory
        .load_into(context.repository())
        .await
        .with_context(|| format!("Failed to import {:?}", file))?;

    print_summary(&summary);
    if !context.is_persistent() {
        println!(
            "{}",
            "Note: in-memory fleet store, nothing was persisted. \
             Configure the postgres backend to keep imports."
                .yellow()
        );
    }
    Ok(())
}

fn print_summary(summary: &InventorySummary) {
    println!("{}", format!("✓ Imported {} entities", summary.created()).green());
    println!("  Venues: {}", summary.venues);
    println!("  Sites:  {}", summary.sites);
    println!("  Nodes:  {}", summary.nodes);
    println!("  Hosts:  {}", summary.hosts);
    if summary.existing > 0 {
        println!("  {}", format!("Already present: {}", summary.existing).dimmed());
    }
}

async fn nodes(config: &NetServaConfig, inventory_override: Option<PathBuf>) -> Result<()> {
    let context =
        FleetContext::new(config, inventory_override, Arc::new(TracingDiagnostics)).await?;
    let nodes = context.repository().list_nodes().await?;

    if nodes.is_empty() {
        println!("{}", "No nodes found".yellow());
        return Ok(());
    }

    println!("{:<30} {}", "NAME".bold(), "ID".bold());
    for node in &nodes {
        if node.follows_naming_convention() {
            println!("{:<30} {}", node.name, node.id);
        } else {
            println!(
                "{:<30} {} {}",
                node.name,
                node.id,
                "(contains '.', resolves as a host)".dimmed()
            );
        }
    }
    Ok(())
}

async fn hosts(config: &NetServaConfig, inventory_override: Option<PathBuf>) -> Result<()> {
    let context =
        FleetContext::new(config, inventory_override, Arc::new(TracingDiagnostics)).await?;
    let repository = context.repository();

    let node_names: HashMap<NodeId, String> = repository
        .list_nodes()
        .await?
        .into_iter()
        .map(|n| (n.id, n.name))
        .collect();
    let hosts = repository.list_hosts().await?;

    if hosts.is_empty() {
        println!("{}", "No hosts found".yellow());
        return Ok(());
    }

    println!(
        "{:<30} {:<30} {:<15} {}",
        "DOMAIN".bold(),
        "FQDN".bold(),
        "NODE".bold(),
        "ID".bold()
    );
    for host in &hosts {
        println!(
            "{:<30} {:<30} {:<15} {}",
            host.domain,
            host.fqdn.as_deref().unwrap_or("-"),
            node_names.get(&host.node_id).map(String::as_str).unwrap_or("?"),
            host.id
        );
    }
    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    std::fs::write(&output, SAMPLE_INVENTORY)
        .with_context(|| format!("Failed to write inventory to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Fleet inventory generated: {}", output.display()).green()
    );

    Ok(())
}
