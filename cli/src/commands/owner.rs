// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Owner resolution commands
//!
//! Commands: resolve

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use netserva_core::domain::config::NetServaConfig;
use netserva_core::domain::owner::{AmbiguityPolicy, OwnerEntity, OwnerKind};

use crate::console::ConsoleDiagnostics;
use crate::fleet_context::FleetContext;

#[derive(Subcommand)]
pub enum OwnerCommand {
    /// Resolve a node name, host domain, or node + domain pair
    Resolve {
        /// Node name, or host domain/fqdn when it contains a '.'
        #[arg(value_name = "NAME")]
        name: String,

        /// Host domain or fqdn on node NAME
        #[arg(value_name = "DOMAIN")]
        domain: Option<String>,

        /// Resolve as this kind instead of inferring it (vnode, vhost, vsite, venue)
        #[arg(long, value_name = "KIND")]
        kind: Option<OwnerKind>,

        /// How to settle several matching hosts (strict, first_match)
        #[arg(long, value_name = "POLICY")]
        ambiguity: Option<AmbiguityPolicy>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(
    command: OwnerCommand,
    config_override: Option<PathBuf>,
    inventory_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        OwnerCommand::Resolve {
            name,
            domain,
            kind,
            ambiguity,
            json,
        } => {
            let mut config = NetServaConfig::load_or_default(config_override)
                .context("Failed to load configuration")?;
            if let Some(policy) = ambiguity {
                config.spec.resolver.ambiguity = policy;
            }

            let diagnostics = Arc::new(ConsoleDiagnostics::stderr());
            let context = FleetContext::new(&config, inventory_override, diagnostics).await?;

            let resolved = match kind {
                Some(kind) => {
                    context
                        .resolver()
                        .resolve_as_or_report(kind, Some(name.as_str()), domain.as_deref())
                        .await
                }
                None => {
                    context
                        .resolver()
                        .resolve_or_report(Some(name.as_str()), domain.as_deref())
                        .await
                }
            }
            .context("Fleet store query failed")?;

            // The failure has already been printed
            let Some(owner) = resolved else {
                std::process::exit(1);
            };

            let report = OwnerReport::new(&owner, &name, domain.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_owner(&report);
            }
            Ok(())
        }
    }
}

/// What `owner resolve` prints for a resolved owner
#[derive(Debug, Serialize)]
pub struct OwnerReport<'a> {
    #[serde(rename = "type")]
    pub type_label: &'static str,
    pub context: String,
    pub id: uuid::Uuid,
    pub owner: &'a OwnerEntity,
}

impl<'a> OwnerReport<'a> {
    pub fn new(owner: &'a OwnerEntity, name: &str, domain: Option<&str>) -> Self {
        Self {
            type_label: owner.type_label(),
            context: owner.context(name, domain),
            id: owner.id(),
            owner,
        }
    }
}

fn print_owner(report: &OwnerReport<'_>) {
    println!("{} {}", report.type_label.bold(), report.context.cyan());
    println!("  ID:   {}", report.id);
    println!("  Name: {}", report.owner.display_name());
    if let OwnerEntity::Host(host) = report.owner {
        if let Some(fqdn) = &host.fqdn {
            println!("  FQDN: {}", fqdn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netserva_core::domain::fleet::{Host, Node, NodeId, SiteId};

    #[test]
    fn test_report_for_host_pair() {
        let owner = OwnerEntity::Host(Host::new(NodeId::new(), "example.com", None));
        let report = OwnerReport::new(&owner, "markc", Some("example.com"));
        assert_eq!(report.type_label, "VHost");
        assert_eq!(report.context, "markc/example.com");
        assert_eq!(report.id, owner.id());
    }

    #[test]
    fn test_report_json_shape() {
        let owner = OwnerEntity::Node(Node::new(SiteId::new(), "markc"));
        let report = OwnerReport::new(&owner, "markc", None);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "VNode");
        assert_eq!(value["context"], "markc");
        assert_eq!(value["owner"]["type"], "node");
        assert_eq!(value["owner"]["entity"]["name"], "markc");
    }
}
