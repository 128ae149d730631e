// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fleet Inventory Loader
//!
//! Parses a YAML fleet inventory and saves it into a `FleetRepository`.
//! Parents are referenced by name and may live either in the same document
//! or already in the store:
//!
//! ```yaml
//! venues:
//!   - name: home
//!     label: Home Office
//! sites:
//!   - name: mgo
//!     venue: home
//! nodes:
//!   - name: markc
//!     site: mgo
//! hosts:
//!   - domain: example.com
//!     fqdn: mail.example.com
//!     node: markc
//! ```
//!
//! Duplicate names and dangling parent references are rejected before
//! anything is written. The saves themselves are not transactional: a store
//! failure part-way through leaves the entities saved so far in place.
//! Entities that already exist (same name, or same domain on the same node
//! for hosts) are left untouched, so importing the same file again is a
//! no-op and re-running a failed import completes it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::fleet::{Host, Node, NodeId, Site, SiteId, Venue, VenueId};
use crate::domain::repository::{FleetRepository, RepositoryError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetInventory {
    #[serde(default)]
    pub venues: Vec<VenueEntry>,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueEntry {
    pub name: String,
    /// Defaults to the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteEntry {
    pub name: String,
    pub venue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    pub site: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    pub node: String,
}

/// Counts of entities written by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    pub venues: usize,
    pub sites: usize,
    pub nodes: usize,
    pub hosts: usize,
    /// Entries that were already present in the store
    pub existing: usize,
}

impl InventorySummary {
    pub fn created(&self) -> usize {
        self.venues + self.sites + self.nodes + self.hosts
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to read inventory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse inventory: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Duplicate {kind} '{name}' in inventory")]
    Duplicate { kind: &'static str, name: String },

    #[error("Site '{site}' references unknown venue '{venue}'")]
    UnknownVenue { site: String, venue: String },

    #[error("Node '{node}' references unknown site '{site}'")]
    UnknownSite { node: String, site: String },

    #[error("Host '{host}' references unknown node '{node}'")]
    UnknownNode { host: String, node: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn check_unique(
    kind: &'static str,
    names: impl IntoIterator<Item = String>,
) -> Result<(), InventoryError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(InventoryError::Duplicate { kind, name });
        }
    }
    Ok(())
}

impl FleetInventory {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, InventoryError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
            && self.sites.is_empty()
            && self.nodes.is_empty()
            && self.hosts.is_empty()
    }

    /// Warn about entries owner resolution will not be able to reach by name
    fn warn_on_naming(&self) {
        for node in self.nodes.iter().filter(|n| n.name.contains('.')) {
            warn!(
                node = %node.name,
                "Node name contains '.', it will be looked up as a host domain"
            );
        }
        for host in self.hosts.iter().filter(|h| !h.domain.contains('.')) {
            warn!(
                domain = %host.domain,
                "Host domain contains no '.', it will be looked up as a node name"
            );
        }
    }

    /// Duplicate names and dangling parent references, checked before writing
    async fn validate(&self, repository: &dyn FleetRepository) -> Result<(), InventoryError> {
        check_unique("venue", self.venues.iter().map(|v| v.name.clone()))?;
        check_unique("site", self.sites.iter().map(|s| s.name.clone()))?;
        check_unique("node", self.nodes.iter().map(|n| n.name.clone()))?;
        check_unique("host", self.hosts.iter().map(|h| format!("{}/{}", h.node, h.domain)))?;

        let venues: HashSet<&str> = self.venues.iter().map(|v| v.name.as_str()).collect();
        for site in &self.sites {
            if !venues.contains(site.venue.as_str())
                && repository.find_venue_by_name(&site.venue).await?.is_none()
            {
                return Err(InventoryError::UnknownVenue {
                    site: site.name.clone(),
                    venue: site.venue.clone(),
                });
            }
        }

        let sites: HashSet<&str> = self.sites.iter().map(|s| s.name.as_str()).collect();
        for node in &self.nodes {
            if !sites.contains(node.site.as_str())
                && repository.find_site_by_name(&node.site).await?.is_none()
            {
                return Err(InventoryError::UnknownSite {
                    node: node.name.clone(),
                    site: node.site.clone(),
                });
            }
        }

        let nodes: HashSet<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();
        for host in &self.hosts {
            if !nodes.contains(host.node.as_str())
                && repository.find_node_by_name(&host.node).await?.is_none()
            {
                return Err(InventoryError::UnknownNode {
                    host: host.domain.clone(),
                    node: host.node.clone(),
                });
            }
        }

        Ok(())
    }

    /// Save every entry into `repository`, parents first
    pub async fn load_into(
        &self,
        repository: &dyn FleetRepository,
    ) -> Result<InventorySummary, InventoryError> {
        self.validate(repository).await?;
        self.warn_on_naming();

        let mut summary = InventorySummary::default();

        let mut venue_ids: HashMap<&str, VenueId> = HashMap::new();
        for entry in &self.venues {
            let id = match repository.find_venue_by_name(&entry.name).await? {
                Some(existing) => {
                    summary.existing += 1;
                    existing.id
                }
                None => {
                    let label = entry.label.clone().unwrap_or_else(|| entry.name.clone());
                    let venue = Venue::new(entry.name.clone(), label);
                    repository.save_venue(&venue).await?;
                    summary.venues += 1;
                    venue.id
                }
            };
            venue_ids.insert(entry.name.as_str(), id);
        }

        let mut site_ids: HashMap<&str, SiteId> = HashMap::new();
        for entry in &self.sites {
            let id = match repository.find_site_by_name(&entry.name).await? {
                Some(existing) => {
                    summary.existing += 1;
                    existing.id
                }
                None => {
                    let venue_id = match venue_ids.get(entry.venue.as_str()) {
                        Some(id) => *id,
                        None => repository
                            .find_venue_by_name(&entry.venue)
                            .await?
                            .map(|v| v.id)
                            .ok_or_else(|| InventoryError::UnknownVenue {
                                site: entry.name.clone(),
                                venue: entry.venue.clone(),
                            })?,
                    };
                    let label = entry.label.clone().unwrap_or_else(|| entry.name.clone());
                    let site = Site::new(venue_id, entry.name.clone(), label);
                    repository.save_site(&site).await?;
                    summary.sites += 1;
                    site.id
                }
            };
            site_ids.insert(entry.name.as_str(), id);
        }

        let mut node_ids: HashMap<&str, NodeId> = HashMap::new();
        for entry in &self.nodes {
            let id = match repository.find_node_by_name(&entry.name).await? {
                Some(existing) => {
                    summary.existing += 1;
                    existing.id
                }
                None => {
                    let site_id = match site_ids.get(entry.site.as_str()) {
                        Some(id) => *id,
                        None => repository
                            .find_site_by_name(&entry.site)
                            .await?
                            .map(|s| s.id)
                            .ok_or_else(|| InventoryError::UnknownSite {
                                node: entry.name.clone(),
                                site: entry.site.clone(),
                            })?,
                    };
                    let node = Node::new(site_id, entry.name.clone());
                    repository.save_node(&node).await?;
                    summary.nodes += 1;
                    node.id
                }
            };
            node_ids.insert(entry.name.as_str(), id);
        }

        for entry in &self.hosts {
            let existing = repository
                .find_hosts_by_domain_or_fqdn_on_node(&entry.domain, &entry.node)
                .await?;
            if existing.iter().any(|h| h.domain == entry.domain) {
                summary.existing += 1;
                continue;
            }

            let node_id = match node_ids.get(entry.node.as_str()) {
                Some(id) => *id,
                None => repository
                    .find_node_by_name(&entry.node)
                    .await?
                    .map(|n| n.id)
                    .ok_or_else(|| InventoryError::UnknownNode {
                        host: entry.domain.clone(),
                        node: entry.node.clone(),
                    })?,
            };
            let host = Host::new(node_id, entry.domain.clone(), entry.fqdn.clone());
            repository.save_host(&host).await?;
            summary.hosts += 1;
        }

        info!(
            venues = summary.venues,
            sites = summary.sites,
            nodes = summary.nodes,
            hosts = summary.hosts,
            existing = summary.existing,
            "Fleet inventory loaded"
        );
        Ok(summary)
    }
}
