// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `FleetRepository` contract defined
//! in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve fleet aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresFleetRepository** - `venues`, `sites`, `nodes`, `hosts` tables
//! - **InMemoryFleetRepository** - HashMap-backed storage, populated from a
//!   fleet inventory file or by tests
//!
//! # Usage
//!
//! ```ignore
//! use sqlx::PgPool;
//! use repositories::postgres_fleet::PostgresFleetRepository;
//!
//! let pool = PgPool::connect(&database_url).await?;
//! let repo = PostgresFleetRepository::new(pool);
//!
//! let node = repo.find_node_by_name("markc").await?;
//! ```

pub mod postgres_fleet;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use async_trait::async_trait;
use crate::domain::fleet::{Host, HostId, Node, NodeId, Site, SiteId, Venue, VenueId};
use crate::domain::repository::{FleetRepository, RepositoryError};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, RepositoryError> {
    lock.read()
        .map_err(|_| RepositoryError::Unknown("fleet store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, RepositoryError> {
    lock.write()
        .map_err(|_| RepositoryError::Unknown("fleet store lock poisoned".to_string()))
}

#[derive(Clone, Default)]
pub struct InMemoryFleetRepository {
    venues: Arc<RwLock<HashMap<VenueId, Venue>>>,
    sites: Arc<RwLock<HashMap<SiteId, Site>>>,
    nodes: Arc<RwLock<HashMap<NodeId, Node>>>,
    hosts: Arc<RwLock<HashMap<HostId, Host>>>,
}

impl InMemoryFleetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ordered by (domain, fqdn, id); a missing fqdn sorts first
fn sorted_hosts(mut hosts: Vec<Host>) -> Vec<Host> {
    hosts.sort_by(|a, b| (&a.domain, &a.fqdn, a.id).cmp(&(&b.domain, &b.fqdn, b.id)));
    hosts
}

#[async_trait]
impl FleetRepository for InMemoryFleetRepository {
    async fn find_hosts_by_domain_or_fqdn_on_node(
        &self,
        value: &str,
        node_name: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        let node_ids: HashSet<NodeId> = read(&self.nodes)?
            .values()
            .filter(|n| n.name == node_name)
            .map(|n| n.id)
            .collect();

        let hosts = read(&self.hosts)?;
        Ok(sorted_hosts(
            hosts
                .values()
                .filter(|h| node_ids.contains(&h.node_id) && h.matches(value))
                .cloned()
                .collect(),
        ))
    }

    async fn find_hosts_by_domain_or_fqdn(
        &self,
        value: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        let hosts = read(&self.hosts)?;
        Ok(sorted_hosts(
            hosts.values().filter(|h| h.matches(value)).cloned().collect(),
        ))
    }

    async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>, RepositoryError> {
        let nodes = read(&self.nodes)?;
        Ok(nodes.values().find(|n| n.name == name).cloned())
    }

    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>, RepositoryError> {
        let sites = read(&self.sites)?;
        Ok(sites.values().find(|s| s.name == name).cloned())
    }

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, RepositoryError> {
        let venues = read(&self.venues)?;
        Ok(venues.values().find(|v| v.name == name).cloned())
    }

    async fn save_venue(&self, venue: &Venue) -> Result<(), RepositoryError> {
        write(&self.venues)?.insert(venue.id, venue.clone());
        Ok(())
    }

    async fn save_site(&self, site: &Site) -> Result<(), RepositoryError> {
        write(&self.sites)?.insert(site.id, site.clone());
        Ok(())
    }

    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError> {
        write(&self.nodes)?.insert(node.id, node.clone());
        Ok(())
    }

    async fn save_host(&self, host: &Host) -> Result<(), RepositoryError> {
        write(&self.hosts)?.insert(host.id, host.clone());
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, RepositoryError> {
        let mut nodes: Vec<Node> = read(&self.nodes)?.values().cloned().collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, RepositoryError> {
        let hosts: Vec<Host> = read(&self.hosts)?.values().cloned().collect();
        Ok(sorted_hosts(hosts))
    }
}
