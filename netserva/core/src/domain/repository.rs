// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the fleet hierarchy. The interface lives in the
//! domain layer and is implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregates | Implementations |
//! |-------|-----------|----------------|
//! | `FleetRepository` | `Venue`, `Site`, `Node`, `Host` | `InMemoryFleetRepository`, `PostgresFleetRepository` |
//!
//! Host lookups return every matching row instead of the first one, so the
//! owner resolver can tell a unique match from an ambiguous one.

use async_trait::async_trait;
use crate::domain::fleet::{Host, Node, Site, Venue};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Repository interface for the fleet hierarchy
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Hosts whose domain or fqdn equals `value` and whose node is named `node_name`
    async fn find_hosts_by_domain_or_fqdn_on_node(
        &self,
        value: &str,
        node_name: &str,
    ) -> Result<Vec<Host>, RepositoryError>;

    /// Hosts whose domain or fqdn equals `value`
    async fn find_hosts_by_domain_or_fqdn(&self, value: &str) -> Result<Vec<Host>, RepositoryError>;

    /// Find node by name
    async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>, RepositoryError>;

    /// Find site by name
    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>, RepositoryError>;

    /// Find venue by name
    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, RepositoryError>;

    /// Save venue (create or update)
    async fn save_venue(&self, venue: &Venue) -> Result<(), RepositoryError>;

    /// Save site (create or update)
    async fn save_site(&self, site: &Site) -> Result<(), RepositoryError>;

    /// Save node (create or update)
    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError>;

    /// Save host (create or update)
    async fn save_host(&self, host: &Host) -> Result<(), RepositoryError>;

    /// List all nodes ordered by name
    async fn list_nodes(&self) -> Result<Vec<Node>, RepositoryError>;

    /// List all hosts ordered by domain
    async fn list_hosts(&self) -> Result<Vec<Host>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}
