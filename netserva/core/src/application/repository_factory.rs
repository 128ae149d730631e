// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates the concrete `FleetRepository` for the configured storage backend,
//! keeping the domain layer free of infrastructure dependencies.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select in-memory or PostgreSQL fleet storage at startup

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::repository::{FleetRepository, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_fleet::PostgresFleetRepository;
use crate::infrastructure::repositories::InMemoryFleetRepository;

/// Creates a FleetRepository implementation based on the configured backend
pub async fn create_fleet_repository(backend: &StorageBackend) -> Result<Arc<dyn FleetRepository>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryFleetRepository::new())),
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(&config.connection_string, config.max_connections)
                .await
                .context("Failed to connect to fleet database")?;
            Ok(Arc::new(PostgresFleetRepository::new(database.get_pool().clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_backend_starts_empty() {
        let repo = create_fleet_repository(&StorageBackend::InMemory).await.unwrap();
        assert!(repo.list_nodes().await.unwrap().is_empty());
        assert!(repo.find_node_by_name("markc").await.unwrap().is_none());
    }
}
