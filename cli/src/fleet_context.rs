// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fleet wiring for CLI commands
//!
//! Builds the configured fleet store and the owner resolver in-process.
//! For the in-memory backend the fleet inventory is loaded on every
//! invocation; a PostgreSQL store is used as it is.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use netserva_core::{
    application::{
        diagnostics::DiagnosticSink, owner_resolver::StandardOwnerResolver,
        repository_factory::create_fleet_repository,
    },
    domain::{config::NetServaConfig, repository::FleetRepository, repository::StorageBackend},
    infrastructure::FleetInventory,
};

pub struct FleetContext {
    repository: Arc<dyn FleetRepository>,
    resolver: StandardOwnerResolver,
    persistent: bool,
}

impl FleetContext {
    pub async fn new(
        config: &NetServaConfig,
        inventory_override: Option<PathBuf>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        config
            .validate()
            .context("Configuration validation failed")?;

        let backend = config.storage_backend()?;
        let persistent = matches!(backend, StorageBackend::PostgreSQL(_));
        let repository = create_fleet_repository(&backend).await?;

        let inventory = inventory_override.or_else(|| config.spec.inventory.clone());
        match (&inventory, persistent) {
            (Some(path), false) => {
                load_inventory(repository.as_ref(), path).await?;
            }
            (Some(path), true) => {
                debug!(
                    ?path,
                    "Inventory ignored for PostgreSQL store, use `netserva fleet import`"
                );
            }
            (None, false) => {
                warn!("No fleet inventory configured, the in-memory fleet store is empty");
            }
            (None, true) => {}
        }

        let resolver = StandardOwnerResolver::new(
            repository.clone(),
            config.spec.resolver.ambiguity,
            diagnostics,
        );

        Ok(Self {
            repository,
            resolver,
            persistent,
        })
    }

    pub fn repository(&self) -> &dyn FleetRepository {
        self.repository.as_ref()
    }

    pub fn resolver(&self) -> &StandardOwnerResolver {
        &self.resolver
    }

    /// Whether writes outlive this process
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}

async fn load_inventory(repository: &dyn FleetRepository, path: &Path) -> Result<()> {
    let inventory = FleetInventory::from_yaml_file(path)?;
    inventory
        .load_into(repository)
        .await
        .with_context(|| format!("Failed to load fleet inventory {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netserva_core::application::diagnostics::TracingDiagnostics;
    use netserva_core::application::owner_resolver::ResolveOwnerUseCase;
    use std::io::Write;

    #[tokio::test]
    async fn test_in_memory_store_loads_inventory() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
venues:
  - name: home
sites:
  - name: mgo
    venue: home
nodes:
  - name: markc
    site: mgo
hosts:
  - domain: example.com
    node: markc
"#,
        )
        .unwrap();

        let context = FleetContext::new(
            &NetServaConfig::default(),
            Some(file.path().to_path_buf()),
            Arc::new(TracingDiagnostics),
        )
        .await
        .unwrap();

        assert!(!context.is_persistent());
        assert_eq!(context.repository().list_hosts().await.unwrap().len(), 1);

        let owner = context.resolver().resolve(Some("example.com"), None).await.unwrap();
        assert_eq!(owner.type_label(), "VHost");
    }

    #[tokio::test]
    async fn test_empty_store_without_inventory() {
        let context =
            FleetContext::new(&NetServaConfig::default(), None, Arc::new(TracingDiagnostics))
                .await
                .unwrap();
        assert!(context.repository().list_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inventory_file_is_an_error() {
        let result = FleetContext::new(
            &NetServaConfig::default(),
            Some(PathBuf::from("/nonexistent/fleet.yaml")),
            Arc::new(TracingDiagnostics),
        )
        .await;
        assert!(result.is_err());
    }
}
