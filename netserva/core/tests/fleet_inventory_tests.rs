// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use netserva_core::application::diagnostics::TracingDiagnostics;
use netserva_core::application::owner_resolver::{ResolveOwnerUseCase, StandardOwnerResolver};
use netserva_core::domain::fleet::{Host, Node, Site, Venue};
use netserva_core::domain::owner::{AmbiguityPolicy, OwnerKind};
use netserva_core::domain::repository::{FleetRepository, RepositoryError};
use netserva_core::infrastructure::fleet_inventory::{FleetInventory, InventoryError};
use netserva_core::infrastructure::repositories::InMemoryFleetRepository;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const INVENTORY: &str = r#"
venues:
  - name: home
    label: Home Office
sites:
  - name: mgo
    venue: home
nodes:
  - name: markc
    site: mgo
  - name: gw
    site: mgo
hosts:
  - domain: example.com
    fqdn: www.example.com
    node: markc
  - domain: mail.example.com
    node: gw
"#;

#[tokio::test]
async fn test_import_then_resolve() {
    let repo = Arc::new(InMemoryFleetRepository::new());
    let inventory = FleetInventory::from_yaml_str(INVENTORY).unwrap();

    let summary = inventory.load_into(repo.as_ref()).await.unwrap();
    assert_eq!(summary.venues, 1);
    assert_eq!(summary.sites, 1);
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.hosts, 2);
    assert_eq!(summary.existing, 0);
    assert_eq!(summary.created(), 6);

    let resolver = StandardOwnerResolver::new(
        repo.clone(),
        AmbiguityPolicy::Strict,
        Arc::new(TracingDiagnostics),
    );

    let owner = resolver.resolve(Some("gw"), Some("mail.example.com")).await.unwrap();
    assert_eq!(owner.type_label(), "VHost");
    assert_eq!(owner.context("gw", Some("mail.example.com")), "gw/mail.example.com");

    let err = resolver.resolve(Some("markc"), Some("mail.example.com")).await.unwrap_err();
    assert_eq!(err.to_string(), "Host mail.example.com not found on node markc");

    let owner = resolver.resolve_as(OwnerKind::Venue, Some("home"), None).await.unwrap();
    assert_eq!(owner.context("home", None), "venue:home");
    assert_eq!(owner.display_name(), "home");

    let label = match owner {
        netserva_core::domain::owner::OwnerEntity::Venue(venue) => venue.label,
        other => panic!("expected venue, got {:?}", other),
    };
    assert_eq!(label, "Home Office");
}

#[tokio::test]
async fn test_reimport_is_noop() {
    let repo = InMemoryFleetRepository::new();
    let inventory = FleetInventory::from_yaml_str(INVENTORY).unwrap();

    inventory.load_into(&repo).await.unwrap();
    let summary = inventory.load_into(&repo).await.unwrap();

    assert_eq!(summary.created(), 0);
    assert_eq!(summary.existing, 6);
    assert_eq!(repo.list_nodes().await.unwrap().len(), 2);
    assert_eq!(repo.list_hosts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_parents_may_already_be_stored() {
    let repo = InMemoryFleetRepository::new();
    FleetInventory::from_yaml_str(INVENTORY)
        .unwrap()
        .load_into(&repo)
        .await
        .unwrap();

    let addition = FleetInventory::from_yaml_str(
        r#"
nodes:
  - name: backup
    site: mgo
hosts:
  - domain: backup.example.com
    node: backup
  - domain: shop.example.com
    node: markc
"#,
    )
    .unwrap();

    let summary = addition.load_into(&repo).await.unwrap();
    assert_eq!(summary.nodes, 1);
    assert_eq!(summary.hosts, 2);

    let hosts = repo
        .find_hosts_by_domain_or_fqdn_on_node("shop.example.com", "markc")
        .await
        .unwrap();
    assert_eq!(hosts.len(), 1);
}

#[tokio::test]
async fn test_dangling_reference_writes_nothing() {
    let repo = InMemoryFleetRepository::new();
    let inventory = FleetInventory::from_yaml_str(
        r#"
venues:
  - name: home
sites:
  - name: mgo
    venue: home
nodes:
  - name: markc
    site: nowhere
"#,
    )
    .unwrap();

    match inventory.load_into(&repo).await {
        Err(InventoryError::UnknownSite { node, site }) => {
            assert_eq!(node, "markc");
            assert_eq!(site, "nowhere");
        }
        other => panic!("expected UnknownSite, got {:?}", other),
    }

    assert!(repo.find_venue_by_name("home").await.unwrap().is_none());
    assert!(repo.find_site_by_name("mgo").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_node_rejected() {
    let repo = InMemoryFleetRepository::new();
    let inventory = FleetInventory::from_yaml_str(
        r#"
venues:
  - name: home
sites:
  - name: mgo
    venue: home
nodes:
  - name: markc
    site: mgo
  - name: markc
    site: mgo
"#,
    )
    .unwrap();

    let err = inventory.load_into(&repo).await.unwrap_err();
    assert_eq!(err.to_string(), "Duplicate node 'markc' in inventory");
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(INVENTORY.as_bytes()).unwrap();

    let inventory = FleetInventory::from_yaml_file(file.path()).unwrap();
    assert_eq!(inventory.hosts.len(), 2);
    assert_eq!(inventory.hosts[0].fqdn.as_deref(), Some("www.example.com"));
    assert_eq!(inventory.hosts[1].fqdn, None);
}

/// In-memory store whose host saves fail while `reject_hosts` is set
#[derive(Default)]
struct HostOutageRepository {
    inner: InMemoryFleetRepository,
    reject_hosts: AtomicBool,
}

#[async_trait]
impl FleetRepository for HostOutageRepository {
    async fn find_hosts_by_domain_or_fqdn_on_node(
        &self,
        value: &str,
        node_name: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        self.inner.find_hosts_by_domain_or_fqdn_on_node(value, node_name).await
    }

    async fn find_hosts_by_domain_or_fqdn(
        &self,
        value: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        self.inner.find_hosts_by_domain_or_fqdn(value).await
    }

    async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>, RepositoryError> {
        self.inner.find_node_by_name(name).await
    }

    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>, RepositoryError> {
        self.inner.find_site_by_name(name).await
    }

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, RepositoryError> {
        self.inner.find_venue_by_name(name).await
    }

    async fn save_venue(&self, venue: &Venue) -> Result<(), RepositoryError> {
        self.inner.save_venue(venue).await
    }

    async fn save_site(&self, site: &Site) -> Result<(), RepositoryError> {
        self.inner.save_site(site).await
    }

    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError> {
        self.inner.save_node(node).await
    }

    async fn save_host(&self, host: &Host) -> Result<(), RepositoryError> {
        if self.reject_hosts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("connection reset".to_string()));
        }
        self.inner.save_host(host).await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, RepositoryError> {
        self.inner.list_nodes().await
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, RepositoryError> {
        self.inner.list_hosts().await
    }
}

#[tokio::test]
async fn test_failed_import_keeps_parents_and_rerun_completes_it() {
    let repo = HostOutageRepository::default();
    repo.reject_hosts.store(true, Ordering::SeqCst);
    let inventory = FleetInventory::from_yaml_str(INVENTORY).unwrap();

    let err = inventory.load_into(&repo).await.unwrap_err();
    assert!(matches!(err, InventoryError::Repository(RepositoryError::Database(_))));

    // Saves before the failure stay in the store
    assert!(repo.find_venue_by_name("home").await.unwrap().is_some());
    assert_eq!(repo.list_nodes().await.unwrap().len(), 2);
    assert!(repo.list_hosts().await.unwrap().is_empty());

    repo.reject_hosts.store(false, Ordering::SeqCst);
    let summary = inventory.load_into(&repo).await.unwrap();
    assert_eq!(summary.hosts, 2);
    assert_eq!(summary.existing, 4);
    assert_eq!(repo.list_hosts().await.unwrap().len(), 2);
}
