// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resolve Owner Use Case
//!
//! Maps loosely-typed credential command input to the fleet entity it refers
//! to. This is the single implementation shared by every command surface.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Decide which entity `(name, domain?)` names
//! - **Collaborators:**
//!   - Domain: `OwnerEntity`, `OwnerNotFound`, `AmbiguityPolicy`
//!   - Infrastructure: `FleetRepository` (read-only), `DiagnosticSink`
//!
//! # Flow
//!
//! 1. Empty name: not found, no store query
//! 2. Domain given: host with that domain/fqdn on the node called `name`
//! 3. Dotted name: host with that domain/fqdn
//! 4. Otherwise: node called `name`
//!
//! The first applicable branch decides the outcome; a miss never falls
//! through to a later branch. Sites and venues are only reachable through
//! [`ResolveOwnerUseCase::resolve_as`].
//!
//! # Multiple host matches
//!
//! A host matching on `domain` beats hosts matching only on `fqdn`. If more
//! than one candidate is left, [`AmbiguityPolicy::Strict`] reports all of
//! them and [`AmbiguityPolicy::FirstMatch`] picks the smallest by
//! `(domain, fqdn, id)`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::diagnostics::DiagnosticSink;
use crate::domain::fleet::{Host, HostMatch};
use crate::domain::owner::{AmbiguityPolicy, OwnerEntity, OwnerKind, OwnerNotFound, ResolveError};
use crate::domain::repository::{FleetRepository, RepositoryError};

#[async_trait]
pub trait ResolveOwnerUseCase: Send + Sync {
    /// Infer the owner from a bare name or a name + domain pair
    ///
    /// # Errors
    ///
    /// - `NotFound`: nothing matched (message depends on the branch taken)
    /// - `Ambiguous`: several hosts matched under the strict policy
    /// - `Repository`: the fleet store failed
    async fn resolve(
        &self,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<OwnerEntity, ResolveError>;

    /// Resolve an owner whose kind the caller states explicitly
    async fn resolve_as(
        &self,
        kind: OwnerKind,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<OwnerEntity, ResolveError>;
}

/// Standard implementation of ResolveOwnerUseCase
pub struct StandardOwnerResolver {
    fleet_repository: Arc<dyn FleetRepository>,
    policy: AmbiguityPolicy,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl StandardOwnerResolver {
    pub fn new(
        fleet_repository: Arc<dyn FleetRepository>,
        policy: AmbiguityPolicy,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            fleet_repository,
            policy,
            diagnostics,
        }
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Like [`ResolveOwnerUseCase::resolve`], but user-facing failures go to
    /// the diagnostic sink and come back as `None`. Only store failures are
    /// returned as errors.
    pub async fn resolve_or_report(
        &self,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<Option<OwnerEntity>, RepositoryError> {
        let outcome = self.resolve(name, domain).await;
        self.report(outcome)
    }

    pub async fn resolve_as_or_report(
        &self,
        kind: OwnerKind,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<Option<OwnerEntity>, RepositoryError> {
        let outcome = self.resolve_as(kind, name, domain).await;
        self.report(outcome)
    }

    fn report(
        &self,
        outcome: Result<OwnerEntity, ResolveError>,
    ) -> Result<Option<OwnerEntity>, RepositoryError> {
        match outcome {
            Ok(owner) => Ok(Some(owner)),
            Err(ResolveError::Repository(err)) => Err(err),
            Err(failure) => {
                self.diagnostics.report(&failure);
                Ok(None)
            }
        }
    }

    async fn host_on_node(&self, name: &str, domain: &str) -> Result<OwnerEntity, ResolveError> {
        let candidates = self
            .fleet_repository
            .find_hosts_by_domain_or_fqdn_on_node(domain, name)
            .await?;

        match self.select_host(domain, candidates)? {
            Some(host) => Ok(OwnerEntity::Host(host)),
            None => Err(OwnerNotFound::HostOnNode {
                name: name.to_string(),
                domain: domain.to_string(),
            }
            .into()),
        }
    }

    async fn host_by_name(&self, name: &str) -> Result<OwnerEntity, ResolveError> {
        let candidates = self.fleet_repository.find_hosts_by_domain_or_fqdn(name).await?;

        match self.select_host(name, candidates)? {
            Some(host) => Ok(OwnerEntity::Host(host)),
            None => Err(OwnerNotFound::Host { name: name.to_string() }.into()),
        }
    }

    async fn node_by_name(&self, name: &str) -> Result<OwnerEntity, ResolveError> {
        match self.fleet_repository.find_node_by_name(name).await? {
            Some(node) => Ok(OwnerEntity::Node(node)),
            None => Err(OwnerNotFound::Node { name: name.to_string() }.into()),
        }
    }

    async fn site_by_name(&self, name: &str) -> Result<OwnerEntity, ResolveError> {
        match self.fleet_repository.find_site_by_name(name).await? {
            Some(site) => Ok(OwnerEntity::Site(site)),
            None => Err(OwnerNotFound::Site { name: name.to_string() }.into()),
        }
    }

    async fn venue_by_name(&self, name: &str) -> Result<OwnerEntity, ResolveError> {
        match self.fleet_repository.find_venue_by_name(name).await? {
            Some(venue) => Ok(OwnerEntity::Venue(venue)),
            None => Err(OwnerNotFound::Venue { name: name.to_string() }.into()),
        }
    }

    fn select_host(
        &self,
        value: &str,
        candidates: Vec<Host>,
    ) -> Result<Option<Host>, ResolveError> {
        let (by_domain, by_fqdn): (Vec<Host>, Vec<Host>) = candidates
            .into_iter()
            .filter(|host| host.matches(value))
            .partition(|host| host.match_on(value) == Some(HostMatch::Domain));

        let pool = if by_domain.is_empty() { by_fqdn } else { by_domain };
        if pool.len() <= 1 {
            return Ok(pool.into_iter().next());
        }

        match self.policy {
            AmbiguityPolicy::Strict => {
                let mut candidates: Vec<String> = pool.iter().map(Host::describe).collect();
                candidates.sort();
                Err(ResolveError::Ambiguous {
                    value: value.to_string(),
                    candidates,
                })
            }
            AmbiguityPolicy::FirstMatch => {
                let matched = pool.len();
                let picked = pool.into_iter().min_by(|a, b| {
                    (&a.domain, &a.fqdn, a.id).cmp(&(&b.domain, &b.fqdn, b.id))
                });
                if let Some(host) = &picked {
                    warn!(
                        value,
                        matched,
                        picked = %host.describe(),
                        "Multiple hosts match, using first by domain/fqdn/id"
                    );
                }
                Ok(picked)
            }
        }
    }
}

fn record(mode: &'static str, outcome: &Result<OwnerEntity, ResolveError>) {
    let result = match outcome {
        Ok(_) => "found",
        Err(ResolveError::NotFound(_)) => "not_found",
        Err(ResolveError::Ambiguous { .. }) => "ambiguous",
        Err(ResolveError::Repository(_)) => "error",
    };
    metrics::counter!(
        "netserva_owner_resolutions_total",
        "mode" => mode,
        "outcome" => result
    )
    .increment(1);
}

#[async_trait]
impl ResolveOwnerUseCase for StandardOwnerResolver {
    async fn resolve(
        &self,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<OwnerEntity, ResolveError> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            let outcome = Err(OwnerNotFound::MissingName.into());
            record("empty", &outcome);
            return outcome;
        };
        let domain = domain.filter(|d| !d.is_empty());

        let (mode, outcome) = match domain {
            Some(domain) => ("pair", self.host_on_node(name, domain).await),
            None if name.contains('.') => ("host", self.host_by_name(name).await),
            None => ("node", self.node_by_name(name).await),
        };

        record(mode, &outcome);
        if let Ok(owner) = &outcome {
            debug!(
                owner_name = name,
                ?domain,
                kind = owner.type_label(),
                id = %owner.id(),
                "Owner resolved"
            );
        }
        outcome
    }

    async fn resolve_as(
        &self,
        kind: OwnerKind,
        name: Option<&str>,
        domain: Option<&str>,
    ) -> Result<OwnerEntity, ResolveError> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            let outcome = Err(OwnerNotFound::MissingName.into());
            record("empty", &outcome);
            return outcome;
        };
        let domain = domain.filter(|d| !d.is_empty());

        let outcome = match kind {
            OwnerKind::Host => match domain {
                Some(domain) => self.host_on_node(name, domain).await,
                None => self.host_by_name(name).await,
            },
            OwnerKind::Node => self.node_by_name(name).await,
            OwnerKind::Site => self.site_by_name(name).await,
            OwnerKind::Venue => self.venue_by_name(name).await,
        };

        record("explicit", &outcome);
        if let Ok(owner) = &outcome {
            debug!(
                owner_name = name,
                ?domain,
                kind = owner.type_label(),
                id = %owner.id(),
                "Owner resolved"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::TracingDiagnostics;
    use crate::domain::fleet::{Node, NodeId, Site, SiteId, Venue};
    use crate::infrastructure::repositories::InMemoryFleetRepository;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

    fn resolver(policy: AmbiguityPolicy) -> StandardOwnerResolver {
        StandardOwnerResolver::new(
            Arc::new(InMemoryFleetRepository::new()),
            policy,
            Arc::new(TracingDiagnostics),
        )
    }

    fn host(domain: &str, fqdn: Option<&str>) -> Host {
        Host::new(NodeId::new(), domain, fqdn.map(str::to_string))
    }

    #[test]
    fn test_select_host_single_candidate() {
        let resolver = resolver(AmbiguityPolicy::Strict);
        let only = host("example.com", None);
        let picked = resolver.select_host("example.com", vec![only.clone()]).unwrap();
        assert_eq!(picked, Some(only));
        assert_eq!(resolver.select_host("example.com", vec![]).unwrap(), None);
    }

    #[test]
    fn test_select_host_domain_beats_fqdn() {
        let resolver = resolver(AmbiguityPolicy::Strict);
        let by_domain = host("a.b.c", None);
        let by_fqdn = host("b.c", Some("a.b.c"));
        let picked = resolver
            .select_host("a.b.c", vec![by_fqdn, by_domain.clone()])
            .unwrap();
        assert_eq!(picked, Some(by_domain));
    }

    #[test]
    fn test_select_host_strict_reports_all_candidates() {
        let resolver = resolver(AmbiguityPolicy::Strict);
        let first = host("one.example", Some("a.b.c"));
        let second = host("two.example", Some("a.b.c"));

        match resolver.select_host("a.b.c", vec![second.clone(), first.clone()]) {
            Err(ResolveError::Ambiguous { value, candidates }) => {
                assert_eq!(value, "a.b.c");
                assert_eq!(candidates, vec![first.describe(), second.describe()]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_select_host_first_match_is_deterministic() {
        let resolver = resolver(AmbiguityPolicy::FirstMatch);
        let first = host("one.example", Some("a.b.c"));
        let second = host("two.example", Some("a.b.c"));

        let picked = resolver
            .select_host("a.b.c", vec![second.clone(), first.clone()])
            .unwrap();
        assert_eq!(picked, Some(first.clone()));

        let picked = resolver.select_host("a.b.c", vec![first.clone(), second]).unwrap();
        assert_eq!(picked, Some(first));
    }

    #[test]
    fn test_select_host_ignores_rows_that_do_not_match() {
        let resolver = resolver(AmbiguityPolicy::Strict);
        let stray = host("other.example", None);
        assert_eq!(resolver.select_host("a.b.c", vec![stray]).unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_as_site_and_venue() {
        let repo = Arc::new(InMemoryFleetRepository::new());
        let venue = Venue::new("home", "Home Office");
        let site = Site::new(venue.id, "mgo", "MGO");
        repo.save_venue(&venue).await.unwrap();
        repo.save_site(&site).await.unwrap();

        let resolver =
            StandardOwnerResolver::new(repo, AmbiguityPolicy::Strict, Arc::new(TracingDiagnostics));

        let owner = resolver.resolve_as(OwnerKind::Site, Some("mgo"), None).await.unwrap();
        assert_eq!(owner.type_label(), "VSite");
        assert_eq!(owner.context("mgo", None), "vsite:mgo");

        let owner = resolver.resolve_as(OwnerKind::Venue, Some("home"), None).await.unwrap();
        assert_eq!(owner.context("home", None), "venue:home");

        let err = resolver.resolve_as(OwnerKind::Site, Some("nowhere"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "VSite not found: nowhere");

        // Inference never produces a site, even when one has the name
        let err = resolver.resolve(Some("mgo"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Node not found: mgo");
    }

    #[tokio::test]
    async fn test_resolve_as_host_skips_dot_heuristic() {
        let repo = Arc::new(InMemoryFleetRepository::new());
        let node = Node::new(SiteId::new(), "markc");
        repo.save_node(&node).await.unwrap();
        let resolver =
            StandardOwnerResolver::new(repo, AmbiguityPolicy::Strict, Arc::new(TracingDiagnostics));

        let err = resolver.resolve_as(OwnerKind::Host, Some("markc"), None).await.unwrap_err();
        assert_eq!(err.to_string(), "Host not found: markc");

        let owner = resolver.resolve_as(OwnerKind::Node, Some("markc"), None).await.unwrap();
        assert_eq!(owner, OwnerEntity::Node(node));
    }

    type ResolutionCount = (String, String, u64);

    fn resolution_counts(snapshotter: &Snapshotter) -> Vec<ResolutionCount> {
        let mut counts: Vec<ResolutionCount> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "netserva_owner_resolutions_total")
            .filter_map(|(key, _, _, value)| {
                let label = |name: &str| {
                    key.key()
                        .labels()
                        .find(|l| l.key() == name)
                        .map(|l| l.value().to_string())
                        .unwrap_or_default()
                };
                match value {
                    DebugValue::Counter(n) => Some((label("mode"), label("outcome"), n)),
                    _ => None,
                }
            })
            .collect();
        counts.sort();
        counts
    }

    #[test]
    fn test_each_resolution_is_counted_once_by_mode_and_outcome() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let repo = Arc::new(InMemoryFleetRepository::new());
                let node = Node::new(SiteId::new(), "markc");
                repo.save_node(&node).await.unwrap();
                for (domain, fqdn) in [
                    ("example.com", None),
                    ("one.example", Some("a.b.c")),
                    ("two.example", Some("a.b.c")),
                ] {
                    repo.save_host(&Host::new(node.id, domain, fqdn.map(str::to_string)))
                        .await
                        .unwrap();
                }
                let resolver = StandardOwnerResolver::new(
                    repo,
                    AmbiguityPolicy::Strict,
                    Arc::new(TracingDiagnostics),
                );

                assert!(resolver.resolve(None, None).await.is_err());
                assert!(resolver.resolve(Some("markc"), None).await.is_ok());
                assert!(resolver.resolve(Some("ghost"), None).await.is_err());
                assert!(resolver.resolve(Some("example.com"), None).await.is_ok());
                assert!(resolver.resolve(Some("a.b.c"), None).await.is_err());
                assert!(resolver.resolve(Some("markc"), Some("example.com")).await.is_ok());
                assert!(resolver
                    .resolve_as(OwnerKind::Site, Some("nowhere"), None)
                    .await
                    .is_err());
            });
        });

        let expected: Vec<ResolutionCount> = [
            ("empty", "not_found"),
            ("explicit", "not_found"),
            ("host", "ambiguous"),
            ("host", "found"),
            ("node", "found"),
            ("node", "not_found"),
            ("pair", "found"),
        ]
        .into_iter()
        .map(|(mode, outcome)| (mode.to_string(), outcome.to_string(), 1))
        .collect();
        assert_eq!(resolution_counts(&snapshotter), expected);
    }
}
