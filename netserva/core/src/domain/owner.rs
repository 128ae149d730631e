// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Owner References
//!
//! Credential (VPass) commands are scoped to a single fleet entity, the
//! *owner*. [`OwnerEntity`] is the closed set of entities that can own
//! credentials; display helpers match on it exhaustively so adding a kind is
//! a compile-time change.
//!
//! Resolution failures are values ([`ResolveError`]), never panics. Store
//! failures travel in their own variant so callers can tell "nothing matched"
//! apart from "the store is down".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::fleet::{Host, Node, Site, Venue};
use crate::domain::repository::RepositoryError;

/// Kind of fleet entity an owner reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Node,
    Host,
    Site,
    Venue,
}

impl OwnerKind {
    pub fn label(&self) -> &'static str {
        match self {
            OwnerKind::Host => "VHost",
            OwnerKind::Node => "VNode",
            OwnerKind::Site => "VSite",
            OwnerKind::Venue => "Venue",
        }
    }

    /// Lowercase identifier used in metrics labels and CLI flags
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Host => "vhost",
            OwnerKind::Node => "vnode",
            OwnerKind::Site => "vsite",
            OwnerKind::Venue => "venue",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vnode" | "node" => Ok(OwnerKind::Node),
            "vhost" | "host" => Ok(OwnerKind::Host),
            "vsite" | "site" => Ok(OwnerKind::Site),
            "venue" => Ok(OwnerKind::Venue),
            other => Err(format!(
                "unknown owner kind '{}', expected one of: vnode, vhost, vsite, venue",
                other
            )),
        }
    }
}

/// A resolved credential owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity", rename_all = "lowercase")]
pub enum OwnerEntity {
    Node(Node),
    Host(Host),
    Site(Site),
    Venue(Venue),
}

impl OwnerEntity {
    pub fn kind(&self) -> OwnerKind {
        match self {
            OwnerEntity::Node(_) => OwnerKind::Node,
            OwnerEntity::Host(_) => OwnerKind::Host,
            OwnerEntity::Site(_) => OwnerKind::Site,
            OwnerEntity::Venue(_) => OwnerKind::Venue,
        }
    }

    /// "VHost", "VNode", "VSite" or "Venue"
    pub fn type_label(&self) -> &'static str {
        self.kind().label()
    }

    /// Human-readable scope for command output.
    ///
    /// `name` and `domain` are the tokens the user typed. Hosts and nodes echo
    /// them back; sites and venues are prefixed with their kind because they
    /// are never produced by name inference.
    pub fn context(&self, name: &str, domain: Option<&str>) -> String {
        match self {
            OwnerEntity::Host(_) => match domain.filter(|d| !d.is_empty()) {
                Some(domain) => format!("{}/{}", name, domain),
                None => name.to_string(),
            },
            OwnerEntity::Node(_) => name.to_string(),
            OwnerEntity::Site(site) => format!("vsite:{}", site.name),
            OwnerEntity::Venue(venue) => format!("venue:{}", venue.name),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            OwnerEntity::Node(node) => node.id.0,
            OwnerEntity::Host(host) => host.id.0,
            OwnerEntity::Site(site) => site.id.0,
            OwnerEntity::Venue(venue) => venue.id.0,
        }
    }

    /// Name of the entity itself (the domain for hosts)
    pub fn display_name(&self) -> &str {
        match self {
            OwnerEntity::Node(node) => &node.name,
            OwnerEntity::Host(host) => &host.domain,
            OwnerEntity::Site(site) => &site.name,
            OwnerEntity::Venue(venue) => &venue.name,
        }
    }
}

/// How to settle a host lookup that matches more than one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Report every candidate and resolve nothing
    #[default]
    Strict,
    /// Pick the smallest candidate by (domain, fqdn, id)
    FirstMatch,
}

impl FromStr for AmbiguityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(AmbiguityPolicy::Strict),
            "first_match" | "first" => Ok(AmbiguityPolicy::FirstMatch),
            other => Err(format!(
                "unknown ambiguity policy '{}', expected 'strict' or 'first_match'",
                other
            )),
        }
    }
}

/// Nothing in the fleet matched the owner input.
///
/// The message of each variant is user-facing and kept stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnerNotFound {
    #[error("No owner name given")]
    MissingName,

    #[error("Host {domain} not found on node {name}")]
    HostOnNode { name: String, domain: String },

    #[error("Host not found: {name}")]
    Host { name: String },

    #[error("Node not found: {name}")]
    Node { name: String },

    #[error("VSite not found: {name}")]
    Site { name: String },

    #[error("Venue not found: {name}")]
    Venue { name: String },
}

impl OwnerNotFound {
    /// The name the caller attempted, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            OwnerNotFound::MissingName => None,
            OwnerNotFound::HostOnNode { name, .. }
            | OwnerNotFound::Host { name }
            | OwnerNotFound::Node { name }
            | OwnerNotFound::Site { name }
            | OwnerNotFound::Venue { name } => Some(name),
        }
    }

    pub fn domain(&self) -> Option<&str> {
        match self {
            OwnerNotFound::HostOnNode { domain, .. } => Some(domain),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    NotFound(#[from] OwnerNotFound),

    #[error("Multiple hosts match {value}: {}", .candidates.join(", "))]
    Ambiguous { value: String, candidates: Vec<String> },

    #[error("Fleet store error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ResolveError {
    /// Not-found and ambiguous outcomes are user errors; store failures are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ResolveError::Repository(_))
    }
}
