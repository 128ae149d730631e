// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Fleet Aggregates
//!
//! The infrastructure hierarchy managed by NetServa:
//!
//! | Entity | Display | Key | Parent |
//! |--------|---------|-----|--------|
//! | `Venue` | Venue | `name` | - |
//! | `Site` | VSite | `name` | `Venue` |
//! | `Node` | VNode | `name` | `Site` |
//! | `Host` | VHost | `domain` or `fqdn` | `Node` |
//!
//! Names of venues, sites and nodes never contain a `.`; host domains always
//! do. Owner resolution relies on that convention but nothing here enforces
//! it, see [`Node::follows_naming_convention`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! fleet_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

fleet_id!(
    /// Unique identifier for a venue
    VenueId
);
fleet_id!(
    /// Unique identifier for a site (VSite)
    SiteId
);
fleet_id!(
    /// Unique identifier for a node (VNode)
    NodeId
);
fleet_id!(
    /// Unique identifier for a virtual host (VHost)
    HostId
);

/// Top-level physical or organisational grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VenueId::new(),
            name: name.into(),
            label: label.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Deployment grouping within a venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub venue_id: VenueId,
    pub name: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    pub fn new(venue_id: VenueId, name: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SiteId::new(),
            venue_id,
            name: name.into(),
            label: label.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Physical or virtual server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub site_id: SiteId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(site_id: SiteId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::new(),
            site_id,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A node whose name contains a `.` can never be reached by name
    /// inference, because dotted input is always looked up as a host.
    pub fn follows_naming_convention(&self) -> bool {
        !self.name.contains('.')
    }
}

/// Which key of a [`Host`] matched a lookup value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostMatch {
    Domain,
    Fqdn,
}

/// Domain-bound virtual host owned by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub node_id: NodeId,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Host {
    pub fn new(node_id: NodeId, domain: impl Into<String>, fqdn: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: HostId::new(),
            node_id,
            domain: domain.into(),
            fqdn,
            created_at: now,
            updated_at: now,
        }
    }

    /// Domain takes precedence when both keys equal `value`.
    pub fn match_on(&self, value: &str) -> Option<HostMatch> {
        if self.domain == value {
            Some(HostMatch::Domain)
        } else if self.fqdn.as_deref() == Some(value) {
            Some(HostMatch::Fqdn)
        } else {
            None
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.match_on(value).is_some()
    }

    /// Short description used when listing ambiguous candidates
    pub fn describe(&self) -> String {
        match &self.fqdn {
            Some(fqdn) if fqdn != &self.domain => {
                format!("{} (fqdn {}, id {})", self.domain, fqdn, self.id)
            }
            _ => format!("{} (id {})", self.domain, self.id),
        }
    }
}
