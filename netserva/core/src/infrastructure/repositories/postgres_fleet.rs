// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Fleet Repository
//!
//! Production `FleetRepository` backed by the `venues`, `sites`, `nodes` and
//! `hosts` tables (see `cli/migrations`). Requires an active `PgPool`.
//!
//! Host lookups compare `domain` and `fqdn` with plain equality and return
//! every matching row ordered by `(domain, fqdn, id)`, hosts without an fqdn
//! first.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use crate::domain::fleet::{Host, HostId, Node, NodeId, Site, SiteId, Venue, VenueId};
use crate::domain::repository::{FleetRepository, RepositoryError};

// Hosts without an fqdn sort first, matching the in-memory store
const SELECT_HOSTS_ON_NODE: &str = r#"
    SELECT h.id, h.node_id, h.domain, h.fqdn, h.created_at, h.updated_at
    FROM hosts h
    JOIN nodes n ON n.id = h.node_id
    WHERE (h.domain = $1 OR h.fqdn = $1)
      AND n.name = $2
    ORDER BY h.domain, h.fqdn NULLS FIRST, h.id
"#;

const SELECT_HOSTS_BY_VALUE: &str = r#"
    SELECT id, node_id, domain, fqdn, created_at, updated_at
    FROM hosts
    WHERE domain = $1 OR fqdn = $1
    ORDER BY domain, fqdn NULLS FIRST, id
"#;

const SELECT_ALL_HOSTS: &str = r#"
    SELECT id, node_id, domain, fqdn, created_at, updated_at
    FROM hosts
    ORDER BY domain, fqdn NULLS FIRST, id
"#;

pub struct PostgresFleetRepository {
    pool: PgPool,
}

impl PostgresFleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn venue_from_row(row: &PgRow) -> Result<Venue, RepositoryError> {
    Ok(Venue {
        id: VenueId(row.try_get("id")?),
        name: row.try_get("name")?,
        label: row.try_get("label")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn site_from_row(row: &PgRow) -> Result<Site, RepositoryError> {
    Ok(Site {
        id: SiteId(row.try_get("id")?),
        venue_id: VenueId(row.try_get("venue_id")?),
        name: row.try_get("name")?,
        label: row.try_get("label")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn node_from_row(row: &PgRow) -> Result<Node, RepositoryError> {
    Ok(Node {
        id: NodeId(row.try_get("id")?),
        site_id: SiteId(row.try_get("site_id")?),
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn host_from_row(row: &PgRow) -> Result<Host, RepositoryError> {
    Ok(Host {
        id: HostId(row.try_get("id")?),
        node_id: NodeId(row.try_get("node_id")?),
        domain: row.try_get("domain")?,
        fqdn: row.try_get("fqdn")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl FleetRepository for PostgresFleetRepository {
    async fn find_hosts_by_domain_or_fqdn_on_node(
        &self,
        value: &str,
        node_name: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        let rows = sqlx::query(SELECT_HOSTS_ON_NODE)
        .bind(value)
        .bind(node_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(host_from_row).collect()
    }

    async fn find_hosts_by_domain_or_fqdn(
        &self,
        value: &str,
    ) -> Result<Vec<Host>, RepositoryError> {
        let rows = sqlx::query(SELECT_HOSTS_BY_VALUE)
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(host_from_row).collect()
    }

    async fn find_node_by_name(&self, name: &str) -> Result<Option<Node>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, site_id, name, created_at, updated_at
            FROM nodes
            WHERE name = $1
            "#
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(node_from_row).transpose()
    }

    async fn find_site_by_name(&self, name: &str) -> Result<Option<Site>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, venue_id, name, label, created_at, updated_at
            FROM sites
            WHERE name = $1
            "#
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(site_from_row).transpose()
    }

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, label, created_at, updated_at
            FROM venues
            WHERE name = $1
            "#
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(venue_from_row).transpose()
    }

    async fn save_venue(&self, venue: &Venue) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO venues (id, name, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                label = EXCLUDED.label,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(venue.id.0)
        .bind(&venue.name)
        .bind(&venue.label)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save venue: {}", e)))?;

        Ok(())
    }

    async fn save_site(&self, site: &Site) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO sites (id, venue_id, name, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                venue_id = EXCLUDED.venue_id,
                name = EXCLUDED.name,
                label = EXCLUDED.label,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(site.id.0)
        .bind(site.venue_id.0)
        .bind(&site.name)
        .bind(&site.label)
        .bind(site.created_at)
        .bind(site.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save site: {}", e)))?;

        Ok(())
    }

    async fn save_node(&self, node: &Node) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO nodes (id, site_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                site_id = EXCLUDED.site_id,
                name = EXCLUDED.name,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(node.id.0)
        .bind(node.site_id.0)
        .bind(&node.name)
        .bind(node.created_at)
        .bind(node.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save node: {}", e)))?;

        Ok(())
    }

    async fn save_host(&self, host: &Host) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO hosts (id, node_id, domain, fqdn, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                node_id = EXCLUDED.node_id,
                domain = EXCLUDED.domain,
                fqdn = EXCLUDED.fqdn,
                updated_at = EXCLUDED.updated_at
            "#
        )
        .bind(host.id.0)
        .bind(host.node_id.0)
        .bind(&host.domain)
        .bind(&host.fqdn)
        .bind(host.created_at)
        .bind(host.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save host: {}", e)))?;

        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, site_id, name, created_at, updated_at
            FROM nodes
            ORDER BY name ASC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(node_from_row).collect()
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, RepositoryError> {
        let rows = sqlx::query(SELECT_ALL_HOSTS)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(host_from_row).collect()
    }
}
