// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// NetServa Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - Which fleet store to use (in-memory inventory or PostgreSQL)
// - How the owner resolver settles ambiguous host lookups
// - Where the fleet inventory file lives
// - Logging settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::owner::AmbiguityPolicy;
use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "netserva.io/v1";
pub const KIND: &str = "NetServaConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetServaConfig {
    /// API version (must be "netserva.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "NetServaConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: NetServaConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable name of this installation
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetServaConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Fleet inventory YAML loaded at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// PostgreSQL connection string (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::InMemory,
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for NetServaConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "netserva".to_string(),
                version: None,
                labels: None,
            },
            spec: NetServaConfigSpec::default(),
        }
    }
}

impl NetServaConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. NETSERVA_CONFIG_PATH environment variable
    /// 2. ./netserva-config.yaml (working directory)
    /// 3. ~/.netserva/config.yaml (user home)
    /// 4. /etc/netserva/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("NETSERVA_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./netserva-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".netserva").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/netserva/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NETSERVA_DATABASE_URL") {
            tracing::info!("Environment override: NETSERVA_DATABASE_URL (backend=postgres)");
            self.spec.storage.backend = StorageKind::Postgres;
            self.spec.storage.database_url = Some(url);
        }

        if let Ok(val) = std::env::var("NETSERVA_RESOLVER_AMBIGUITY") {
            match val.parse::<AmbiguityPolicy>() {
                Ok(policy) => {
                    tracing::info!(
                        "Environment override: NETSERVA_RESOLVER_AMBIGUITY={:?}",
                        policy
                    );
                    self.spec.resolver.ambiguity = policy;
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid value for NETSERVA_RESOLVER_AMBIGUITY: {}. Ignoring.",
                        e
                    );
                }
            }
        }
    }

    /// Database URL with "env:VAR_NAME" indirection expanded
    pub fn database_url(&self) -> anyhow::Result<Option<String>> {
        match self.spec.storage.database_url.as_deref() {
            None => Ok(None),
            Some(value) => match value.strip_prefix("env:") {
                Some(var) => std::env::var(var)
                    .map(Some)
                    .map_err(|_| {
                        anyhow::anyhow!(
                            "Environment variable '{}' referenced by storage.database_url is not set",
                            var
                        )
                    }),
                None => Ok(Some(value.to_string())),
            },
        }
    }

    /// Storage backend selected by this configuration
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.storage.backend {
            StorageKind::InMemory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let connection_string = self
                    .database_url()?
                    .ok_or_else(|| {
                        anyhow::anyhow!("storage.database_url is required for the postgres backend")
                    })?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string,
                    max_connections: self.spec.storage.max_connections,
                }))
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let storage = &self.spec.storage;
        if storage.backend == StorageKind::Postgres {
            match storage.database_url.as_deref() {
                None | Some("") => {
                    anyhow::bail!("storage.database_url is required for the postgres backend")
                }
                _ => {}
            }
        }

        if storage.max_connections == 0 {
            anyhow::bail!("storage.max_connections must be at least 1");
        }

        match self.spec.observability.log_format.as_str() {
            "compact" | "json" => {}
            other => anyhow::bail!(
                "Invalid observability.log_format '{}'. Must be 'compact' or 'json'",
                other
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NetServaConfig::default();
        assert_eq!(config.api_version, "netserva.io/v1");
        assert_eq!(config.kind, "NetServaConfig");
        assert_eq!(config.spec.storage.backend, StorageKind::InMemory);
        assert_eq!(config.spec.resolver.ambiguity, AmbiguityPolicy::Strict);
        assert!(config.validate().is_ok());
        assert_eq!(config.storage_backend().unwrap(), StorageBackend::InMemory);
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
apiVersion: netserva.io/v1
kind: NetServaConfig
metadata:
  name: lab
spec:
  resolver:
    ambiguity: first_match
  inventory: ./fleet.yaml
"#;
        let config = NetServaConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.metadata.name, "lab");
        assert_eq!(config.spec.resolver.ambiguity, AmbiguityPolicy::FirstMatch);
        assert_eq!(config.spec.inventory, Some(PathBuf::from("./fleet.yaml")));
        assert_eq!(config.spec.storage.max_connections, 5);
        assert_eq!(config.spec.observability.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend() {
        let yaml = r#"
apiVersion: netserva.io/v1
kind: NetServaConfig
metadata:
  name: prod
spec:
  storage:
    backend: postgres
    database_url: postgres://netserva@localhost/netserva
    max_connections: 10
"#;
        let config = NetServaConfig::from_yaml_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.storage_backend().unwrap(),
            StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: "postgres://netserva@localhost/netserva".to_string(),
                max_connections: 10,
            })
        );
    }

    #[test]
    fn test_validation() {
        let mut config = NetServaConfig::default();

        config.api_version = "wrong/v1".to_string();
        assert!(config.validate().is_err());
        config.api_version = API_VERSION.to_string();

        config.kind = "NodeConfig".to_string();
        assert!(config.validate().is_err());
        config.kind = KIND.to_string();

        config.metadata.name = "".to_string();
        assert!(config.validate().is_err());
        config.metadata.name = "lab".to_string();

        config.spec.storage.backend = StorageKind::Postgres;
        assert!(config.validate().is_err());
        assert!(config.storage_backend().is_err());
        config.spec.storage.database_url = Some("postgres://localhost/netserva".to_string());
        assert!(config.validate().is_ok());

        config.spec.observability.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = NetServaConfig::default().to_yaml_string().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = NetServaConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.metadata.name, "netserva");

        let missing =
            NetServaConfig::load_or_default(Some(PathBuf::from("/nonexistent/netserva.yaml")));
        assert!(missing.is_err());
    }
}
