//! Engine configuration
//!
//! Loaded from YAML (`from_file` / `from_yaml`) or from environment variables
//! (`from_env`, which also reads a `.env` file when present). Every field has
//! a default, so an empty document is a valid configuration.

use crate::catalog::CatalogQuery;
use crate::error::{AclError, Result};
use serde::Deserialize;

pub const ENV_CATALOG_URL: &str = "ACL_CATALOG_URL";
pub const ENV_CATALOG_TIMEOUT_SECS: &str = "ACL_CATALOG_TIMEOUT_SECS";
pub const ENV_CATALOG_PAGE_LIMIT: &str = "ACL_CATALOG_PAGE_LIMIT";
pub const ENV_CATALOG_TYPES: &str = "ACL_CATALOG_TYPES";
pub const ENV_CATALOG_FIRST_PARTY: &str = "ACL_CATALOG_FIRST_PARTY";
pub const ENV_ENVIRONMENTS: &str = "ACL_ENVIRONMENTS";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    pub catalog: CatalogConfig,
    /// Environments every projection renders, in addition to those stored.
    pub environments: Vec<String>,
}

/// Catalog service connection and listing parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Page size of a listing call.
    pub page_limit: usize,
    /// Service types to list; empty means all.
    pub types: Vec<String>,
    /// Use the first-party-only listing.
    pub first_party_only: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            page_limit: 1000,
            types: Vec::new(),
            first_party_only: false,
        }
    }
}

impl CatalogConfig {
    /// The listing query this configuration describes.
    pub fn query(&self) -> CatalogQuery {
        CatalogQuery {
            types: self.types.clone(),
            start: 0,
            limit: self.page_limit,
            first_party_only: self.first_party_only,
        }
    }
}

impl AclConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AclError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| AclError::Config(e.to_string()))
    }

    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup, defaulting absent keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_CATALOG_URL) {
            config.catalog.base_url = url;
        }
        if let Some(secs) = lookup(ENV_CATALOG_TIMEOUT_SECS) {
            config.catalog.timeout_secs = parse_number(ENV_CATALOG_TIMEOUT_SECS, &secs)?;
        }
        if let Some(limit) = lookup(ENV_CATALOG_PAGE_LIMIT) {
            config.catalog.page_limit = parse_number(ENV_CATALOG_PAGE_LIMIT, &limit)?;
        }
        if let Some(types) = lookup(ENV_CATALOG_TYPES) {
            config.catalog.types = split_list(&types);
        }
        if let Some(flag) = lookup(ENV_CATALOG_FIRST_PARTY) {
            config.catalog.first_party_only = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }
        if let Some(envs) = lookup(ENV_ENVIRONMENTS) {
            config.environments = split_list(&envs);
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AclError::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
