//! API catalog access.
//!
//! The catalog service is an external collaborator. This module defines the
//! `CatalogSource` seam, an HTTP implementation and an in-memory one, and
//! the per-request [`CatalogIndex`] the engines read from.

pub mod client;
pub mod index;

pub use client::HttpCatalogClient;
pub use index::{ApiGroup, CatalogIndex, IndexedService, IndexedVersion, Pagination, ServiceGroupIndex};

use crate::error::Result;
use acl_types::CatalogService;
use async_trait::async_trait;

/// Parameters of a `listAllApis` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Service types to list; empty means all.
    pub types: Vec<String>,
    pub start: usize,
    pub limit: usize,
    /// Restrict the listing to first-party services.
    pub first_party_only: bool,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            start: 0,
            limit: 1000,
            first_party_only: false,
        }
    }
}

/// Source of catalog records.
///
/// Implementations must be Send + Sync for use in async contexts. A failed
/// listing is reported as a single `UpstreamCatalog` error; partial results
/// are never returned.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_all_apis(&self, query: &CatalogQuery) -> Result<Vec<CatalogService>>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    services: Vec<CatalogService>,
    first_party: Option<Vec<String>>,
}

impl StaticCatalog {
    pub fn new(services: Vec<CatalogService>) -> Self {
        Self {
            services,
            first_party: None,
        }
    }

    /// Names of the services returned by first-party-only queries.
    /// Without this, first-party queries see every service.
    pub fn with_first_party(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.first_party = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_all_apis(&self, query: &CatalogQuery) -> Result<Vec<CatalogService>> {
        let services = self
            .services
            .iter()
            .filter(|s| query.types.is_empty() || query.types.contains(&s.group))
            .filter(|s| match (&self.first_party, query.first_party_only) {
                (Some(names), true) => names.contains(&s.name),
                _ => true,
            })
            .skip(query.start)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(services)
    }
}
