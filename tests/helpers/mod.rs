//! Shared fixtures for the integration tests.
//!
//! The catalog holds three services:
//! - `account@1.0`: the "My account guest" group with three `get` APIs, and
//!   "My account owner" with one
//! - `multitenant@1.2` / `multitenant@2.1`: "Tenants" and "Audit" groups
//! - `billing@3.0`: "Invoices", first-party only

#![allow(dead_code)]

use acl_types::{CatalogApi, CatalogService, CatalogVersion, Package, PreviewRecord, Product};
use async_trait::async_trait;
use gateway_acl::catalog::{CatalogIndex, CatalogQuery, CatalogSource, StaticCatalog};
use gateway_acl::{AclConfig, AclError, AclService, MemoryAclStore};
use std::sync::Arc;

pub const GUEST: &str = "My account guest";
pub const OWNER: &str = "My account owner";
pub const GUEST_APIS: [&str; 3] = ["/password/forgot", "/emailToken", "/validate/changeEmail"];

pub fn catalog_services() -> Vec<CatalogService> {
    let tenants = |version: &str| CatalogVersion {
        version: version.into(),
        apis: vec![
            CatalogApi::new("Tenants", "get", "/tenants"),
            CatalogApi::new("Tenants", "post", "/tenants"),
            CatalogApi::new("Audit", "get", "/audit/log"),
        ],
    };

    vec![
        CatalogService {
            name: "account".into(),
            group: "Identity".into(),
            versions: vec![CatalogVersion {
                version: "1.0".into(),
                apis: GUEST_APIS
                    .iter()
                    .map(|path| CatalogApi::new(GUEST, "GET", *path))
                    .chain([CatalogApi::new(OWNER, "get", "/account/me")])
                    .collect(),
            }],
        },
        CatalogService {
            name: "multitenant".into(),
            group: "Platform".into(),
            versions: vec![tenants("1.2"), tenants("2.1")],
        },
        CatalogService {
            name: "billing".into(),
            group: "Finance".into(),
            versions: vec![CatalogVersion {
                version: "3.0".into(),
                apis: vec![CatalogApi::new("Invoices", "get", "/invoices")],
            }],
        },
    ]
}

pub fn catalog_index() -> CatalogIndex {
    CatalogIndex::build(catalog_services(), &CatalogQuery::default())
}

pub fn static_catalog() -> StaticCatalog {
    StaticCatalog::new(catalog_services()).with_first_party(["billing"])
}

/// API-granularity record addressing `env` only.
pub fn api_record(
    service: &str,
    version: &str,
    group: &str,
    method: &str,
    api: &str,
    env: &str,
    access: bool,
) -> PreviewRecord {
    PreviewRecord::api_level(service, version, group, method, api).with_access(env, access)
}

pub fn guest_record(api: &str, env: &str, access: bool) -> PreviewRecord {
    api_record("account", "1.0", GUEST, "get", api, env, access)
}

pub fn shop_product() -> Product {
    let mut product = Product::new("shop", "Shop");
    product.packages.push(Package::new("gold", "Gold"));
    product
}

/// Catalog source that always fails.
pub struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn list_all_apis(&self, _query: &CatalogQuery) -> gateway_acl::Result<Vec<CatalogService>> {
        Err(AclError::upstream("catalog unavailable"))
    }
}

/// A service over an in-memory store seeded with `products`.
pub async fn service_with(
    products: &[Product],
    catalog: Arc<dyn CatalogSource>,
) -> (AclService, Arc<MemoryAclStore>) {
    let store = Arc::new(MemoryAclStore::new());
    for product in products {
        store.insert_product(product).await.expect("seed product");
    }
    let service = AclService::new(store.clone(), catalog, AclConfig::default());
    (service, store)
}
