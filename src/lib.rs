//! Gateway ACL - access-control engine for an API gateway
//!
//! Manages per-environment access rules over a remote API catalog for a
//! product's scope and its package tiers.
//!
//! ## Architecture
//!
//! ```text
//! AclStore ──► key_codec (decode) ──► AclTree ─┬─► projection ──► UI fill
//!                                              ├─► preview::diff ──► records
//! CatalogSource ──► CatalogIndex ──────────────┘         │ (edited)
//!                                                        ▼
//! AclStore ◄── key_codec (encode) ◄── AclTree ◄── preview::apply
//! ```
//!
//! The engines are synchronous pure functions over an explicit tree and
//! catalog index. Only the catalog fetch and the store boundary are async.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_acl::{AclConfig, AclService, HttpCatalogClient, MemoryAclStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> gateway_acl::Result<()> {
//! let config = AclConfig::from_env()?;
//! let catalog = Arc::new(HttpCatalogClient::new(&config.catalog)?);
//! let service = AclService::new(Arc::new(MemoryAclStore::new()), catalog, config);
//!
//! let projected = service.scope_projection("shop", &["dev".to_string()]).await?;
//! # let _ = projected;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod key_codec;
pub mod preview;
pub mod projection;
pub mod service;
pub mod store;

pub use catalog::{CatalogIndex, CatalogQuery, CatalogSource, HttpCatalogClient, StaticCatalog};
pub use config::{AclConfig, CatalogConfig};
pub use error::{AclError, RecordKind, Result};
pub use projection::ProjectedAcl;
pub use service::AclService;
pub use store::{AclStore, MemoryAclStore};

pub use acl_types;
