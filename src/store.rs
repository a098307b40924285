//! Boundary to the product/package store.
//!
//! The store holds product documents as raw JSON whose ACL trees carry
//! sanitized version keys. Keys are decoded exactly once on read and encoded
//! exactly once on write, here and nowhere else.

use crate::error::Result;
use crate::key_codec::{decode_document, encode_document};
use acl_types::Product;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Product/package persistence.
///
/// Documents are stored in their key-sanitized form. Record versioning and
/// write ordering are the store's concern.
#[async_trait]
pub trait AclStore: Send + Sync {
    /// Load a product document, or `None` when no such product exists.
    async fn load_product(&self, code: &str) -> Result<Option<Value>>;

    /// Replace a product document.
    async fn save_product(&self, code: &str, document: Value) -> Result<()>;
}

/// Decode a stored product document.
pub fn product_from_document(document: &Value) -> Result<Product> {
    let decoded = rewrite_trees(document, decode_document);
    Ok(serde_json::from_value(decoded)?)
}

/// Encode a product into its stored document.
pub fn product_to_document(product: &Product) -> Result<Value> {
    let raw = serde_json::to_value(product)?;
    Ok(rewrite_trees(&raw, encode_document))
}

/// Apply `f` to the scope tree and to every package ACL tree of a product
/// document.
fn rewrite_trees(document: &Value, f: fn(&Value) -> Value) -> Value {
    let mut document = document.clone();

    if let Some(scope) = document.get_mut("scope") {
        *scope = f(scope);
    }
    if let Some(Value::Array(packages)) = document.get_mut("packages") {
        for package in packages {
            if let Some(acl) = package.get_mut("acl") {
                *acl = f(acl);
            }
        }
    }

    document
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryAclStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryAclStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product, encoding it like any other write.
    pub async fn insert_product(&self, product: &Product) -> Result<()> {
        let document = product_to_document(product)?;
        self.save_product(&product.code, document).await
    }

    /// The stored document exactly as persisted.
    pub async fn raw_document(&self, code: &str) -> Option<Value> {
        self.documents.read().await.get(code).cloned()
    }
}

#[async_trait]
impl AclStore for MemoryAclStore {
    async fn load_product(&self, code: &str) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(code).cloned())
    }

    async fn save_product(&self, code: &str, document: Value) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(code.to_string(), document);
        Ok(())
    }
}
