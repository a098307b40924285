//! Owning records of ACL trees.

use crate::tree::{AclTree, AclType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A commercial product with its scope ACL and package tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub packages: Vec<Package>,
    /// Maximal access any tenant on this product could be granted.
    #[serde(default)]
    pub scope: AclTree,
}

/// A package tier selecting a subset of its product's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub acl: AclTree,
    /// Granularity per environment. Absent environments are `apiGroup`.
    #[serde(default)]
    pub acl_type_by_env: BTreeMap<String, AclType>,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            packages: Vec::new(),
            scope: AclTree::new(),
        }
    }

    pub fn package(&self, code: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.code == code)
    }

    pub fn package_mut(&mut self, code: &str) -> Option<&mut Package> {
        self.packages.iter_mut().find(|p| p.code == code)
    }
}

impl Package {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            acl: AclTree::new(),
            acl_type_by_env: BTreeMap::new(),
        }
    }

    pub fn acl_type(&self, env: &str) -> AclType {
        self.acl_type_by_env.get(env).copied().unwrap_or_default()
    }

    pub fn is_granular(&self, env: &str) -> bool {
        self.acl_type(env) == AclType::Granular
    }
}
