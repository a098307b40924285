//! UI-rendering tree ("fill" nodes).
//!
//! Ephemeral output of the projector; never persisted.

use acl_types::AccessType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Projection of a whole ACL tree. Environment keys are uppercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectedAcl {
    /// ENV -> service -> version -> fill
    pub environments: BTreeMap<String, BTreeMap<String, BTreeMap<String, VersionFill>>>,
}

impl ProjectedAcl {
    pub fn version(&self, env: &str, service: &str, version: &str) -> Option<&VersionFill> {
        self.environments.get(env)?.get(service)?.get(version)
    }
}

/// Fill of one service version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFill {
    pub access: bool,
    pub apis_restrict_permission: bool,
    pub collapse: bool,
    /// False when the catalog no longer offers this version.
    pub include: bool,
    /// API groups in catalog order.
    pub groups: Vec<GroupFill>,
}

impl VersionFill {
    pub fn group(&self, label: &str) -> Option<&GroupFill> {
        self.groups.iter().find(|g| g.label == label)
    }
}

/// Fill of one API group; aggregates its verb cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFill {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_api: Option<String>,
    /// Every verb cell fully granted.
    pub access: bool,
    /// Some API of the group granted.
    pub include: bool,
    pub verbs: BTreeMap<String, VerbFill>,
}

/// One group x verb cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbFill {
    pub access: bool,
    pub include: bool,
    pub apis: Vec<ApiFill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFill {
    pub path: String,
    pub label: String,
    pub access: bool,
    pub include: bool,
    pub access_type: AccessType,
}
