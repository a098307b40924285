//! Effective API access under a rule.
//!
//! Scope ACLs and `granular` package environments read restricted rules per
//! API. Package environments in `apiGroup` mode read every rule per group: a
//! restricted rule grants a group/verb only when all of its catalogued APIs
//! resolve to true, so per-API detail never leaks through.

use crate::catalog::IndexedVersion;
use acl_types::{AclType, Package, Rule};

/// How a rule is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    PerApi,
    PerGroup,
}

impl ReadMode {
    /// Read mode of a package environment.
    pub fn for_package(package: &Package, env: &str) -> Self {
        match package.acl_type(env) {
            AclType::Granular => ReadMode::PerApi,
            AclType::ApiGroup => ReadMode::PerGroup,
        }
    }
}

/// Effective access of one catalogued API.
pub fn resolve_access(
    rule: &Rule,
    mode: ReadMode,
    version: &IndexedVersion,
    group: &str,
    verb: &str,
    path: &str,
) -> bool {
    match mode {
        ReadMode::PerApi => rule.resolve_api_access(group, verb, path),
        ReadMode::PerGroup if rule.is_restricted() => group_access(rule, version, group, verb),
        ReadMode::PerGroup => rule.resolve_api_access(group, verb, path),
    }
}

/// Whether every catalogued API of a group/verb resolves to true per API.
/// Empty group/verb cells are not granted.
fn group_access(rule: &Rule, version: &IndexedVersion, group: &str, verb: &str) -> bool {
    let apis = version.group(group).map(|g| g.apis(verb)).unwrap_or(&[]);
    !apis.is_empty()
        && apis
            .iter()
            .all(|api| rule.resolve_api_access(group, verb, &api.path))
}
