//! ACL trees: env -> service -> version -> rule.
//!
//! Both the product scope ACL and a package ACL use [`AclTree`]. Navigation
//! never fails on a missing segment; absent rules read as the empty sentinel
//! so callers treat absence and explicit-empty the same way.

use crate::rule::{Rule, EMPTY_RULE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// version -> rule
pub type VersionRules = BTreeMap<String, Rule>;

/// service -> version -> rule
pub type ServiceRules = BTreeMap<String, VersionRules>;

// ============================================================================
// ACL TYPE
// ============================================================================

/// Granularity mode of a package ACL in one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AclType {
    /// Per-API selection.
    Granular,
    /// Whole API groups only.
    #[default]
    ApiGroup,
}

impl AclType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclType::Granular => "granular",
            AclType::ApiGroup => "apiGroup",
        }
    }
}

// ============================================================================
// ACL TREE
// ============================================================================

/// Environment-keyed ACL tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AclTree(BTreeMap<String, ServiceRules>);

impl AclTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rule at the given path, or the empty sentinel.
    pub fn get_rule(&self, env: &str, service: &str, version: &str) -> &Rule {
        self.find_rule(env, service, version).unwrap_or(&EMPTY_RULE)
    }

    /// Rule at the given path if one is stored.
    pub fn find_rule(&self, env: &str, service: &str, version: &str) -> Option<&Rule> {
        self.0
            .get(env)
            .and_then(|services| services.get(service))
            .and_then(|versions| versions.get(version))
    }

    /// Store a rule, creating intermediate levels as needed.
    pub fn set_rule(
        &mut self,
        env: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
        rule: Rule,
    ) {
        self.0
            .entry(env.into())
            .or_default()
            .entry(service.into())
            .or_default()
            .insert(version.into(), rule);
    }

    /// Remove a rule, pruning levels left empty.
    pub fn remove_rule(&mut self, env: &str, service: &str, version: &str) -> Option<Rule> {
        let services = self.0.get_mut(env)?;
        let versions = services.get_mut(service)?;
        let removed = versions.remove(version);
        if versions.is_empty() {
            services.remove(service);
        }
        if services.is_empty() {
            self.0.remove(env);
        }
        removed
    }

    /// Versions stored for a service in an environment, in key order.
    pub fn list_versions(&self, env: &str, service: &str) -> Vec<&str> {
        self.0
            .get(env)
            .and_then(|services| services.get(service))
            .map(|versions| versions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn list_environments(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn environment(&self, env: &str) -> Option<&ServiceRules> {
        self.0.get(env)
    }

    /// Replace one environment wholesale. An empty replacement removes it.
    pub fn replace_environment(&mut self, env: impl Into<String>, services: ServiceRules) {
        let env = env.into();
        if services.is_empty() {
            self.0.remove(&env);
        } else {
            self.0.insert(env, services);
        }
    }

    /// `(service, version, rule)` triples of one environment.
    pub fn rules_in(&self, env: &str) -> impl Iterator<Item = (&str, &str, &Rule)> {
        self.0.get(env).into_iter().flat_map(|services| {
            services.iter().flat_map(|(service, versions)| {
                versions
                    .iter()
                    .map(move |(version, rule)| (service.as_str(), version.as_str(), rule))
            })
        })
    }

    /// `(service, version)` pairs holding a rule in any of `envs`.
    pub fn service_versions<'a>(
        &'a self,
        envs: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<(&'a str, &'a str)> {
        envs.into_iter()
            .flat_map(|env| self.rules_in(env).map(|(s, v, _)| (s, v)))
            .collect()
    }

    /// Copy of the tree with every version key passed through `f`.
    /// Environment and service keys and all rules are left untouched.
    pub fn map_version_keys(&self, f: impl Fn(&str) -> String) -> AclTree {
        let envs = self
            .0
            .iter()
            .map(|(env, services)| {
                let services = services
                    .iter()
                    .map(|(service, versions)| {
                        let versions = versions
                            .iter()
                            .map(|(version, rule)| (f(version), rule.clone()))
                            .collect();
                        (service.clone(), versions)
                    })
                    .collect();
                (env.clone(), services)
            })
            .collect();
        AclTree(envs)
    }
}

impl From<BTreeMap<String, ServiceRules>> for AclTree {
    fn from(envs: BTreeMap<String, ServiceRules>) -> Self {
        AclTree(envs)
    }
}
