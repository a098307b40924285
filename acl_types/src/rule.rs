//! Access rules stored per environment/service/version.
//!
//! A rule is persisted as `{access, restricted, grants}`. The shape of
//! `grants` depends on `restricted`:
//!
//! ```text
//! restricted = false   grants: { verb: [group, ...] }
//! restricted = true    grants: { group: { verb: { apiPath: bool } } }
//! ```
//!
//! In memory the two shapes are the variants of [`Grant`], so no caller ever
//! inspects the JSON shape at runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Whole-group grants: verb -> set of group labels.
pub type GroupGrants = BTreeMap<String, BTreeSet<String>>;

/// Per-API overrides: group label -> verb -> api path -> access.
pub type ApiAccessMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

// ============================================================================
// GRANT
// ============================================================================

/// The grant payload of a rule, selected by the stored `restricted` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Entire API groups granted uniformly per verb.
    Whole(GroupGrants),
    /// Explicit per-API access overrides.
    Restricted(ApiAccessMap),
}

impl Default for Grant {
    fn default() -> Self {
        Grant::Whole(GroupGrants::new())
    }
}

// ============================================================================
// RULE
// ============================================================================

/// One access rule for an env/service/version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredRule", into = "StoredRule")]
pub struct Rule {
    /// Top-level access switch for the service version.
    pub access: bool,
    /// Group or per-API grants.
    pub grant: Grant,
}

/// Sentinel returned for absent paths.
pub(crate) static EMPTY_RULE: Rule = Rule {
    access: false,
    grant: Grant::Whole(BTreeMap::new()),
};

impl Rule {
    /// The empty rule: no access, no groups.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whole-group rule.
    pub fn whole(access: bool, grants: GroupGrants) -> Self {
        Self {
            access,
            grant: Grant::Whole(grants),
        }
    }

    /// Restricted rule carrying per-API overrides.
    pub fn restricted(access: bool, apis: ApiAccessMap) -> Self {
        Self {
            access,
            grant: Grant::Restricted(apis),
        }
    }

    /// Rule with only the top-level switch set.
    pub fn with_access(access: bool) -> Self {
        Self {
            access,
            grant: Grant::default(),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self.grant, Grant::Restricted(_))
    }

    /// True when this rule carries no information beyond the sentinel.
    pub fn is_empty(&self) -> bool {
        !self.access
            && match &self.grant {
                Grant::Whole(g) => g.values().all(|s| s.is_empty()),
                Grant::Restricted(m) => m.is_empty(),
            }
    }

    /// Stored per-API override, if any. Always `None` for whole-group rules.
    pub fn api_override(&self, group: &str, verb: &str, path: &str) -> Option<bool> {
        match &self.grant {
            Grant::Restricted(apis) => apis
                .get(group)
                .and_then(|verbs| verbs.get(verb))
                .and_then(|paths| paths.get(path))
                .copied(),
            Grant::Whole(_) => None,
        }
    }

    /// Whether `group` sits in the grant set of `verb`. Always false for
    /// restricted rules.
    pub fn grants_group(&self, verb: &str, group: &str) -> bool {
        match &self.grant {
            Grant::Whole(grants) => grants.get(verb).is_some_and(|g| g.contains(group)),
            Grant::Restricted(_) => false,
        }
    }

    /// Resolve the access of one API under this rule.
    ///
    /// Restricted rules fall back to the top-level `access` when the API has
    /// no override. Whole-group rules grant an API iff the rule is switched on
    /// and its group is in the verb's grant set.
    pub fn resolve_api_access(&self, group: &str, verb: &str, path: &str) -> bool {
        match &self.grant {
            Grant::Restricted(_) => self.api_override(group, verb, path).unwrap_or(self.access),
            Grant::Whole(_) => self.access && self.grants_group(verb, group),
        }
    }
}

// ============================================================================
// ACCESS TYPE
// ============================================================================

/// Presentation label of a resolved API access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Access granted to the product/package holder.
    Private,
    /// Not granted.
    Public,
}

impl AccessType {
    pub fn from_access(access: bool) -> Self {
        if access {
            AccessType::Private
        } else {
            AccessType::Public
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Private => "private",
            AccessType::Public => "public",
        }
    }
}

// ============================================================================
// STORED SHAPE
// ============================================================================

/// A stored rule whose `grants` shape contradicts its `restricted` flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleShapeError {
    #[error("restricted rule carries whole-group grants")]
    WholeGrantsOnRestricted,
    #[error("unrestricted rule carries per-API grants")]
    ApiGrantsOnWhole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredGrants {
    PerApi(ApiAccessMap),
    Whole(GroupGrants),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRule {
    #[serde(default)]
    access: bool,
    #[serde(default)]
    restricted: bool,
    #[serde(default)]
    grants: Option<StoredGrants>,
}

impl TryFrom<StoredRule> for Rule {
    type Error = RuleShapeError;

    fn try_from(stored: StoredRule) -> Result<Self, Self::Error> {
        // `{}` parses as either shape; only a non-empty payload is decisive.
        let grant = match (stored.restricted, stored.grants) {
            (false, None) => Grant::Whole(GroupGrants::new()),
            (true, None) => Grant::Restricted(ApiAccessMap::new()),
            (true, Some(StoredGrants::PerApi(apis))) => Grant::Restricted(apis),
            (false, Some(StoredGrants::Whole(groups))) => Grant::Whole(groups),
            (false, Some(StoredGrants::PerApi(apis))) if apis.is_empty() => {
                Grant::Whole(GroupGrants::new())
            }
            (true, Some(StoredGrants::Whole(groups))) if groups.is_empty() => {
                Grant::Restricted(ApiAccessMap::new())
            }
            (true, Some(StoredGrants::Whole(_))) => {
                return Err(RuleShapeError::WholeGrantsOnRestricted)
            }
            (false, Some(StoredGrants::PerApi(_))) => return Err(RuleShapeError::ApiGrantsOnWhole),
        };

        Ok(Rule {
            access: stored.access,
            grant,
        })
    }
}

impl From<Rule> for StoredRule {
    fn from(rule: Rule) -> Self {
        let (restricted, grants) = match rule.grant {
            Grant::Whole(groups) => (false, StoredGrants::Whole(groups)),
            Grant::Restricted(apis) => (true, StoredGrants::PerApi(apis)),
        };
        StoredRule {
            access: rule.access,
            restricted,
            grants: Some(grants),
        }
    }
}
