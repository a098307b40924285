//! Preview apply - writes an edited preview list into one target environment.
//!
//! Service-granularity records set a rule's top-level `access`. API-granularity
//! records are merged per service version and the resulting rule is always
//! written in its most compact form:
//!
//! - every group/verb uniform: a whole-group rule, no per-API detail
//! - otherwise: a restricted rule with explicit per-API entries
//!
//! Every record is validated against the catalog before anything is written,
//! so the target environment is updated wholly or not at all. Other
//! environments pass through untouched.

use super::ensure_granular;
use crate::catalog::{CatalogIndex, IndexedVersion};
use crate::error::{AclError, Result};
use acl_types::{AclTree, ApiAccessMap, Grant, GroupGrants, Package, PreviewRecord, Rule};
use std::collections::BTreeMap;

/// (group, verb, path)
type ApiKey = (String, String, String);

/// Validated edits for one target environment.
#[derive(Default)]
struct ApplyPlan<'c> {
    services: Vec<(String, String, bool)>,
    apis: BTreeMap<(String, String), (Option<&'c IndexedVersion>, BTreeMap<ApiKey, bool>)>,
    /// Some API-granularity record carries an access value for the target.
    has_api_records: bool,
}

/// Apply edited records to a product scope ACL.
pub fn apply_scope(
    tree: &AclTree,
    target_env: &str,
    records: &[PreviewRecord],
    catalog: &CatalogIndex,
) -> Result<AclTree> {
    let plan = plan(records, target_env, catalog)?;
    Ok(execute(tree, target_env, plan))
}

/// Apply edited records to a package ACL. API-granularity records that
/// address the target environment require it in `granular` mode.
pub fn apply_package(
    package: &Package,
    target_env: &str,
    records: &[PreviewRecord],
    catalog: &CatalogIndex,
) -> Result<AclTree> {
    let plan = plan(records, target_env, catalog)?;
    if plan.has_api_records {
        ensure_granular(package, [target_env])?;
    }
    Ok(execute(&package.acl, target_env, plan))
}

fn plan<'c>(
    records: &[PreviewRecord],
    target_env: &str,
    catalog: &'c CatalogIndex,
) -> Result<ApplyPlan<'c>> {
    let mut plan = ApplyPlan::default();

    for record in records {
        let identity = || record.identity();
        let service = catalog
            .service(&record.service)
            .ok_or_else(|| AclError::invalid_identity(identity(), "unknown service"))?;
        let version = service
            .version(&record.version)
            .ok_or_else(|| AclError::invalid_identity(identity(), "unknown service version"))?;
        let access = record.access.get(target_env).copied();

        match (&record.group, &record.method, &record.api) {
            (None, None, None) => {
                if let Some(access) = access {
                    plan.services
                        .push((record.service.clone(), record.version.clone(), access));
                }
            }
            (Some(group), Some(method), Some(path)) => {
                let verb = method.to_ascii_lowercase();
                if version.group(group).is_none() {
                    return Err(AclError::invalid_identity(identity(), "unknown API group"));
                }
                if version.find_api(group, &verb, path).is_none() {
                    return Err(AclError::invalid_identity(identity(), "unknown API"));
                }

                if let Some(access) = access {
                    plan.has_api_records = true;
                    let (slot, updates) = plan
                        .apis
                        .entry((record.service.clone(), record.version.clone()))
                        .or_default();
                    *slot = Some(version);
                    updates.insert((group.clone(), verb, path.clone()), access);
                }
            }
            _ => {
                return Err(AclError::invalid_identity(
                    identity(),
                    "API identity needs group, method and api",
                ))
            }
        }
    }

    Ok(plan)
}

fn execute(tree: &AclTree, target_env: &str, plan: ApplyPlan<'_>) -> AclTree {
    let mut updated = tree.clone();

    for (service, version, access) in &plan.services {
        let mut rule = updated
            .find_rule(target_env, service, version)
            .cloned()
            .unwrap_or_default();
        rule.access = *access;
        updated.set_rule(target_env, service.as_str(), version.as_str(), rule);
    }

    for ((service, version), (indexed, updates)) in &plan.apis {
        let Some(indexed) = indexed else { continue };
        let prior = updated.get_rule(target_env, service, version);
        let rule = compact(prior, indexed, updates);
        tracing::debug!(
            env = target_env,
            service = service.as_str(),
            version = version.as_str(),
            restricted = rule.is_restricted(),
            "rule rewritten"
        );
        updated.set_rule(target_env, service.as_str(), version.as_str(), rule);
    }

    tracing::info!(
        env = target_env,
        service_updates = plan.services.len(),
        api_versions = plan.apis.len(),
        "preview applied"
    );
    updated
}

/// Merge per-API edits into a rule and return the compact result.
fn compact(prior: &Rule, version: &IndexedVersion, updates: &BTreeMap<ApiKey, bool>) -> Rule {
    let mut effective: BTreeMap<ApiKey, bool> = BTreeMap::new();
    let mut cells: BTreeMap<(&str, &str), Vec<bool>> = BTreeMap::new();

    for (group, verb, api) in version.grouped_apis() {
        let key = (group.to_string(), verb.to_string(), api.path.clone());
        let access = updates
            .get(&key)
            .copied()
            .unwrap_or_else(|| prior.resolve_api_access(group, verb, &api.path));
        cells.entry((group, verb)).or_default().push(access);
        effective.insert(key, access);
    }

    let any_granted = effective.values().any(|granted| *granted);
    let uniform = cells.values().all(|values| values.windows(2).all(|w| w[0] == w[1]));

    if uniform {
        let mut grants = GroupGrants::new();
        for ((group, verb), values) in &cells {
            if values.first().copied().unwrap_or(false) {
                grants
                    .entry(verb.to_string())
                    .or_default()
                    .insert(group.to_string());
            }
        }

        // A switched-off rule reads every group as denied, so stored groups
        // nobody addressed can stay in place.
        if !any_granted {
            if let Grant::Whole(prior_grants) = &prior.grant {
                for (verb, groups) in prior_grants {
                    for group in groups {
                        if !addresses_cell(updates, group, verb) {
                            grants.entry(verb.clone()).or_default().insert(group.clone());
                        }
                    }
                }
            }
        }
        return Rule::whole(any_granted, grants);
    }

    // Unaddressed APIs keep reading through the prior fallback where possible.
    let fallback = match &prior.grant {
        Grant::Restricted(_) => prior.access,
        Grant::Whole(_) => false,
    };

    let mut apis = ApiAccessMap::new();
    let mut put = |(group, verb, path): &ApiKey, access: bool| {
        apis.entry(group.clone())
            .or_default()
            .entry(verb.clone())
            .or_default()
            .insert(path.clone(), access);
    };

    // Unaddressed explicit entries survive, including ones the catalog dropped.
    if let Grant::Restricted(prior_apis) = &prior.grant {
        for (group, verbs) in prior_apis {
            for (verb, paths) in verbs {
                for (path, access) in paths {
                    let key = (group.clone(), verb.clone(), path.clone());
                    if !updates.contains_key(&key) {
                        put(&key, *access);
                    }
                }
            }
        }
    }

    for (key, access) in updates {
        put(key, *access);
    }

    // Anything else that would read differently through the fallback.
    for (key, access) in &effective {
        if *access != fallback && !updates.contains_key(key) && prior_override(prior, key).is_none() {
            put(key, *access);
        }
    }

    Rule::restricted(fallback, apis)
}

fn addresses_cell(updates: &BTreeMap<ApiKey, bool>, group: &str, verb: &str) -> bool {
    updates.keys().any(|(g, v, _)| g == group && v == verb)
}

fn prior_override(prior: &Rule, (group, verb, path): &ApiKey) -> Option<bool> {
    prior.api_override(group, verb, path)
}
