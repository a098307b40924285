//! UI projector - expands a stored ACL tree against the catalog.
//!
//! For every env/service/version the projector emits a [`VersionFill`]:
//!
//! - versions the catalog no longer offers keep their top-level values but
//!   are marked `include = false` and carry no groups
//! - restricted rules resolve every catalogued API from its override, falling
//!   back to the rule's top-level `access`
//! - whole-group rules emit the stored group x verb matrix with
//!   `collapse = false` and `include` = the rule's `access`
//!
//! Environment keys are uppercased in the output. Projection is pure: the same
//! tree and catalog always produce the same output and neither is modified.

mod model;

pub use model::{ApiFill, GroupFill, ProjectedAcl, VerbFill, VersionFill};

use crate::access::{resolve_access, ReadMode};
use crate::catalog::{ApiGroup, CatalogIndex, IndexedVersion};
use acl_types::{AccessType, AclTree, Grant, Package, Rule};
use std::collections::{BTreeMap, BTreeSet};

/// Project a product scope ACL.
///
/// `envs` names environments rendered in full: every catalogued service
/// version appears there, projected from the empty rule when nothing is
/// stored. Other stored environments show their stored rules only.
pub fn project_scope(tree: &AclTree, catalog: &CatalogIndex, envs: &[String]) -> ProjectedAcl {
    project(tree, catalog, envs, |_| ReadMode::PerApi)
}

/// Project a package ACL, reading each environment per its ACL type.
pub fn project_package(package: &Package, catalog: &CatalogIndex, envs: &[String]) -> ProjectedAcl {
    project(&package.acl, catalog, envs, |env| {
        ReadMode::for_package(package, env)
    })
}

fn project(
    tree: &AclTree,
    catalog: &CatalogIndex,
    envs: &[String],
    mode_for: impl Fn(&str) -> ReadMode,
) -> ProjectedAcl {
    let mut env_names: BTreeSet<&str> = tree.list_environments().into_iter().collect();
    env_names.extend(envs.iter().map(String::as_str));

    let mut projected = ProjectedAcl::default();
    for env in env_names {
        let mut pairs: BTreeSet<(&str, &str)> =
            tree.rules_in(env).map(|(service, version, _)| (service, version)).collect();

        if envs.iter().any(|e| e == env) {
            for service in catalog.services() {
                for version in &service.versions {
                    pairs.insert((service.name.as_str(), version.version.as_str()));
                }
            }
        }

        let mode = mode_for(env);
        let mut services: BTreeMap<String, BTreeMap<String, VersionFill>> = BTreeMap::new();
        for (service, version) in pairs {
            let rule = tree.get_rule(env, service, version);
            let fill = project_rule(rule, catalog.version(service, version), mode);
            services
                .entry(service.to_string())
                .or_default()
                .insert(version.to_string(), fill);
        }

        projected.environments.insert(env.to_uppercase(), services);
    }

    projected
}

fn project_rule(rule: &Rule, version: Option<&IndexedVersion>, mode: ReadMode) -> VersionFill {
    // In apiGroup mode the restricted flag is not observable.
    let restricted_view = rule.is_restricted() && mode == ReadMode::PerApi;

    let Some(version) = version else {
        return VersionFill {
            access: rule.access,
            apis_restrict_permission: restricted_view,
            collapse: restricted_view,
            include: false,
            groups: Vec::new(),
        };
    };

    let groups: Vec<GroupFill> = version
        .groups
        .iter()
        .map(|group| project_group(rule, version, group, mode))
        .collect();

    let include = match &rule.grant {
        Grant::Whole(_) => rule.access,
        Grant::Restricted(_) => rule.access || groups.iter().any(|g| g.include),
    };

    VersionFill {
        access: rule.access,
        apis_restrict_permission: restricted_view,
        collapse: restricted_view,
        include,
        groups,
    }
}

fn project_group(rule: &Rule, version: &IndexedVersion, group: &ApiGroup, mode: ReadMode) -> GroupFill {
    let verbs: BTreeMap<String, VerbFill> = group
        .verbs
        .iter()
        .map(|(verb, apis)| {
            // Whole-group rules render the stored matrix cell for every API.
            let cell = match &rule.grant {
                Grant::Whole(_) => Some(rule.grants_group(verb, &group.label)),
                Grant::Restricted(_) => None,
            };

            let apis: Vec<ApiFill> = apis
                .iter()
                .map(|api| {
                    let access = cell.unwrap_or_else(|| {
                        resolve_access(rule, mode, version, &group.label, verb, &api.path)
                    });
                    ApiFill {
                        path: api.path.clone(),
                        label: api.label.clone(),
                        access,
                        include: access,
                        access_type: AccessType::from_access(access),
                    }
                })
                .collect();

            let fill = VerbFill {
                access: !apis.is_empty() && apis.iter().all(|a| a.access),
                include: apis.iter().any(|a| a.include),
                apis,
            };
            (verb.clone(), fill)
        })
        .collect();

    GroupFill {
        label: group.label.clone(),
        main_api: group.main_api.clone(),
        access: !verbs.is_empty() && verbs.values().all(|v| v.access),
        include: verbs.values().any(|v| v.include),
        verbs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogQuery;
    use acl_types::{
        AclType, ApiAccessMap, CatalogApi, CatalogService, CatalogVersion, GroupGrants,
    };
    use pretty_assertions::assert_eq;

    fn catalog() -> CatalogIndex {
        let services = vec![CatalogService {
            name: "accounts".into(),
            group: "Core".into(),
            versions: vec![CatalogVersion {
                version: "1.2".into(),
                apis: vec![
                    CatalogApi::new("Users", "get", "/users"),
                    CatalogApi::new("Users", "get", "/users/{id}"),
                    CatalogApi::new("Users", "post", "/users"),
                    CatalogApi::new("Sessions", "delete", "/sessions"),
                ],
            }],
        }];
        CatalogIndex::build(services, &CatalogQuery::default())
    }

    fn override_map(entries: &[(&str, &str, &str, bool)]) -> ApiAccessMap {
        let mut apis = ApiAccessMap::new();
        for (group, verb, path, access) in entries {
            apis.entry(group.to_string())
                .or_default()
                .entry(verb.to_string())
                .or_default()
                .insert(path.to_string(), *access);
        }
        apis
    }

    #[test]
    fn test_restricted_rule_resolves_overrides_with_fallback() {
        let mut tree = AclTree::new();
        let apis = override_map(&[("Users", "get", "/users/{id}", false)]);
        tree.set_rule("dev", "accounts", "1.2", Rule::restricted(true, apis));

        let projected = project_scope(&tree, &catalog(), &[]);
        let fill = projected.version("DEV", "accounts", "1.2").unwrap();
        assert!(fill.apis_restrict_permission);
        assert!(fill.include);

        let users = fill.group("Users").unwrap();
        let get = &users.verbs["get"];
        assert_eq!(get.apis[0].access_type, AccessType::Private);
        assert_eq!(get.apis[1].access_type, AccessType::Public);
        assert!(!get.access);
        assert!(get.include);
        assert!(users.verbs["post"].access);
        assert!(!users.access);

        // No override anywhere in this group: falls back to the top access.
        assert!(fill.group("Sessions").unwrap().access);
    }

    #[test]
    fn test_whole_group_matrix() {
        let mut grants = GroupGrants::new();
        grants.insert("get".into(), BTreeSet::from(["Users".to_string()]));
        let mut tree = AclTree::new();
        tree.set_rule("prod", "accounts", "1.2", Rule::whole(false, grants));

        let projected = project_scope(&tree, &catalog(), &[]);
        let fill = projected.version("PROD", "accounts", "1.2").unwrap();
        assert!(!fill.collapse);
        assert!(!fill.include);
        assert!(!fill.apis_restrict_permission);

        let users = fill.group("Users").unwrap();
        assert!(users.verbs["get"].access);
        assert!(!users.verbs["post"].access);
        assert!(!fill.group("Sessions").unwrap().include);
    }

    #[test]
    fn test_uncatalogued_version_is_excluded() {
        let mut tree = AclTree::new();
        tree.set_rule("dev", "accounts", "0.9", Rule::with_access(true));

        let projected = project_scope(&tree, &catalog(), &[]);
        let fill = projected.version("DEV", "accounts", "0.9").unwrap();
        assert!(fill.access);
        assert!(!fill.include);
        assert!(fill.groups.is_empty());
    }

    #[test]
    fn test_requested_environments_filled_with_defaults() {
        let tree = AclTree::new();
        let projected = project_scope(&tree, &catalog(), &["qa".to_string()]);

        let fill = projected.version("QA", "accounts", "1.2").unwrap();
        assert!(!fill.access);
        assert_eq!(fill.groups.len(), 2);
        assert!(fill.groups.iter().all(|g| !g.include));
    }

    #[test]
    fn test_projection_is_deterministic_and_pure() {
        let mut tree = AclTree::new();
        tree.set_rule(
            "dev",
            "accounts",
            "1.2",
            Rule::restricted(false, override_map(&[("Users", "post", "/users", true)])),
        );
        let catalog = catalog();
        let before = tree.clone();

        let first = project_scope(&tree, &catalog, &["prod".to_string()]);
        let second = project_scope(&tree, &catalog, &["prod".to_string()]);
        assert_eq!(first, second);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_api_group_package_reads_per_group() {
        let mut package = Package::new("gold", "Gold");
        package.acl.set_rule(
            "dev",
            "accounts",
            "1.2",
            Rule::restricted(
                false,
                override_map(&[
                    ("Users", "get", "/users", true),
                    ("Users", "get", "/users/{id}", false),
                    ("Users", "post", "/users", true),
                ]),
            ),
        );

        let projected = project_package(&package, &catalog(), &[]);
        let fill = projected.version("DEV", "accounts", "1.2").unwrap();
        assert!(!fill.apis_restrict_permission);
        let users = fill.group("Users").unwrap();
        assert!(!users.verbs["get"].include);
        assert!(users.verbs["post"].access);

        package.acl_type_by_env.insert("dev".into(), AclType::Granular);
        let projected = project_package(&package, &catalog(), &[]);
        let fill = projected.version("DEV", "accounts", "1.2").unwrap();
        assert!(fill.apis_restrict_permission);
        assert!(fill.group("Users").unwrap().verbs["get"].include);
    }
}
