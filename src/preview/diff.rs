//! Preview diff - flattens two environments of a tree into one comparison
//! list.
//!
//! Service granularity yields one record per (service, version) holding a
//! rule in either environment. API granularity expands those versions over
//! the full catalog API list, so newly catalogued APIs show up even when no
//! override is stored for them.

use super::ensure_granular;
use crate::access::{resolve_access, ReadMode};
use crate::catalog::CatalogIndex;
use crate::error::Result;
use acl_types::{AclTree, Package, PreviewRecord};

/// Service-granularity preview of `main_env` against `sec_env`.
pub fn preview_services(tree: &AclTree, main_env: &str, sec_env: &str) -> Vec<PreviewRecord> {
    tree.service_versions([main_env, sec_env])
        .into_iter()
        .map(|(service, version)| {
            [main_env, sec_env]
                .into_iter()
                .fold(PreviewRecord::service_level(service, version), |record, env| {
                    match tree.find_rule(env, service, version) {
                        Some(rule) => record.with_env(env, true, rule.is_restricted(), rule.access),
                        None => record.with_env(env, false, false, false),
                    }
                })
        })
        .collect()
}

/// API-granularity preview of `main_env` against `sec_env`.
///
/// Versions the catalog does not offer contribute no records.
pub fn preview_apis(
    tree: &AclTree,
    main_env: &str,
    sec_env: &str,
    catalog: &CatalogIndex,
) -> Vec<PreviewRecord> {
    let mut records = Vec::new();

    for (service, version) in tree.service_versions([main_env, sec_env]) {
        let Some(indexed) = catalog.version(service, version) else {
            tracing::debug!(service, version, "version not catalogued, no API records");
            continue;
        };

        for (group, verb, api) in indexed.grouped_apis() {
            let record = [main_env, sec_env].into_iter().fold(
                PreviewRecord::api_level(service, version, group, verb, &api.path),
                |record, env| {
                    let present = tree.find_rule(env, service, version).is_some();
                    let rule = tree.get_rule(env, service, version);
                    let access =
                        resolve_access(rule, ReadMode::PerApi, indexed, group, verb, &api.path);
                    record.with_env(env, present, rule.is_restricted(), access)
                },
            );
            records.push(record);
        }
    }

    records
}

/// API-granularity preview of a package. Both environments must be in
/// `granular` mode.
pub fn preview_package_apis(
    package: &Package,
    main_env: &str,
    sec_env: &str,
    catalog: &CatalogIndex,
) -> Result<Vec<PreviewRecord>> {
    ensure_granular(package, [main_env, sec_env])?;
    Ok(preview_apis(&package.acl, main_env, sec_env, catalog))
}
