//! Per-request catalog index.
//!
//! Groups catalog services by their service-group label and partitions each
//! version's APIs by API group, then by lowercased HTTP verb:
//!
//! ```text
//! CatalogIndex
//! └── service group ("Core")
//!     ├── allServiceApis
//!     │   └── service ("accounts")
//!     │       └── version ("1.2")
//!     │           ├── apis   (catalog order)
//!     │           └── groups
//!     │               └── "Users" -> { get: [...], post: [...] }
//!     └── paginations { start, limit, total }
//! ```
//!
//! The index is immutable once built and is only ever built from a complete
//! catalog listing.

use super::{CatalogQuery, CatalogSource};
use crate::error::{AclError, Result};
use acl_types::{CatalogApi, CatalogService};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Upper bound on listing pages per fetch.
const MAX_PAGES: usize = 10_000;

/// Page cursor of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub start: usize,
    pub limit: usize,
    pub total: usize,
}

/// APIs of one API group, split by verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub label: String,
    /// Path of the API flagged `groupMain`, if any.
    pub main_api: Option<String>,
    /// verb -> APIs in catalog order
    pub verbs: BTreeMap<String, Vec<CatalogApi>>,
}

impl ApiGroup {
    pub fn apis(&self, verb: &str) -> &[CatalogApi] {
        self.verbs.get(verb).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A catalogued version with its grouped API index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedVersion {
    pub version: String,
    pub apis: Vec<CatalogApi>,
    /// API groups in order of first appearance.
    pub groups: Vec<ApiGroup>,
}

impl IndexedVersion {
    fn build(version: &acl_types::CatalogVersion) -> Self {
        let mut groups: Vec<ApiGroup> = Vec::new();

        for api in &version.apis {
            let position = match groups.iter().position(|g| g.label == api.group) {
                Some(position) => position,
                None => {
                    groups.push(ApiGroup {
                        label: api.group.clone(),
                        main_api: None,
                        verbs: BTreeMap::new(),
                    });
                    groups.len() - 1
                }
            };
            let group = &mut groups[position];
            if api.is_group_main() && group.main_api.is_none() {
                group.main_api = Some(api.path.clone());
            }
            group.verbs.entry(api.verb()).or_default().push(api.clone());
        }

        Self {
            version: version.version.clone(),
            apis: version.apis.clone(),
            groups,
        }
    }

    pub fn group(&self, label: &str) -> Option<&ApiGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Look up one API by group, lowercased verb and path.
    pub fn find_api(&self, group: &str, verb: &str, path: &str) -> Option<&CatalogApi> {
        self.group(group)?.apis(verb).iter().find(|api| api.path == path)
    }

    /// `(group, verb, api)` triples in group order, then verb order, then
    /// catalog order.
    pub fn grouped_apis(&self) -> impl Iterator<Item = (&str, &str, &CatalogApi)> {
        self.groups.iter().flat_map(|group| {
            group.verbs.iter().flat_map(move |(verb, apis)| {
                apis.iter()
                    .map(move |api| (group.label.as_str(), verb.as_str(), api))
            })
        })
    }
}

/// A catalogued service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedService {
    pub name: String,
    pub group: String,
    pub versions: Vec<IndexedVersion>,
}

impl IndexedService {
    pub fn version(&self, version: &str) -> Option<&IndexedVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Index of one service group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroupIndex {
    pub all_service_apis: Vec<IndexedService>,
    pub paginations: Pagination,
}

/// Catalog index keyed by service-group label.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    groups: BTreeMap<String, ServiceGroupIndex>,
    /// service name -> (service group, position)
    by_service: HashMap<String, (String, usize)>,
}

impl CatalogIndex {
    /// Build an index from a complete listing.
    pub fn build(services: Vec<CatalogService>, query: &CatalogQuery) -> Self {
        let mut grouped: BTreeMap<String, Vec<IndexedService>> = BTreeMap::new();
        for service in services {
            let indexed = IndexedService {
                versions: service.versions.iter().map(IndexedVersion::build).collect(),
                name: service.name,
                group: service.group,
            };
            grouped.entry(indexed.group.clone()).or_default().push(indexed);
        }

        let mut by_service = HashMap::new();
        let groups = grouped
            .into_iter()
            .map(|(label, services)| {
                for (position, service) in services.iter().enumerate() {
                    match by_service.entry(service.name.clone()) {
                        Entry::Vacant(slot) => {
                            slot.insert((label.clone(), position));
                        }
                        Entry::Occupied(kept) => {
                            tracing::warn!(
                                service = service.name.as_str(),
                                kept_group = kept.get().0.as_str(),
                                ignored_group = label.as_str(),
                                "service listed in more than one service group"
                            );
                        }
                    }
                }
                let paginations = Pagination {
                    start: query.start,
                    limit: query.limit,
                    total: services.len(),
                };
                (
                    label,
                    ServiceGroupIndex {
                        all_service_apis: services,
                        paginations,
                    },
                )
            })
            .collect();

        Self { groups, by_service }
    }

    /// Fetch the complete listing from `source`, page by page, and index it.
    ///
    /// Pages are requested from `query.start` until one comes back shorter
    /// than `query.limit`. Any failing page fails the whole fetch.
    pub async fn fetch(source: &dyn CatalogSource, query: &CatalogQuery) -> Result<Self> {
        let mut services = Vec::new();
        let mut page = query.clone();

        for _ in 0..MAX_PAGES {
            let listed = source.list_all_apis(&page).await?;
            let count = listed.len();
            services.extend(listed);

            if page.limit == 0 || count < page.limit {
                let index = Self::build(services, query);
                tracing::debug!(
                    service_groups = index.groups.len(),
                    services = index.by_service.len(),
                    "catalog index built"
                );
                return Ok(index);
            }
            page.start += count;
        }

        Err(AclError::upstream(format!(
            "catalog listing did not end within {} pages of {}",
            MAX_PAGES, query.limit
        )))
    }

    pub fn service_groups(&self) -> &BTreeMap<String, ServiceGroupIndex> {
        &self.groups
    }

    pub fn service_group(&self, label: &str) -> Option<&ServiceGroupIndex> {
        self.groups.get(label)
    }

    pub fn service(&self, name: &str) -> Option<&IndexedService> {
        let (group, position) = self.by_service.get(name)?;
        self.groups.get(group)?.all_service_apis.get(*position)
    }

    pub fn version(&self, service: &str, version: &str) -> Option<&IndexedVersion> {
        self.service(service)?.version(version)
    }

    /// All services, by service group then catalog order.
    pub fn services(&self) -> impl Iterator<Item = &IndexedService> {
        self.groups.values().flat_map(|g| g.all_service_apis.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use acl_types::CatalogVersion;

    fn catalog() -> Vec<CatalogService> {
        let mut main = CatalogApi::new("Users", "GET", "/users");
        main.group_main = Some(true);
        vec![
            CatalogService {
                name: "accounts".into(),
                group: "Core".into(),
                versions: vec![CatalogVersion {
                    version: "1.2".into(),
                    apis: vec![
                        CatalogApi::new("Users", "POST", "/users"),
                        main,
                        CatalogApi::new("Sessions", "delete", "/sessions"),
                        CatalogApi::new("Users", "get", "/users/{id}"),
                    ],
                }],
            },
            CatalogService {
                name: "billing".into(),
                group: "Finance".into(),
                versions: vec![CatalogVersion {
                    version: "3.0".into(),
                    apis: vec![CatalogApi::new("Invoices", "get", "/invoices")],
                }],
            },
        ]
    }

    #[test]
    fn test_groups_and_verbs() {
        let index = CatalogIndex::build(catalog(), &CatalogQuery::default());
        let version = index.version("accounts", "1.2").unwrap();

        let labels: Vec<_> = version.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Users", "Sessions"]);

        let users = version.group("Users").unwrap();
        assert_eq!(users.main_api.as_deref(), Some("/users"));
        let gets: Vec<_> = users.apis("get").iter().map(|a| a.path.as_str()).collect();
        assert_eq!(gets, vec!["/users", "/users/{id}"]);
        assert_eq!(users.apis("post").len(), 1);
        assert!(users.apis("patch").is_empty());

        assert!(version.find_api("Sessions", "delete", "/sessions").is_some());
        assert!(version.find_api("Sessions", "get", "/sessions").is_none());
    }

    #[test]
    fn test_service_groups_and_pagination() {
        let query = CatalogQuery {
            start: 0,
            limit: 25,
            ..CatalogQuery::default()
        };
        let index = CatalogIndex::build(catalog(), &query);

        let core = index.service_group("Core").unwrap();
        assert_eq!(core.all_service_apis.len(), 1);
        assert_eq!(
            core.paginations,
            Pagination {
                start: 0,
                limit: 25,
                total: 1
            }
        );
        assert_eq!(index.service("billing").unwrap().group, "Finance");
        assert!(index.version("billing", "3.1").is_none());
        assert!(index.service("orders").is_none());
        assert_eq!(index.services().count(), 2);
    }

    #[test]
    fn test_grouped_apis_order() {
        let index = CatalogIndex::build(catalog(), &CatalogQuery::default());
        let version = index.version("accounts", "1.2").unwrap();
        let flat: Vec<_> = version
            .grouped_apis()
            .map(|(g, v, a)| format!("{} {} {}", g, v, a.path))
            .collect();
        assert_eq!(
            flat,
            vec![
                "Users get /users",
                "Users get /users/{id}",
                "Users post /users",
                "Sessions delete /sessions",
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let index = CatalogIndex::build(catalog(), &CatalogQuery::default());
        let value = serde_json::to_value(index.service_group("Finance").unwrap()).unwrap();
        assert!(value.get("allServiceApis").is_some());
        assert_eq!(value["paginations"]["total"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_fetch_from_source() {
        let source = StaticCatalog::new(catalog());
        let index = CatalogIndex::fetch(&source, &CatalogQuery::default())
            .await
            .unwrap();
        assert!(index.version("accounts", "1.2").is_some());
    }

    #[tokio::test]
    async fn test_fetch_reads_every_page() {
        let mut services = catalog();
        services.push(CatalogService {
            name: "orders".into(),
            group: "Core".into(),
            versions: vec![],
        });
        let source = StaticCatalog::new(services);

        for limit in [1, 2, 3] {
            let query = CatalogQuery {
                limit,
                ..CatalogQuery::default()
            };
            let index = CatalogIndex::fetch(&source, &query).await.unwrap();
            assert_eq!(index.services().count(), 3, "page size {}", limit);
            assert!(index.version("billing", "3.0").is_some());
        }
    }

    #[test]
    fn test_duplicate_service_name_keeps_first_group() {
        let mut services = catalog();
        services.push(CatalogService {
            name: "accounts".into(),
            group: "Legacy".into(),
            versions: vec![],
        });

        let index = CatalogIndex::build(services, &CatalogQuery::default());
        assert_eq!(index.service("accounts").unwrap().group, "Core");
        assert!(index.version("accounts", "1.2").is_some());
        assert_eq!(index.service_group("Legacy").unwrap().all_service_apis.len(), 1);
    }
}
