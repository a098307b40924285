//! Records of the remote API catalog.
//!
//! Read-only input supplied per request. Field names follow the catalog's
//! JSON wire format.

use serde::{Deserialize, Serialize};

/// A catalogued micro-service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogService {
    /// Service name, matching the service key of ACL trees.
    pub name: String,
    /// Service-group label the catalog files this service under.
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub versions: Vec<CatalogVersion>,
}

/// One published version of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVersion {
    /// Raw version identifier (may contain `.`).
    pub version: String,
    /// APIs in catalog order.
    #[serde(default)]
    pub apis: Vec<CatalogApi>,
}

/// One API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogApi {
    pub path: String,
    /// HTTP verb as published; compare via [`CatalogApi::verb`].
    pub method: String,
    #[serde(default)]
    pub label: String,
    /// API group label.
    #[serde(default)]
    pub group: String,
    /// Marks the representative API of its group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_main: Option<bool>,
}

impl CatalogApi {
    pub fn new(
        group: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            label: String::new(),
            group: group.into(),
            group_main: None,
        }
    }

    /// Lowercased verb, the form used as a key in ACL trees.
    pub fn verb(&self) -> String {
        self.method.to_ascii_lowercase()
    }

    pub fn is_group_main(&self) -> bool {
        self.group_main.unwrap_or(false)
    }
}

impl CatalogService {
    pub fn version(&self, version: &str) -> Option<&CatalogVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_service() {
        let service: CatalogService = serde_json::from_value(serde_json::json!({
            "name": "accounts",
            "group": "Core",
            "versions": [{
                "version": "1.2",
                "apis": [
                    { "path": "/users", "method": "GET", "label": "List users", "group": "Users", "groupMain": true },
                    { "path": "/users", "method": "POST", "group": "Users" }
                ]
            }]
        }))
        .unwrap();

        let version = service.version("1.2").unwrap();
        assert_eq!(version.apis.len(), 2);
        assert_eq!(version.apis[0].verb(), "get");
        assert!(version.apis[0].is_group_main());
        assert!(!version.apis[1].is_group_main());
        assert!(service.version("1.3").is_none());
    }
}
