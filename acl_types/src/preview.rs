//! Preview records: flattened, environment-comparable ACL entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Granularity of a preview list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewGranularity {
    /// One record per service version.
    Service,
    /// One record per catalogued API.
    Api,
}

/// One row of a preview list.
///
/// The identity is `(service, version)` at service granularity and
/// `(service, version, group, method, api)` at API granularity. The three
/// maps are keyed by raw environment name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    pub service: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// Whether a rule is stored in the environment.
    #[serde(default)]
    pub envs: BTreeMap<String, bool>,
    /// The rule's restricted flag per environment.
    #[serde(default)]
    pub restriction: BTreeMap<String, bool>,
    /// Resolved access per environment.
    #[serde(default)]
    pub access: BTreeMap<String, bool>,
}

impl PreviewRecord {
    pub fn service_level(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            group: None,
            method: None,
            api: None,
            envs: BTreeMap::new(),
            restriction: BTreeMap::new(),
            access: BTreeMap::new(),
        }
    }

    pub fn api_level(
        service: impl Into<String>,
        version: impl Into<String>,
        group: impl Into<String>,
        method: impl Into<String>,
        api: impl Into<String>,
    ) -> Self {
        Self {
            group: Some(group.into()),
            method: Some(method.into()),
            api: Some(api.into()),
            ..Self::service_level(service, version)
        }
    }

    /// Record the state of one environment.
    pub fn with_env(
        mut self,
        env: impl Into<String>,
        present: bool,
        restricted: bool,
        access: bool,
    ) -> Self {
        let env = env.into();
        self.envs.insert(env.clone(), present);
        self.restriction.insert(env.clone(), restricted);
        self.access.insert(env, access);
        self
    }

    /// Set only the access value of one environment, as an edited record does.
    pub fn with_access(mut self, env: impl Into<String>, access: bool) -> Self {
        self.access.insert(env.into(), access);
        self
    }

    /// Granularity implied by the identity, or `None` when the API part is
    /// only partially filled in.
    pub fn granularity(&self) -> Option<PreviewGranularity> {
        match (&self.group, &self.method, &self.api) {
            (None, None, None) => Some(PreviewGranularity::Service),
            (Some(_), Some(_), Some(_)) => Some(PreviewGranularity::Api),
            _ => None,
        }
    }

    /// Human-readable identity, used in errors and logs.
    pub fn identity(&self) -> String {
        match (&self.group, &self.method, &self.api) {
            (Some(group), Some(method), Some(api)) => format!(
                "{}@{} {} {} {}",
                self.service, self.version, group, method, api
            ),
            _ => format!("{}@{}", self.service, self.version),
        }
    }
}
