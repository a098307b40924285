//! Catalog service HTTP client
//!
//! Calls `listAllApis` on the remote catalog. Any transport failure, non-2xx
//! status, unparsable body or non-success envelope becomes a single
//! `UpstreamCatalog` error.

use super::{CatalogQuery, CatalogSource};
use crate::config::CatalogConfig;
use crate::error::{AclError, Result};
use acl_types::CatalogService;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Response envelope of the catalog service.
#[derive(Debug, Deserialize)]
struct CatalogEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<CatalogPayload>,
}

#[derive(Debug, Deserialize)]
struct CatalogPayload {
    #[serde(default)]
    services: Vec<CatalogService>,
}

impl CatalogEnvelope {
    fn into_services(self) -> Result<Vec<CatalogService>> {
        if !self.success {
            return Err(AclError::upstream(
                self.message
                    .unwrap_or_else(|| "catalog returned a non-success envelope".to_string()),
            ));
        }
        Ok(self.data.map(|d| d.services).unwrap_or_default())
    }
}

/// HTTP implementation of [`CatalogSource`].
pub struct HttpCatalogClient {
    http: Client,
    base_url: Url,
}

impl HttpCatalogClient {
    /// Create a client from catalog configuration
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AclError::Config(format!("invalid catalog base url '{}': {}", config.base_url, e))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AclError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    /// URL of one listing call.
    fn listing_url(&self, query: &CatalogQuery) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AclError::Config(format!("catalog base url '{}' cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty().push("apis");
            if query.first_party_only {
                segments.push("first-party");
            }
        }

        {
            let mut pairs = url.query_pairs_mut();
            if !query.types.is_empty() {
                pairs.append_pair("types", &query.types.join(","));
            }
            pairs.append_pair("start", &query.start.to_string());
            pairs.append_pair("limit", &query.limit.to_string());
        }

        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn list_all_apis(&self, query: &CatalogQuery) -> Result<Vec<CatalogService>> {
        let url = self.listing_url(query)?;
        tracing::debug!(%url, "listing catalog APIs");

        let response = self
            .http
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AclError::upstream(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AclError::upstream(format!(
                "catalog returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let envelope: CatalogEnvelope = response
            .json()
            .await
            .map_err(|e| AclError::upstream(format!("unparsable catalog response: {}", e)))?;

        let services = envelope.into_services()?;
        tracing::info!(services = services.len(), "catalog listing received");
        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(base_url: &str) -> CatalogConfig {
        CatalogConfig {
            base_url: base_url.to_string(),
            ..CatalogConfig::default()
        }
    }

    /// Serve a single canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{}/catalog", addr)
    }

    #[test]
    fn test_listing_url() {
        let client = HttpCatalogClient::new(&config("http://catalog.local/v1/")).unwrap();
        let url = client
            .listing_url(&CatalogQuery {
                types: vec!["Core".into(), "Finance".into()],
                start: 20,
                limit: 10,
                first_party_only: false,
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://catalog.local/v1/apis?types=Core%2CFinance&start=20&limit=10"
        );

        let url = client
            .listing_url(&CatalogQuery {
                first_party_only: true,
                ..CatalogQuery::default()
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://catalog.local/v1/apis/first-party?start=0&limit=1000"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpCatalogClient::new(&config("not a url")).err().unwrap();
        assert_eq!(err.code(), "CONFIG");
    }

    #[test]
    fn test_envelope_failure() {
        let envelope: CatalogEnvelope =
            serde_json::from_str(r#"{"success": false, "message": "catalog down"}"#).unwrap();
        let err = envelope.into_services().unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_CATALOG");
        assert!(err.to_string().contains("catalog down"));
    }

    #[tokio::test]
    async fn test_fetch_services() {
        let base = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"services":[{"name":"accounts","group":"Core","versions":[]}]}}"#,
        )
        .await;
        let client = HttpCatalogClient::new(&config(&base)).unwrap();

        let services = client.list_all_apis(&CatalogQuery::default()).await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "accounts");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let base = serve_once("503 Service Unavailable", r#"{"success":false}"#).await;
        let client = HttpCatalogClient::new(&config(&base)).unwrap();

        let err = client
            .list_all_apis(&CatalogQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AclError::UpstreamCatalog { .. }));
        assert!(err.to_string().contains("503"));
    }
}
