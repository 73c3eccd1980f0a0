//! ArcGIS REST access: WebMap items and feature service metadata.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info, instrument};
use webmap_common::{ServiceMetadata, WebMapError, WebMapResult};

use crate::config::ConverterConfig;

/// Source of feature service metadata (`{serviceUrl}?f=json`).
#[async_trait]
pub trait ServiceMetadataSource: Send + Sync {
    async fn fetch_service_metadata(&self, url: &str) -> WebMapResult<ServiceMetadata>;
}

/// Source of WebMap documents by portal item id.
#[async_trait]
pub trait WebMapSource: Send + Sync {
    async fn fetch_webmap(&self, webmap_id: &str, token: Option<&str>) -> WebMapResult<Value>;
}

#[async_trait]
impl<T: ServiceMetadataSource + ?Sized> ServiceMetadataSource for Arc<T> {
    async fn fetch_service_metadata(&self, url: &str) -> WebMapResult<ServiceMetadata> {
        (**self).fetch_service_metadata(url).await
    }
}

#[async_trait]
impl<T: WebMapSource + ?Sized> WebMapSource for Arc<T> {
    async fn fetch_webmap(&self, webmap_id: &str, token: Option<&str>) -> WebMapResult<Value> {
        (**self).fetch_webmap(webmap_id, token).await
    }
}

/// Append `f=json` to a service URL.
pub fn service_metadata_url(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}f=json", url, separator)
}

/// Item data URL of a WebMap on a portal. The id and token are
/// percent-encoded.
pub fn webmap_url(portal_url: &str, webmap_id: &str, token: Option<&str>) -> WebMapResult<String> {
    let mut url = Url::parse(portal_url.trim_end_matches('/'))
        .map_err(|e| WebMapError::Config(format!("Invalid portal URL {}: {}", portal_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| WebMapError::Config(format!("Portal URL {} cannot take a path", portal_url)))?
        .pop_if_empty()
        .extend(["sharing", "rest", "content", "items", webmap_id, "data"]);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("f", "json");
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            query.append_pair("token", token);
        }
    }
    Ok(url.to_string())
}

/// ArcGIS answers many failures with HTTP 200 and an `error` object.
pub fn check_arcgis_error(body: &Value) -> WebMapResult<()> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| error.get("code").map(|c| format!("code {}", c)))
        .unwrap_or_else(|| "Unknown error".to_string());
    Err(WebMapError::ArcGis(message))
}

fn http_error(err: reqwest::Error) -> WebMapError {
    if err.is_timeout() {
        WebMapError::Http(format!("request timed out: {}", err))
    } else {
        WebMapError::Http(err.to_string())
    }
}

/// HTTP client for an ArcGIS portal and its feature services.
#[derive(Clone)]
pub struct ArcGisClient {
    client: Client,
    portal_url: String,
}

impl ArcGisClient {
    pub fn new(config: &ConverterConfig) -> WebMapResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(config.max_concurrent_fetches)
            .build()
            .map_err(|e| WebMapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.portal_url))
    }

    pub fn with_client(client: Client, portal_url: &str) -> Self {
        Self {
            client,
            portal_url: portal_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    /// GET a JSON document, treating non-2xx and ArcGIS error bodies as failures.
    async fn get_json(&self, url: &str, log_url: &str) -> WebMapResult<Value> {
        let response = self.client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebMapError::HttpStatus {
                status: status.as_u16(),
                url: log_url.to_string(),
            });
        }

        let body: Value = response.json().await.map_err(http_error)?;
        check_arcgis_error(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl ServiceMetadataSource for ArcGisClient {
    #[instrument(skip(self))]
    async fn fetch_service_metadata(&self, url: &str) -> WebMapResult<ServiceMetadata> {
        let request_url = service_metadata_url(url);
        let body = self.get_json(&request_url, &request_url).await?;
        let metadata: ServiceMetadata = serde_json::from_value(body)?;
        debug!(
            has_renderer = metadata
                .drawing_info
                .as_ref()
                .map(|d| d.renderer.is_some())
                .unwrap_or(false),
            has_description = metadata.description.is_some(),
            "Fetched service metadata"
        );
        Ok(metadata)
    }
}

#[async_trait]
impl WebMapSource for ArcGisClient {
    // The token must never reach the logs.
    #[instrument(skip(self, token), fields(with_token = token.is_some()))]
    async fn fetch_webmap(&self, webmap_id: &str, token: Option<&str>) -> WebMapResult<Value> {
        let url = webmap_url(&self.portal_url, webmap_id, token)?;
        let log_url = webmap_url(&self.portal_url, webmap_id, None)?;
        info!(url = %log_url, "Fetching WebMap");
        self.get_json(&url, &log_url).await
    }
}
