//! WebMap id in, cached layer records out.

use std::sync::Arc;

use tracing::{info, instrument};
use webmap_common::WebMapResult;

use crate::cache::{CachedLayers, LayerConfigCache};
use crate::client::{ArcGisClient, ServiceMetadataSource, WebMapSource};
use crate::config::ConverterConfig;
use crate::transform::WebMapTransformer;

/// Fetches a WebMap, transforms it and memoizes the result per WebMap id.
pub struct LayerConfigService<C> {
    client: Arc<C>,
    transformer: WebMapTransformer<Arc<C>>,
    cache: LayerConfigCache,
    token: Option<String>,
}

impl LayerConfigService<ArcGisClient> {
    /// Service talking to the portal named in `config`.
    pub fn from_config(config: ConverterConfig, token: Option<String>) -> WebMapResult<Self> {
        let client = ArcGisClient::new(&config)?;
        Ok(Self::new(Arc::new(client), Arc::new(config), token))
    }
}

impl<C> LayerConfigService<C>
where
    C: WebMapSource + ServiceMetadataSource,
{
    pub fn new(client: Arc<C>, config: Arc<ConverterConfig>, token: Option<String>) -> Self {
        Self {
            transformer: WebMapTransformer::new(client.clone(), config),
            client,
            cache: LayerConfigCache::new(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Layer records for a WebMap, loading it on first use.
    #[instrument(skip(self))]
    pub async fn get_layer_configs(&self, webmap_id: &str) -> WebMapResult<CachedLayers> {
        self.cache
            .get_or_load(webmap_id, || async {
                let doc = self
                    .client
                    .fetch_webmap(webmap_id, self.token.as_deref())
                    .await?;
                let layers = self.transformer.transform(&doc).await?;
                info!(webmap_id, layers = layers.len(), "Loaded layer configs");
                Ok(layers)
            })
            .await
    }

    /// Forget one WebMap, or all of them.
    pub async fn clear_cache(&self, webmap_id: Option<&str>) {
        self.cache.clear(webmap_id).await;
    }

    pub fn cache(&self) -> &LayerConfigCache {
        &self.cache
    }

    pub fn transformer(&self) -> &WebMapTransformer<Arc<C>> {
        &self.transformer
    }
}
