//! WebMap to layer record orchestration.
//!
//! For every operational layer, in order:
//! 1. skip group layers (no URL) and deny-listed layers
//! 2. resolve drawing info, fetching the feature service metadata when the
//!    WebMap has no renderer or the title is on the override list
//! 3. convert renderer, popup, filter and scale range into a [`LayerConfig`]
//! 4. apply configured style overrides
//!
//! The records are then sorted by display title. A failure in any single
//! layer is logged and that layer is left out; only a malformed document
//! fails the whole call.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use style_converter::{convert_drawing_info, convert_popup, ConvertOptions, LabelMap};
use tracing::{debug, info, instrument, warn};
use webmap_common::{
    DrawingInfo, LayerConfig, OperationalLayer, WebMap, WebMapError, WebMapResult, ZoomRange,
};

use crate::client::ServiceMetadataSource;
use crate::config::ConverterConfig;
use crate::naming::{display_title, layer_slug, sort_layer_configs};

/// Drawing info chosen for a layer, plus any labels recovered from the
/// service description.
#[derive(Debug, Clone, Default)]
pub struct ResolvedStyle {
    pub drawing_info: Option<DrawingInfo>,
    pub labels: Option<LabelMap>,
}

impl ResolvedStyle {
    fn embedded(layer: &OperationalLayer) -> Self {
        Self {
            drawing_info: embedded_drawing_info(layer),
            labels: None,
        }
    }
}

fn embedded_drawing_info(layer: &OperationalLayer) -> Option<DrawingInfo> {
    layer
        .drawing_info()
        .filter(|info| info.renderer.is_some())
        .cloned()
}

/// Converts WebMap documents, consulting `S` for service metadata.
pub struct WebMapTransformer<S> {
    source: S,
    config: Arc<ConverterConfig>,
    options: ConvertOptions,
}

impl<S: ServiceMetadataSource> WebMapTransformer<S> {
    pub fn new(source: S, config: Arc<ConverterConfig>) -> Self {
        let options = config.convert_options();
        Self {
            source,
            config,
            options,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Transform a WebMap document into sorted layer records.
    #[instrument(skip_all)]
    pub async fn transform(&self, doc: &Value) -> WebMapResult<Vec<LayerConfig>> {
        let webmap = WebMap::from_value(doc)?;
        let candidates: Vec<OperationalLayer> = webmap
            .operational_layers
            .iter()
            .filter_map(|raw| prepare_layer(raw, &self.config))
            .collect();

        // buffered keeps input order, so logs and results line up with the WebMap
        let converted: Vec<Option<LayerConfig>> = stream::iter(candidates)
            .map(|layer| self.convert_layer(layer))
            .buffered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut configs: Vec<LayerConfig> = converted.into_iter().flatten().collect();
        sort_layer_configs(&mut configs);

        info!(
            input_layers = webmap.len(),
            output_layers = configs.len(),
            "Transformed WebMap"
        );
        Ok(configs)
    }

    async fn convert_layer(&self, layer: OperationalLayer) -> Option<LayerConfig> {
        let style = match self.resolve_style(&layer).await {
            Ok(style) => style,
            Err(e) => {
                warn!(layer = %layer.title, error = %e, "Skipping layer, no usable style");
                return None;
            }
        };

        match build_layer_config(
            &layer,
            style.drawing_info.as_ref(),
            style.labels.as_ref(),
            &self.options,
        ) {
            Ok(mut config) => {
                apply_style_override(&mut config, &self.config);
                Some(config)
            }
            Err(e) => {
                warn!(layer = %layer.title, error = %e, "Failed to transform layer");
                None
            }
        }
    }

    /// Decide where the layer's renderer comes from.
    ///
    /// A fetch error only fails the layer when there is no embedded
    /// renderer to fall back on.
    pub async fn resolve_style(&self, layer: &OperationalLayer) -> WebMapResult<ResolvedStyle> {
        let embedded = ResolvedStyle::embedded(layer);
        let forced = self
            .config
            .forces_service_renderer(&layer.title, &display_title(&layer.title));

        if embedded.drawing_info.is_some() && !forced {
            return Ok(embedded);
        }

        let url = layer.url.as_deref().ok_or_else(|| WebMapError::InvalidLayer {
            title: layer.title.clone(),
            message: "layer has no service URL".to_string(),
        })?;

        debug!(
            layer = %layer.title,
            forced,
            "Fetching renderer from feature service"
        );

        match self.source.fetch_service_metadata(url).await {
            Ok(metadata) => {
                let labels = LabelMap::from_optional(metadata.description.as_deref());
                let drawing_info = metadata
                    .drawing_info
                    .filter(|info| info.renderer.is_some())
                    .or(embedded.drawing_info);
                if drawing_info.is_none() {
                    warn!(layer = %layer.title, "No renderer in WebMap or service, using empty paint");
                }
                Ok(ResolvedStyle {
                    drawing_info,
                    labels: (!labels.is_empty()).then_some(labels),
                })
            }
            Err(e) if embedded.drawing_info.is_some() => {
                warn!(
                    layer = %layer.title,
                    error = %e,
                    "Service metadata unavailable, keeping WebMap renderer"
                );
                Ok(embedded)
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse a raw layer and apply the skip rules. `None` means skipped.
fn prepare_layer(raw: &Value, config: &ConverterConfig) -> Option<OperationalLayer> {
    let layer = match OperationalLayer::from_value(raw) {
        Ok(layer) => layer,
        Err(e) => {
            warn!(error = %e, "Skipping malformed layer");
            return None;
        }
    };

    if layer.url.as_deref().map_or(true, str::is_empty) {
        info!(layer = %layer.title, "Skipping layer without URL");
        return None;
    }

    let shown = display_title(&layer.title);
    let slug = layer_slug(&layer.title);
    let webmap_id = layer.layer_id().unwrap_or_default();
    if config.is_excluded(&[
        layer.title.as_str(),
        shown.as_str(),
        slug.as_str(),
        webmap_id.as_str(),
    ]) {
        info!(layer = %layer.title, "Skipping excluded layer");
        return None;
    }

    Some(layer)
}

fn apply_style_override(config: &mut LayerConfig, converter: &ConverterConfig) {
    if let Some(style) = converter.style_override(&config.id) {
        debug!(layer = %config.id, "Applying style override");
        style.apply(config);
    }
}

/// Assemble one layer record from already resolved drawing info. Pure.
pub fn build_layer_config(
    layer: &OperationalLayer,
    drawing_info: Option<&DrawingInfo>,
    labels: Option<&LabelMap>,
    options: &ConvertOptions,
) -> WebMapResult<LayerConfig> {
    let url = layer
        .url
        .clone()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| WebMapError::InvalidLayer {
            title: layer.title.clone(),
            message: "layer has no service URL".to_string(),
        })?;

    let id = layer_slug(&layer.title);
    if id.is_empty() {
        return Err(WebMapError::InvalidLayer {
            title: layer.title.clone(),
            message: "title does not produce a usable id".to_string(),
        });
    }

    let opacity = layer.opacity_or_default();
    let renderer = convert_drawing_info(drawing_info, opacity, labels, options);

    let definition = layer.layer_definition.as_ref();
    let zoom = ZoomRange::from_scales(
        definition.and_then(|d| d.min_scale),
        definition.and_then(|d| d.max_scale),
    );

    let mut config = LayerConfig {
        id,
        title: display_title(&layer.title),
        kind: renderer.geometry,
        url,
        r#where: layer.definition_expression().map(str::to_string),
        min_zoom: None,
        max_zoom: None,
        opacity,
        paint: renderer.paint,
        outline_paint: renderer.outline_paint,
        legend: renderer.legend,
        popup: convert_popup(layer.popup_info.as_ref()),
    };
    config.set_zoom_range(zoom);
    Ok(config)
}

/// Transform using only the renderers embedded in the WebMap. Performs no
/// I/O; layers without a renderer get empty paint.
pub fn transform_embedded(doc: &Value, config: &ConverterConfig) -> WebMapResult<Vec<LayerConfig>> {
    let webmap = WebMap::from_value(doc)?;
    let options = config.convert_options();

    let mut configs: Vec<LayerConfig> = webmap
        .operational_layers
        .iter()
        .filter_map(|raw| prepare_layer(raw, config))
        .filter_map(|layer| {
            let drawing_info = embedded_drawing_info(&layer);
            match build_layer_config(&layer, drawing_info.as_ref(), None, &options) {
                Ok(mut record) => {
                    apply_style_override(&mut record, config);
                    Some(record)
                }
                Err(e) => {
                    warn!(layer = %layer.title, error = %e, "Failed to transform layer");
                    None
                }
            }
        })
        .collect();

    sort_layer_configs(&mut configs);
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_utils::layers;

    #[test]
    fn test_land_use_record() {
        let layer = OperationalLayer::from_value(&layers::land_use()).unwrap();
        let info = embedded_drawing_info(&layer);
        let config =
            build_layer_config(&layer, info.as_ref(), None, &ConvertOptions::default()).unwrap();

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "id": "land-use",
                "title": "Land Use",
                "type": "fill",
                "url": "https://svc/arcgis/rest/services/LandUse/FeatureServer/0",
                "opacity": 1.0,
                "paint": {"fill-color": "#38a800", "fill-opacity": 1.0},
                "legend": [{"type": "fill", "color": "#38a800", "label": "Feature"}],
                "popup": null
            })
        );
    }

    #[test]
    fn test_where_and_zoom() {
        let layer = OperationalLayer::from_value(&json!({
            "title": "Permits",
            "url": "https://svc/0",
            "layerDefinition": {
                "definitionExpression": "STATUS = 'Active'",
                "minScale": 100000,
                "maxScale": 5000
            }
        }))
        .unwrap();
        let config = build_layer_config(&layer, None, None, &ConvertOptions::default()).unwrap();

        assert_eq!(config.r#where.as_deref(), Some("STATUS = 'Active'"));
        assert_eq!(config.min_zoom, Some(12.45));
        assert_eq!(config.max_zoom, Some(16.77));
        assert!(config.paint.is_empty());
        assert!(config.legend.is_empty());
    }

    #[test]
    fn test_unusable_title_is_an_error() {
        let layer =
            OperationalLayer::from_value(&json!({"title": "!!!", "url": "https://svc/0"})).unwrap();
        assert!(matches!(
            build_layer_config(&layer, None, None, &ConvertOptions::default()),
            Err(WebMapError::InvalidLayer { .. })
        ));
    }

    #[test]
    fn test_prepare_skips_groups_and_excluded() {
        let config = ConverterConfig {
            excluded_layers: vec!["vacancy-licenses".to_string(), "abc-123".to_string()],
            ..Default::default()
        };
        assert!(prepare_layer(&layers::group("Folder"), &config).is_none());
        assert!(prepare_layer(
            &json!({"title": "Licenses_Vacancy Licenses", "url": "https://svc/0"}),
            &config
        )
        .is_none());
        assert!(prepare_layer(
            &json!({"id": "abc-123", "title": "Anything", "url": "https://svc/0"}),
            &config
        )
        .is_none());
        assert!(prepare_layer(&json!({"title": "Kept", "url": "https://svc/0"}), &config).is_some());
        assert!(prepare_layer(&json!({"title": 42, "url": "https://svc/0"}), &config).is_none());
    }
}
