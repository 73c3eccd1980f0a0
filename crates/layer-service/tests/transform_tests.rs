//! Tests for the layer orchestrator and the cached layer config service.
//!
//! Feature services and the portal are replaced by an in-process source so
//! fetch failures and concurrency can be controlled.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use layer_service::{
    transform_embedded, ConverterConfig, LayerConfigService, ServiceMetadataSource,
    StyleOverride, WebMapSource, WebMapTransformer,
};
use serde_json::{json, Value};
use test_utils::{colors, layers, renderers, require_test_file, symbols, webmaps};
use webmap_common::{
    GeometryKind, LayerConfig, Paint, ServiceMetadata, WebMapError, WebMapResult,
};

// ============================================================================
// Mock portal and feature services
// ============================================================================

#[derive(Default)]
struct MockArcGis {
    webmaps: HashMap<String, Value>,
    services: HashMap<String, Value>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    service_calls: AtomicUsize,
    webmap_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockArcGis {
    fn new() -> Self {
        Self::default()
    }

    fn with_service(mut self, url: &str, metadata: Value) -> Self {
        self.services.insert(url.to_string(), metadata);
        self
    }

    fn with_failure(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn with_webmap(mut self, id: &str, doc: Value) -> Self {
        self.webmaps.insert(id.to_string(), doc);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn service_calls(&self) -> usize {
        self.service_calls.load(Ordering::SeqCst)
    }

    fn webmap_calls(&self) -> usize {
        self.webmap_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceMetadataSource for MockArcGis {
    async fn fetch_service_metadata(&self, url: &str) -> WebMapResult<ServiceMetadata> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(url) {
            return Err(WebMapError::Http(format!("connection reset: {}", url)));
        }
        match self.services.get(url) {
            Some(body) => Ok(serde_json::from_value(body.clone())?),
            None => Err(WebMapError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl WebMapSource for MockArcGis {
    async fn fetch_webmap(&self, webmap_id: &str, _token: Option<&str>) -> WebMapResult<Value> {
        self.webmap_calls.fetch_add(1, Ordering::SeqCst);
        self.webmaps
            .get(webmap_id)
            .cloned()
            .ok_or_else(|| WebMapError::ArcGis("Item does not exist or is inaccessible.".into()))
    }
}

fn transformer(mock: MockArcGis, config: ConverterConfig) -> WebMapTransformer<Arc<MockArcGis>> {
    WebMapTransformer::new(Arc::new(mock), Arc::new(config))
}

fn ids(configs: &[LayerConfig]) -> Vec<&str> {
    configs.iter().map(|c| c.id.as_str()).collect()
}

fn titles(configs: &[LayerConfig]) -> Vec<&str> {
    configs.iter().map(|c| c.title.as_str()).collect()
}

// ============================================================================
// Record assembly tests
// ============================================================================

#[tokio::test]
async fn test_land_use_layer_record() {
    let source = Arc::new(MockArcGis::new());
    let transformer = WebMapTransformer::new(source.clone(), Arc::new(ConverterConfig::default()));

    let configs = transformer
        .transform(&webmaps::webmap(vec![layers::land_use()]))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&configs).unwrap(),
        json!([{
            "id": "land-use",
            "title": "Land Use",
            "type": "fill",
            "url": "https://svc/arcgis/rest/services/LandUse/FeatureServer/0",
            "opacity": 1.0,
            "paint": {"fill-color": "#38a800", "fill-opacity": 1.0},
            "legend": [{"type": "fill", "color": "#38a800", "label": "Feature"}],
            "popup": null
        }])
    );
    assert_eq!(source.service_calls(), 0, "embedded renderer needs no fetch");
}

#[tokio::test]
async fn test_group_layers_are_skipped() {
    let doc = webmaps::webmap(vec![
        layers::group("Planning"),
        layers::land_use(),
        json!({"title": "Empty URL", "url": ""}),
    ]);
    let configs = transformer(MockArcGis::new(), ConverterConfig::default())
        .transform(&doc)
        .await
        .unwrap();
    assert_eq!(ids(&configs), vec!["land-use"]);
}

#[tokio::test]
async fn test_results_sorted_by_display_title() {
    let doc = webmaps::webmap(vec![
        layers::with_renderer("b_Zebra Crossings", "https://svc/1", renderers::simple(symbols::line(colors::BLACK, 1.0))),
        layers::with_renderer("apple Orchards", "https://svc/2", renderers::simple(symbols::fill(colors::GREEN))),
        layers::with_renderer("Alpha Sites", "https://svc/3", renderers::simple(symbols::marker(colors::RED, 8.0))),
    ]);
    let configs = transformer(MockArcGis::new(), ConverterConfig::default())
        .transform(&doc)
        .await
        .unwrap();
    assert_eq!(titles(&configs), vec!["Alpha Sites", "apple Orchards", "Zebra Crossings"]);
}

#[test]
fn test_accented_titles_sort_by_base_letter() {
    let doc = webmaps::webmap(vec![
        layers::with_renderer("Zoning", "https://svc/zoning", renderers::simple(symbols::fill(colors::GREEN))),
        layers::with_renderer(
            "Schools_Éducation Centers",
            "https://svc/education",
            renderers::simple(symbols::marker(colors::BLUE, 6.0)),
        ),
    ]);
    let configs = transform_embedded(&doc, &ConverterConfig::default()).unwrap();

    assert_eq!(titles(&configs), vec!["Éducation Centers", "Zoning"]);
    assert_eq!(ids(&configs), vec!["education-centers", "zoning"]);
}

#[test]
fn test_string_marker_size_keeps_layer() {
    let mut symbol = symbols::marker(colors::RED, 8.0);
    symbol["size"] = json!("8");
    let mut outlined = symbols::fill_with_outline(colors::BLUE, colors::BLACK, 1.0);
    outlined["outline"]["width"] = json!("thin");

    let doc = webmaps::webmap(vec![
        layers::with_renderer("Hydrants", "https://svc/hydrants", renderers::simple(symbol)),
        layers::with_renderer("Parcels", "https://svc/parcels", renderers::simple(outlined)),
    ]);
    let configs = transform_embedded(&doc, &ConverterConfig::default()).unwrap();
    assert_eq!(ids(&configs), vec!["hydrants", "parcels"]);

    let numeric = webmaps::webmap(vec![layers::with_renderer(
        "Hydrants",
        "https://svc/hydrants",
        renderers::simple(symbols::marker(colors::RED, 8.0)),
    )]);
    let expected = transform_embedded(&numeric, &ConverterConfig::default()).unwrap();
    assert_eq!(configs[0], expected[0]);
}

// ============================================================================
// Fetch and failure handling tests
// ============================================================================

#[tokio::test]
async fn test_failed_fetch_only_drops_that_layer() {
    let mut mock = MockArcGis::new();
    let mut entries = Vec::new();
    for (i, name) in ["Parks", "Schools", "Hydrants", "Trails", "Wards"].iter().enumerate() {
        let url = layers::service_url(name);
        entries.push(layers::without_renderer(name, &url));
        mock = if i == 2 {
            mock.with_failure(&url)
        } else {
            mock.with_service(
                &url,
                webmaps::service_metadata(Some(renderers::simple(symbols::fill(colors::BLUE))), None),
            )
        };
    }

    let configs = transformer(mock, ConverterConfig::default())
        .transform(&webmaps::webmap(entries))
        .await
        .unwrap();

    assert_eq!(configs.len(), 4);
    assert_eq!(ids(&configs), vec!["parks", "schools", "trails", "wards"]);
    assert!(configs
        .iter()
        .all(|c| c.paint["fill-color"].to_json() == json!("#0070ff")));
}

#[tokio::test]
async fn test_service_without_renderer_gives_empty_paint() {
    let url = layers::service_url("Parcels");
    let mock = MockArcGis::new().with_service(&url, webmaps::service_metadata(None, None));
    let configs = transformer(mock, ConverterConfig::default())
        .transform(&webmaps::webmap(vec![layers::without_renderer("Parcels", &url)]))
        .await
        .unwrap();

    assert_eq!(configs.len(), 1);
    assert!(configs[0].paint.is_empty());
    assert!(configs[0].legend.is_empty());
    assert_eq!(configs[0].kind, GeometryKind::Fill);
}

#[tokio::test]
async fn test_fetch_concurrency_is_bounded() {
    let mut mock = MockArcGis::new().with_delay(Duration::from_millis(10));
    let mut entries = Vec::new();
    for i in 0..8 {
        let name = format!("Layer {}", i);
        let url = layers::service_url(&name.replace(' ', "_"));
        entries.push(layers::without_renderer(&name, &url));
        mock = mock.with_service(&url, webmaps::service_metadata(None, None));
    }
    let source = Arc::new(mock);
    let config = ConverterConfig {
        max_concurrent_fetches: 2,
        ..Default::default()
    };
    let transformer = WebMapTransformer::new(source.clone(), Arc::new(config));

    let configs = transformer.transform(&webmaps::webmap(entries)).await.unwrap();

    assert_eq!(configs.len(), 8);
    assert_eq!(source.service_calls(), 8);
    let peak = source.max_in_flight.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 2, "peak concurrency {}", peak);
}

#[tokio::test]
async fn test_malformed_documents_fail_the_batch() {
    let transformer = transformer(MockArcGis::new(), ConverterConfig::default());

    for doc in [json!([1, 2]), json!("webmap"), json!({"operationalLayers": 5})] {
        let err = transformer.transform(&doc).await.unwrap_err();
        assert!(matches!(err, WebMapError::InvalidDocument(_)), "{:?}", err);
        assert!(err.is_batch_error());
    }

    let err = transformer.transform(&json!({"baseMap": {}})).await.unwrap_err();
    assert!(matches!(err, WebMapError::MissingOperationalLayers));
}

#[tokio::test]
async fn test_empty_webmap_gives_empty_list() {
    let configs = transformer(MockArcGis::new(), ConverterConfig::default())
        .transform(&webmaps::webmap(Vec::new()))
        .await
        .unwrap();
    assert!(configs.is_empty());
}

#[tokio::test]
async fn test_transform_is_idempotent() {
    let url = layers::service_url("Zoning");
    let doc = webmaps::webmap(vec![
        layers::land_use(),
        layers::without_renderer("Planning_Zoning", &url),
        layers::with_renderer(
            "Streets",
            "https://svc/streets",
            renderers::unique_value(
                "CLASS",
                vec![
                    (json!(1), Some("Arterial"), symbols::line(colors::RED, 3.0)),
                    (json!(2), Some("Local"), symbols::line(colors::BLACK, 1.0)),
                ],
            ),
        ),
    ]);
    let mock = MockArcGis::new().with_service(
        &url,
        webmaps::service_metadata(Some(renderers::simple(symbols::fill(colors::HALF_RED))), None),
    );
    let transformer = transformer(mock, ConverterConfig::default());

    let first = serde_json::to_string(&transformer.transform(&doc).await.unwrap()).unwrap();
    let second = serde_json::to_string(&transformer.transform(&doc).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Configuration tests
// ============================================================================

#[tokio::test]
async fn test_excluded_layers_are_dropped() {
    let doc = webmaps::webmap(vec![
        layers::land_use(),
        layers::with_renderer(
            "Licenses_Rental Violations",
            "https://svc/rental",
            renderers::simple(symbols::marker(colors::RED, 6.0)),
        ),
    ]);
    let config = ConverterConfig {
        excluded_layers: vec!["Rental Violations".to_string()],
        ..Default::default()
    };
    let configs = transformer(MockArcGis::new(), config).transform(&doc).await.unwrap();
    assert_eq!(ids(&configs), vec!["land-use"]);
}

#[tokio::test]
async fn test_override_list_uses_service_renderer_and_labels() {
    let url = layers::service_url("Zoning_BaseDistricts");
    let service_renderer = renderers::unique_value(
        "ZONE",
        vec![
            (json!(11), None, symbols::fill(colors::RED)),
            (json!("22"), Some("22"), symbols::fill(colors::BLUE)),
        ],
    );
    let mock = MockArcGis::new().with_service(
        &url,
        webmaps::service_metadata(
            Some(service_renderer),
            Some("<p>Zoning codes:</p><p>11 - Light Industrial</p><p>22 Residential</p>"),
        ),
    );
    let source = Arc::new(mock);
    let config = ConverterConfig {
        service_renderer_titles: vec!["Zoning Base Districts".to_string()],
        ..Default::default()
    };
    let transformer = WebMapTransformer::new(source.clone(), Arc::new(config));

    let doc = webmaps::webmap(vec![layers::with_renderer(
        "Planning_Zoning Base Districts",
        &url,
        renderers::simple(symbols::fill(colors::GREEN)),
    )]);
    let configs = transformer.transform(&doc).await.unwrap();

    assert_eq!(source.service_calls(), 1);
    let zoning = &configs[0];
    assert_eq!(zoning.id, "zoning-base-districts");
    let labels: Vec<&str> = zoning.legend.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["Light Industrial", "Residential"]);
    assert_eq!(zoning.paint["fill-color"].to_json()[0], json!("match"));
}

#[tokio::test]
async fn test_override_fetch_failure_keeps_embedded_renderer() {
    let url = layers::service_url("Zoning_BaseDistricts");
    let config = ConverterConfig {
        service_renderer_titles: vec!["Zoning Base Districts".to_string()],
        ..Default::default()
    };
    let doc = webmaps::webmap(vec![layers::with_renderer(
        "Planning_Zoning Base Districts",
        &url,
        renderers::simple(symbols::fill(colors::GREEN)),
    )]);

    let configs = transformer(MockArcGis::new().with_failure(&url), config)
        .transform(&doc)
        .await
        .unwrap();

    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].paint["fill-color"].to_json(), json!("#38a800"));
}

#[tokio::test]
async fn test_style_override_replaces_paint() {
    let mut paint = Paint::new();
    paint.insert("line-color".into(), "#005ce6".into());
    paint.insert("line-width".into(), 3.0.into());
    let mut config = ConverterConfig::default();
    config.style_overrides.insert(
        "land-use".to_string(),
        StyleOverride {
            paint: Some(paint),
            kind: Some(GeometryKind::Line),
            ..Default::default()
        },
    );

    let configs = transformer(MockArcGis::new(), config)
        .transform(&webmaps::webmap(vec![layers::land_use()]))
        .await
        .unwrap();

    assert_eq!(configs[0].kind, GeometryKind::Line);
    assert_eq!(
        serde_json::to_value(&configs[0].paint).unwrap(),
        json!({"line-color": "#005ce6", "line-width": 3.0})
    );
    assert_eq!(configs[0].legend[0].color, "#38a800", "legend is kept");
}

// ============================================================================
// Offline transform tests
// ============================================================================

#[test]
fn test_embedded_transform_matches_fetching_transform() {
    let doc = webmaps::webmap(vec![
        layers::land_use(),
        layers::with_renderer("Parks", "https://svc/parks", renderers::simple(symbols::fill(colors::GREEN))),
    ]);
    let config = ConverterConfig::default();

    let offline = transform_embedded(&doc, &config).unwrap();
    let online = tokio_test::block_on(transformer(MockArcGis::new(), config).transform(&doc)).unwrap();

    assert_eq!(
        serde_json::to_value(&offline).unwrap(),
        serde_json::to_value(&online).unwrap()
    );
}

#[test]
fn test_embedded_transform_of_sample_webmap() {
    let path = require_test_file!("sample_webmap.json");
    let doc = test_utils::load_test_json("sample_webmap.json")
        .unwrap_or_else(|| panic!("{} is not valid JSON", path.display()));

    let configs = transform_embedded(&doc, &ConverterConfig::default()).unwrap();

    assert_eq!(
        titles(&configs),
        vec![
            "Bike Network",
            "Council Districts",
            "Crime Density",
            "Free Libraries",
            "Tree Canopy Change",
            "Zoning Base Districts",
        ]
    );

    let by_id: HashMap<&str, &LayerConfig> = configs.iter().map(|c| (c.id.as_str(), c)).collect();
    let zoning = by_id["zoning-base-districts"];
    assert_eq!(zoning.min_zoom, Some(12.45));
    assert!(zoning.popup.is_some());

    assert_eq!(by_id["free-libraries"].kind, GeometryKind::Circle);
    assert_eq!(by_id["free-libraries"].max_zoom, Some(16.77));
    assert!(by_id["bike-network"].r#where.is_some());
    assert_eq!(by_id["bike-network"].kind, GeometryKind::Line);
    assert!(by_id["council-districts"].outline_paint.is_some());
    assert!(by_id["crime-density"].paint.is_empty());
    assert_eq!(
        by_id["tree-canopy-change"].paint["fill-color"].to_json()[0],
        json!("case")
    );
}

// ============================================================================
// Layer config service tests
// ============================================================================

#[tokio::test]
async fn test_service_memoizes_per_webmap() {
    let mock = Arc::new(
        MockArcGis::new().with_webmap("abc123", webmaps::webmap(vec![layers::land_use()])),
    );
    let service = LayerConfigService::new(mock.clone(), Arc::new(ConverterConfig::default()), None);

    let first = service.get_layer_configs("abc123").await.unwrap();
    let second = service.get_layer_configs("abc123").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.webmap_calls(), 1);

    service.clear_cache(Some("abc123")).await;
    let third = service.get_layer_configs("abc123").await.unwrap();
    assert_eq!(mock.webmap_calls(), 2);
    assert_eq!(first, third);
}

#[tokio::test]
async fn test_service_does_not_cache_failures() {
    let mock = Arc::new(MockArcGis::new());
    let service = LayerConfigService::new(mock.clone(), Arc::new(ConverterConfig::default()), None);

    assert!(matches!(
        service.get_layer_configs("missing").await,
        Err(WebMapError::ArcGis(_))
    ));
    assert!(service.get_layer_configs("missing").await.is_err());
    assert_eq!(mock.webmap_calls(), 2);
    assert!(service.cache().is_empty().await);
}
