//! Converter configuration.
//!
//! Loaded from a YAML file, typically named by `WEBMAP_CONVERTER_CONFIG`:
//!
//! ```yaml
//! excluded_layers:
//!   - Rental License Violations (Under Construction)
//! service_renderer_titles:
//!   - Zoning Base Districts
//! circle_radius_factor: 0.71
//! max_concurrent_fetches: 4
//! style_overrides:
//!   council-districts:
//!     paint:
//!       fill-color: "rgba(0, 0, 0, 0.00)"
//!       fill-opacity: 0
//!     outline_paint:
//!       line-color: "#005ce6"
//!       line-width: 3
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use style_converter::ConvertOptions;
use tracing::{debug, info};
use webmap_common::{GeometryKind, LayerConfig, LegendItem, Paint, WebMapError, WebMapResult};

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV_VAR: &str = "WEBMAP_CONVERTER_CONFIG";

/// Everything the orchestrator needs beyond the WebMap itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Layers to drop: raw title, display title, derived id or WebMap layer id
    #[serde(default)]
    pub excluded_layers: Vec<String>,

    /// Titles whose embedded renderer is known to be wrong
    #[serde(default)]
    pub service_renderer_titles: Vec<String>,

    #[serde(default = "default_circle_radius_factor")]
    pub circle_radius_factor: f64,

    #[serde(default = "default_circle_size")]
    pub default_circle_size: f64,

    #[serde(default = "default_line_width")]
    pub default_line_width: f64,

    #[serde(default = "default_fallback_color")]
    pub fallback_color: String,

    /// Upper bound on concurrent service metadata requests
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// ArcGIS portal hosting the WebMap items
    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Per layer id replacements applied after conversion
    #[serde(default)]
    pub style_overrides: HashMap<String, StyleOverride>,
}

fn default_circle_radius_factor() -> f64 {
    0.71
}

fn default_circle_size() -> f64 {
    6.0
}

fn default_line_width() -> f64 {
    2.0
}

fn default_fallback_color() -> String {
    webmap_common::FALLBACK_COLOR.to_string()
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_portal_url() -> String {
    "https://www.arcgis.com".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            excluded_layers: Vec::new(),
            service_renderer_titles: Vec::new(),
            circle_radius_factor: default_circle_radius_factor(),
            default_circle_size: default_circle_size(),
            default_line_width: default_line_width(),
            fallback_color: default_fallback_color(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            portal_url: default_portal_url(),
            style_overrides: HashMap::new(),
        }
    }
}

impl ConverterConfig {
    /// Parse and validate YAML configuration.
    pub fn from_yaml(yaml: &str) -> WebMapResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| WebMapError::Config(format!("Invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> WebMapResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WebMapError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&contents)?;
        info!(
            path = %path.display(),
            excluded = config.excluded_layers.len(),
            overrides = config.style_overrides.len(),
            "Loaded converter configuration"
        );
        Ok(config)
    }

    /// Load from the file named by `WEBMAP_CONVERTER_CONFIG`, or defaults.
    pub fn from_env() -> WebMapResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => {
                debug!("No {} set, using default configuration", CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> WebMapResult<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(WebMapError::Config(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if !(self.circle_radius_factor.is_finite() && self.circle_radius_factor > 0.0) {
            return Err(WebMapError::Config(format!(
                "circle_radius_factor must be positive, got {}",
                self.circle_radius_factor
            )));
        }
        if self.portal_url.is_empty() {
            return Err(WebMapError::Config("portal_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            circle_radius_factor: self.circle_radius_factor,
            default_circle_size: self.default_circle_size,
            default_line_width: self.default_line_width,
            fallback_color: self.fallback_color.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether any of the layer's identifiers is on the deny-list.
    pub fn is_excluded(&self, identifiers: &[&str]) -> bool {
        identifiers
            .iter()
            .filter(|id| !id.is_empty())
            .any(|id| self.excluded_layers.iter().any(|excluded| excluded == id))
    }

    /// Whether the layer must take its renderer from the feature service.
    pub fn forces_service_renderer(&self, raw_title: &str, display_title: &str) -> bool {
        self.service_renderer_titles
            .iter()
            .any(|t| t == raw_title || t == display_title)
    }

    pub fn style_override(&self, layer_id: &str) -> Option<&StyleOverride> {
        self.style_overrides.get(layer_id)
    }
}

/// Hand-tuned style that replaces parts of a converted layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverride {
    #[serde(default)]
    pub paint: Option<Paint>,

    #[serde(default)]
    pub outline_paint: Option<Paint>,

    #[serde(default)]
    pub legend: Option<Vec<LegendItem>>,

    #[serde(rename = "type", default)]
    pub kind: Option<GeometryKind>,
}

impl StyleOverride {
    /// Replace each part that is set. Parts are swapped wholesale, not merged.
    pub fn apply(&self, config: &mut LayerConfig) {
        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if let Some(paint) = &self.paint {
            config.paint = paint.clone();
        }
        if let Some(outline_paint) = &self.outline_paint {
            config.outline_paint = Some(outline_paint.clone());
        }
        if let Some(legend) = &self.legend {
            config.legend = legend.clone();
        }
    }
}
