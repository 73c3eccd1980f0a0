//! Output layer records consumed by the map UI.
//!
//! Field names follow the JSON contract of the layer panel, so everything
//! is camelCase and optional keys are omitted rather than emitted as null.
//! The one exception is `popup`, which is always present.

use serde::{Deserialize, Serialize};

use crate::expression::Paint;
use crate::geometry::GeometryKind;
use crate::scale::ZoomRange;

/// A fully converted operational layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    /// Kebab-case slug of the display title
    pub id: String,

    /// Title with any group prefix stripped
    pub title: String,

    #[serde(rename = "type")]
    pub kind: GeometryKind,

    /// Feature service layer URL
    pub url: String,

    /// Filter passed to the feature service query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#where: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,

    pub opacity: f64,

    #[serde(default)]
    pub paint: Paint,

    /// Companion line paint for thick or fill-less polygon outlines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_paint: Option<Paint>,

    #[serde(default)]
    pub legend: Vec<LegendItem>,

    #[serde(default)]
    pub popup: Option<PopupConfig>,
}

impl LayerConfig {
    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }

    pub fn set_zoom_range(&mut self, range: ZoomRange) {
        self.min_zoom = range.min_zoom;
        self.max_zoom = range.max_zoom;
    }
}

/// One legend swatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub color: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl LegendItem {
    pub fn new(kind: GeometryKind, color: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            color: color.into(),
            label: label.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }
}

/// Feature detail popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupConfig {
    pub title: String,
    pub fields: Vec<PopupField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupField {
    pub field: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PopupFieldFormat>,
}

/// Formatting hints; only the properties that were set are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupFieldFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digit_separator: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<i64>,
}

impl PopupFieldFormat {
    pub fn is_empty(&self) -> bool {
        self.date_format.is_none() && self.digit_separator.is_none() && self.places.is_none()
    }
}
