//! Map-service scale denominators and MapLibre zoom levels.
//!
//! Esri describes visibility by scale (a larger number is further out),
//! MapLibre by zoom (a larger number is further in). The names line up but
//! the directions do not:
//!
//! - Esri `minScale` is the zoomed-out limit and becomes MapLibre `minzoom`.
//! - Esri `maxScale` is the zoomed-in limit and becomes MapLibre `maxzoom`.

use serde::{Deserialize, Serialize};

/// Approximate scale denominator at zoom 0 on the equator (Web Mercator).
pub const SCALE_AT_ZOOM_0: f64 = 559_082_264.0;

/// Convert a scale denominator to a zoom level rounded to 2 decimals.
///
/// Returns `None` for zero, negative or non-finite scales, which Esri uses
/// to mean "no limit".
pub fn scale_to_zoom(scale: f64) -> Option<f64> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    Some(round2((SCALE_AT_ZOOM_0 / scale).log2()))
}

/// Inverse of [`scale_to_zoom`], without rounding.
pub fn zoom_to_scale(zoom: f64) -> f64 {
    SCALE_AT_ZOOM_0 / zoom.exp2()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Zoom bounds derived from a layer's scale range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
}

impl ZoomRange {
    pub fn from_scales(min_scale: Option<f64>, max_scale: Option<f64>) -> Self {
        Self {
            min_zoom: min_scale.and_then(scale_to_zoom),
            max_zoom: max_scale.and_then(scale_to_zoom),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min_zoom.is_none() && self.max_zoom.is_none()
    }
}
