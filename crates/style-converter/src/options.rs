//! Tunables for renderer conversion.

use serde::{Deserialize, Serialize};
use webmap_common::FALLBACK_COLOR;

/// Conversion constants that depend on the rendering target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Esri marker size (points, diameter) to MapLibre radius (pixels)
    pub circle_radius_factor: f64,

    /// Marker size assumed when a symbol has none
    pub default_circle_size: f64,

    /// Line width for unique-value line layers whose first symbol has none
    pub default_line_width: f64,

    /// Color used for missing symbols and unmatched categories
    pub fallback_color: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            circle_radius_factor: 0.71,
            default_circle_size: 6.0,
            default_line_width: 2.0,
            fallback_color: FALLBACK_COLOR.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Circle radius in pixels, rounded to 2 decimals.
    pub fn circle_radius(&self, size: Option<f64>) -> f64 {
        let size = size.filter(|s| *s > 0.0).unwrap_or(self.default_circle_size);
        ((size * self.circle_radius_factor) * 100.0).round() / 100.0
    }
}
