//! Esri renderer, legend and popup conversion to MapLibre style specs.
//!
//! All converters are pure: the drawing info is resolved beforehand (from
//! the WebMap or from the feature service) and passed in, so nothing here
//! performs I/O.
//!
//! # Example
//!
//! ```
//! use style_converter::{convert_drawing_info, ConvertOptions};
//! use webmap_common::DrawingInfo;
//!
//! let info: DrawingInfo = serde_json::from_str(
//!     r#"{"renderer": {"type": "simple", "symbol": {"type": "esriSFS", "color": [56, 168, 0, 255]}}}"#,
//! ).unwrap();
//! let result = convert_drawing_info(Some(&info), 1.0, None, &ConvertOptions::default());
//! assert_eq!(result.legend[0].color, "#38a800");
//! ```

pub mod class_breaks;
pub mod continuous;
pub mod labels;
pub mod options;
pub mod popup;
pub mod simple;
mod symbology;
pub mod unique_value;

pub use labels::LabelMap;
pub use options::ConvertOptions;
pub use popup::convert_popup;

use tracing::warn;
use webmap_common::{DrawingInfo, GeometryKind, LegendItem, Paint, Renderer};

/// Output of a renderer conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererResult {
    pub paint: Paint,
    pub legend: Vec<LegendItem>,
    pub geometry: GeometryKind,
    /// Companion line paint for polygon outlines the fill layer cannot draw
    pub outline_paint: Option<Paint>,
}

impl RendererResult {
    /// Nothing to paint; the layer renders with host defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paint.is_empty() && self.legend.is_empty()
    }
}

/// Convert a layer's drawing info. A missing renderer yields an empty result.
pub fn convert_drawing_info(
    drawing_info: Option<&DrawingInfo>,
    opacity: f64,
    labels: Option<&LabelMap>,
    options: &ConvertOptions,
) -> RendererResult {
    match drawing_info.and_then(|info| info.renderer.as_ref()) {
        Some(renderer) => convert_renderer(renderer, opacity, labels, options),
        None => RendererResult::empty(),
    }
}

pub fn convert_renderer(
    renderer: &Renderer,
    opacity: f64,
    labels: Option<&LabelMap>,
    options: &ConvertOptions,
) -> RendererResult {
    match renderer {
        Renderer::Simple(r) => simple::convert_simple(r, opacity, options),
        Renderer::UniqueValue(r) => unique_value::convert_unique_value(r, opacity, labels, options),
        Renderer::ClassBreaks(r) => class_breaks::convert_class_breaks(r, opacity, options),
        Renderer::Unsupported(kind) => {
            warn!(renderer_type = %kind, "Unknown renderer type");
            RendererResult::empty()
        }
    }
}

/// Legend entries only.
pub fn legend_for(
    drawing_info: Option<&DrawingInfo>,
    opacity: f64,
    options: &ConvertOptions,
) -> Vec<LegendItem> {
    convert_drawing_info(drawing_info, opacity, None, options).legend
}
