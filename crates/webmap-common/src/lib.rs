//! Common types and codecs shared across the WebMap to MapLibre converter.
//!
//! The input side models the Esri WebMap document (operational layers,
//! drawing info, renderers, symbols, popups). The output side models the
//! MapLibre-flavoured layer records consumed by the map UI.

pub mod color;
pub mod error;
pub mod expression;
pub mod geometry;
pub mod layer;
pub mod scale;
pub mod webmap;

pub use color::{esri_color_to_css, ColorValue, Rgba, FALLBACK_COLOR, TRANSPARENT};
pub use error::{WebMapError, WebMapResult};
pub use expression::{format_number, match_label, Expr, Paint};
pub use geometry::{classify, GeometryKind, SymbolType};
pub use layer::{LayerConfig, LegendItem, PopupConfig, PopupField, PopupFieldFormat};
pub use scale::{scale_to_zoom, zoom_to_scale, ZoomRange, SCALE_AT_ZOOM_0};
pub use webmap::{
    ClassBreakInfo, ClassBreaksRenderer, ColorStop, DrawingInfo, FieldFormat, FieldInfo,
    LayerDefinition, OperationalLayer, Outline, PopupInfo, Renderer, ServiceMetadata,
    SimpleRenderer, Symbol, UniqueValueInfo, UniqueValueRenderer, VisualVariable, WebMap,
};
