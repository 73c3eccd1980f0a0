//! Symbol type tags and the output geometry they map to.

use serde::{Deserialize, Serialize};

use crate::webmap::Symbol;

/// Esri symbol type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolType {
    /// `esriSFS` simple fill
    SimpleFill,
    /// `esriSLS` simple line
    SimpleLine,
    /// `esriSMS` simple marker
    SimpleMarker,
    /// `esriPMS` picture marker
    PictureMarker,
    /// `esriPFS` picture fill
    PictureFill,
    /// Anything else, including text symbols
    Other(String),
}

impl SymbolType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "esriSFS" => Self::SimpleFill,
            "esriSLS" => Self::SimpleLine,
            "esriSMS" => Self::SimpleMarker,
            "esriPMS" => Self::PictureMarker,
            "esriPFS" => Self::PictureFill,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn geometry(&self) -> GeometryKind {
        match self {
            Self::SimpleFill | Self::PictureFill => GeometryKind::Fill,
            Self::SimpleLine => GeometryKind::Line,
            Self::SimpleMarker | Self::PictureMarker => GeometryKind::Circle,
            Self::Other(_) => GeometryKind::Fill,
        }
    }
}

/// MapLibre layer type produced for a WebMap layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Fill,
    Line,
    Circle,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Fill => "fill",
            GeometryKind::Line => "line",
            GeometryKind::Circle => "circle",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a symbol; missing symbols and unknown tags are treated as fill.
pub fn classify(symbol: Option<&Symbol>) -> GeometryKind {
    symbol
        .map(|s| s.symbol_type().geometry())
        .unwrap_or_default()
}
