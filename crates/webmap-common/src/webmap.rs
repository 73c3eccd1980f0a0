//! Esri WebMap document model.
//!
//! Only the parts of the WebMap schema the converter reads are modelled.
//! Everything is deserialized leniently: missing keys fall back to
//! defaults and unknown renderer kinds are preserved as
//! [`Renderer::Unsupported`] instead of failing the document.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::color::ColorValue;
use crate::error::{WebMapError, WebMapResult};
use crate::geometry::SymbolType;

/// Outline style Esri uses for "no outline".
pub const NULL_LINE_STYLE: &str = "esriSLSNull";

/// Fill style Esri uses for hollow polygons.
pub const NULL_FILL_STYLE: &str = "esriSFSNull";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Numeric symbol properties arrive as numbers, numeric strings or junk.
/// Anything that is not a finite number reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

// ============================================================================
// Document
// ============================================================================

/// A validated WebMap document.
///
/// Layers are kept as raw JSON so that a single malformed layer can be
/// reported and skipped without rejecting the rest of the map.
#[derive(Debug, Clone)]
pub struct WebMap {
    pub operational_layers: Vec<Value>,
}

impl WebMap {
    /// Validate the top-level shape of a WebMap document.
    pub fn from_value(doc: &Value) -> WebMapResult<Self> {
        let object = doc.as_object().ok_or_else(|| {
            WebMapError::InvalidDocument(format!("expected a JSON object, got {}", json_kind(doc)))
        })?;

        match object.get("operationalLayers") {
            None => Err(WebMapError::MissingOperationalLayers),
            Some(Value::Array(layers)) => Ok(Self {
                operational_layers: layers.clone(),
            }),
            Some(other) => Err(WebMapError::InvalidDocument(format!(
                "operationalLayers must be an array, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn from_json(json: &str) -> WebMapResult<Self> {
        let doc: Value = serde_json::from_str(json)?;
        Self::from_value(&doc)
    }

    pub fn len(&self) -> usize {
        self.operational_layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operational_layers.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One entry of `operationalLayers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalLayer {
    /// WebMap-assigned layer id (string or number in the wild)
    #[serde(default)]
    pub id: Option<Value>,

    /// Raw title, possibly carrying a `Group_` prefix
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Feature service layer URL; absent for group layers
    #[serde(default)]
    pub url: Option<String>,

    /// Layer opacity in 0-1
    #[serde(default)]
    pub opacity: Option<f64>,

    #[serde(default)]
    pub layer_definition: Option<LayerDefinition>,

    #[serde(default)]
    pub popup_info: Option<PopupInfo>,
}

impl OperationalLayer {
    /// Parse one raw layer entry.
    pub fn from_value(value: &Value) -> WebMapResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| WebMapError::InvalidLayer {
            title: value
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("<untitled>")
                .to_string(),
            message: e.to_string(),
        })
    }

    /// The WebMap's own layer id as a string.
    pub fn layer_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn opacity_or_default(&self) -> f64 {
        self.opacity.unwrap_or(1.0)
    }

    pub fn drawing_info(&self) -> Option<&DrawingInfo> {
        self.layer_definition.as_ref()?.drawing_info.as_ref()
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.drawing_info()?.renderer.as_ref()
    }

    pub fn definition_expression(&self) -> Option<&str> {
        self.layer_definition
            .as_ref()?
            .definition_expression
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// The `layerDefinition` block of an operational layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDefinition {
    #[serde(default)]
    pub drawing_info: Option<DrawingInfo>,

    /// SQL-like filter applied to the feature service
    #[serde(default)]
    pub definition_expression: Option<String>,

    /// Zoomed-out visibility limit (0 = none)
    #[serde(default)]
    pub min_scale: Option<f64>,

    /// Zoomed-in visibility limit (0 = none)
    #[serde(default)]
    pub max_scale: Option<f64>,
}

/// Drawing info from a WebMap layer or a feature service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrawingInfo {
    #[serde(default)]
    pub renderer: Option<Renderer>,
}

/// Metadata returned by `{serviceUrl}?f=json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    #[serde(default)]
    pub drawing_info: Option<DrawingInfo>,

    /// Free text; some services document renderer codes here
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Renderers
// ============================================================================

/// Symbology rule set of a layer.
#[derive(Debug, Clone)]
pub enum Renderer {
    Simple(SimpleRenderer),
    UniqueValue(UniqueValueRenderer),
    ClassBreaks(ClassBreaksRenderer),
    /// A renderer kind the converter does not understand (e.g. heatmap)
    Unsupported(String),
}

impl Renderer {
    pub fn type_name(&self) -> &str {
        match self {
            Renderer::Simple(_) => "simple",
            Renderer::UniqueValue(_) => "uniqueValue",
            Renderer::ClassBreaks(_) => "classBreaks",
            Renderer::Unsupported(kind) => kind,
        }
    }
}

impl<'de> Deserialize<'de> for Renderer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let parsed = match kind.as_str() {
            "simple" => serde_json::from_value(value).map(Renderer::Simple),
            "uniqueValue" => serde_json::from_value(value).map(Renderer::UniqueValue),
            "classBreaks" => serde_json::from_value(value).map(Renderer::ClassBreaks),
            _ => return Ok(Renderer::Unsupported(kind)),
        };
        parsed.map_err(D::Error::custom)
    }
}

/// One symbol for every feature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimpleRenderer {
    #[serde(default)]
    pub symbol: Option<Symbol>,

    #[serde(default)]
    pub label: Option<String>,
}

/// Categorical symbology keyed by exact field value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValueRenderer {
    #[serde(default)]
    pub field1: Option<String>,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub default_symbol: Option<Symbol>,

    #[serde(default)]
    pub default_label: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_value_infos: Vec<UniqueValueInfo>,
}

impl UniqueValueRenderer {
    /// Attribute the categories are keyed on.
    pub fn field_name(&self) -> Option<&str> {
        self.field1
            .as_deref()
            .or(self.field.as_deref())
            .filter(|f| !f.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UniqueValueInfo {
    /// Declared value; numbers and numeric-looking strings both occur
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub symbol: Option<Symbol>,
}

/// Graduated symbology keyed by numeric range, optionally carrying a
/// continuous color ramp as a visual variable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassBreaksRenderer {
    #[serde(default)]
    pub field: Option<String>,

    /// Lower bound of the first class
    #[serde(default, deserialize_with = "lenient_number")]
    pub min_value: Option<f64>,

    #[serde(default)]
    pub default_symbol: Option<Symbol>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub class_break_infos: Vec<ClassBreakInfo>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub visual_variables: Vec<VisualVariable>,
}

impl ClassBreaksRenderer {
    /// The first color ramp with at least one stop.
    pub fn color_ramp(&self) -> Option<&VisualVariable> {
        self.visual_variables
            .iter()
            .find(|v| v.is_color_ramp() && !v.stops.is_empty())
    }

    /// Symbol used for geometry and outline decisions.
    pub fn base_symbol(&self) -> Option<&Symbol> {
        self.class_break_infos
            .first()
            .and_then(|info| info.symbol.as_ref())
            .or(self.default_symbol.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassBreakInfo {
    /// Upper bound of this class (inclusive); classes without one are unusable
    #[serde(default, deserialize_with = "lenient_number")]
    pub class_max_value: Option<f64>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub symbol: Option<Symbol>,
}

/// Renderer extension such as a continuous color ramp (`colorInfo`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisualVariable {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stops: Vec<ColorStop>,
}

impl VisualVariable {
    pub fn is_color_ramp(&self) -> bool {
        self.kind == "colorInfo"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorStop {
    pub value: f64,

    #[serde(default)]
    pub color: ColorValue,

    #[serde(default)]
    pub label: Option<String>,
}

// ============================================================================
// Symbols
// ============================================================================

/// An Esri symbol (fill, line or marker).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Symbol {
    #[serde(rename = "type", default)]
    pub type_tag: Option<String>,

    #[serde(default)]
    pub color: ColorValue,

    /// Marker diameter in points
    #[serde(default, deserialize_with = "lenient_number")]
    pub size: Option<f64>,

    /// Line width in points
    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<f64>,

    #[serde(default)]
    pub style: Option<String>,

    #[serde(default)]
    pub outline: Option<Outline>,
}

impl Symbol {
    pub fn symbol_type(&self) -> SymbolType {
        SymbolType::from_tag(self.type_tag.as_deref().unwrap_or_default())
    }

    /// The outline, if it would actually draw something.
    pub fn visible_outline(&self) -> Option<&Outline> {
        self.outline.as_ref().filter(|o| o.is_visible())
    }

    /// Hollow fills and zero-alpha colors paint nothing.
    pub fn is_transparent(&self) -> bool {
        self.alpha_channel() == 0
    }

    /// `esriSFSNull` fills draw no interior whatever their color.
    pub fn is_hollow(&self) -> bool {
        self.style.as_deref() == Some(NULL_FILL_STYLE)
    }

    /// Alpha channel of the symbol color, 0 for hollow fills.
    pub fn alpha_channel(&self) -> u8 {
        if self.is_hollow() {
            0
        } else {
            self.color.alpha_channel()
        }
    }
}

/// Outline of a fill or marker symbol.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub color: ColorValue,

    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<f64>,

    #[serde(default)]
    pub style: Option<String>,
}

impl Outline {
    /// Visible unless styled null, colored null, zero-width or zero-alpha.
    pub fn is_visible(&self) -> bool {
        if self.style.as_deref() == Some(NULL_LINE_STYLE) {
            return false;
        }
        if self.color.is_null() {
            return false;
        }
        if self.width == Some(0.0) {
            return false;
        }
        self.color.alpha_channel() != 0
    }

    /// Width in pixels; missing widths draw as 1px.
    pub fn effective_width(&self) -> f64 {
        self.width.filter(|w| *w > 0.0).unwrap_or(1.0)
    }
}

// ============================================================================
// Popups
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupInfo {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub field_infos: Vec<FieldInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub visible: Option<bool>,

    #[serde(default)]
    pub format: Option<FieldFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFormat {
    #[serde(default)]
    pub date_format: Option<String>,

    #[serde(default)]
    pub digit_separator: Option<bool>,

    #[serde(default)]
    pub places: Option<i64>,
}
