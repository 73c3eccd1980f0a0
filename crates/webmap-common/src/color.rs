//! Esri color arrays and their CSS representation.
//!
//! Esri encodes colors as `[r, g, b, a]` with every channel in 0-255.
//! MapLibre wants CSS strings, so opaque colors become `#rrggbb` and
//! anything with transparency becomes `rgba(r, g, b, 0.xx)`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Neutral gray used whenever a color is missing or malformed.
pub const FALLBACK_COLOR: &str = "#888888";

/// Fully transparent CSS color.
pub const TRANSPARENT: &str = "rgba(0, 0, 0, 0.00)";

/// A color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Alpha as a fraction in 0-1.
    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// CSS string: lowercase hex when opaque, `rgba()` otherwise.
    pub fn to_css(&self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                self.alpha()
            )
        }
    }

    /// Build from a channel slice; `None` when fewer than 3 channels.
    pub fn from_channels(channels: &[f64]) -> Option<Self> {
        if channels.len() < 3 {
            return None;
        }
        let a = channels.get(3).copied().unwrap_or(255.0);
        Some(Self {
            r: clamp_channel(channels[0]),
            g: clamp_channel(channels[1]),
            b: clamp_channel(channels[2]),
            a: clamp_channel(a),
        })
    }
}

fn clamp_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// A color as found in a WebMap symbol.
///
/// `Absent` and `Null` are kept apart because a `null` outline color means
/// "draw no outline", while a missing one falls back to gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorValue {
    #[default]
    Absent,
    Null,
    Rgba(Rgba),
    Malformed,
}

impl ColorValue {
    /// Interpret an arbitrary JSON value as an Esri color.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ColorValue::Null,
            Value::Array(items) => {
                let channels: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
                channels
                    .as_deref()
                    .and_then(Rgba::from_channels)
                    .map(ColorValue::Rgba)
                    .unwrap_or(ColorValue::Malformed)
            }
            _ => ColorValue::Malformed,
        }
    }

    pub fn rgba(&self) -> Option<Rgba> {
        match self {
            ColorValue::Rgba(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColorValue::Null)
    }

    /// Alpha channel, treating missing colors as opaque gray.
    pub fn alpha_channel(&self) -> u8 {
        self.rgba().map(|c| c.a).unwrap_or(255)
    }

    /// CSS string, or `fallback` when the color is unusable.
    pub fn to_css_or(&self, fallback: &str) -> String {
        match self {
            ColorValue::Rgba(c) => c.to_css(),
            _ => fallback.to_string(),
        }
    }

    pub fn to_css(&self) -> String {
        self.to_css_or(FALLBACK_COLOR)
    }
}

impl From<Rgba> for ColorValue {
    fn from(c: Rgba) -> Self {
        ColorValue::Rgba(c)
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ColorValue::from_json(&value))
    }
}

/// Convert an Esri `[r, g, b, a]` array to a CSS color string.
///
/// Short arrays produce [`FALLBACK_COLOR`]; a missing alpha means opaque.
pub fn esri_color_to_css(color: &[i64]) -> String {
    let channels: Vec<f64> = color.iter().map(|&c| c as f64).collect();
    Rgba::from_channels(&channels)
        .map(|c| c.to_css())
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// Parse `#rrggbb` back into channels.
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
