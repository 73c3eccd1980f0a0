//! Common test fixtures for WebMap conversion tests.
//!
//! Builders return raw `serde_json::Value` so that tests exercise the same
//! lenient deserialization path as real WebMap documents.

use serde_json::{json, Value};

/// Esri `[r, g, b, a]` colors.
pub mod colors {
    pub const GREEN: [i64; 4] = [56, 168, 0, 255];
    pub const RED: [i64; 4] = [230, 0, 0, 255];
    pub const BLUE: [i64; 4] = [0, 112, 255, 255];
    pub const BLACK: [i64; 4] = [0, 0, 0, 255];
    pub const HALF_RED: [i64; 4] = [255, 0, 0, 128];
    pub const CLEAR: [i64; 4] = [0, 0, 0, 0];
}

/// Esri symbol JSON.
pub mod symbols {
    use super::*;

    pub fn fill(color: [i64; 4]) -> Value {
        json!({"type": "esriSFS", "style": "esriSFSSolid", "color": color})
    }

    pub fn fill_with_outline(color: [i64; 4], outline: [i64; 4], width: f64) -> Value {
        json!({
            "type": "esriSFS",
            "style": "esriSFSSolid",
            "color": color,
            "outline": {"type": "esriSLS", "style": "esriSLSSolid", "color": outline, "width": width}
        })
    }

    pub fn line(color: [i64; 4], width: f64) -> Value {
        json!({"type": "esriSLS", "style": "esriSLSSolid", "color": color, "width": width})
    }

    pub fn marker(color: [i64; 4], size: f64) -> Value {
        json!({"type": "esriSMS", "style": "esriSMSCircle", "color": color, "size": size})
    }
}

/// Esri renderer JSON.
pub mod renderers {
    use super::*;

    pub fn simple(symbol: Value) -> Value {
        json!({"type": "simple", "symbol": symbol})
    }

    pub fn simple_labeled(symbol: Value, label: &str) -> Value {
        json!({"type": "simple", "symbol": symbol, "label": label})
    }

    /// `entries` are `(value, label, symbol)`.
    pub fn unique_value(field: &str, entries: Vec<(Value, Option<&str>, Value)>) -> Value {
        let infos: Vec<Value> = entries
            .into_iter()
            .map(|(value, label, symbol)| match label {
                Some(label) => json!({"value": value, "label": label, "symbol": symbol}),
                None => json!({"value": value, "symbol": symbol}),
            })
            .collect();
        json!({"type": "uniqueValue", "field1": field, "uniqueValueInfos": infos})
    }

    /// `breaks` are `(classMaxValue, symbol)`.
    pub fn class_breaks(field: &str, breaks: Vec<(f64, Value)>) -> Value {
        let infos: Vec<Value> = breaks
            .into_iter()
            .map(|(max, symbol)| json!({"classMaxValue": max, "symbol": symbol}))
            .collect();
        json!({"type": "classBreaks", "field": field, "classBreakInfos": infos})
    }

    /// Class-breaks renderer carrying a `colorInfo` ramp.
    pub fn color_ramp(field: &str, base_symbol: Value, stops: Vec<(f64, [i64; 4])>) -> Value {
        let stops: Vec<Value> = stops
            .into_iter()
            .map(|(value, color)| json!({"value": value, "color": color}))
            .collect();
        json!({
            "type": "classBreaks",
            "field": field,
            "classBreakInfos": [{"classMaxValue": 1e9, "symbol": base_symbol}],
            "visualVariables": [{"type": "colorInfo", "field": field, "stops": stops}]
        })
    }
}

/// Operational layer JSON.
pub mod layers {
    use super::*;

    pub const SERVICE_BASE: &str = "https://services.arcgis.com/test/arcgis/rest/services";

    /// Feature service URL for a named service.
    pub fn service_url(name: &str) -> String {
        format!("{}/{}/FeatureServer/0", SERVICE_BASE, name)
    }

    /// A layer with an embedded renderer.
    pub fn with_renderer(title: &str, url: &str, renderer: Value) -> Value {
        json!({
            "id": format!("{}-id", title.to_lowercase().replace(' ', "-")),
            "title": title,
            "url": url,
            "opacity": 1.0,
            "layerDefinition": {"drawingInfo": {"renderer": renderer}}
        })
    }

    /// A layer that has no embedded renderer and must be fetched.
    pub fn without_renderer(title: &str, url: &str) -> Value {
        json!({"title": title, "url": url, "opacity": 1.0})
    }

    /// A group/folder layer without a URL.
    pub fn group(title: &str) -> Value {
        json!({"title": title, "layerType": "GroupLayer", "layers": []})
    }

    /// The land-use layer used throughout the documentation.
    pub fn land_use() -> Value {
        json!({
            "title": "Group_Land Use",
            "url": "https://svc/arcgis/rest/services/LandUse/FeatureServer/0",
            "opacity": 1,
            "layerDefinition": {
                "drawingInfo": {
                    "renderer": {"type": "simple", "symbol": {"type": "esriSFS", "color": [56, 168, 0, 255]}}
                }
            }
        })
    }
}

/// Whole WebMap documents.
pub mod webmaps {
    use super::*;

    pub fn webmap(layers: Vec<Value>) -> Value {
        json!({
            "operationalLayers": layers,
            "baseMap": {"title": "Basemap", "baseMapLayers": []},
            "spatialReference": {"wkid": 102100},
            "version": "2.31"
        })
    }

    /// Service metadata returned by `{url}?f=json`.
    pub fn service_metadata(renderer: Option<Value>, description: Option<&str>) -> Value {
        let mut doc = json!({"name": "Service", "geometryType": "esriGeometryPolygon"});
        if let Some(renderer) = renderer {
            doc["drawingInfo"] = json!({"renderer": renderer});
        }
        if let Some(description) = description {
            doc["description"] = json!(description);
        }
        doc
    }
}
