//! Continuous color ramps (`colorInfo` visual variables).
//!
//! Features with a null value would otherwise pick up the lowest stop
//! color, so the interpolation is guarded:
//!
//! ```text
//! ["case", ["==", ["get", f], null], "rgba(0, 0, 0, 0.00)",
//!     ["interpolate", ["linear"], ["get", f], v1, c1, v2, c2, ...]]
//! ```

use tracing::warn;
use webmap_common::geometry::classify;
use webmap_common::{
    format_number, ClassBreaksRenderer, Expr, LegendItem, VisualVariable, TRANSPARENT,
};

use crate::options::ConvertOptions;
use crate::symbology::PaintBuilder;
use crate::RendererResult;

/// Convert a color ramp layered on a class-breaks renderer. The renderer's
/// first break symbol (or default symbol) supplies geometry and outline.
pub fn convert_color_ramp(
    renderer: &ClassBreaksRenderer,
    ramp: &VisualVariable,
    opacity: f64,
    options: &ConvertOptions,
) -> RendererResult {
    if ramp.stops.is_empty() {
        return RendererResult::empty();
    }

    let field = ramp
        .field
        .as_deref()
        .or(renderer.field.as_deref())
        .unwrap_or_else(|| {
            warn!("Color ramp has no field");
            ""
        });

    let base_symbol = renderer.base_symbol();
    let geometry = classify(base_symbol);

    let stops = ramp
        .stops
        .iter()
        .map(|stop| {
            (
                stop.value,
                Expr::from(stop.color.to_css_or(&options.fallback_color)),
            )
        })
        .collect();
    let color = Expr::case(
        vec![(Expr::is_null(Expr::get(field)), TRANSPARENT.into())],
        Expr::interpolate_linear(Expr::get(field), stops),
    );

    let legend = ramp
        .stops
        .iter()
        .map(|stop| {
            let label = stop
                .label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format_number(stop.value));
            LegendItem::new(
                geometry,
                stop.color.to_css_or(&options.fallback_color),
                label,
            )
        })
        .collect();

    let (paint, outline_paint) = PaintBuilder::new(options, base_symbol, opacity)
        .categorical()
        .build(geometry, color);

    RendererResult {
        paint,
        legend,
        geometry,
        outline_paint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webmap_common::GeometryKind;

    #[test]
    fn test_ramp_is_null_guarded() {
        let renderer: ClassBreaksRenderer = serde_json::from_value(json!({
            "field": "RATE",
            "classBreakInfos": [
                {"classMaxValue": 1, "symbol": {"type": "esriSFS", "color": [0, 0, 0, 255],
                 "outline": {"color": [110, 110, 110, 255], "width": 0.5}}}
            ],
            "visualVariables": [
                {"type": "sizeInfo", "field": "OTHER"},
                {"type": "colorInfo", "field": "PCT", "stops": [
                    {"value": 0, "color": [255, 255, 204, 255], "label": "< 0"},
                    {"value": 0.5, "color": [0, 104, 55, 255]}
                ]}
            ]
        }))
        .unwrap();

        let ramp = renderer.color_ramp().unwrap();
        let result = convert_color_ramp(&renderer, ramp, 0.7, &ConvertOptions::default());

        assert_eq!(result.geometry, GeometryKind::Fill);
        assert_eq!(
            result.paint["fill-color"].to_json(),
            json!([
                "case",
                ["==", ["get", "PCT"], null],
                "rgba(0, 0, 0, 0.00)",
                ["interpolate", ["linear"], ["get", "PCT"], 0.0, "#ffffcc", 0.5, "#006837"]
            ])
        );
        assert_eq!(result.paint["fill-opacity"].to_json(), json!(0.7));
        assert_eq!(result.paint["fill-outline-color"].to_json(), json!("#6e6e6e"));
        let labels: Vec<_> = result.legend.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["< 0", "0.5"]);
    }
}
