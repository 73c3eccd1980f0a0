//! Class-breaks renderer: graduated colors keyed by numeric range.
//!
//! Breaks are emitted in the order given. Each threshold of the `step`
//! expression is the previous class's maximum, so values up to and
//! including the first maximum take the first color.

use tracing::{debug, warn};
use webmap_common::geometry::classify;
use webmap_common::{format_number, ClassBreakInfo, ClassBreaksRenderer, Expr, GeometryKind};

use crate::continuous::convert_color_ramp;
use crate::options::ConvertOptions;
use crate::symbology::{legend_item, symbol_color, PaintBuilder};
use crate::RendererResult;

pub fn convert_class_breaks(
    renderer: &ClassBreaksRenderer,
    opacity: f64,
    options: &ConvertOptions,
) -> RendererResult {
    if let Some(ramp) = renderer.color_ramp() {
        debug!(stops = ramp.stops.len(), "Class breaks renderer carries a color ramp");
        return convert_color_ramp(renderer, ramp, opacity, options);
    }

    let breaks: Vec<(f64, &ClassBreakInfo)> = renderer
        .class_break_infos
        .iter()
        .filter_map(|info| match info.class_max_value {
            Some(max) => Some((max, info)),
            None => {
                warn!(label = ?info.label, "Dropping class break without a numeric maximum");
                None
            }
        })
        .collect();
    let Some((_, first)) = breaks.first() else {
        return RendererResult::empty();
    };

    let field = renderer.field.as_deref().unwrap_or_else(|| {
        warn!("Class breaks renderer has no field");
        ""
    });

    let first_symbol = first.symbol.as_ref();
    let geometry = classify(first_symbol);

    let stops = breaks
        .windows(2)
        .map(|pair| {
            (
                pair[0].0,
                Expr::from(symbol_color(pair[1].1.symbol.as_ref(), options)),
            )
        })
        .collect();
    let color = Expr::step(
        Expr::get(field),
        symbol_color(first_symbol, options).into(),
        stops,
    );

    let mut legend = Vec::with_capacity(breaks.len());
    let mut prev_max = renderer.min_value.unwrap_or(0.0);
    for (max, info) in &breaks {
        let label = match info.label.as_deref().filter(|l| !l.is_empty()) {
            Some(label) => label.to_string(),
            None if geometry == GeometryKind::Line => {
                format!("{} - {}", format_number(prev_max), format_number(*max))
            }
            None => format_number(*max),
        };
        legend.push(legend_item(geometry, info.symbol.as_ref(), label, options));
        prev_max = *max;
    }

    let (paint, outline_paint) = PaintBuilder::new(options, first_symbol, opacity)
        .categorical()
        .build(geometry, color);

    RendererResult {
        paint,
        legend,
        geometry,
        outline_paint,
    }
}
