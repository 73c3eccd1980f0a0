//! Simple renderer: one symbol for every feature.

use webmap_common::geometry::classify;
use webmap_common::{SimpleRenderer, Symbol};

use crate::options::ConvertOptions;
use crate::symbology::{legend_item, symbol_color, PaintBuilder};
use crate::RendererResult;

const DEFAULT_LABEL: &str = "Feature";

pub fn convert_simple(
    renderer: &SimpleRenderer,
    opacity: f64,
    options: &ConvertOptions,
) -> RendererResult {
    convert_symbol(renderer.symbol.as_ref(), renderer.label.as_deref(), opacity, options)
}

/// Convert a lone symbol. Without a symbol there is nothing to paint.
pub(crate) fn convert_symbol(
    symbol: Option<&Symbol>,
    label: Option<&str>,
    opacity: f64,
    options: &ConvertOptions,
) -> RendererResult {
    let Some(symbol) = symbol else {
        return RendererResult::empty();
    };

    let geometry = classify(Some(symbol));
    let color = symbol_color(Some(symbol), options);
    let (paint, outline_paint) =
        PaintBuilder::new(options, Some(symbol), opacity).build(geometry, color.into());

    let label = label
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LABEL)
        .to_string();

    RendererResult {
        paint,
        legend: vec![legend_item(geometry, Some(symbol), label, options)],
        geometry,
        outline_paint,
    }
}
