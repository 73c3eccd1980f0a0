//! Unique-value renderer: categorical colors keyed by exact field value.
//!
//! Esri declares category values as numbers or numeric-looking strings,
//! while the feature service may return the field as either type. Both
//! sides are therefore compared as strings:
//!
//! ```text
//! ["match", ["to-string", ["get", "ZONE"]], "11", "#ff0000", "22", "#00ff00", "#888888"]
//! ```

use tracing::warn;
use webmap_common::geometry::classify;
use webmap_common::{match_label, Expr, UniqueValueRenderer};

use crate::labels::LabelMap;
use crate::options::ConvertOptions;
use crate::simple::convert_symbol;
use crate::symbology::{legend_item, symbol_color, PaintBuilder};
use crate::RendererResult;

pub fn convert_unique_value(
    renderer: &UniqueValueRenderer,
    opacity: f64,
    labels: Option<&LabelMap>,
    options: &ConvertOptions,
) -> RendererResult {
    let infos = &renderer.unique_value_infos;
    if infos.is_empty() {
        return convert_symbol(
            renderer.default_symbol.as_ref(),
            renderer.default_label.as_deref(),
            opacity,
            options,
        );
    }

    let field = renderer.field_name().unwrap_or_else(|| {
        warn!("Unique value renderer has no field, every feature gets the default color");
        ""
    });

    let first_symbol = infos
        .first()
        .and_then(|info| info.symbol.as_ref())
        .or(renderer.default_symbol.as_ref());
    let geometry = classify(first_symbol);

    let mut cases = Vec::with_capacity(infos.len());
    let mut legend = Vec::with_capacity(infos.len());
    for info in infos {
        let value = match_label(&info.value);
        let color = symbol_color(info.symbol.as_ref(), options);

        let label = labels
            .and_then(|map| map.get(&value))
            .or(info.label.as_deref().filter(|l| !l.is_empty()))
            .unwrap_or(&value)
            .to_string();

        legend.push(legend_item(geometry, info.symbol.as_ref(), label, options));
        cases.push((value, Expr::from(color)));
    }

    let fallback = renderer
        .default_symbol
        .as_ref()
        .map(|s| symbol_color(Some(s), options))
        .unwrap_or_else(|| options.fallback_color.clone());

    let color = Expr::matching(Expr::get_as_string(field), cases, fallback.into());
    let (paint, outline_paint) = PaintBuilder::new(options, first_symbol, opacity)
        .categorical()
        .line_width_fallback(options.default_line_width)
        .build(geometry, color);

    RendererResult {
        paint,
        legend,
        geometry,
        outline_paint,
    }
}
