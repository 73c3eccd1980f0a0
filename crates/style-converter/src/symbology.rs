//! Paint construction shared by every renderer converter.
//!
//! A converter decides *which* color expression applies (a literal, a
//! `match`, a `step` or an `interpolate`), while the geometry-specific
//! properties (opacity, outline, width, radius) always come from one
//! representative symbol.

use webmap_common::{Expr, GeometryKind, LegendItem, Paint, Symbol, TRANSPARENT};

use crate::options::ConvertOptions;

/// How fill opacity reacts to the representative symbol's alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpacityMode {
    /// One symbol for the whole layer: a transparent symbol hides the fill.
    Single,
    /// Colors vary per feature: the first symbol must not hide the others.
    Categorical,
}

/// CSS color of a symbol, or the configured fallback when absent.
pub(crate) fn symbol_color(symbol: Option<&Symbol>, options: &ConvertOptions) -> String {
    match symbol {
        Some(s) if s.is_hollow() => TRANSPARENT.to_string(),
        Some(s) => s.color.to_css_or(&options.fallback_color),
        None => options.fallback_color.clone(),
    }
}

/// Width used for line symbols and line legend entries.
pub(crate) fn line_width(symbol: Option<&Symbol>, fallback: f64) -> f64 {
    symbol
        .and_then(|s| s.width)
        .filter(|w| *w > 0.0)
        .unwrap_or(fallback)
}

/// Builds geometry-specific paint around a color expression.
pub(crate) struct PaintBuilder<'a> {
    options: &'a ConvertOptions,
    symbol: Option<&'a Symbol>,
    opacity: f64,
    mode: OpacityMode,
    line_width_fallback: f64,
}

impl<'a> PaintBuilder<'a> {
    pub fn new(options: &'a ConvertOptions, symbol: Option<&'a Symbol>, opacity: f64) -> Self {
        Self {
            options,
            symbol,
            opacity,
            mode: OpacityMode::Single,
            line_width_fallback: 1.0,
        }
    }

    pub fn categorical(mut self) -> Self {
        self.mode = OpacityMode::Categorical;
        self
    }

    pub fn line_width_fallback(mut self, width: f64) -> Self {
        self.line_width_fallback = width;
        self
    }

    /// Paint plus the optional companion outline paint.
    pub fn build(&self, geometry: GeometryKind, color: Expr) -> (Paint, Option<Paint>) {
        match geometry {
            GeometryKind::Fill => self.fill(color),
            GeometryKind::Line => (self.line(color), None),
            GeometryKind::Circle => (self.circle(color), None),
        }
    }

    fn fill(&self, color: Expr) -> (Paint, Option<Paint>) {
        let mut paint = Paint::new();
        paint.insert("fill-color".into(), color);
        paint.insert("fill-opacity".into(), Expr::number(self.fill_opacity()));

        let mut outline_paint = None;
        if let Some(outline) = self.symbol.and_then(Symbol::visible_outline) {
            let outline_color = outline.color.to_css_or(&self.options.fallback_color);
            let width = outline.effective_width();

            // fill-outline-color is always drawn at 1px
            paint.insert("fill-outline-color".into(), outline_color.clone().into());

            if width > 1.0 || self.fill_is_transparent() {
                let mut line = Paint::new();
                line.insert("line-color".into(), outline_color.into());
                line.insert("line-width".into(), Expr::number(width));
                outline_paint = Some(line);
            }
        }

        (paint, outline_paint)
    }

    fn fill_is_transparent(&self) -> bool {
        self.symbol.map(Symbol::is_transparent).unwrap_or(false)
    }

    fn fill_opacity(&self) -> f64 {
        let alpha = self.symbol.map(Symbol::alpha_channel).unwrap_or(255);
        match (alpha, self.mode) {
            (0, OpacityMode::Single) => 0.0,
            // the color string already carries its alpha
            (a, _) if a < 255 => 1.0,
            _ => self.opacity,
        }
    }

    fn line(&self, color: Expr) -> Paint {
        let mut paint = Paint::new();
        paint.insert("line-color".into(), color);
        paint.insert(
            "line-width".into(),
            Expr::number(line_width(self.symbol, self.line_width_fallback)),
        );
        paint.insert("line-opacity".into(), Expr::number(self.opacity));
        paint
    }

    fn circle(&self, color: Expr) -> Paint {
        let mut paint = Paint::new();
        paint.insert("circle-color".into(), color);
        paint.insert(
            "circle-radius".into(),
            Expr::number(self.options.circle_radius(self.symbol.and_then(|s| s.size))),
        );
        paint.insert("circle-opacity".into(), Expr::number(self.opacity));

        if let Some(outline) = self.symbol.and_then(Symbol::visible_outline) {
            paint.insert(
                "circle-stroke-color".into(),
                outline.color.to_css_or(&self.options.fallback_color).into(),
            );
            paint.insert(
                "circle-stroke-width".into(),
                Expr::number(outline.effective_width()),
            );
        }
        paint
    }
}

/// Legend entry for one symbol; line entries carry their width.
pub(crate) fn legend_item(
    geometry: GeometryKind,
    symbol: Option<&Symbol>,
    label: String,
    options: &ConvertOptions,
) -> LegendItem {
    let item = LegendItem::new(geometry, symbol_color(symbol, options), label);
    match geometry {
        GeometryKind::Line => item.with_width(line_width(symbol, 1.0)),
        _ => item,
    }
}
