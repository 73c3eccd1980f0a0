//! Layer ids and display titles derived from WebMap titles.
//!
//! WebMap titles often carry a group prefix: `Planning_Zoning Base Districts`
//! is shown as `Zoning Base Districts` with id `zoning-base-districts`.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use webmap_common::LayerConfig;

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Title without its group prefix. Later underscores become spaces.
pub fn display_title(raw: &str) -> String {
    match raw.split_once('_') {
        Some((_, rest)) => rest.replace('_', " "),
        None => raw.to_string(),
    }
}

/// Kebab-case id of the display title.
pub fn layer_slug(raw: &str) -> String {
    let folded = collation_key(&display_title(raw));
    NON_ALPHANUMERIC
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Primary collation key: compatibility-decomposed, accents dropped,
/// lowercased. `Éducation` and `education` share a key.
pub fn collation_key(title: &str) -> String {
    title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Accent- and case-insensitive title order. Ties fall back to the
/// lowercased title, the exact title and the id so the order is total.
pub fn compare_layers(a: &LayerConfig, b: &LayerConfig) -> Ordering {
    collation_key(&a.title)
        .cmp(&collation_key(&b.title))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_layer_configs(configs: &mut [LayerConfig]) {
    configs.sort_by(compare_layers);
}
