//! Code to label lookup parsed from feature service descriptions.
//!
//! Some services only carry terse numeric labels in their renderer
//! (`"11"`, `"12"`) and document the meaning of each code in the free-text
//! description instead:
//!
//! ```text
//! 11 Residential Low Density<br>
//! 12 Residential Medium Density<br>
//! ```
//!
//! [`LabelMap::from_description`] recovers `{"11": "Residential Low Density", ...}`
//! so legend entries can show the descriptive text.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// `<br>`, `</p>`, `</div>` and `</li>` end a line.
static LINE_BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>").unwrap());

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Leading 1-3 digit code, whitespace, then the label. An optional `-`,
/// `:` or `=` separator after the code is not part of the label.
static CODE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\s+(?:[-:=]\s+)?(\S.*)$").unwrap());

/// Lookup from renderer code to descriptive label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a service description. Lines that do not start with a code
    /// are ignored; if a code repeats, the first occurrence wins.
    pub fn from_description(description: &str) -> Self {
        let mut map = Self::new();
        for line in normalize_markup(description).lines() {
            let line = line.trim();
            if let Some(caps) = CODE_LINE.captures(line) {
                let label = caps[2].trim();
                if !label.is_empty() {
                    map.entries
                        .entry(caps[1].to_string())
                        .or_insert_with(|| label.to_string());
                }
            }
        }
        map
    }

    /// Parse an optional description; `None` yields an empty map.
    pub fn from_optional(description: Option<&str>) -> Self {
        description.map(Self::from_description).unwrap_or_default()
    }

    /// Label for `code`, ignoring empty labels.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries
            .get(code)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Turn the simple HTML ArcGIS stores in descriptions into plain lines.
fn normalize_markup(text: &str) -> String {
    let text = LINE_BREAK_TAG.replace_all(text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ").replace("&amp;", "&")
}
