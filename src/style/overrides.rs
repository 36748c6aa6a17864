//! The freeform style-override document.
//!
//! A template may carry a JSON blob layered between its own fields and each
//! section's style map:
//!
//! ```json
//! {
//!   "colors":   { "accent": "#DC2626" },
//!   "fonts":    { "bodySize": "11px" },
//!   "sections": { "line-items": { "striped": true, "borderStyle": "dashed" } }
//! }
//! ```
//!
//! The document is user-edited text, so it is parsed defensively: any failure
//! drops the whole document and produces a single warning.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::template::SectionKind;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOverrides {
    colors: BTreeMap<String, Value>,
    fonts: BTreeMap<String, Value>,
    sections: BTreeMap<String, BTreeMap<String, Value>>,
}

/// Parsed style overrides. Scalar JSON values are kept as strings so they
/// flow through the same parsing as template style maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverrides {
    /// Palette field name (camelCase, as in the template) to color string.
    pub colors: BTreeMap<String, String>,
    /// Typography field name (camelCase) to value.
    pub fonts: BTreeMap<String, String>,
    pub sections: BTreeMap<SectionKind, BTreeMap<String, String>>,
}

impl StyleOverrides {
    /// Parse an optional override document. Returns the overrides (empty on
    /// failure) and at most one warning.
    pub fn parse(raw: Option<&str>) -> (Self, Option<String>) {
        let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
            return (Self::default(), None);
        };

        let parsed: RawOverrides = match serde_json::from_str(text) {
            Ok(p) => p,
            Err(e) => {
                return (
                    Self::default(),
                    Some(format!("style overrides ignored: {}", e)),
                )
            }
        };

        let mut out = StyleOverrides {
            colors: stringify_map(parsed.colors),
            fonts: stringify_map(parsed.fonts),
            sections: BTreeMap::new(),
        };
        for (name, map) in parsed.sections {
            match SectionKind::from_name(&name) {
                Some(kind) => {
                    out.sections.insert(kind, stringify_map(map));
                }
                None => log::debug!("Style overrides name unknown section '{}'", name),
            }
        }
        (out, None)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&BTreeMap<String, String>> {
        self.sections.get(&kind)
    }
}

fn stringify_map(map: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    map.into_iter()
        .filter_map(|(k, v)| {
            let s = match v {
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null => return None,
                other => {
                    log::debug!("Style override '{}' has non-scalar value {}", k, other);
                    return None;
                }
            };
            Some((k, s))
        })
        .collect()
}
