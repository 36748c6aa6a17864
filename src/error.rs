//! Structured error types for the Folio composition engine.
//!
//! Only fatal conditions live here. Anything the engine can recover from
//! (a logo that fails to load, a malformed style value, a section that
//! faults while rendering) is reported as a [`crate::render::Diagnostic`]
//! on the render result instead.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The template cannot produce a document (no content area, missing
    /// required style blocks, unusable typography).
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON input failed to parse as a template, invoice or config.
    #[error("Failed to parse {what}: {source}{}", hint_suffix(.hint))]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A template import payload was rejected.
    #[error("Import rejected: {0}")]
    Import(String),

    /// `update_section_at` was given an index past the end of the section list.
    #[error("No section at index {index} (template has {len})")]
    SectionIndex { index: usize, len: usize },

    /// PDF serialization failed.
    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl FolioError {
    /// Wrap a serde_json error with a hint chosen by error category.
    pub fn parse(what: &'static str, e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                format!("The JSON is valid but doesn't match the {} schema. Check field names and types.", what)
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Parse { what, source: e, hint }
    }
}

/// Failure to produce an external resource (logo bytes, decoded image, font).
///
/// Always recovered locally: the engine falls back to a text-only header or
/// the default font and records a warning.
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch '{reference}': {message}")]
    Fetch { reference: String, message: String },

    #[error("Failed to decode '{reference}': {message}")]
    Decode { reference: String, message: String },

    #[error("Font '{family}' unavailable: {message}")]
    Font { family: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}").unwrap_err();
        let err = FolioError::parse("template", err);
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse template"));
        assert!(msg.contains("trailing commas"));
    }

    #[test]
    fn data_errors_name_the_schema() {
        let err = serde_json::from_str::<Vec<u32>>("{\"a\": 1}").unwrap_err();
        let msg = FolioError::parse("invoice", err).to_string();
        assert!(msg.contains("invoice schema"));
    }
}
