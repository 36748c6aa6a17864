//! Engine configuration.
//!
//! Everything here is a deployment choice rather than a template choice:
//! templates are user data, this is operator data. Every field has a default,
//! so `{}` is a valid config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// Where the footer section is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FooterPolicy {
    /// Drawn once, at the bottom of whichever page the section loop is on
    /// when it reaches the footer.
    #[default]
    Once,
    /// Drawn at the bottom of every page after layout completes.
    EveryPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub footer_policy: FooterPolicy,
    pub page_numbers: bool,
    /// `{current}` and `{total}` are substituted.
    pub page_number_format: String,
    /// chrono strftime pattern for ISO dates.
    pub date_format: String,
    /// Searched in order for `<Family>.ttf` and friends.
    pub font_dirs: Vec<PathBuf>,
    pub fetch_timeout_secs: u64,
    /// Line height as a multiple of font size.
    pub line_height: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            footer_policy: FooterPolicy::Once,
            page_numbers: true,
            page_number_format: "Page {current} of {total}".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            font_dirs: Vec::new(),
            fetch_timeout_secs: 10,
            line_height: 1.4,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| FolioError::parse("config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, FolioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), FolioError> {
        if !self.line_height.is_finite() || self.line_height < 1.0 {
            return Err(FolioError::Config(format!(
                "lineHeight must be at least 1.0, got {}",
                self.line_height
            )));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(FolioError::Config(format!("invalid dateFormat '{}'", self.date_format)));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn page_label(&self, current: usize, total: usize) -> String {
        self.page_number_format
            .replace("{current}", &current.to_string())
            .replace("{total}", &total.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn camel_case_fields() {
        let config = EngineConfig::from_json(
            r#"{ "footerPolicy": "everyPage", "pageNumbers": false, "fontDirs": ["/usr/share/fonts"] }"#,
        )
        .unwrap();
        assert_eq!(config.footer_policy, FooterPolicy::EveryPage);
        assert!(!config.page_numbers);
        assert_eq!(config.font_dirs, vec![PathBuf::from("/usr/share/fonts")]);
    }

    #[test]
    fn rejects_tiny_line_height() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "lineHeight": 0.5 }"#),
            Err(FolioError::Config(_))
        ));
    }

    #[test]
    fn rejects_unknown_date_specifier() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "dateFormat": "%Q" }"#),
            Err(FolioError::Config(_))
        ));
        assert!(EngineConfig::from_json(r#"{ "dateFormat": "%d %B %Y" }"#).is_ok());
    }

    #[test]
    fn page_label_substitution() {
        let config = EngineConfig::default();
        assert_eq!(config.page_label(2, 5), "Page 2 of 5");
    }
}
