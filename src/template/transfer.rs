//! Template export and import.
//!
//! Export is a plain pretty-printed JSON serialization of the full template.
//! Import is stricter than deserialization alone: payloads must carry the
//! blocks a template cannot be rendered without, and the timestamps are
//! refreshed so the store can tell imported copies apart.

use chrono::Utc;
use serde_json::Value;

use super::InvoiceTemplate;
use crate::error::FolioError;

/// Top-level keys an import payload must contain.
const REQUIRED_KEYS: [&str; 4] = ["name", "sections", "colors", "fonts"];

/// How an imported template relates to the one it was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep `id` and `createdAt`; only `updatedAt` changes.
    Preserve,
    /// Treat the payload as a brand-new template: fresh id and `createdAt`.
    AsNew,
}

/// Serialize a template for transfer.
pub fn export_template(template: &InvoiceTemplate) -> Result<String, FolioError> {
    serde_json::to_string_pretty(template).map_err(|e| FolioError::Output(e.to_string()))
}

/// Parse and normalize an exported template.
pub fn import_template(json: &str, mode: ImportMode) -> Result<InvoiceTemplate, FolioError> {
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| FolioError::parse("template", e))?;

    let obj = value
        .as_object_mut()
        .ok_or_else(|| FolioError::Import("payload is not a JSON object".to_string()))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| obj.get(*k).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(FolioError::Import(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }

    // A new template needs no id in the payload at all.
    if mode == ImportMode::AsNew || !obj.contains_key("id") {
        obj.insert("id".to_string(), Value::String(String::new()));
    }

    let mut template: InvoiceTemplate =
        serde_json::from_value(value).map_err(|e| FolioError::parse("template", e))?;

    let now = Utc::now();
    if mode == ImportMode::AsNew || template.id.is_empty() {
        template.id = uuid::Uuid::new_v4().to_string();
        template.created_at = now;
        template.is_default = false;
    }
    template.updated_at = now;

    log::debug!("Imported template '{}' ({:?})", template.name, mode);
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{SectionKind, TemplateSection};
    use pretty_assertions::assert_eq;

    fn sample() -> InvoiceTemplate {
        let mut t = InvoiceTemplate::standard("Round trip");
        t.company.name = Some("Acme Ltd".to_string());
        t.style_overrides = Some(r##"{"colors": {"accent": "#FF0000"}}"##.to_string());
        t.sections.push(
            TemplateSection::new(SectionKind::Notes, 99)
                .hidden()
                .with_style("title", "Remarks"),
        );
        t
    }

    #[test]
    fn round_trip_preserves_everything_but_updated_at() {
        let original = sample();
        let json = export_template(&original).unwrap();
        let mut imported = import_template(&json, ImportMode::Preserve).unwrap();

        assert!(imported.updated_at >= original.updated_at);
        imported.updated_at = original.updated_at;
        assert_eq!(imported, original);
    }

    #[test]
    fn as_new_resets_identity() {
        let original = sample();
        let json = export_template(&original).unwrap();
        let imported = import_template(&json, ImportMode::AsNew).unwrap();

        assert_ne!(imported.id, original.id);
        assert!(imported.created_at >= original.created_at);
        assert_eq!(imported.sections, original.sections);
        assert_eq!(imported.name, original.name);
    }

    #[test]
    fn missing_required_blocks_are_rejected() {
        let original = sample();
        let mut value = serde_json::to_value(&original).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("colors");
        obj.remove("fonts");

        let err = import_template(&value.to_string(), ImportMode::Preserve).unwrap_err();
        match err {
            FolioError::Import(msg) => {
                assert!(msg.contains("colors"));
                assert!(msg.contains("fonts"));
                assert!(!msg.contains("name"));
            }
            other => panic!("expected import error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            import_template("[1, 2, 3]", ImportMode::Preserve),
            Err(FolioError::Import(_))
        ));
    }

    #[test]
    fn payload_without_id_gets_one() {
        let json = r#"{
            "name": "Bare",
            "sections": [{ "id": "h", "type": "header", "position": 1 }],
            "colors": {},
            "fonts": {}
        }"#;
        let t = import_template(json, ImportMode::Preserve).unwrap();
        assert!(!t.id.is_empty());
        assert_eq!(t.fonts.body_font, "Helvetica");
        assert!(t.sections[0].is_visible);
    }
}
