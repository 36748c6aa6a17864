//! # External Resources
//!
//! The only things a render reaches outside its inputs for: logo bytes and
//! font files. Both are looked up here and memoized by [`crate::cache`].
//!
//! Logo fetching sits behind the [`LogoFetcher`] trait so hosts can route it
//! through their own storage and tests can run without a network.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use crate::error::ResourceError;
use crate::font::{CustomFace, CustomFamily, FontFamily, StandardFamily};

/// Produces the raw bytes behind a logo reference.
#[async_trait]
pub trait LogoFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Data URIs, file paths and `http(s)://` URLs.
pub struct DefaultLogoFetcher {
    client: Result<reqwest::Client, String>,
}

impl DefaultLogoFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string());
        Self { client }
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        let fail = |message: String| ResourceError::Fetch {
            reference: url.to_string(),
            message,
        };
        let client = self.client.as_ref().map_err(|e| fail(format!("HTTP client error: {}", e)))?;

        let response = client.get(url).send().await.map_err(|e| fail(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl LogoFetcher for DefaultLogoFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResourceError> {
        let reference = reference.trim();
        if reference.starts_with("data:") {
            decode_data_uri(reference)
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            self.fetch_http(reference).await
        } else {
            tokio::fs::read(reference).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ResourceError::NotFound(reference.to_string()),
                _ => ResourceError::Fetch {
                    reference: reference.to_string(),
                    message: e.to_string(),
                },
            })
        }
    }
}

/// `data:image/png;base64,iVBOR...`
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ResourceError> {
    let fail = |message: &str| ResourceError::Decode {
        reference: truncate(uri),
        message: message.to_string(),
    };
    let (header, payload) = uri.split_once(',').ok_or_else(|| fail("data URI has no comma"))?;
    if !header.ends_with(";base64") {
        return Err(fail("only base64 data URIs are supported"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| fail(&format!("base64: {}", e)))
}

// Data URIs can be megabytes long; keep them out of log lines.
fn truncate(reference: &str) -> String {
    match reference.char_indices().nth(48) {
        Some((i, _)) => format!("{}...", &reference[..i]),
        None => reference.to_string(),
    }
}

/// Resolve a template font family string. Entries of a comma-separated list
/// are tried in order: standard aliases first, then TrueType files in
/// `font_dirs`.
pub async fn load_font_family(spec: &str, font_dirs: &[PathBuf]) -> Result<FontFamily, ResourceError> {
    let mut problems = Vec::new();

    for entry in spec.split(',').map(|e| e.trim().trim_matches(|c| c == '"' || c == '\'')) {
        if entry.is_empty() {
            continue;
        }
        if let Some(standard) = StandardFamily::from_alias(entry) {
            return Ok(FontFamily::Standard(standard));
        }
        match load_custom_family(entry, font_dirs).await {
            Ok(family) => return Ok(FontFamily::Custom(Arc::new(family))),
            Err(message) => problems.push(format!("{}: {}", entry, message)),
        }
    }

    Err(ResourceError::Font {
        family: spec.to_string(),
        message: if problems.is_empty() {
            "empty family name".to_string()
        } else {
            problems.join("; ")
        },
    })
}

async fn load_custom_family(name: &str, font_dirs: &[PathBuf]) -> Result<CustomFamily, String> {
    if font_dirs.is_empty() {
        return Err("not a standard font and no font directories are configured".to_string());
    }

    let stems = file_stems(name);
    let regular_files: Vec<String> = stems
        .iter()
        .flat_map(|s| [format!("{}.ttf", s), format!("{}-Regular.ttf", s)])
        .collect();
    let bold_files: Vec<String> = stems.iter().map(|s| format!("{}-Bold.ttf", s)).collect();

    let (path, data) = find_file(font_dirs, &regular_files)
        .await
        .ok_or_else(|| format!("no {} in font directories", regular_files.join(" / ")))?;
    let regular = CustomFace::parse(data).map_err(|e| format!("{}: {}", path.display(), e))?;

    let bold = match find_file(font_dirs, &bold_files).await {
        Some((path, data)) => match CustomFace::parse(data) {
            Ok(face) => Some(face),
            Err(e) => {
                log::warn!("Ignoring bold face {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    log::debug!("Loaded font family '{}' from {}", name, path.display());
    Ok(CustomFamily {
        name: name.to_string(),
        regular,
        bold,
    })
}

/// "Open Sans" is usually shipped as "OpenSans-Regular.ttf".
fn file_stems(name: &str) -> Vec<String> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == name {
        vec![name.to_string()]
    } else {
        vec![name.to_string(), compact]
    }
}

async fn find_file(dirs: &[PathBuf], names: &[String]) -> Option<(PathBuf, Vec<u8>)> {
    for dir in dirs {
        for name in names {
            let path = Path::new(dir).join(name);
            if let Ok(data) = tokio::fs::read(&path).await {
                return Some((path, data));
            }
        }
    }
    None
}
