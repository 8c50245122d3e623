//! Read-only access to the canvas `meta.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const META_FILE: &str = "meta.json";

/// Kind of content the canvas currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Email,
    Message,
    #[default]
    Doc,
}

impl ContentType {
    /// Capitalized label for the header.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Message => "Message",
            Self::Doc => "Doc",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasMode {
    #[default]
    View,
    Edit,
}

impl fmt::Display for CanvasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::View => "view",
            Self::Edit => "edit",
        })
    }
}

/// Contents of `meta.json`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasMeta {
    pub version: String,
    pub content_type: ContentType,
    pub mode: CanvasMode,
    pub claude_last_write: Option<String>,
    pub user_last_edit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for CanvasMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            content_type: ContentType::Doc,
            mode: CanvasMode::View,
            claude_last_write: None,
            user_last_edit: None,
            title: None,
        }
    }
}

/// Location of `meta.json` inside a canvas directory.
pub fn meta_path(canvas_dir: &Path) -> PathBuf {
    canvas_dir.join(META_FILE)
}

/// Read `path`, falling back to defaults when it is missing or invalid.
pub fn read_meta(path: &Path) -> CanvasMeta {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %err, "failed to read meta");
            }
            return CanvasMeta::default();
        }
    };
    serde_json::from_str(&data).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "invalid meta, using defaults");
        CanvasMeta::default()
    })
}
