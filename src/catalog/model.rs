//! Core data types for the catalog and its HTTP wire format.
//!
//! Field names follow the JSON the review endpoints speak (`fileNameRegex`,
//! `updatedCount`, ...), so the same types serve the server, the HTTP client
//! and the in-process client.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::mark::Mark;

/// Supported document kinds, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension (case-insensitive).
    pub fn detect(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect from an HTTP Content-Type header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("application/pdf") {
            Some(Self::Pdf)
        } else if ct.contains("text/plain") {
            Some(Self::Text)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw document bytes plus the kind used to pick a renderer.
#[derive(Debug, Clone)]
pub struct DocumentContent {
    pub filename: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// `GET /api/files` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListing {
    pub files: Vec<String>,
    #[serde(default)]
    pub marks: BTreeMap<String, Mark>,
}

/// `POST /api/mark` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkRequest {
    pub filename: String,
    pub mark: Mark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkResponse {
    pub success: bool,
}

/// Upper length bound used when the request leaves `maxLength` unset.
pub const DEFAULT_MAX_LENGTH: usize = 10_000_000;

/// `POST /api/filter` body.
///
/// Length is the character count for text documents and the page count
/// for PDFs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub file_name_regex: String,
    #[serde(default)]
    pub content_pattern: String,
    #[serde(
        default,
        deserialize_with = "lenient_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_length: Option<usize>,
    #[serde(
        default,
        deserialize_with = "lenient_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_length: Option<usize>,
    #[serde(default = "default_mark_color")]
    pub mark_color: Mark,
}

fn default_mark_color() -> Mark {
    Mark::A
}

impl Default for FilterRequest {
    fn default() -> Self {
        Self {
            file_name_regex: String::new(),
            content_pattern: String::new(),
            min_length: None,
            max_length: None,
            mark_color: default_mark_color(),
        }
    }
}

impl FilterRequest {
    pub fn min(&self) -> usize {
        self.min_length.unwrap_or(0)
    }

    pub fn max(&self) -> usize {
        self.max_length.unwrap_or(DEFAULT_MAX_LENGTH)
    }
}

/// Browser forms post lengths as strings; accept both numbers and numeric
/// strings, with the empty string meaning "unset".
fn lenient_length<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LengthField {
        Number(u64),
        Text(String),
    }

    match Option::<LengthField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LengthField::Number(n)) => usize::try_from(n)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(LengthField::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(LengthField::Text(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// `POST /api/filter` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    pub updated_count: usize,
}

/// `POST /api/export` body: the marks whose documents get exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub colors: BTreeSet<Mark>,
}

impl ExportRequest {
    pub fn new(marks: impl IntoIterator<Item = Mark>) -> Self {
        Self {
            colors: marks.into_iter().collect(),
        }
    }
}

/// `POST /api/export` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    /// Exported document names.
    pub exported: Vec<String>,
    /// Marks dropped because their document no longer exists.
    #[serde(default)]
    pub removed: Vec<String>,
}
