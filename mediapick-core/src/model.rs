//! Records returned to callers

use serde::Serialize;
use std::path::Path;

use crate::filetype::MediaKind;
use crate::metadata::MediaMetadata;

const FILE_SCHEME: &str = "file://";

/// A materialized local file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalFile {
    pub uri: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

impl LocalFile {
    pub fn new(path: &Path, file_size: u64, mime_type: String) -> Self {
        Self {
            uri: file_uri(path),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_size,
            mime_type,
        }
    }
}

/// One item of an interactive pick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResult {
    pub id: String,
    /// Position in the original selection
    pub index: usize,
    #[serde(flatten)]
    pub file: LocalFile,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One asset of a library page. File fields are absent when the asset could
/// not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    /// Global position in the newest-first library
    pub index: usize,
    #[serde(flatten)]
    pub file: Option<LocalFile>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub creation_date: String,
}

impl LibraryItem {
    /// Prefer values read from the file, keep the library's otherwise
    pub fn merge_metadata(&mut self, meta: MediaMetadata) {
        self.width = meta.width.or(self.width);
        self.height = meta.height.or(self.height);
        self.duration = meta.duration.or(self.duration);
    }
}

/// `file://` URI of a local path, absolute
pub fn file_uri(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_file_uri(&absolute.to_string_lossy())
}

/// Leave local-file URIs alone, prefix bare paths with the scheme
pub fn normalize_file_uri(location: &str) -> String {
    if has_file_scheme(location) {
        location.to_string()
    } else {
        format!("{FILE_SCHEME}{location}")
    }
}

/// Filesystem path behind a `file://` URI or bare path
pub fn uri_to_path(location: &str) -> &str {
    if has_file_scheme(location) {
        &location[FILE_SCHEME.len()..]
    } else {
        location
    }
}

fn has_file_scheme(location: &str) -> bool {
    location
        .get(..FILE_SCHEME.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(FILE_SCHEME))
}
