//! Type identifiers, MIME resolution and file type sniffing
//!
//! Selection entries describe themselves with a list of type hints. A hint is
//! either a uniform type identifier (`public.heic`) or a MIME content type
//! (`image/heic`). The registry below knows how the two map onto each other
//! and which abstract capability (image, movie) every concrete type belongs to.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DATA: &str = "public.data";
pub const IMAGE: &str = "public.image";
pub const MOVIE: &str = "public.movie";
pub const HEIF: &str = "public.heif";
pub const HEIC: &str = "public.heic";

pub const OCTET_STREAM: &str = "application/octet-stream";
const JPEG_MIME: &str = "image/jpeg";
const MP4_MIME: &str = "video/mp4";

/// Coarse media kind of a picked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Extension used when neither the item nor its hints name one
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mov",
            MediaKind::Other => "dat",
        }
    }
}

struct UniformType {
    identifier: &'static str,
    mime: Option<&'static str>,
    extensions: &'static [&'static str],
    parent: Option<&'static str>,
}

const fn uti(
    identifier: &'static str,
    mime: Option<&'static str>,
    extensions: &'static [&'static str],
    parent: Option<&'static str>,
) -> UniformType {
    UniformType { identifier, mime, extensions, parent }
}

// First extension of each entry is the preferred one
const REGISTRY: &[UniformType] = &[
    uti(DATA, None, &[], None),
    uti(IMAGE, None, &[], Some(DATA)),
    uti(MOVIE, None, &[], Some(DATA)),
    // Images
    uti("public.jpeg", Some(JPEG_MIME), &["jpg", "jpeg"], Some(IMAGE)),
    uti("public.png", Some("image/png"), &["png"], Some(IMAGE)),
    uti("com.compuserve.gif", Some("image/gif"), &["gif"], Some(IMAGE)),
    uti("public.tiff", Some("image/tiff"), &["tiff", "tif"], Some(IMAGE)),
    uti("com.microsoft.bmp", Some("image/bmp"), &["bmp"], Some(IMAGE)),
    uti("org.webmproject.webp", Some("image/webp"), &["webp"], Some(IMAGE)),
    uti("public.avif", Some("image/avif"), &["avif"], Some(IMAGE)),
    uti(HEIF, Some("image/heif"), &["heif", "hif"], Some(IMAGE)),
    uti(HEIC, Some("image/heic"), &["heic"], Some(HEIF)),
    uti("com.adobe.raw-image", Some("image/x-adobe-dng"), &["dng"], Some(IMAGE)),
    // Movies
    uti("com.apple.quicktime-movie", Some("video/quicktime"), &["mov", "qt"], Some(MOVIE)),
    uti("public.mpeg-4", Some(MP4_MIME), &["mp4"], Some(MOVIE)),
    uti("com.apple.m4v-video", Some("video/x-m4v"), &["m4v"], Some(MOVIE)),
    uti("public.3gpp", Some("video/3gpp"), &["3gp", "3gpp"], Some(MOVIE)),
    uti("public.avi", Some("video/avi"), &["avi"], Some(MOVIE)),
    uti("org.matroska.mkv", Some("video/x-matroska"), &["mkv"], Some(MOVIE)),
    uti("org.webmproject.webm", Some("video/webm"), &["webm"], Some(MOVIE)),
    // Other
    uti("com.adobe.pdf", Some("application/pdf"), &["pdf"], Some(DATA)),
];

fn by_identifier(identifier: &str) -> Option<&'static UniformType> {
    REGISTRY.iter().find(|t| t.identifier.eq_ignore_ascii_case(identifier))
}

fn by_mime(mime: &str) -> Option<&'static UniformType> {
    REGISTRY.iter().find(|t| t.mime.is_some_and(|m| m.eq_ignore_ascii_case(mime)))
}

fn by_extension(ext: &str) -> Option<&'static UniformType> {
    REGISTRY
        .iter()
        .find(|t| t.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// `type/subtype` with no whitespace
fn is_mime(hint: &str) -> bool {
    match hint.split_once('/') {
        Some((top, sub)) => {
            !top.is_empty() && !sub.is_empty() && !hint.contains(char::is_whitespace) && !sub.contains('/')
        }
        None => false,
    }
}

/// Registry entry a hint refers to, if any
fn entry_for_hint(hint: &str) -> Option<&'static UniformType> {
    if is_mime(hint) {
        by_mime(hint)
    } else {
        by_identifier(hint)
    }
}

/// Whether `hint` conforms to the abstract `capability` identifier.
pub fn conforms_to(hint: &str, capability: &str) -> bool {
    if hint.eq_ignore_ascii_case(capability) {
        return true;
    }

    let mut current = entry_for_hint(hint);
    if current.is_none() && is_mime(hint) {
        // Unregistered content types still carry their top-level family
        let top = hint.split('/').next().unwrap_or_default().to_ascii_lowercase();
        return match top.as_str() {
            "image" => capability == IMAGE || capability == DATA,
            "video" => capability == MOVIE || capability == DATA,
            _ => capability == DATA,
        };
    }

    while let Some(entry) = current {
        if entry.identifier == capability {
            return true;
        }
        current = entry.parent.and_then(by_identifier);
    }
    false
}

/// Classify an item by its hints. Video wins over image.
pub fn classify(hints: &[String]) -> MediaKind {
    if hints.iter().any(|h| conforms_to(h, MOVIE)) {
        MediaKind::Video
    } else if hints.iter().any(|h| conforms_to(h, IMAGE)) {
        MediaKind::Image
    } else {
        MediaKind::Other
    }
}

/// Whether any hint names HEIC or HEIF
pub fn declares_heif(hints: &[String]) -> bool {
    hints.iter().any(|h| conforms_to(h, HEIF))
}

pub fn is_heif_extension(ext: &str) -> bool {
    matches!(ext.to_ascii_lowercase().as_str(), "heic" | "heif" | "hif")
}

/// Preferred file extension of the first concrete hint
pub fn preferred_extension(hints: &[String]) -> Option<&'static str> {
    hints
        .iter()
        .filter_map(|h| entry_for_hint(h))
        .find_map(|t| t.extensions.first().copied())
}

/// Preferred extensions of every non-HEIF still image type, JPEG first
pub fn still_image_extensions() -> impl Iterator<Item = &'static str> {
    REGISTRY
        .iter()
        .filter(|t| conforms_to(t.identifier, IMAGE) && !conforms_to(t.identifier, HEIF))
        .filter_map(|t| t.extensions.first().copied())
}

pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    by_mime(mime).and_then(|t| t.extensions.first().copied())
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    by_extension(ext).and_then(|t| t.mime)
}

/// Type hints describing a file with the given extension: the concrete
/// identifier followed by every parent up to `public.data`.
pub fn hints_for_extension(ext: &str) -> Vec<String> {
    let mut hints = Vec::new();
    let mut current = by_extension(ext);
    while let Some(entry) = current {
        hints.push(entry.identifier.to_string());
        current = entry.parent.and_then(by_identifier);
    }
    if hints.is_empty() {
        hints.push(DATA.to_string());
    }
    hints
}

pub fn kind_for_extension(ext: &str) -> MediaKind {
    classify(&hints_for_extension(ext))
}

/// Build the ordered MIME candidate list for an item.
///
/// Content-type hints come first as given, then MIME types looked up from
/// identifier hints, then the type detected from the finalized file itself.
pub fn candidate_mimes(hints: &[String], detected: Option<&str>) -> Vec<String> {
    let modern = hints.iter().filter(|h| is_mime(h)).map(|h| h.to_ascii_lowercase());
    let legacy = hints
        .iter()
        .filter(|h| !is_mime(h))
        .filter_map(|h| by_identifier(h).and_then(|t| t.mime))
        .map(str::to_string);
    let mut candidates: Vec<String> = Vec::new();
    for mime in modern.chain(legacy).chain(detected.map(str::to_string)) {
        if !candidates.contains(&mime) {
            candidates.push(mime);
        }
    }
    candidates
}

/// Pick one MIME type: JPEG first, then MP4, then the first candidate.
pub fn resolve_mime(candidates: &[String]) -> String {
    if candidates.iter().any(|c| c == JPEG_MIME) {
        return JPEG_MIME.to_string();
    }
    if candidates.iter().any(|c| c == MP4_MIME) {
        return MP4_MIME.to_string();
    }
    candidates
        .first()
        .cloned()
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Detect a file's MIME type from its magic bytes, falling back to its extension
pub fn detect_mime(path: &Path) -> Option<String> {
    if let Some(mime) = sniff_file(path) {
        return Some(mime);
    }
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .map(str::to_string)
}

/// MIME type recognized from leading bytes
pub fn sniff(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| canonical_mime(k.mime_type()))
}

pub fn sniff_file(path: &Path) -> Option<String> {
    infer::get_from_path(path)
        .ok()
        .flatten()
        .map(|k| canonical_mime(k.mime_type()))
}

pub fn is_heif_mime(mime: &str) -> bool {
    matches!(mime, "image/heif" | "image/heic")
}

// infer spells AVI differently from the registry
fn canonical_mime(mime: &str) -> String {
    match mime {
        "video/x-msvideo" => "video/avi".to_string(),
        other => other.to_string(),
    }
}
