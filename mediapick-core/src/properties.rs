//! EXIF and container property lookup on a local file
//!
//! Images are searched dictionary by dictionary: top-level properties, then the
//! EXIF IFD, then TIFF (primary IFD), then GPS. Videos only expose the common
//! metadata keys, mapped onto container tags reported by ffprobe.

use exif::{Context, Field, In, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use codecs::video;

use crate::model::uri_to_path;

pub const KEY_REQUIRED: &str = "Exif key is required";

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "3gp"];

const COORDINATE_TAGS: [exif::Tag; 4] = [
    exif::Tag::GPSLatitude,
    exif::Tag::GPSLongitude,
    exif::Tag::GPSDestLatitude,
    exif::Tag::GPSDestLongitude,
];

/// Outcome of a lookup. Absence is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExifLookup {
    Value(String),
    /// Serializes as an empty object
    Missing,
    /// The key was empty; serializes as the placeholder message
    KeyRequired,
}

impl ExifLookup {
    pub fn value(&self) -> Option<&str> {
        match self {
            ExifLookup::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for ExifLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExifLookup::Value(v) => serializer.serialize_str(v),
            ExifLookup::KeyRequired => serializer.serialize_str(KEY_REQUIRED),
            ExifLookup::Missing => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Look up `key` in the file at `location` (a `file://` URI or a bare path)
pub fn lookup(location: &str, key: &str) -> ExifLookup {
    if key.is_empty() {
        return ExifLookup::KeyRequired;
    }
    let path = Path::new(uri_to_path(location));
    let found = if is_video_path(path) {
        lookup_video(path, key)
    } else {
        lookup_image(path, key)
    };
    found.map_or(ExifLookup::Missing, ExifLookup::Value)
}

fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

fn lookup_image(path: &Path, key: &str) -> Option<String> {
    if let Some(value) = top_level_property(path, key) {
        return Some(value);
    }

    let file = File::open(path)
        .map_err(|e| log::debug!("cannot open {}: {}", path.display(), e))
        .ok()?;
    let data = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|e| log::debug!("no EXIF in {}: {}", path.display(), e))
        .ok()?;

    let primary: Vec<&Field> = data.fields().filter(|f| f.ifd_num == In::PRIMARY).collect();
    [Context::Exif, Context::Tiff, Context::Gps]
        .into_iter()
        .find_map(|context| find_in_dictionary(&primary, context, key))
}

fn find_in_dictionary(fields: &[&Field], context: Context, key: &str) -> Option<String> {
    fields
        .iter()
        .filter(|f| f.tag.context() == context)
        .find(|f| {
            let name = f.tag.to_string();
            // GPS keys may be given without their prefix ("Latitude")
            name == key || (context == Context::Gps && name.strip_prefix("GPS") == Some(key))
        })
        .map(|f| format_value(f))
}

/// Properties of the image container rather than of an IFD
fn top_level_property(path: &Path, key: &str) -> Option<String> {
    match key {
        "PixelWidth" | "PixelHeight" => {
            let (w, h) = image::ImageReader::open(path)
                .ok()?
                .with_guessed_format()
                .ok()?
                .into_dimensions()
                .ok()?;
            Some(if key == "PixelWidth" { w } else { h }.to_string())
        }
        "FileSize" => std::fs::metadata(path).ok().map(|m| m.len().to_string()),
        "Orientation" | "DPIWidth" | "DPIHeight" => {
            let file = File::open(path).ok()?;
            let data = exif::Reader::new()
                .read_from_container(&mut BufReader::new(file))
                .ok()?;
            let tag = match key {
                "Orientation" => exif::Tag::Orientation,
                "DPIWidth" => exif::Tag::XResolution,
                _ => exif::Tag::YResolution,
            };
            data.get_field(tag, In::PRIMARY).map(format_value)
        }
        _ => None,
    }
}

fn format_value(field: &Field) -> String {
    fn number(v: f64) -> String {
        format!("{v}")
    }

    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Byte(v) if v.len() == 1 => v[0].to_string(),
        Value::Short(v) if v.len() == 1 => v[0].to_string(),
        Value::Long(v) if v.len() == 1 => v[0].to_string(),
        Value::SShort(v) if v.len() == 1 => v[0].to_string(),
        Value::SLong(v) if v.len() == 1 => v[0].to_string(),
        Value::Rational(v) if v.len() == 1 => number(v[0].to_f64()),
        Value::SRational(v) if v.len() == 1 => number(v[0].to_f64()),
        // Degrees, minutes, seconds as decimal degrees
        Value::Rational(v) if v.len() == 3 && COORDINATE_TAGS.contains(&field.tag) => {
            number(v[0].to_f64() + v[1].to_f64() / 60.0 + v[2].to_f64() / 3600.0)
        }
        _ => field.display_value().to_string().replace(['\\', '"'], ""),
    }
}

/// Common metadata keys and the container tags that carry them
const COMMON_KEYS: &[(&str, &[&str])] = &[
    ("title", &["com.apple.quicktime.title", "title"]),
    ("creator", &["com.apple.quicktime.author", "artist", "creator"]),
    ("subject", &["com.apple.quicktime.keywords", "subject"]),
    ("description", &["com.apple.quicktime.description", "description", "comment"]),
    ("publisher", &["com.apple.quicktime.publisher", "publisher"]),
    ("contributor", &["contributor"]),
    ("creationDate", &["com.apple.quicktime.creationdate", "creation_time", "date"]),
    ("lastModifiedDate", &["modification_time", "last_modified"]),
    ("type", &["type"]),
    ("format", &["major_brand"]),
    ("identifier", &["identifier"]),
    ("source", &["source"]),
    ("language", &["language"]),
    ("relation", &["relation"]),
    ("location", &["com.apple.quicktime.location.ISO6709", "location"]),
    ("copyrights", &["com.apple.quicktime.copyright", "copyright"]),
    ("album", &["com.apple.quicktime.album", "album"]),
    ("author", &["com.apple.quicktime.author", "author"]),
    ("artist", &["com.apple.quicktime.artist", "artist"]),
    ("make", &["com.apple.quicktime.make", "make"]),
    ("model", &["com.apple.quicktime.model", "model"]),
    ("software", &["com.apple.quicktime.software", "software", "encoder"]),
];

fn lookup_video(path: &Path, key: &str) -> Option<String> {
    if !video::ffprobe_available() {
        log::debug!("ffprobe not available, no metadata for {}", path.display());
        return None;
    }
    match video::probe_video(path) {
        Ok(probe) => common_value(&probe.tags, key),
        Err(e) => {
            log::debug!("probe failed for {}: {:#}", path.display(), e);
            None
        }
    }
}

/// Value of a common metadata key among container tags; unknown keys find nothing
pub fn common_value(tags: &BTreeMap<String, String>, key: &str) -> Option<String> {
    let (_, candidates) = COMMON_KEYS.iter().find(|(common, _)| *common == key)?;
    candidates.iter().find_map(|candidate| {
        tags.iter()
            .find(|(tag, value)| tag.eq_ignore_ascii_case(candidate) && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}
