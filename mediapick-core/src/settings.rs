//! Picker configuration and request options

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PickerError, Result};
use crate::filetype::MediaKind;

/// Settings shared by every operation of a [`crate::MediaPicker`]
#[derive(Debug, Clone)]
pub struct PickerSettings {
    /// Where materialized files land; the system temp dir when `None`
    pub cache_dir: Option<PathBuf>,
    /// JPEG quality for HEIC/HEIF conversion, in (0, 1]
    pub jpeg_quality: f32,
    /// Edge length of the square video thumbnails
    pub thumbnail_size: u32,
    /// JPEG quality for thumbnails (1-100)
    pub thumbnail_quality: u8,
    /// Worker threads for batch materialization; rayon's default when `None`
    pub worker_threads: Option<usize>,
    /// Upper bound on a single store request
    pub provider_timeout: Option<Duration>,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            jpeg_quality: 0.9,
            thumbnail_size: 300,
            thumbnail_quality: 80,
            worker_threads: None,
            provider_timeout: None,
        }
    }
}

impl PickerSettings {
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Conversion quality on the 1-100 scale the encoder takes
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(PickerError::InvalidSettings(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        if self.thumbnail_size == 0 {
            return Err(PickerError::InvalidSettings("thumbnail_size must be positive".into()));
        }
        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(PickerError::InvalidSettings(format!(
                "thumbnail_quality must be in 1..=100, got {}",
                self.thumbnail_quality
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(PickerError::InvalidSettings("worker_threads must be positive".into()));
        }
        if self.provider_timeout == Some(Duration::ZERO) {
            return Err(PickerError::InvalidSettings("provider_timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Which kinds of media a request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MediaFilter {
    #[default]
    All,
    Images,
    Videos,
}

impl MediaFilter {
    pub fn matches(self, kind: MediaKind) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Images => kind == MediaKind::Image,
            MediaFilter::Videos => kind == MediaKind::Video,
        }
    }
}

// Unknown names fall back to `All`
impl From<&str> for MediaFilter {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "images" | "image" => MediaFilter::Images,
            "videos" | "video" => MediaFilter::Videos,
            _ => MediaFilter::All,
        }
    }
}

impl From<String> for MediaFilter {
    fn from(value: String) -> Self {
        MediaFilter::from(value.as_str())
    }
}

/// Options of an interactive pick
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickOptions {
    pub selection_limit: i64,
    pub show_loader: bool,
    pub image_only: bool,
    pub media_type: Option<MediaFilter>,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            selection_limit: 3,
            show_loader: true,
            image_only: false,
            media_type: None,
        }
    }
}

impl PickOptions {
    /// Effective selection limit, never below one
    pub fn limit(&self) -> usize {
        self.selection_limit.max(1) as usize
    }

    /// An explicit media type wins over `imageOnly`
    pub fn filter(&self) -> MediaFilter {
        self.media_type.unwrap_or(if self.image_only {
            MediaFilter::Images
        } else {
            MediaFilter::All
        })
    }
}

/// A window into the media library, newest first
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
    pub media_type: MediaFilter,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            media_type: MediaFilter::All,
        }
    }
}

impl PageRequest {
    pub fn new(limit: i64, offset: i64, media_type: MediaFilter) -> Self {
        Self { limit, offset, media_type }
    }

    /// Half-open index range of the page within a library of `total` assets
    pub fn window(&self, total: usize) -> std::ops::Range<usize> {
        let offset = self.offset.max(0) as usize;
        let limit = self.limit.max(0) as usize;
        if offset >= total {
            return total..total;
        }
        offset..offset.saturating_add(limit).min(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        let settings = PickerSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.jpeg_quality_percent(), 90);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let bad = PickerSettings { jpeg_quality: 0.0, ..Default::default() };
        assert!(matches!(bad.validate(), Err(PickerError::InvalidSettings(_))));
        let bad = PickerSettings { jpeg_quality: 1.5, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = PickerSettings { worker_threads: Some(0), ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pick_options_from_json() {
        let opts: PickOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.limit(), 3);
        assert!(opts.show_loader);
        assert_eq!(opts.filter(), MediaFilter::All);

        let opts: PickOptions = serde_json::from_str(r#"{"selectionLimit": -4, "imageOnly": true}"#).unwrap();
        assert_eq!(opts.limit(), 1);
        assert_eq!(opts.filter(), MediaFilter::Images);

        let opts: PickOptions = serde_json::from_str(r#"{"imageOnly": true, "mediaType": "videos"}"#).unwrap();
        assert_eq!(opts.filter(), MediaFilter::Videos);
    }

    #[test]
    fn test_page_request_defaults_and_window() {
        let req: PageRequest = serde_json::from_str(r#"{"mediaType": "bogus"}"#).unwrap();
        assert_eq!((req.limit, req.offset, req.media_type), (20, 0, MediaFilter::All));

        assert_eq!(PageRequest::new(2, 0, MediaFilter::All).window(5), 0..2);
        assert_eq!(PageRequest::new(10, 3, MediaFilter::All).window(5), 3..5);
        assert_eq!(PageRequest::new(10, 5, MediaFilter::All).window(5), 5..5);
        assert!(PageRequest::new(0, 0, MediaFilter::All).window(5).is_empty());
        assert_eq!(PageRequest::new(2, -1, MediaFilter::All).window(5), 0..2);
    }
}
