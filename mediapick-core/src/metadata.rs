//! Dimensions and duration of materialized files

use std::path::Path;

use codecs::video;

use crate::filetype::MediaKind;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Seconds
    pub duration: Option<f64>,
}

/// Reads metadata without failing the item; missing values stay `None`
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    probe_videos: bool,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        let probe_videos = video::ffprobe_available();
        if !probe_videos {
            log::info!("ffprobe not found, video dimensions and duration will be omitted");
        }
        Self { probe_videos }
    }

    pub fn without_video_probe() -> Self {
        Self { probe_videos: false }
    }

    pub fn extract(&self, path: &Path, kind: MediaKind) -> MediaMetadata {
        match kind {
            MediaKind::Image => image_metadata(path),
            MediaKind::Video if self.probe_videos => video_metadata(path),
            _ => MediaMetadata::default(),
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// Header-only read; content sniffing wins over a wrong extension
fn image_metadata(path: &Path) -> MediaMetadata {
    let dims = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.into_dimensions());
    match dims {
        Ok((width, height)) => MediaMetadata {
            width: Some(width),
            height: Some(height),
            duration: None,
        },
        Err(e) => {
            log::debug!("no dimensions for {}: {}", path.display(), e);
            MediaMetadata::default()
        }
    }
}

fn video_metadata(path: &Path) -> MediaMetadata {
    match video::probe_video(path) {
        Ok(probe) => MediaMetadata {
            width: probe.display_size.map(|(w, _)| w),
            height: probe.display_size.map(|(_, h)| h),
            duration: probe.duration_secs,
        },
        Err(e) => {
            log::warn!("video probe failed for {}: {:#}", path.display(), e);
            MediaMetadata::default()
        }
    }
}
