// Preview thumbnail generation for videos
use std::path::Path;
use std::process::Command;
use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, ImageFormat, imageops::FilterType};

use crate::heic::encode_jpeg;

/// Thumbnail generator configuration
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
    pub filter: FilterType,
    /// Timestamp of the grabbed frame, in seconds
    pub seek_secs: f64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            quality: 80,
            // Use Triangle (bilinear) for speed - good enough for thumbnails
            filter: FilterType::Triangle,
            seek_secs: 0.0,
        }
    }
}

/// Thumbnail generator for video files
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator with default settings
    pub fn new() -> Self {
        Self {
            config: ThumbnailConfig::default(),
        }
    }

    /// Create a thumbnail generator with custom config
    pub fn with_config(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Scale and center-crop so the thumbnail covers the whole target box
    pub fn fill(&self, img: &DynamicImage) -> DynamicImage {
        img.resize_to_fill(self.config.width.max(1), self.config.height.max(1), self.config.filter)
    }

    /// Grab one frame from a video with ffmpeg (rotation metadata is applied by ffmpeg)
    pub fn grab_video_frame(&self, input_path: &Path) -> Result<DynamicImage> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss"])
            .arg(format!("{:.3}", self.config.seek_secs.max(0.0)))
            .arg("-i")
            .arg(input_path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()
            .context("Failed to execute ffmpeg - ensure ffmpeg is installed")?;

        if !output.status.success() || output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("ffmpeg could not extract a frame from {}: {}", input_path.display(), stderr.trim()));
        }

        image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .with_context(|| format!("Failed to decode frame from {}", input_path.display()))
    }

    /// Grab a frame, fill the target box and encode it as JPEG bytes
    pub fn video_thumbnail_jpeg(&self, input_path: &Path) -> Result<Vec<u8>> {
        let frame = self.grab_video_frame(input_path)?;
        self.thumbnail_jpeg(&frame)
    }

    /// Thumbnail of already decoded pixels as JPEG bytes
    pub fn thumbnail_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        encode_jpeg(&self.fill(img), self.config.quality)
    }
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new()
    }
}
