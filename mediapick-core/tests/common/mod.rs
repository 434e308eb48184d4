#![allow(dead_code)]

use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mediapick_core::metadata::MetadataExtractor;
use mediapick_core::{
    Authorization, AuthorizationGate, HeifDecoder, ItemProvider, LibraryAsset, MediaFilter, MediaKind, MediaLibrary,
    MediaPicker, PickerConfig, PickerSettings, Representation, SelectionEntry, SelectionSurface,
};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([30, 60, 90])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Just enough of an ISO-BMFF header to be recognized as HEIC
pub fn heic_bytes() -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 0x18];
    bytes.extend_from_slice(b"ftypheic");
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(b"mif1heic");
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}

/// Stands in for libheif: every file decodes to the same picture
pub struct FakeHeifDecoder {
    pub width: u32,
    pub height: u32,
    pub calls: AtomicUsize,
}

impl FakeHeifDecoder {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self { width, height, calls: AtomicUsize::new(0) })
    }
}

impl HeifDecoder for FakeHeifDecoder {
    fn decode(&self, _path: &Path) -> Result<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(self.width, self.height, Rgb([200, 10, 10]))))
    }
}

/// libheif failing on every file
pub struct BrokenHeifDecoder;

impl BrokenHeifDecoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl HeifDecoder for BrokenHeifDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        Err(anyhow!("corrupt HEIF container: {}", path.display()))
    }
}

/// Item provider serving fixed bytes, counting how often it is asked
pub struct BytesProvider {
    bytes: Vec<u8>,
    extension: Option<String>,
    delay: Duration,
    failure: Option<String>,
    pub calls: AtomicUsize,
}

impl BytesProvider {
    pub fn new(bytes: Vec<u8>, extension: &str) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            extension: Some(extension.to_string()),
            delay: Duration::ZERO,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn delayed(bytes: Vec<u8>, extension: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            extension: Some(extension.to_string()),
            delay,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            bytes: Vec::new(),
            extension: None,
            delay: Duration::ZERO,
            failure: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ItemProvider for BytesProvider {
    fn load_representation(&self, _type_identifier: &str) -> Result<Representation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(Representation::Data { bytes: self.bytes.clone(), extension: self.extension.clone() }),
        }
    }
}

pub fn entry(provider: Arc<BytesProvider>, id: &str, hints: &[&str]) -> SelectionEntry {
    SelectionEntry::new(provider, hints.iter().map(|h| h.to_string()).collect()).with_identifier(id)
}

/// Surface that returns a canned selection and records the config it saw
pub struct FixedSurface {
    entries: Vec<SelectionEntry>,
    supported: bool,
    pub seen: Mutex<Option<PickerConfig>>,
}

impl FixedSurface {
    pub fn new(entries: Vec<SelectionEntry>) -> Self {
        Self { entries, supported: true, seen: Mutex::new(None) }
    }

    pub fn unsupported() -> Self {
        Self { entries: Vec::new(), supported: false, seen: Mutex::new(None) }
    }
}

impl SelectionSurface for FixedSurface {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn present(&self, config: &PickerConfig) -> Result<Vec<SelectionEntry>> {
        *self.seen.lock() = Some(*config);
        Ok(self.entries.clone())
    }
}

pub struct FixedGate {
    status: Authorization,
    answer: Authorization,
    pub requests: AtomicUsize,
}

impl FixedGate {
    pub fn new(status: Authorization, answer: Authorization) -> Self {
        Self { status, answer, requests: AtomicUsize::new(0) }
    }

    pub fn granted() -> Self {
        Self::new(Authorization::Authorized, Authorization::Authorized)
    }
}

impl AuthorizationGate for FixedGate {
    fn status(&self) -> Authorization {
        self.status
    }

    fn request(&self) -> Authorization {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// In-memory library, newest asset first
pub struct FakeLibrary {
    assets: Vec<(LibraryAsset, Option<Vec<u8>>)>,
    pub requests: AtomicUsize,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self { assets: Vec::new(), requests: AtomicUsize::new(0) }
    }

    pub fn with_image(mut self, id: &str, filename: &str, bytes: Vec<u8>) -> Self {
        let mut asset = LibraryAsset::new(id, MediaKind::Image);
        asset.original_filename = Some(filename.to_string());
        asset.creation_date = Some(format!("created-{id}"));
        self.assets.push((asset, Some(bytes)));
        self
    }

    pub fn with_video(mut self, id: &str, filename: &str, bytes: Vec<u8>) -> Self {
        let mut asset = LibraryAsset::new(id, MediaKind::Video);
        asset.original_filename = Some(filename.to_string());
        asset.duration = Some(4.5);
        asset.creation_date = Some(format!("created-{id}"));
        self.assets.push((asset, Some(bytes)));
        self
    }

    /// Asset the store cannot deliver
    pub fn with_unavailable(mut self, id: &str, width: u32, height: u32) -> Self {
        let mut asset = LibraryAsset::new(id, MediaKind::Image);
        asset.pixel_width = Some(width);
        asset.pixel_height = Some(height);
        asset.creation_date = Some(format!("created-{id}"));
        self.assets.push((asset, None));
        self
    }

    fn filtered(&self, filter: MediaFilter) -> Vec<&(LibraryAsset, Option<Vec<u8>>)> {
        self.assets.iter().filter(|(a, _)| filter.matches(a.kind)).collect()
    }

    fn fetch(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (_, bytes) = self
            .assets
            .iter()
            .find(|(a, _)| a.identifier == asset.identifier)
            .ok_or_else(|| anyhow!("unknown asset {}", asset.identifier))?;
        let bytes = bytes.clone().ok_or_else(|| anyhow!("asset is only in the cloud"))?;
        Ok(Representation::Data { bytes, extension: asset.original_extension() })
    }
}

impl MediaLibrary for FakeLibrary {
    fn count(&self, filter: MediaFilter) -> Result<usize> {
        Ok(self.filtered(filter).len())
    }

    fn asset_at(&self, filter: MediaFilter, index: usize) -> Result<LibraryAsset> {
        self.filtered(filter)
            .get(index)
            .map(|(a, _)| a.clone())
            .ok_or_else(|| anyhow!("index {index} out of range"))
    }

    fn request_image_data(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.fetch(asset)
    }

    fn request_video(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.fetch(asset)
    }
}

/// Library that cannot enumerate one position
pub struct GappyLibrary {
    pub inner: FakeLibrary,
    pub gap: usize,
}

impl MediaLibrary for GappyLibrary {
    fn count(&self, filter: MediaFilter) -> Result<usize> {
        self.inner.count(filter)
    }

    fn asset_at(&self, filter: MediaFilter, index: usize) -> Result<LibraryAsset> {
        if index == self.gap {
            return Err(anyhow!("asset {index} vanished"));
        }
        self.inner.asset_at(filter, index)
    }

    fn request_image_data(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.inner.request_image_data(asset)
    }

    fn request_video(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.inner.request_video(asset)
    }
}

pub fn settings(cache: &Path) -> PickerSettings {
    PickerSettings {
        cache_dir: Some(cache.to_path_buf()),
        worker_threads: Some(4),
        ..Default::default()
    }
}

pub fn picker(cache: &Path, decoder: Arc<dyn HeifDecoder>) -> MediaPicker {
    picker_with(settings(cache), decoder)
}

pub fn picker_with(settings: PickerSettings, decoder: Arc<dyn HeifDecoder>) -> MediaPicker {
    MediaPicker::with_decoder(settings, decoder)
        .unwrap()
        .with_metadata_extractor(MetadataExtractor::without_video_probe())
}
