//! Seams to the platform: media stores, picker surfaces and authorization
//!
//! Every external collaborator the pipeline talks to is a trait here so the
//! same code runs against a phone library, a directory tree or a test double.

use anyhow::Result;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::filetype::{self, MediaKind};
use crate::settings::MediaFilter;

/// Bytes handed over by a store for one item
#[derive(Debug, Clone)]
pub enum Representation {
    /// A readable file; it may vanish once the load call returns
    File(PathBuf),
    /// In-memory contents with an optional extension hint
    Data { bytes: Vec<u8>, extension: Option<String> },
}

impl Representation {
    /// Lower-cased source extension, if the representation carries one
    pub fn extension(&self) -> Option<String> {
        let ext = match self {
            Representation::File(path) => path.extension().and_then(|e| e.to_str()).map(str::to_string),
            Representation::Data { extension, .. } => extension.clone(),
        };
        ext.map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// MIME type recognized from the leading bytes
    pub fn sniff_mime(&self) -> Option<String> {
        match self {
            Representation::File(path) => filetype::sniff_file(path),
            Representation::Data { bytes, .. } => filetype::sniff(bytes),
        }
    }
}

/// Opaque handle to one selected item
pub trait ItemProvider: Send + Sync {
    /// Materialize the item as the given type identifier.
    ///
    /// May block for a long time, e.g. while a cloud copy downloads.
    fn load_representation(&self, type_identifier: &str) -> Result<Representation>;

    /// File name the store would give the item
    fn suggested_name(&self) -> Option<String> {
        None
    }
}

/// One item returned by a selection surface
#[derive(Clone)]
pub struct SelectionEntry {
    pub provider: Arc<dyn ItemProvider>,
    /// Stable library identifier; a random one is generated when absent
    pub asset_identifier: Option<String>,
    /// Type identifiers or MIME types, most specific first
    pub type_hints: Vec<String>,
}

impl SelectionEntry {
    pub fn new(provider: Arc<dyn ItemProvider>, type_hints: Vec<String>) -> Self {
        Self {
            provider,
            asset_identifier: None,
            type_hints,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.asset_identifier = Some(identifier.into());
        self
    }

    pub fn kind(&self) -> MediaKind {
        filetype::classify(&self.type_hints)
    }
}

impl std::fmt::Debug for SelectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionEntry")
            .field("asset_identifier", &self.asset_identifier)
            .field("type_hints", &self.type_hints)
            .finish_non_exhaustive()
    }
}

/// What the surface should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerConfig {
    pub filter: MediaFilter,
    pub selection_limit: usize,
}

/// Interactive picker UI
pub trait SelectionSurface: Send + Sync {
    /// False on platforms too old to host the picker
    fn is_supported(&self) -> bool {
        true
    }

    /// Show the picker and block until the user finishes. An empty list means
    /// the user cancelled.
    fn present(&self, config: &PickerConfig) -> Result<Vec<SelectionEntry>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    NotDetermined,
    Denied,
    Restricted,
    Authorized,
    /// Access to a user-chosen subset of the library
    Limited,
}

impl Authorization {
    pub fn is_granted(self) -> bool {
        matches!(self, Authorization::Authorized | Authorization::Limited)
    }
}

/// Library read permission
pub trait AuthorizationGate: Send + Sync {
    fn status(&self) -> Authorization;

    /// Ask the user; blocks until answered
    fn request(&self) -> Authorization;
}

/// One library asset as enumerated, before any bytes are fetched
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryAsset {
    pub identifier: String,
    pub kind: MediaKind,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    /// Seconds, videos only
    pub duration: Option<f64>,
    pub creation_date: Option<String>,
    pub original_filename: Option<String>,
}

impl LibraryAsset {
    pub fn new(identifier: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            pixel_width: None,
            pixel_height: None,
            duration: None,
            creation_date: None,
            original_filename: None,
        }
    }

    pub fn original_extension(&self) -> Option<String> {
        self.original_filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// The user's media library, ordered newest first
pub trait MediaLibrary: Send + Sync {
    fn count(&self, filter: MediaFilter) -> Result<usize>;

    /// The asset at `index` among those matching `filter`
    fn asset_at(&self, filter: MediaFilter, index: usize) -> Result<LibraryAsset>;

    /// Full-quality image bytes, downloading from the cloud if needed
    fn request_image_data(&self, asset: &LibraryAsset) -> Result<Representation>;

    /// The original video file, downloading from the cloud if needed
    fn request_video(&self, asset: &LibraryAsset) -> Result<Representation>;
}

/// Decodes HEIC/HEIF files to pixels with orientation applied
pub trait HeifDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DynamicImage>;
}

/// Decoder backed by libheif
#[derive(Debug, Clone, Copy, Default)]
pub struct LibheifDecoder;

impl HeifDecoder for LibheifDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        codecs::heic::decode_heic_image(path)
    }
}
