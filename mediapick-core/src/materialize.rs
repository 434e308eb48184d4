//! Turning one selected item or library asset into a local file
//!
//! The destination is decided before the store is asked for anything, so a
//! second request for the same identifier is served from the cache without
//! touching the provider. HEIF content is copied under its own extension and
//! transcoded to `{safe_id}.jpg`.

use anyhow::anyhow;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use codecs::thumbnail::{ThumbnailConfig, ThumbnailGenerator};
use uuid::Uuid;

use crate::cache::{is_populated, MediaCache};
use crate::error::{ItemError, Result};
use crate::filetype::{self, MediaKind};
use crate::metadata::{MediaMetadata, MetadataExtractor};
use crate::model::{LocalFile, MediaResult};
use crate::normalize::EncodingNormalizer;
use crate::provider::{HeifDecoder, LibraryAsset, MediaLibrary, Representation, SelectionEntry};
use crate::sanitize::sanitize_identifier;
use crate::settings::PickerSettings;

const JPEG_MIME: &str = "image/jpeg";

/// A finalized file with everything needed to describe it
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub path: PathBuf,
    pub len: u64,
    pub mime_type: String,
    pub metadata: MediaMetadata,
}

impl Materialized {
    pub fn local_file(&self) -> LocalFile {
        LocalFile::new(&self.path, self.len, self.mime_type.clone())
    }
}

struct Plan<'a> {
    safe_id: &'a str,
    kind: MediaKind,
    hints: &'a [String],
    declared_heif: bool,
    /// Extension of the copied file unless the content turns out to be HEIF
    extension: String,
}

impl Plan<'_> {
    fn converts(&self) -> bool {
        self.kind == MediaKind::Image && self.declared_heif
    }

    /// Cache keys a previous run may have left for this item. A declared
    /// HEIF item lands on `jpg` once converted, or on whatever still image
    /// type its bytes turned out to be.
    fn cache_extensions(&self) -> Vec<&str> {
        if self.converts() {
            filetype::still_image_extensions().collect()
        } else {
            vec![self.extension.as_str()]
        }
    }
}

pub struct Materializer {
    cache: MediaCache,
    normalizer: EncodingNormalizer,
    extractor: MetadataExtractor,
    thumbnails: ThumbnailGenerator,
    provider_timeout: Option<Duration>,
}

impl Materializer {
    pub fn new(settings: &PickerSettings, decoder: Arc<dyn HeifDecoder>) -> Result<Self> {
        settings.validate()?;
        let cache = MediaCache::new(settings.cache_root())?;
        let thumbnails = ThumbnailGenerator::with_config(ThumbnailConfig {
            width: settings.thumbnail_size,
            height: settings.thumbnail_size,
            quality: settings.thumbnail_quality,
            ..Default::default()
        });
        Ok(Self {
            cache,
            normalizer: EncodingNormalizer::new(decoder, settings.jpeg_quality_percent()),
            extractor: MetadataExtractor::new(),
            thumbnails,
            provider_timeout: settings.provider_timeout,
        })
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Materialize one selection entry; errors carry the entry's index
    pub fn materialize_entry(&self, index: usize, entry: &SelectionEntry) -> Result<MediaResult> {
        let id = entry
            .asset_identifier
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let safe_id = sanitize_identifier(&id);
        let kind = entry.kind();

        let extension = entry
            .provider
            .suggested_name()
            .as_deref()
            .and_then(extension_of)
            .or_else(|| filetype::preferred_extension(&entry.type_hints).map(str::to_string))
            .unwrap_or_else(|| kind.default_extension().to_string());

        let plan = Plan {
            safe_id: &safe_id,
            kind,
            hints: &entry.type_hints,
            declared_heif: filetype::declares_heif(&entry.type_hints),
            extension,
        };

        let type_identifier = match kind {
            MediaKind::Video => filetype::MOVIE.to_string(),
            MediaKind::Image => filetype::IMAGE.to_string(),
            MediaKind::Other => entry
                .type_hints
                .first()
                .cloned()
                .unwrap_or_else(|| filetype::DATA.to_string()),
        };
        let provider = Arc::clone(&entry.provider);

        let file = self
            .acquire(&plan, move || provider.load_representation(&type_identifier))
            .map_err(|e| e.at(index))?;

        Ok(MediaResult {
            id,
            index,
            file: file.local_file(),
            kind,
            width: file.metadata.width,
            height: file.metadata.height,
            duration: file.metadata.duration,
            thumbnail: None,
        })
    }

    /// Materialize a library asset, keeping its original extension
    pub fn materialize_asset(
        &self,
        asset: &LibraryAsset,
        library: &Arc<dyn MediaLibrary>,
    ) -> std::result::Result<Materialized, ItemError> {
        let safe_id = sanitize_identifier(&asset.identifier);
        let original_ext = asset.original_extension();
        let declared_heif = original_ext.as_deref().is_some_and(filetype::is_heif_extension);
        let hints = original_ext
            .as_deref()
            .map(filetype::hints_for_extension)
            .unwrap_or_default();

        let plan = Plan {
            safe_id: &safe_id,
            kind: asset.kind,
            hints: &hints,
            declared_heif,
            extension: original_ext.unwrap_or_else(|| asset.kind.default_extension().to_string()),
        };

        let library = Arc::clone(library);
        let asset = asset.clone();
        self.acquire(&plan, move || match asset.kind {
            MediaKind::Video => library.request_video(&asset),
            _ => library.request_image_data(&asset),
        })
    }

    /// `thumb_{safe_id}.jpg` for a video, generated on first request.
    /// Failures are logged and leave no thumbnail.
    pub fn ensure_video_thumbnail(&self, safe_id: &str, video: &Path) -> Option<PathBuf> {
        let dest = self.cache.thumbnail_path(safe_id);
        if is_populated(&dest) {
            return Some(dest);
        }
        let bytes = match self.thumbnails.video_thumbnail_jpeg(video) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("thumbnail for {} failed: {:#}", video.display(), e);
                return None;
            }
        };
        match self
            .cache
            .write_atomic(&dest, |file| std::io::Write::write_all(file, &bytes))
        {
            Ok(()) => Some(dest),
            Err(e) => {
                log::warn!("cannot write {}: {}", dest.display(), e);
                None
            }
        }
    }

    fn acquire<F>(&self, plan: &Plan<'_>, load: F) -> std::result::Result<Materialized, ItemError>
    where
        F: FnOnce() -> anyhow::Result<Representation> + Send + 'static,
    {
        if let Some(path) = self.cache.lookup_any(plan.safe_id, plan.cache_extensions()) {
            log::debug!("cache hit for {}: {}", plan.safe_id, path.display());
            let converted = plan.converts() && path == self.cache.path_for(plan.safe_id, "jpg");
            return self.describe(path, plan, converted);
        }

        let representation =
            call_with_timeout(self.provider_timeout, load).map_err(|e| ItemError::Load(format!("{e:#}")))?;

        // Content wins over declared types when the bytes are recognizable
        let sniffed = representation.sniff_mime();
        let heif = plan.kind == MediaKind::Image
            && match sniffed.as_deref() {
                Some(mime) => filetype::is_heif_mime(mime),
                None => {
                    plan.declared_heif
                        || representation.extension().as_deref().is_some_and(filetype::is_heif_extension)
                }
            };

        let raw_ext = if heif {
            // Keep HEIF bytes off the JPEG destination
            if filetype::is_heif_extension(&plan.extension) {
                plan.extension.as_str()
            } else {
                "heic"
            }
        } else if plan.converts() {
            // Declared HEIF but delivered as something else
            sniffed
                .as_deref()
                .and_then(filetype::extension_for_mime)
                .unwrap_or("jpg")
        } else {
            plan.extension.as_str()
        };
        let raw_path = self.cache.path_for(plan.safe_id, raw_ext);
        self.cache
            .store(&representation, &raw_path)
            .map_err(|e| ItemError::Copy(format!("{}: {e}", raw_path.display())))?;
        drop(representation);

        let final_path = if heif {
            self.normalizer.to_jpeg(&raw_path, plan.safe_id, &self.cache)?
        } else {
            raw_path
        };
        self.describe(final_path, plan, heif)
    }

    fn describe(
        &self,
        path: PathBuf,
        plan: &Plan<'_>,
        converted: bool,
    ) -> std::result::Result<Materialized, ItemError> {
        let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(ItemError::Copy(format!("{} is missing or empty", path.display())));
        }
        // A transcoded file is JPEG whatever the hints say
        let mime_type = if converted {
            JPEG_MIME.to_string()
        } else {
            // The bytes are not HEIF, so HEIF hints no longer describe them
            let hints: Vec<String> = plan
                .hints
                .iter()
                .filter(|h| !filetype::conforms_to(h, filetype::HEIF))
                .cloned()
                .collect();
            let detected = filetype::detect_mime(&path);
            filetype::resolve_mime(&filetype::candidate_mimes(&hints, detected.as_deref()))
        };
        let metadata = self.extractor.extract(&path, plan.kind);
        Ok(Materialized { path, len, mime_type, metadata })
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Run a store request, giving up after `timeout`.
///
/// On timeout the worker thread is detached; its eventual result is dropped.
pub(crate) fn call_with_timeout<T, F>(timeout: Option<Duration>, call: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let Some(limit) = timeout else {
        return call();
    };

    let (tx, rx) = flume::bounded(1);
    thread::Builder::new()
        .name("mediapick-load".into())
        .spawn(move || {
            let _ = tx.send(panic::catch_unwind(AssertUnwindSafe(call)));
        })?;

    match rx.recv_timeout(limit) {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(anyhow!("store request panicked")),
        Err(flume::RecvTimeoutError::Timeout) => Err(anyhow!("timed out after {:?}", limit)),
        Err(flume::RecvTimeoutError::Disconnected) => Err(anyhow!("store request ended without a result")),
    }
}
