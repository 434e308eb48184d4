//! Entry points: interactive pick, library pages and property lookup

use flume::Receiver;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::batch::{self, BatchReport};
use crate::error::{PickerError, Result};
use crate::events::{EventSink, ProcessingEvent};
use crate::materialize::Materializer;
use crate::metadata::MetadataExtractor;
use crate::model::{LibraryItem, MediaResult};
use crate::pagination;
use crate::properties::{self, ExifLookup};
use crate::provider::{
    AuthorizationGate, HeifDecoder, LibheifDecoder, MediaLibrary, PickerConfig, SelectionEntry, SelectionSurface,
};
use crate::settings::{PageRequest, PickOptions, PickerSettings};

pub struct MediaPicker {
    settings: PickerSettings,
    materializer: Materializer,
    pool: ThreadPool,
    presenting: AtomicBool,
    events: Option<flume::Sender<ProcessingEvent>>,
}

/// Clears the presenting flag when the pick finishes, however it finishes
struct PresentingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PresentingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl MediaPicker {
    pub fn new(settings: PickerSettings) -> Result<Self> {
        Self::with_decoder(settings, Arc::new(LibheifDecoder))
    }

    pub fn with_decoder(settings: PickerSettings, decoder: Arc<dyn HeifDecoder>) -> Result<Self> {
        let materializer = Materializer::new(&settings, decoder)?;
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("mediapick-worker-{i}"));
        if let Some(threads) = settings.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        log::debug!(
            "media picker ready: cache {}, {} workers",
            materializer.cache().root().display(),
            pool.current_num_threads()
        );
        Ok(Self {
            settings,
            materializer,
            pool,
            presenting: AtomicBool::new(false),
            events: None,
        })
    }

    /// Replace the metadata extractor, e.g. to skip ffprobe
    pub fn with_metadata_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.materializer = self.materializer.with_extractor(extractor);
        self
    }

    pub fn settings(&self) -> &PickerSettings {
        &self.settings
    }

    /// Progress events of subsequent picks
    pub fn subscribe(&mut self) -> Receiver<ProcessingEvent> {
        let (tx, rx) = flume::unbounded();
        self.events = Some(tx);
        rx
    }

    /// Present the picker and materialize the selection.
    ///
    /// Either every selected item is returned, ordered by selection index, or
    /// the call fails with one aggregate error naming each failed item.
    pub fn get_medias(&self, options: &PickOptions, surface: &dyn SelectionSurface) -> Result<Vec<MediaResult>> {
        self.get_medias_partial(options, surface)?.into_result()
    }

    /// Like [`MediaPicker::get_medias`], but keeps the items that succeeded
    pub fn get_medias_partial(&self, options: &PickOptions, surface: &dyn SelectionSurface) -> Result<BatchReport> {
        if !surface.is_supported() {
            return Err(PickerError::NotSupported(
                "the media picker is not available on this platform".into(),
            ));
        }
        let _guard = self.begin_presentation()?;

        let config = PickerConfig {
            filter: options.filter(),
            selection_limit: options.limit(),
        };
        let mut entries = surface
            .present(&config)
            .map_err(|e| PickerError::Presentation(format!("{e:#}")))?;
        if entries.len() > config.selection_limit {
            log::debug!("selection of {} truncated to {}", entries.len(), config.selection_limit);
            entries.truncate(config.selection_limit);
        }
        if entries.is_empty() {
            log::debug!("selection cancelled");
            return Ok(BatchReport::default());
        }

        Ok(self.materialize(&entries, options.show_loader))
    }

    /// Materialize entries that did not come through a surface
    pub fn materialize(&self, entries: &[SelectionEntry], show_loader: bool) -> BatchReport {
        let events = EventSink::new(self.events.clone(), show_loader);
        batch::materialize_batch(&self.materializer, &self.pool, entries, &events)
    }

    /// One page of the library, newest first
    pub fn get_last_medias(
        &self,
        request: &PageRequest,
        library: Arc<dyn MediaLibrary>,
        gate: &dyn AuthorizationGate,
    ) -> Result<Vec<LibraryItem>> {
        let mut status = gate.status();
        if !status.is_granted() {
            status = gate.request();
        }
        if !status.is_granted() {
            log::info!("library access not granted: {:?}", status);
            return Err(PickerError::PermissionDenied);
        }
        pagination::fetch_page(&self.materializer, &library, request)
    }

    /// Look up one EXIF or container property of a local file
    pub fn get_exif_for_key(&self, file_uri: &str, key: &str) -> ExifLookup {
        properties::lookup(file_uri, key)
    }

    fn begin_presentation(&self) -> Result<PresentingGuard<'_>> {
        self.presenting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PickerError::PresentationConflict)?;
        Ok(PresentingGuard { flag: &self.presenting })
    }
}
