//! HEIC/HEIF to JPEG normalization

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{is_populated, MediaCache};
use crate::error::ItemError;
use crate::provider::HeifDecoder;

pub struct EncodingNormalizer {
    decoder: Arc<dyn HeifDecoder>,
    /// 1-100
    quality: u8,
}

impl EncodingNormalizer {
    pub fn new(decoder: Arc<dyn HeifDecoder>, quality: u8) -> Self {
        Self {
            decoder,
            quality: quality.clamp(1, 100),
        }
    }

    /// Transcode `source` to `{safe_id}.jpg` in the cache.
    ///
    /// An existing non-empty JPEG is reused without decoding.
    pub fn to_jpeg(&self, source: &Path, safe_id: &str, cache: &MediaCache) -> Result<PathBuf, ItemError> {
        let dest = cache.path_for(safe_id, "jpg");
        if dest == source {
            return Err(ItemError::Conversion(format!(
                "source and destination are the same file: {}",
                dest.display()
            )));
        }
        if is_populated(&dest) {
            return Ok(dest);
        }

        let img = self
            .decoder
            .decode(source)
            .map_err(|e| ItemError::Conversion(format!("cannot decode {}: {e:#}", source.display())))?;
        let bytes = codecs::heic::encode_jpeg(&img, self.quality)
            .map_err(|e| ItemError::Conversion(format!("JPEG encoding failed: {e:#}")))?;

        cache
            .write_atomic(&dest, |file| std::io::Write::write_all(file, &bytes))
            .map_err(|e| ItemError::Conversion(format!("cannot write {}: {e}", dest.display())))?;

        log::debug!(
            "normalized {} -> {} ({}x{}, q{})",
            source.display(),
            dest.display(),
            img.width(),
            img.height(),
            self.quality
        );
        Ok(dest)
    }
}
