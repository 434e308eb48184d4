//! Newest-first pages over the media library

use std::sync::Arc;

use crate::error::{PickerError, Result};
use crate::filetype::MediaKind;
use crate::materialize::Materializer;
use crate::model::{file_uri, LibraryItem};
use crate::provider::{LibraryAsset, MediaLibrary};
use crate::sanitize::sanitize_identifier;
use crate::settings::PageRequest;

/// Fetch one page. Items are materialized one after another, in library order.
///
/// An asset whose bytes cannot be fetched still yields a record, without the
/// file fields. A position the library fails to enumerate has no asset to
/// describe and is left out of the page.
pub(crate) fn fetch_page(
    materializer: &Materializer,
    library: &Arc<dyn MediaLibrary>,
    request: &PageRequest,
) -> Result<Vec<LibraryItem>> {
    let filter = request.media_type;
    let total = library
        .count(filter)
        .map_err(|e| PickerError::Library(format!("{e:#}")))?;
    let window = request.window(total);
    log::debug!("library page {:?} of {} ({:?})", window, total, filter);

    let mut items = Vec::with_capacity(window.len());
    for index in window {
        let asset = match library.asset_at(filter, index) {
            Ok(asset) => asset,
            Err(e) => {
                log::warn!("library enumeration failed at {}, skipping: {:#}", index, e);
                continue;
            }
        };
        items.push(library_item(materializer, library, &asset, index));
    }
    Ok(items)
}

fn library_item(
    materializer: &Materializer,
    library: &Arc<dyn MediaLibrary>,
    asset: &LibraryAsset,
    index: usize,
) -> LibraryItem {
    let mut item = LibraryItem {
        id: asset.identifier.clone(),
        index,
        file: None,
        kind: asset.kind,
        width: asset.pixel_width,
        height: asset.pixel_height,
        duration: asset.duration.filter(|_| asset.kind == MediaKind::Video),
        thumbnail: None,
        creation_date: asset.creation_date.clone().unwrap_or_default(),
    };

    match materializer.materialize_asset(asset, library) {
        Ok(file) => {
            if asset.kind == MediaKind::Video {
                let safe_id = sanitize_identifier(&asset.identifier);
                item.thumbnail = materializer
                    .ensure_video_thumbnail(&safe_id, &file.path)
                    .map(|thumb| file_uri(&thumb));
            }
            item.merge_metadata(file.metadata);
            item.file = Some(file.local_file());
        }
        Err(e) => log::warn!("{}", e.at(index)),
    }
    item
}
