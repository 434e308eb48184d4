//! mediapick core
//!
//! Brings user-selected photos and videos, or pages of the media library,
//! into a local cache directory as regular files. HEIC/HEIF images are
//! transcoded to JPEG on the way in; every result carries its local URI,
//! MIME type, size and, when readable, dimensions and duration.

pub mod batch;
pub mod cache;
pub mod error;
pub mod events;
pub mod filetype;
pub mod materialize;
pub mod metadata;
pub mod model;
pub mod normalize;
mod pagination;
pub mod picker;
pub mod properties;
pub mod provider;
pub mod sanitize;
pub mod settings;

pub use batch::BatchReport;
pub use error::{ItemError, PickerError, Result};
pub use events::ProcessingEvent;
pub use filetype::MediaKind;
pub use model::{LibraryItem, LocalFile, MediaResult};
pub use picker::MediaPicker;
pub use properties::ExifLookup;
pub use provider::{
    Authorization, AuthorizationGate, HeifDecoder, ItemProvider, LibheifDecoder, LibraryAsset, MediaLibrary,
    PickerConfig, Representation, SelectionEntry, SelectionSurface,
};
pub use settings::{MediaFilter, PageRequest, PickOptions, PickerSettings};
