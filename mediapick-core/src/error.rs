use thiserror::Error;

/// Failure of a single item, before it is tagged with its selection index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// The store could not deliver the item's bytes
    #[error("load error: {0}")]
    Load(String),

    /// Writing the local copy failed
    #[error("copy error: {0}")]
    Copy(String),

    /// HEIC/HEIF to JPEG transcoding failed
    #[error("conversion error: {0}")]
    Conversion(String),
}

impl ItemError {
    pub fn at(self, index: usize) -> PickerError {
        PickerError::Item { index, error: self }
    }
}

#[derive(Debug, Error)]
pub enum PickerError {
    /// A selection is already in progress
    #[error("Picker is already presented")]
    PresentationConflict,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Item {index} {error}")]
    Item { index: usize, error: ItemError },

    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The selection surface could not be shown
    #[error("Presentation failed: {0}")]
    Presentation(String),

    /// The media library could not be enumerated
    #[error("Library error: {0}")]
    Library(String),

    /// Every item error of a batch, newline-joined when displayed
    #[error("{}", .0.join("\n"))]
    Aggregate(Vec<String>),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PickerError {
    /// Selection index of an item-level error
    pub fn item_index(&self) -> Option<usize> {
        match self {
            PickerError::Item { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T, E = PickerError> = std::result::Result<T, E>;
