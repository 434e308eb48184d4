//! Filesystem-backed collaborators for the command line
//!
//! Picked files become selection entries served straight from disk; a
//! directory tree plays the role of the media library.

use anyhow::{anyhow, Context, Result};
use mediapick_core::filetype::{self, MediaKind};
use mediapick_core::{
    Authorization, AuthorizationGate, ItemProvider, LibraryAsset, MediaFilter, MediaLibrary, PickerConfig,
    Representation, SelectionEntry, SelectionSurface,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// One file on disk
pub struct FileItem {
    path: PathBuf,
}

impl ItemProvider for FileItem {
    fn load_representation(&self, _type_identifier: &str) -> Result<Representation> {
        if !self.path.is_file() {
            return Err(anyhow!("{} is not a readable file", self.path.display()));
        }
        Ok(Representation::File(self.path.clone()))
    }

    fn suggested_name(&self) -> Option<String> {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned())
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Selection entry for a file, identified by its absolute path
pub fn selection_entry(path: &Path) -> SelectionEntry {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let hints = filetype::hints_for_extension(&extension(path));
    SelectionEntry::new(Arc::new(FileItem { path: absolute.clone() }), hints)
        .with_identifier(absolute.to_string_lossy().into_owned())
}

/// "Picker" that selects a fixed list of files
pub struct FileListSurface {
    files: Vec<PathBuf>,
}

impl FileListSurface {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }
}

impl SelectionSurface for FileListSurface {
    fn present(&self, config: &PickerConfig) -> Result<Vec<SelectionEntry>> {
        Ok(self
            .files
            .iter()
            .map(|f| selection_entry(f))
            .filter(|entry| config.filter.matches(entry.kind()))
            .collect())
    }
}

/// Hidden and private-vault folders never show up in the library
fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy().to_ascii_lowercase();
        (name.starts_with('.') && name != "." && name != "..") || name.contains("vault")
    })
}

/// Photos and videos under a directory, newest first by modification time
pub struct DirectoryLibrary {
    assets: Vec<(LibraryAsset, PathBuf)>,
}

impl DirectoryLibrary {
    pub fn scan(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root).with_context(|| format!("Cannot open library {}", root.display()))?;
        let mut found: Vec<(SystemTime, LibraryAsset, PathBuf)> = Vec::new();

        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("skipping unreadable library entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if is_hidden(relative) {
                continue;
            }
            let kind = filetype::kind_for_extension(&extension(entry.path()));
            if kind == MediaKind::Other {
                continue;
            }

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.created().or_else(|_| m.modified()).ok())
                .unwrap_or(UNIX_EPOCH);
            let mut asset = LibraryAsset::new(relative.to_string_lossy().into_owned(), kind);
            asset.original_filename = entry.file_name().to_str().map(str::to_string);
            asset.creation_date = modified
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_secs().to_string());
            found.push((modified, asset, entry.path().to_path_buf()));
        }

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.identifier.cmp(&b.1.identifier)));
        log::debug!("library {}: {} assets", root.display(), found.len());
        Ok(Self {
            assets: found.into_iter().map(|(_, asset, path)| (asset, path)).collect(),
        })
    }

    fn matching(&self, filter: MediaFilter) -> impl Iterator<Item = &(LibraryAsset, PathBuf)> {
        self.assets.iter().filter(move |(a, _)| filter.matches(a.kind))
    }

    fn path_of(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.assets
            .iter()
            .find(|(a, _)| a.identifier == asset.identifier)
            .map(|(_, path)| Representation::File(path.clone()))
            .ok_or_else(|| anyhow!("unknown asset {}", asset.identifier))
    }
}

impl MediaLibrary for DirectoryLibrary {
    fn count(&self, filter: MediaFilter) -> Result<usize> {
        Ok(self.matching(filter).count())
    }

    fn asset_at(&self, filter: MediaFilter, index: usize) -> Result<LibraryAsset> {
        self.matching(filter)
            .nth(index)
            .map(|(asset, _)| asset.clone())
            .ok_or_else(|| anyhow!("no asset at index {index}"))
    }

    fn request_image_data(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.path_of(asset)
    }

    fn request_video(&self, asset: &LibraryAsset) -> Result<Representation> {
        self.path_of(asset)
    }
}

/// A readable directory counts as an authorized library
pub struct DirectoryGate {
    root: PathBuf,
}

impl DirectoryGate {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }
}

impl AuthorizationGate for DirectoryGate {
    fn status(&self) -> Authorization {
        match fs::read_dir(&self.root) {
            Ok(_) => Authorization::Authorized,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Authorization::Denied,
            Err(_) => Authorization::Restricted,
        }
    }

    // Nobody to ask on a command line
    fn request(&self) -> Authorization {
        self.status()
    }
}
