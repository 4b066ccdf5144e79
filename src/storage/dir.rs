// Directory-backed history: one file per entry, named by creation time
//
// File names are `<zero-padded unix nanos>.<ext>` so lexical order is
// chronological. The file name doubles as the item id.

use super::{ContentType, HistoryStore, ItemMeta, Storage, StorageError};
use crate::rendering::codec;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const TEXT_EXTENSIONS: &[&str] = &["txt"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "ico", "img"];

pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Open (creating if needed) a history directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened history directory");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_type_of(name: &str) -> Option<ContentType> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Some(ContentType::Text)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(ContentType::Image)
        } else {
            None
        }
    }

    /// Resolve an id to a path inside the root, rejecting anything that
    /// could escape it
    fn path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        if id.is_empty() || id.contains(|c| c == '/' || c == '\\') || id.starts_with('.') {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn write_new(&self, ext: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let mut stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        loop {
            let name = format!("{stamp:020}.{ext}");
            let path = self.root.join(&name);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    fs::write(&path, bytes)?;
                    debug!(id = %name, len = bytes.len(), "Stored history entry");
                    return Ok(name);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Storage for DirStorage {
    fn fetch_full_bytes(&self, id: &str) -> Result<(Vec<u8>, ContentType), StorageError> {
        let content_type =
            Self::content_type_of(id).ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let path = self.path_for(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok((bytes, content_type)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list_meta(&self) -> Result<Vec<ItemMeta>, StorageError> {
        let mut items = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(content_type) = Self::content_type_of(&name) {
                items.push(ItemMeta::new(name, content_type));
            }
        }
        items.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(items)
    }
}

impl HistoryStore for DirStorage {
    fn add_text(&self, text: &str) -> Result<ItemMeta, StorageError> {
        let id = self.write_new("txt", text.as_bytes())?;
        Ok(ItemMeta::new(id, ContentType::Text))
    }

    fn add_image(&self, bytes: &[u8]) -> Result<ItemMeta, StorageError> {
        let ext = codec::measure(bytes)
            .ok()
            .and_then(|info| info.format.extensions_str().first().copied())
            .filter(|ext| IMAGE_EXTENSIONS.contains(ext))
            .unwrap_or("img");
        let id = self.write_new(ext, bytes)?;
        Ok(ItemMeta::new(id, ContentType::Image))
    }

    fn remove(&self, id: &str) -> Result<(), StorageError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}
