//! Binary photo storage.
//!
//! Photos are opaque blobs addressed by the file name they were stored
//! under. Items only keep the returned id.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use medinv_core::DomainError;

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// File extension for an accepted mime type.
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("photo {0} not found")]
    NotFound(String),

    #[error("invalid photo id: {0}")]
    InvalidId(String),

    #[error("photo store lock poisoned")]
    Poisoned,

    #[error("photo io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PhotoError> for DomainError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::NotFound(id) => DomainError::not_found(format!("photo {id}")),
            PhotoError::InvalidId(id) => DomainError::validation(format!("invalid photo id: {id}")),
            other => DomainError::storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub id: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub trait PhotoStore: Send + Sync {
    /// Store `bytes` under `file_name` and return the photo id.
    fn put(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, PhotoError>;

    fn get(&self, id: &str) -> Result<StoredPhoto, PhotoError>;

    fn remove(&self, id: &str) -> Result<(), PhotoError>;
}

impl<S> PhotoStore for Arc<S>
where
    S: PhotoStore + ?Sized,
{
    fn put(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, PhotoError> {
        (**self).put(file_name, mime_type, bytes)
    }

    fn get(&self, id: &str) -> Result<StoredPhoto, PhotoError> {
        (**self).get(id)
    }

    fn remove(&self, id: &str) -> Result<(), PhotoError> {
        (**self).remove(id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPhotoStore {
    inner: RwLock<HashMap<String, StoredPhoto>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PhotoStore for InMemoryPhotoStore {
    fn put(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, PhotoError> {
        let mut map = self.inner.write().map_err(|_| PhotoError::Poisoned)?;
        let id = file_name.to_string();
        map.insert(
            id.clone(),
            StoredPhoto {
                id: id.clone(),
                mime_type: mime_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<StoredPhoto, PhotoError> {
        let map = self.inner.read().map_err(|_| PhotoError::Poisoned)?;
        map.get(id).cloned().ok_or_else(|| PhotoError::NotFound(id.to_string()))
    }

    fn remove(&self, id: &str) -> Result<(), PhotoError> {
        let mut map = self.inner.write().map_err(|_| PhotoError::Poisoned)?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| PhotoError::NotFound(id.to_string()))
    }
}

/// Photos as plain files in one directory; the id is the file name.
#[derive(Debug, Clone)]
pub struct DirPhotoStore {
    dir: PathBuf,
}

impl DirPhotoStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PhotoError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, PhotoError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(PhotoError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(id))
    }
}

fn mime_for_file(id: &str) -> &'static str {
    match id.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

impl PhotoStore for DirPhotoStore {
    fn put(&self, file_name: &str, _mime_type: &str, bytes: &[u8]) -> Result<String, PhotoError> {
        let path = self.path_for(file_name)?;
        fs::write(path, bytes)?;
        Ok(file_name.to_string())
    }

    fn get(&self, id: &str) -> Result<StoredPhoto, PhotoError> {
        let path = self.path_for(id)?;
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PhotoError::NotFound(id.to_string()),
            _ => PhotoError::Io(e),
        })?;
        Ok(StoredPhoto {
            id: id.to_string(),
            mime_type: mime_for_file(id).to_string(),
            bytes,
        })
    }

    fn remove(&self, id: &str) -> Result<(), PhotoError> {
        let path = self.path_for(id)?;
        fs::remove_file(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PhotoError::NotFound(id.to_string()),
            _ => PhotoError::Io(e),
        })
    }
}
