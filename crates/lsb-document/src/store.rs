use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use lsb_types::AssetId;
use tracing::debug;

use crate::document::BackupDocument;
use crate::error::{DocumentError, DocumentResult};

/// Where a backup document and its companion images live.
///
/// Companion images are keyed by the asset id they were exported from.
pub trait BackupStore {
    fn write_document(&self, document: &BackupDocument) -> DocumentResult<()>;

    fn read_document(&self) -> DocumentResult<BackupDocument>;

    fn write_texture(&self, id: AssetId, data: &[u8]) -> DocumentResult<()>;

    fn read_texture(&self, id: AssetId) -> DocumentResult<Bytes>;

    fn has_texture(&self, id: AssetId) -> bool;
}

// ---------------------------------------------------------------------------
// BackupDir
// ---------------------------------------------------------------------------

/// A backup on disk: the document file plus one file per companion image in
/// the same directory, named by the hyphenated asset id without extension.
#[derive(Clone, Debug)]
pub struct BackupDir {
    document: PathBuf,
    dir: PathBuf,
}

impl BackupDir {
    /// A backup whose document lives at `document`.
    pub fn new(document: impl Into<PathBuf>) -> Self {
        let document = document.into();
        let dir = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self { document, dir }
    }

    pub fn document_path(&self) -> &Path {
        &self.document
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the companion image for `id`.
    pub fn texture_path(&self, id: AssetId) -> PathBuf {
        self.dir.join(id.to_string())
    }

    /// Referenced ids without a companion file next to the document.
    pub fn missing_textures(&self, document: &BackupDocument) -> Vec<AssetId> {
        document
            .referenced_assets()
            .into_iter()
            .filter(|id| !self.has_texture(*id))
            .collect()
    }
}

impl BackupStore for BackupDir {
    fn write_document(&self, document: &BackupDocument) -> DocumentResult<()> {
        if !self.dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let text = document.to_json_pretty()?;
        std::fs::write(&self.document, text)?;
        debug!(path = %self.document.display(), "document written");
        Ok(())
    }

    fn read_document(&self) -> DocumentResult<BackupDocument> {
        let bytes = std::fs::read(&self.document)?;
        BackupDocument::from_slice(&bytes)
    }

    fn write_texture(&self, id: AssetId, data: &[u8]) -> DocumentResult<()> {
        let path = self.texture_path(id);
        std::fs::write(&path, data)?;
        debug!(path = %path.display(), bytes = data.len(), "companion image written");
        Ok(())
    }

    fn read_texture(&self, id: AssetId) -> DocumentResult<Bytes> {
        match std::fs::read(self.texture_path(id)) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DocumentError::CompanionMissing(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn has_texture(&self, id: AssetId) -> bool {
        self.texture_path(id).is_file()
    }
}

// ---------------------------------------------------------------------------
// MemoryBackup
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    document: Option<String>,
    textures: HashMap<AssetId, Bytes>,
    reject_document: bool,
    reject_textures: HashSet<AssetId>,
}

/// In-memory backup, for tests and dry runs.
///
/// Clones share the same contents. Writes can be made to fail per texture id
/// or for the document itself.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackup {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryBackup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backup already holding `document`.
    pub fn with_document(document: &BackupDocument) -> DocumentResult<Self> {
        Ok(Self::with_text(document.to_json_pretty()?))
    }

    /// A backup holding raw document text, valid or not.
    pub fn with_text(text: impl Into<String>) -> Self {
        let backup = Self::default();
        backup.inner.write().expect("lock poisoned").document = Some(text.into());
        backup
    }

    pub fn insert_texture(&self, id: AssetId, data: impl Into<Bytes>) {
        self.inner
            .write()
            .expect("lock poisoned")
            .textures
            .insert(id, data.into());
    }

    pub fn reject_document_writes(&self) {
        self.inner.write().expect("lock poisoned").reject_document = true;
    }

    pub fn reject_texture_write(&self, id: AssetId) {
        self.inner
            .write()
            .expect("lock poisoned")
            .reject_textures
            .insert(id);
    }

    /// The document text last written, if any.
    pub fn document_text(&self) -> Option<String> {
        self.inner.read().expect("lock poisoned").document.clone()
    }

    /// Ids of every stored companion image, sorted.
    pub fn texture_ids(&self) -> Vec<AssetId> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut ids: Vec<AssetId> = inner.textures.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn texture_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").textures.len()
    }
}

impl BackupStore for MemoryBackup {
    fn write_document(&self, document: &BackupDocument) -> DocumentResult<()> {
        let text = document.to_json_pretty()?;
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.reject_document {
            return Err(DocumentError::WriteRejected("document".into()));
        }
        inner.document = Some(text);
        Ok(())
    }

    fn read_document(&self) -> DocumentResult<BackupDocument> {
        let inner = self.inner.read().expect("lock poisoned");
        let text = inner.document.as_deref().ok_or_else(|| {
            DocumentError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no document written",
            ))
        })?;
        BackupDocument::parse(text)
    }

    fn write_texture(&self, id: AssetId, data: &[u8]) -> DocumentResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.reject_textures.contains(&id) {
            return Err(DocumentError::WriteRejected(id.to_string()));
        }
        inner.textures.insert(id, Bytes::copy_from_slice(data));
        Ok(())
    }

    fn read_texture(&self, id: AssetId) -> DocumentResult<Bytes> {
        self.inner
            .read()
            .expect("lock poisoned")
            .textures
            .get(&id)
            .cloned()
            .ok_or(DocumentError::CompanionMissing(id))
    }

    fn has_texture(&self, id: AssetId) -> bool {
        self.inner
            .read()
            .expect("lock poisoned")
            .textures
            .contains_key(&id)
    }
}
