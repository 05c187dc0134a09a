//! Persistence of document bytes
//!
//! Stored documents are immutable: every write goes under a fresh identifier
//! and an existing identifier is never overwritten.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::document::{page_geometry, DocumentId, PageSize};
use crate::error::{Result, StampError};

/// Where documents live
pub trait DocumentStore: Send + Sync {
    /// Store bytes under `id`; fails if `id` is already taken
    fn insert(&self, id: &DocumentId, bytes: &[u8]) -> Result<()>;

    /// Read the bytes stored under `id`
    fn get(&self, id: &DocumentId) -> Result<Vec<u8>>;

    /// Store bytes under a fresh identifier
    fn put(&self, bytes: &[u8]) -> Result<DocumentId> {
        let id = DocumentId::generate();
        self.insert(&id, bytes)?;
        Ok(id)
    }

    /// Store bytes under a fresh identifier derived from a file name
    fn put_named(&self, name: &str, bytes: &[u8]) -> Result<DocumentId> {
        let id = DocumentId::derived_from(name);
        self.insert(&id, bytes)?;
        Ok(id)
    }

    /// Page sizes of a stored document
    fn geometry(&self, id: &DocumentId) -> Result<Vec<PageSize>> {
        page_geometry(&self.get(id)?)
    }
}

/// Directory-backed store, one file per document
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StampError::Storage(format!("Cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &DocumentId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

impl DocumentStore for FsStore {
    fn insert(&self, id: &DocumentId, bytes: &[u8]) -> Result<()> {
        let storage = |e: io::Error| StampError::Storage(format!("Cannot write {}: {}", id, e));

        // Temp names start with a dot, so they are never valid identifiers
        let mut part = tempfile::Builder::new()
            .prefix(".incoming-")
            .suffix(".part")
            .tempfile_in(&self.root)
            .map_err(storage)?;
        part.write_all(bytes).map_err(storage)?;
        part.as_file().sync_all().map_err(storage)?;
        part.persist_noclobber(self.path_of(id))
            .map_err(|e| storage(e.error))?;

        debug!(document_id = %id, bytes = bytes.len(), "Stored document");
        Ok(())
    }

    fn get(&self, id: &DocumentId) -> Result<Vec<u8>> {
        match fs::read(self.path_of(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StampError::NotFound(id.to_string()))
            }
            Err(e) => Err(StampError::Storage(format!("Cannot read {}: {}", id, e))),
        }
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, id: &DocumentId, bytes: &[u8]) -> Result<()> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StampError::Storage("Document map lock poisoned".into()))?;
        if documents.contains_key(id) {
            return Err(StampError::Storage(format!("Document {} already exists", id)));
        }
        documents.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, id: &DocumentId) -> Result<Vec<u8>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StampError::Storage("Document map lock poisoned".into()))?;
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| StampError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_pdf, PageSpec};
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    fn exercise_store(store: &dyn DocumentStore) {
        let pdf = build_pdf(&[PageSpec::letter("a"), PageSpec::sized(595.0, 842.0, "b")]);
        let id = store.put(&pdf).unwrap();

        assert_eq!(store.get(&id).unwrap(), pdf);
        assert_eq!(store.geometry(&id).unwrap().len(), 2);

        let named = store.put_named("contract.pdf", b"%PDF-1.7").unwrap();
        assert_ne!(named, id);
        assert!(named.as_str().ends_with("-contract.pdf"));

        let missing = DocumentId::parse("0-missing.pdf").unwrap();
        assert_eq!(store.get(&missing).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_store_contract() {
        exercise_store(&MemoryStore::new());
    }

    #[test]
    fn test_fs_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        exercise_store(&FsStore::new(dir.path()).unwrap());
    }

    #[test]
    fn test_fs_store_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("uploads");
        let store = FsStore::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_fs_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        let id = store.put(b"%PDF-1.7 bytes").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![id.to_string()]);
    }

    #[test]
    fn test_insert_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let fs_store = FsStore::new(dir.path()).unwrap();
        let memory = MemoryStore::new();
        let id = DocumentId::parse("1-fixed.pdf").unwrap();

        for store in [&fs_store as &dyn DocumentStore, &memory] {
            store.insert(&id, b"first").unwrap();
            let err = store.insert(&id, b"second").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Storage);
            assert_eq!(store.get(&id).unwrap(), b"first");
        }
    }

    #[test]
    fn test_fs_store_write_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("gone")).unwrap();
        fs::remove_dir(store.root()).unwrap();

        let err = store.put(b"%PDF-1.7").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_geometry_of_non_pdf_is_malformed() {
        let store = MemoryStore::new();
        let id = store.put(b"plain text").unwrap();
        assert_eq!(
            store.geometry(&id).unwrap_err().kind(),
            ErrorKind::MalformedDocument
        );
    }

    #[test]
    fn test_parallel_writes_stay_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let fs_store = FsStore::new(dir.path()).unwrap();
        let memory = MemoryStore::new();

        for store in [&fs_store as &dyn DocumentStore, &memory] {
            let written: Vec<(DocumentId, Vec<u8>)> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8u8)
                    .map(|n| {
                        scope.spawn(move || {
                            let bytes = vec![n; 4096];
                            (store.put(&bytes).unwrap(), bytes)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            for (id, bytes) in written {
                assert_eq!(store.get(&id).unwrap(), bytes);
            }
        }
        assert_eq!(memory.len(), 8);
    }
}
