//! The index manager: collection lifecycle and the hash ledger.
//!
//! Exclusively owns the on-disk index pairs and the ledger. Readers share
//! `IndexHandle`s and never block on ingestion except for the short merge
//! window of one batch; visibility is last-consistent-save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use lexrag_core::config::IndexConfig;
use lexrag_core::chunk::Chunk;
use lexrag_core::errors::{IndexError, RagResult};

use crate::ledger::HashLedger;
use crate::persist;
use crate::store::VectorIndex;

/// Shared handle to one collection's in-memory index.
pub type IndexHandle = Arc<RwLock<VectorIndex>>;

pub struct IndexManager {
    root: PathBuf,
    batch_size: usize,
    ledger: Mutex<HashLedger>,
    handles: Mutex<HashMap<String, IndexHandle>>,
}

impl IndexManager {
    pub fn new(cfg: &IndexConfig) -> RagResult<Self> {
        std::fs::create_dir_all(&cfg.root_dir).map_err(IndexError::from)?;
        let ledger = HashLedger::load(&cfg.root_dir);
        Ok(Self {
            root: cfg.root_dir.clone(),
            batch_size: cfg.batch_size.max(1),
            ledger: Mutex::new(ledger),
            handles: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a persisted index pair exists for the collection.
    pub fn exists(&self, name: &str) -> bool {
        persist::vector_path(&self.root, name).exists()
    }

    /// Get the collection's handle, loading the persisted pair if present
    /// or starting empty (the fresh-create path) otherwise.
    pub fn load_or_create(&self, name: &str) -> IndexHandle {
        let mut handles = self.handles.lock().expect("handles lock");
        handles
            .entry(name.to_string())
            .or_insert_with(|| {
                let index = persist::load(&self.root, name).unwrap_or_default();
                debug!(name, entries = index.len(), "collection handle opened");
                Arc::new(RwLock::new(index))
            })
            .clone()
    }

    /// Persist the collection's current in-memory state.
    pub fn save(&self, name: &str, handle: &IndexHandle) -> RagResult<()> {
        let index = handle.read().expect("index lock");
        persist::save(&self.root, name, &index)?;
        Ok(())
    }

    /// Append chunks with vectors in batches, merging each batch into the
    /// main index and saving after every merge so progress survives
    /// interruption. `keep_going(done, total)` is consulted between batches;
    /// returning false stops cleanly: everything already merged stays
    /// saved, nothing half-written remains. Returns the number of chunks
    /// actually merged and saved.
    pub fn add_documents(
        &self,
        name: &str,
        handle: &IndexHandle,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        mut keep_going: impl FnMut(usize, usize) -> bool,
    ) -> RagResult<usize> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::CountMismatch { chunks: chunks.len(), vectors: vectors.len() }.into());
        }
        let total = chunks.len();
        let mut done = 0usize;
        for (chunk_batch, vector_batch) in
            chunks.chunks(self.batch_size).zip(vectors.chunks(self.batch_size))
        {
            if !keep_going(done, total) {
                info!(name, done, total, "stopping merge early, saved batches kept");
                return Ok(done);
            }
            let mut batch_index = VectorIndex::new();
            batch_index.add(chunk_batch, vector_batch)?;
            {
                let mut index = handle.write().expect("index lock");
                index.merge(batch_index)?;
            }
            self.save(name, handle)?;
            done += chunk_batch.len();
            debug!(name, done, total, "batch merged and saved");
        }
        Ok(done)
    }

    /// Whether the file hash is already recorded for the collection.
    pub fn already_ingested(&self, collection: &str, hash: &str) -> bool {
        self.ledger.lock().expect("ledger lock").contains(collection, hash)
    }

    /// Record a file hash after its chunks have been merged and saved, and
    /// persist the ledger.
    pub fn record_ingested(&self, collection: &str, hash: String) -> RagResult<()> {
        let mut ledger = self.ledger.lock().expect("ledger lock");
        ledger.record(collection, hash);
        ledger.save(&self.root)?;
        Ok(())
    }

    /// Forced full rebuild: drop the collection's ledger entries and its
    /// persisted index pair; the in-memory handle restarts empty.
    pub fn reset_collection(&self, name: &str) -> RagResult<()> {
        let mut handles = self.handles.lock().expect("handles lock");
        let mut ledger = self.ledger.lock().expect("ledger lock");
        persist::remove(&self.root, name)?;
        ledger.clear_collection(name);
        ledger.save(&self.root)?;
        if let Some(handle) = handles.get_mut(name) {
            *handle.write().expect("index lock") = VectorIndex::new();
        }
        info!(name, "collection reset for full rebuild");
        Ok(())
    }

    /// Delete a collection: index pair, ledger entry, and handle go
    /// together under one lock so observers never see a half-removed
    /// collection.
    pub fn delete_collection(&self, name: &str) -> RagResult<()> {
        let mut handles = self.handles.lock().expect("handles lock");
        let mut ledger = self.ledger.lock().expect("ledger lock");
        persist::remove(&self.root, name)?;
        ledger.clear_collection(name);
        ledger.save(&self.root)?;
        handles.remove(name);
        info!(name, "collection deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::chunk::ContentType;

    fn manager(dir: &Path) -> IndexManager {
        IndexManager::new(&IndexConfig { root_dir: dir.to_path_buf(), batch_size: 2 }).unwrap()
    }

    fn inputs(n: usize) -> (Vec<Chunk>, Vec<Vec<f32>>) {
        let chunks = (0..n)
            .map(|i| Chunk::new(format!("chunk {i}"), "f.txt", ContentType::Generic))
            .collect();
        let vectors = (0..n).map(|i| vec![i as f32, 1.0]).collect();
        (chunks, vectors)
    }

    #[test]
    fn load_or_create_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let handle = mgr.load_or_create("kb");
        assert!(handle.read().unwrap().is_empty());
    }

    #[test]
    fn add_documents_persists_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let handle = mgr.load_or_create("kb");
        let (chunks, vectors) = inputs(5);
        let merged = mgr.add_documents("kb", &handle, &chunks, &vectors, |_, _| true).unwrap();
        assert_eq!(merged, 5);

        // A fresh manager sees the persisted state.
        let mgr2 = manager(dir.path());
        let handle2 = mgr2.load_or_create("kb");
        assert_eq!(handle2.read().unwrap().len(), 5);
    }

    #[test]
    fn cancel_between_batches_keeps_saved_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let handle = mgr.load_or_create("kb");
        let (chunks, vectors) = inputs(6);
        // Allow the first two batches (2 chunks each), then stop.
        let merged = mgr
            .add_documents("kb", &handle, &chunks, &vectors, |done, _| done < 4)
            .unwrap();
        assert_eq!(merged, 4);

        let mgr2 = manager(dir.path());
        let handle2 = mgr2.load_or_create("kb");
        assert_eq!(handle2.read().unwrap().len(), 4);
    }

    #[test]
    fn ledger_skip_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        assert!(!mgr.already_ingested("kb", "h1"));
        mgr.record_ingested("kb", "h1".into()).unwrap();
        assert!(mgr.already_ingested("kb", "h1"));

        // Persisted across managers.
        let mgr2 = manager(dir.path());
        assert!(mgr2.already_ingested("kb", "h1"));
    }

    #[test]
    fn delete_collection_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let handle = mgr.load_or_create("kb");
        let (chunks, vectors) = inputs(2);
        mgr.add_documents("kb", &handle, &chunks, &vectors, |_, _| true).unwrap();
        mgr.record_ingested("kb", "h1".into()).unwrap();

        mgr.delete_collection("kb").unwrap();
        assert!(!mgr.exists("kb"));
        assert!(!mgr.already_ingested("kb", "h1"));
        assert!(mgr.load_or_create("kb").read().unwrap().is_empty());
    }

    #[test]
    fn reset_collection_clears_state_but_keeps_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let handle = mgr.load_or_create("kb");
        let (chunks, vectors) = inputs(3);
        mgr.add_documents("kb", &handle, &chunks, &vectors, |_, _| true).unwrap();
        mgr.record_ingested("kb", "h1".into()).unwrap();

        mgr.reset_collection("kb").unwrap();
        assert!(handle.read().unwrap().is_empty());
        assert!(!mgr.already_ingested("kb", "h1"));
    }
}
