//! Per-installation ingestion hash ledger.
//!
//! One JSON file mapping each collection to the content hashes of files
//! already ingested into it. Append-only during normal ingestion; a forced
//! full rebuild replaces a collection's set wholesale.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use lexrag_core::constants::HASH_LEDGER_FILE;
use lexrag_core::errors::IndexError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HashLedger {
    #[serde(flatten)]
    collections: BTreeMap<String, BTreeSet<String>>,
}

impl HashLedger {
    pub fn path(root: &Path) -> PathBuf {
        root.join(HASH_LEDGER_FILE)
    }

    /// Load the ledger, treating a missing or unreadable file as empty.
    pub fn load(root: &Path) -> Self {
        let path = Self::path(root);
        match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "hash ledger unreadable, starting empty");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist via temp file + rename.
    pub fn save(&self, root: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(root)?;
        let path = Self::path(root);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn contains(&self, collection: &str, hash: &str) -> bool {
        self.collections.get(collection).is_some_and(|set| set.contains(hash))
    }

    /// Record a file's hash for the collection. Returns whether it was new.
    pub fn record(&mut self, collection: &str, hash: String) -> bool {
        self.collections.entry(collection.to_string()).or_default().insert(hash)
    }

    /// Forced full rebuild: drop everything recorded for the collection.
    pub fn clear_collection(&mut self, collection: &str) {
        self.collections.remove(collection);
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeSet::len)
    }
}
