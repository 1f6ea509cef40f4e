//! One JSON file per recognized law, under `law_structure/` in the index
//! root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use lexrag_core::constants::LAW_STRUCTURE_DIR;
use lexrag_core::errors::StructureError;
use lexrag_core::models::LawStructure;

pub struct StructureStore {
    dir: PathBuf,
}

impl StructureStore {
    /// Store rooted under the index directory.
    pub fn new(index_root: &Path) -> Self {
        Self { dir: index_root.join(LAW_STRUCTURE_DIR) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, law_name: &str) -> PathBuf {
        // Law names are used as file names; strip path separators defensively.
        let safe: String = law_name.chars().filter(|c| !matches!(c, '/' | '\\')).collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Persist one law's structure (overwrites an earlier version of the
    /// same law).
    pub fn save(&self, structure: &LawStructure) -> Result<(), StructureError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.file_path(&structure.law_name);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(structure)?)?;
        fs::rename(&tmp, &path)?;
        debug!(law = %structure.law_name, articles = structure.article_count(), "law structure saved");
        Ok(())
    }

    /// Load every persisted structure, repairing chapter listings on the
    /// way in. Unreadable files are logged and skipped.
    pub fn load_all(&self) -> Vec<LawStructure> {
        let mut structures = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return structures,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).map_err(StructureError::from).and_then(|raw| {
                serde_json::from_slice::<LawStructure>(&raw).map_err(StructureError::from)
            }) {
                Ok(mut structure) => {
                    structure.repair();
                    structures.push(structure);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable law structure"),
            }
        }
        structures.sort_by(|a, b| a.law_name.cmp(&b.law_name));
        structures
    }

    /// Remove one law's structure file; missing is fine.
    pub fn remove(&self, law_name: &str) -> Result<(), StructureError> {
        match fs::remove_file(self.file_path(law_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
