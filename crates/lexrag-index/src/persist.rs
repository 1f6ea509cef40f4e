//! On-disk format: one file pair per collection.
//!
//! `{name}.vec` holds the vector arena as little-endian f32s behind a
//! `[dim: u32][count: u32]` header; `{name}.meta.json` holds the chunk
//! metadata. Writes go through a temp file + rename so observers only ever
//! see complete artifacts; a missing or unreadable pair loads as absent.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use lexrag_core::chunk::Chunk;
use lexrag_core::constants::{INDEX_META_SUFFIX, INDEX_VECTOR_EXT};
use lexrag_core::errors::IndexError;

use crate::store::VectorIndex;

pub fn vector_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.{INDEX_VECTOR_EXT}"))
}

pub fn meta_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}{INDEX_META_SUFFIX}"))
}

/// Persist the index pair. Idempotent: saving the same index twice leaves
/// the same bytes.
pub fn save(root: &Path, name: &str, index: &VectorIndex) -> Result<(), IndexError> {
    fs::create_dir_all(root)?;

    let mut raw = Vec::with_capacity(8 + index.vectors().len() * 4);
    raw.extend_from_slice(&(index.dim() as u32).to_le_bytes());
    raw.extend_from_slice(&(index.len() as u32).to_le_bytes());
    for value in index.vectors() {
        raw.extend_from_slice(&value.to_le_bytes());
    }
    write_atomic(&vector_path(root, name), &raw)?;

    let meta = serde_json::to_vec(&index.chunks().to_vec())?;
    write_atomic(&meta_path(root, name), &meta)?;

    debug!(name, entries = index.len(), dim = index.dim(), "index pair saved");
    Ok(())
}

/// Load the index pair. Missing artifacts are a normal absent result;
/// corrupt artifacts are logged and also treated as absent, which routes
/// the caller onto the fresh-create path.
pub fn load(root: &Path, name: &str) -> Option<VectorIndex> {
    let vec_file = vector_path(root, name);
    let meta_file = meta_path(root, name);
    if !vec_file.exists() || !meta_file.exists() {
        return None;
    }
    match try_load(&vec_file, &meta_file) {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(name, error = %e, "index pair unreadable, treating as absent");
            None
        }
    }
}

fn try_load(vec_file: &Path, meta_file: &Path) -> Result<VectorIndex, IndexError> {
    let raw = fs::read(vec_file)?;
    if raw.len() < 8 {
        return Err(IndexError::Corrupt { reason: "vector file shorter than header".into() });
    }
    let dim = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
    let count = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
    let body = &raw[8..];
    if body.len() != dim * count * 4 {
        return Err(IndexError::Corrupt {
            reason: format!("vector body holds {} bytes, expected {}", body.len(), dim * count * 4),
        });
    }
    let vectors: Vec<f32> = body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let chunks: Vec<Chunk> = serde_json::from_slice(&fs::read(meta_file)?)?;
    VectorIndex::from_parts(dim, chunks, vectors)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Remove a collection's index pair; missing files are fine.
pub fn remove(root: &Path, name: &str) -> Result<(), IndexError> {
    for path in [vector_path(root, name), meta_path(root, name)] {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
