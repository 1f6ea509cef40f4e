//! In-memory vector index: chunk metadata plus a flat vector arena,
//! searched by cosine similarity.

use lexrag_core::chunk::Chunk;
use lexrag_core::errors::IndexError;

/// One retrieval result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// A collection's vectors and their chunk back-references.
///
/// Vectors are stored in one flat arena (`dim` floats per entry), which is
/// also the on-disk layout. The dimension is fixed by the first insert.
#[derive(Debug, Default, Clone)]
pub struct VectorIndex {
    dim: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<f32>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts. Validates that the arena length is
    /// consistent with the chunk count.
    pub fn from_parts(dim: usize, chunks: Vec<Chunk>, vectors: Vec<f32>) -> Result<Self, IndexError> {
        if dim == 0 && !chunks.is_empty() {
            return Err(IndexError::Corrupt { reason: "zero dimension with entries".into() });
        }
        if chunks.len() * dim != vectors.len() {
            return Err(IndexError::Corrupt {
                reason: format!(
                    "arena holds {} floats, expected {} ({} chunks x {} dims)",
                    vectors.len(),
                    chunks.len() * dim,
                    chunks.len(),
                    dim
                ),
            });
        }
        Ok(Self { dim, chunks, vectors })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// Append chunks with their vectors. The first append fixes the
    /// dimension; later appends must match it.
    pub fn add(&mut self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::CountMismatch { chunks: chunks.len(), vectors: vectors.len() });
        }
        if chunks.is_empty() {
            return Ok(());
        }
        let dim = vectors[0].len();
        if self.dim == 0 {
            self.dim = dim;
        }
        for v in vectors {
            if v.len() != self.dim {
                return Err(IndexError::DimensionMismatch { expected: self.dim, got: v.len() });
            }
        }
        self.chunks.extend_from_slice(chunks);
        for v in vectors {
            self.vectors.extend_from_slice(v);
        }
        Ok(())
    }

    /// Merge another index into this one (batch sub-indices during
    /// ingestion).
    pub fn merge(&mut self, other: VectorIndex) -> Result<(), IndexError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.dim == 0 {
            self.dim = other.dim;
        }
        if other.dim != self.dim {
            return Err(IndexError::DimensionMismatch { expected: self.dim, got: other.dim });
        }
        self.chunks.extend(other.chunks);
        self.vectors.extend(other.vectors);
        Ok(())
    }

    /// Top-k cosine-similarity search. Entries (or queries) with zero norm
    /// score 0.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if self.dim == 0 || query.len() != self.dim || k == 0 {
            return Vec::new();
        }
        let q_norm = norm(query);
        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let v = &self.vectors[i * self.dim..(i + 1) * self.dim];
                let score = if q_norm == 0.0 {
                    0.0
                } else {
                    let v_norm = norm(v);
                    if v_norm == 0.0 {
                        0.0
                    } else {
                        dot(query, v) / (q_norm * v_norm)
                    }
                };
                let mut chunk = chunk.clone();
                chunk.score = Some(score);
                SearchHit { chunk, score }
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
