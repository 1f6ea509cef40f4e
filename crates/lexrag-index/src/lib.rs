//! # lexrag-index
//!
//! Owns persistence and incremental update of one named vector index per
//! logical collection, plus the hash ledger that lets ingestion skip
//! already-processed files. Index artifacts are a file pair per collection:
//! a binary vector file and a JSON metadata file. Loading a missing or
//! corrupt index is a normal "absent" result, never an error.

pub mod ledger;
pub mod manager;
pub mod persist;
pub mod store;

pub use ledger::HashLedger;
pub use manager::{IndexHandle, IndexManager};
pub use store::{SearchHit, VectorIndex};
