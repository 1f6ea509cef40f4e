//! Shared constants for the lexrag pipeline.

/// File extension (without dot) of the binary vector half of an index pair.
pub const INDEX_VECTOR_EXT: &str = "vec";

/// Suffix of the JSON metadata half of an index pair.
pub const INDEX_META_SUFFIX: &str = ".meta.json";

/// File name of the per-installation ingestion hash ledger.
pub const HASH_LEDGER_FILE: &str = "hash_ledger.json";

/// Directory (under the index root) holding one JSON structure per law.
pub const LAW_STRUCTURE_DIR: &str = "law_structure";

/// Unicode range treated as CJK for token estimation.
pub const CJK_RANGE: (char, char) = ('\u{4e00}', '\u{9fff}');

/// Compose the on-disk collection name for an owner + logical name.
///
/// Keeps collections of different owners apart so they never
/// cross-contaminate.
pub fn collection_name(owner: &str, name: &str) -> String {
    format!("user_{owner}_{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_name_includes_owner() {
        assert_eq!(collection_name("42", "contracts"), "user_42_contracts");
        assert_ne!(collection_name("1", "kb"), collection_name("2", "kb"));
    }
}
