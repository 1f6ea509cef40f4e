//! Property tests for token-limit enforcement: every fragment fits the
//! budget (or is explicitly flagged), and reassembling the fragments in
//! index order reproduces the original text byte-for-byte.

use proptest::prelude::*;

use lexrag_chunk::{enforce_token_limit, merge_sibling_chunks, TokenCounter};
use lexrag_core::chunk::{Chunk, ContentType};

/// Text made of CJK runs, ASCII words, punctuation, and whitespace,
/// enough variety to hit the sentence, clause, and whitespace fallbacks.
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            "[\u{4e00}-\u{4eff}]{1,12}",
            "[a-z]{1,8}",
            Just("。".to_string()),
            Just("，".to_string()),
            Just("！".to_string()),
            Just(" ".to_string()),
            Just("\n".to_string()),
        ],
        1..60,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fragments_fit_budget_or_are_flagged(text in arb_text(), max_tokens in 4usize..64) {
        let counter = TokenCounter::Heuristic;
        let chunk = Chunk::new(text, "prop.txt", ContentType::Generic);
        let fragments = enforce_token_limit(&chunk, max_tokens, 0, &counter);
        for frag in &fragments {
            prop_assert!(
                counter.count(&frag.text) <= max_tokens || frag.over_budget,
                "unflagged fragment over budget"
            );
        }
    }

    #[test]
    fn reassembly_reproduces_original(text in arb_text(), max_tokens in 4usize..64) {
        let counter = TokenCounter::Heuristic;
        let chunk = Chunk::new(text.clone(), "prop.txt", ContentType::Generic);
        let fragments = enforce_token_limit(&chunk, max_tokens, 0, &counter);
        let rebuilt: String = fragments.iter().map(|c| c.text.as_str()).collect();
        prop_assert_eq!(&rebuilt, &text);

        // And the public merge operation agrees.
        let merged = merge_sibling_chunks(&fragments);
        prop_assert_eq!(merged.len(), 1);
        prop_assert_eq!(&merged[0].text, &text);
    }

    #[test]
    fn indices_are_dense_and_total_consistent(text in arb_text(), max_tokens in 4usize..32) {
        let counter = TokenCounter::Heuristic;
        let chunk = Chunk::new(text, "prop.txt", ContentType::Generic);
        let fragments = enforce_token_limit(&chunk, max_tokens, 0, &counter);
        for (i, frag) in fragments.iter().enumerate() {
            prop_assert_eq!(frag.chunk_index, i);
            prop_assert_eq!(frag.total_chunks, fragments.len());
        }
    }
}
