//! Token-budget enforcement and sibling reassembly.
//!
//! `enforce_token_limit` re-splits any over-budget chunk by sentence, then
//! clause, then whitespace, using an explicit worklist so recursion depth is
//! bounded by construction. Fragments are lossless: concatenating all
//! siblings of one `parent_id` in `chunk_index` order reproduces the
//! original text exactly, which is why requested overlap is not applied to
//! the fragment boundaries.

use lexrag_core::chunk::{hash_text, Chunk};
use tracing::debug;

use crate::generic::{is_clause_end, is_sentence_end, split_after, split_after_whitespace};
use crate::tokens::TokenCounter;

/// Split levels, tried in order. `Whitespace` is the last resort; a piece
/// that still exceeds the budget afterwards is emitted as-is and flagged.
const SENTENCE: u8 = 0;
const CLAUSE: u8 = 1;
const WHITESPACE: u8 = 2;
const EXHAUSTED: u8 = 3;

fn partition(piece: &str, level: u8) -> Vec<String> {
    match level {
        SENTENCE => split_after(piece, is_sentence_end),
        CLAUSE => split_after(piece, is_clause_end),
        _ => split_after_whitespace(piece),
    }
}

/// Break `text` into in-order fragments of at most `max_tokens` each, where
/// possible. Returns `(fragments, over_budget_flags)`.
fn split_to_budget(
    text: &str,
    max_tokens: usize,
    counter: &TokenCounter,
) -> (Vec<String>, Vec<bool>) {
    // Explicit worklist: children are pushed in reverse so pops preserve
    // document order.
    let mut stack: Vec<(String, u8)> = vec![(text.to_string(), SENTENCE)];
    let mut pieces: Vec<(String, bool)> = Vec::new();

    while let Some((piece, level)) = stack.pop() {
        if counter.count(&piece) <= max_tokens {
            pieces.push((piece, false));
            continue;
        }
        if level >= EXHAUSTED {
            pieces.push((piece, true));
            continue;
        }
        let parts = partition(&piece, level);
        if parts.len() <= 1 {
            // This level found no boundary; try the next one on the same
            // piece.
            stack.push((piece, level + 1));
            continue;
        }
        for part in parts.into_iter().rev() {
            stack.push((part, level + 1));
        }
    }

    // Merge undersized neighbors back together so fragments stay close to
    // the budget instead of degenerating into clause confetti.
    let mut merged: Vec<(String, bool)> = Vec::new();
    for (piece, over) in pieces {
        let can_merge = match merged.last() {
            Some((last, last_over)) => {
                !last_over && !over && counter.count(last) + counter.count(&piece) <= max_tokens
            }
            None => false,
        };
        if can_merge {
            merged.last_mut().expect("checked non-empty").0.push_str(&piece);
        } else {
            merged.push((piece, over));
        }
    }

    let flags = merged.iter().map(|(_, over)| *over).collect();
    (merged.into_iter().map(|(p, _)| p).collect(), flags)
}

/// Enforce the token budget on one chunk.
///
/// Within budget, the chunk passes through untouched. Over budget, it is
/// re-split into sibling fragments sharing one `parent_id` (the content
/// hash of the original text) with `chunk_index`/`total_chunks` set for
/// lossless reassembly. A chunk that cannot be split at all is emitted
/// as-is with `over_budget` set rather than silently truncated.
///
/// `overlap` is accepted for interface stability but fragments never
/// overlap: reassembly must reproduce the original text exactly.
pub fn enforce_token_limit(
    chunk: &Chunk,
    max_tokens: usize,
    _overlap: usize,
    counter: &TokenCounter,
) -> Vec<Chunk> {
    let tokens = counter.count(&chunk.text);
    if tokens <= max_tokens {
        let mut out = chunk.clone();
        out.is_split = false;
        return vec![out];
    }

    let (fragments, flags) = split_to_budget(&chunk.text, max_tokens, counter);
    debug!(
        source = %chunk.source,
        tokens,
        max_tokens,
        fragments = fragments.len(),
        "re-split over-budget chunk"
    );

    if fragments.len() == 1 {
        let mut out = chunk.clone();
        out.over_budget = true;
        out.is_split = false;
        return vec![out];
    }

    let parent_id = hash_text(&chunk.text);
    let total = fragments.len();
    fragments
        .into_iter()
        .zip(flags)
        .enumerate()
        .map(|(i, (text, over))| {
            let mut frag = chunk.clone();
            frag.text = text;
            frag.parent_id = Some(parent_id.clone());
            frag.chunk_index = i;
            frag.total_chunks = total;
            frag.is_split = true;
            frag.over_budget = over;
            frag
        })
        .collect()
}

/// Break a raw text into provider-sized sub-texts (used by the embedding
/// engine before batching). Unlike [`enforce_token_limit`], a piece that no
/// boundary can shrink is char-sliced as a final fallback, because the
/// provider would reject it outright.
pub fn split_text_by_token_limit(
    text: &str,
    max_tokens: usize,
    counter: &TokenCounter,
) -> Vec<String> {
    if counter.count(text) <= max_tokens {
        return vec![text.to_string()];
    }
    let (fragments, flags) = split_to_budget(text, max_tokens, counter);
    let mut out = Vec::with_capacity(fragments.len());
    for (frag, over) in fragments.into_iter().zip(flags) {
        if !over {
            out.push(frag);
            continue;
        }
        out.extend(slice_by_chars(&frag, max_tokens, counter));
    }
    out
}

/// Char-window slicing for text with no usable boundaries (one long CJK
/// run, base64 blobs). Window size is derived from the piece's own
/// chars-per-token ratio with 10% headroom.
fn slice_by_chars(piece: &str, max_tokens: usize, counter: &TokenCounter) -> Vec<String> {
    let chars: Vec<char> = piece.chars().collect();
    let tokens = counter.count(piece).max(1);
    let ratio = chars.len() as f64 / tokens as f64;
    let window = ((max_tokens as f64 * ratio * 0.9) as usize).max(1);
    chars
        .chunks(window)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Reassemble split fragments: group by `parent_id`, concatenate text in
/// `chunk_index` order, one chunk per group. Standalone chunks pass through.
/// Output order follows each group's first appearance.
pub fn merge_sibling_chunks(chunks: &[Chunk]) -> Vec<Chunk> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<&Chunk>> =
        std::collections::HashMap::new();
    let mut out: Vec<Chunk> = Vec::new();
    // First pass: remember group order, pass standalone chunks through at
    // their original position using a placeholder scheme.
    let mut slots: Vec<Option<Chunk>> = Vec::new();
    for chunk in chunks {
        match &chunk.parent_id {
            None => slots.push(Some(chunk.clone())),
            Some(pid) => {
                if !groups.contains_key(pid) {
                    order.push(pid.clone());
                    slots.push(None); // group placeholder at first appearance
                }
                groups.entry(pid.clone()).or_default().push(chunk);
            }
        }
    }

    let mut merged_iter = order.into_iter().map(|pid| {
        let mut siblings = groups.remove(&pid).unwrap_or_default();
        siblings.sort_by_key(|c| c.chunk_index);
        let text: String = siblings.iter().map(|c| c.text.as_str()).collect();
        let mut merged = siblings[0].clone();
        merged.text = text;
        merged.parent_id = None;
        merged.is_split = false;
        merged.chunk_index = 0;
        merged.total_chunks = 1;
        merged.score = siblings
            .iter()
            .filter_map(|c| c.score)
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));
        merged.exact_match = siblings.iter().any(|c| c.exact_match);
        merged
    });

    for slot in slots {
        match slot {
            Some(chunk) => out.push(chunk),
            None => {
                if let Some(merged) = merged_iter.next() {
                    out.push(merged);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::chunk::ContentType;

    fn counter() -> TokenCounter {
        TokenCounter::Heuristic
    }

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, "t.txt", ContentType::Generic)
    }

    #[test]
    fn within_budget_passes_through() {
        let c = chunk("短文本。");
        let out = enforce_token_limit(&c, 100, 0, &counter());
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_split);
        assert!(out[0].parent_id.is_none());
    }

    #[test]
    fn over_budget_splits_and_roundtrips() {
        let text = "第一句话在这里。第二句话也在这里。第三句话结束了。".repeat(8);
        let c = chunk(&text);
        let out = enforce_token_limit(&c, 30, 0, &counter());
        assert!(out.len() > 1);
        for frag in &out {
            assert!(counter().count(&frag.text) <= 30, "fragment over budget");
            assert!(frag.is_split);
        }
        // Round-trip law: reassembly reproduces the original exactly.
        let rebuilt: String = out.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn fragments_share_parent_and_indices() {
        let text = "甲句。".repeat(40);
        let out = enforce_token_limit(&chunk(&text), 20, 0, &counter());
        let pid = out[0].parent_id.clone().unwrap();
        for (i, frag) in out.iter().enumerate() {
            assert_eq!(frag.parent_id.as_deref(), Some(pid.as_str()));
            assert_eq!(frag.chunk_index, i);
            assert_eq!(frag.total_chunks, out.len());
        }
    }

    #[test]
    fn unsplittable_chunk_is_flagged_not_truncated() {
        // One long CJK run with no punctuation or whitespace.
        let text = "字".repeat(64);
        let out = enforce_token_limit(&chunk(&text), 10, 0, &counter());
        assert_eq!(out.len(), 1);
        assert!(out[0].over_budget);
        assert_eq!(out[0].text, text);
    }

    #[test]
    fn merge_reassembles_in_index_order() {
        let text = "一句。".repeat(30);
        let frags = enforce_token_limit(&chunk(&text), 15, 0, &counter());
        // Shuffle: feed fragments in reverse.
        let reversed: Vec<Chunk> = frags.iter().rev().cloned().collect();
        let merged = merge_sibling_chunks(&reversed);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, text);
        assert!(!merged[0].is_split);
    }

    #[test]
    fn merge_passes_standalone_through() {
        let a = chunk("独立块");
        let merged = merge_sibling_chunks(&[a.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "独立块");
    }

    #[test]
    fn merge_keeps_best_score_and_exact_flag() {
        let text = "一句。".repeat(30);
        let mut frags = enforce_token_limit(&chunk(&text), 15, 0, &counter());
        frags[0].score = Some(0.3);
        frags[1].score = Some(0.9);
        frags[1].exact_match = true;
        let merged = merge_sibling_chunks(&frags);
        assert_eq!(merged[0].score, Some(0.9));
        assert!(merged[0].exact_match);
    }

    #[test]
    fn embedding_split_char_slices_last_resort() {
        let text = "字".repeat(100);
        let parts = split_text_by_token_limit(&text, 10, &counter());
        assert!(parts.len() > 1);
        let rebuilt: String = parts.concat();
        assert_eq!(rebuilt, text);
        for p in &parts {
            assert!(counter().count(p) <= 10);
        }
    }

    #[test]
    fn embedding_split_short_text_untouched() {
        let parts = split_text_by_token_limit("短。", 100, &counter());
        assert_eq!(parts, vec!["短。".to_string()]);
    }
}
