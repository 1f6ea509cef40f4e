//! Sentence-boundary splitter for non-legal documents.
//!
//! Splits on terminal punctuation (the punctuation stays with its
//! sentence), then greedily packs sentences into blocks up to a character
//! budget. A single sentence over budget falls back to clause-level
//! (comma) splitting, then to whitespace splitting.

use lexrag_core::chunk::{Chunk, ContentType};

/// Sentence-terminal punctuation (CJK and ASCII).
pub(crate) fn is_sentence_end(ch: char) -> bool {
    matches!(
        ch,
        '。' | '！' | '？' | '!' | '?' | '；' | ';' | '.' | '﹒' | '﹔' | '﹖' | '﹗' | '．' | '…'
    )
}

/// Clause-terminal punctuation.
pub(crate) fn is_clause_end(ch: char) -> bool {
    matches!(ch, '，' | ',' | '；' | ';')
}

/// Partition `text` into pieces, breaking after every char satisfying
/// `pred`. Lossless: the concatenation of the pieces is `text`.
pub(crate) fn split_after(text: &str, pred: impl Fn(char) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if pred(ch) {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Partition after whitespace runs. Lossless.
pub(crate) fn split_after_whitespace(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            in_ws = true;
        } else if in_ws {
            // First non-whitespace after a run: break before it.
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            in_ws = false;
        }
        current.push(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Break one over-budget sentence down to clause level, then whitespace
/// level. Pieces that still exceed the budget after both fallbacks are
/// returned as-is.
fn break_down_sentence(sentence: String, budget: usize) -> Vec<String> {
    let mut out = Vec::new();
    for clause in split_after(&sentence, is_clause_end) {
        if char_len(&clause) <= budget {
            out.push(clause);
        } else {
            out.extend(split_after_whitespace(&clause));
        }
    }
    out
}

/// Greedily pack pieces into blocks of at most `budget` characters. A piece
/// larger than the budget becomes its own block.
fn pack(pieces: Vec<String>, budget: usize) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + char_len(&piece) <= budget {
            current.push_str(&piece);
        } else {
            blocks.push(std::mem::take(&mut current));
            current = piece;
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Split arbitrary text into sentence-packed generic chunks.
///
/// Empty input yields zero chunks.
pub fn split_generic(text: &str, source: &str, sentence_size: usize) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let budget = sentence_size.max(1);

    let mut units: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let mut line_units = Vec::new();
        for sentence in split_after(line, is_sentence_end) {
            if char_len(&sentence) <= budget {
                line_units.push(sentence);
            } else {
                line_units.extend(break_down_sentence(sentence, budget));
            }
        }
        // Keep a line boundary between units of different lines.
        if let Some(last) = line_units.last_mut() {
            last.push('\n');
        }
        units.extend(line_units);
    }

    let blocks = pack(units, budget);
    let total = blocks.len();
    blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let mut chunk = Chunk::new(block.trim_end().to_string(), source, ContentType::Generic);
            chunk.chunk_index = i;
            chunk.total_chunks = total;
            chunk
        })
        .collect()
}
