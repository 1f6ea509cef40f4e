//! Token accounting.
//!
//! When the target embedding model has a known encoding, counts come from
//! the real tokenizer. The CJK heuristic (1 token per CJK character, a
//! quarter token per remaining character) is strictly a fallback for
//! unknown models; the two are never mixed within one counter.

use tiktoken_rs::CoreBPE;
use tracing::warn;

use lexrag_core::config::ChunkingConfig;
use lexrag_core::constants::CJK_RANGE;

/// Counts tokens either exactly (via a BPE encoding) or approximately.
pub enum TokenCounter {
    Exact(CoreBPE),
    Heuristic,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenCounter::Exact(_) => f.write_str("TokenCounter::Exact"),
            TokenCounter::Heuristic => f.write_str("TokenCounter::Heuristic"),
        }
    }
}

impl TokenCounter {
    /// Build from config. An unrecognized tokenizer name falls back to the
    /// heuristic with a warning, never an error.
    pub fn from_config(cfg: &ChunkingConfig) -> Self {
        match cfg.tokenizer.as_deref() {
            None => TokenCounter::Heuristic,
            Some("cl100k_base") => match tiktoken_rs::cl100k_base() {
                Ok(bpe) => TokenCounter::Exact(bpe),
                Err(e) => {
                    warn!(error = %e, "failed to load cl100k_base, using heuristic counts");
                    TokenCounter::Heuristic
                }
            },
            Some("o200k_base") => match tiktoken_rs::o200k_base() {
                Ok(bpe) => TokenCounter::Exact(bpe),
                Err(e) => {
                    warn!(error = %e, "failed to load o200k_base, using heuristic counts");
                    TokenCounter::Heuristic
                }
            },
            Some(other) => {
                warn!(tokenizer = other, "unknown tokenizer, using heuristic counts");
                TokenCounter::Heuristic
            }
        }
    }

    /// Token count of `text`.
    pub fn count(&self, text: &str) -> usize {
        match self {
            TokenCounter::Exact(bpe) => bpe.encode_with_special_tokens(text).len(),
            TokenCounter::Heuristic => approx_token_count(text),
        }
    }
}

/// CJK-aware approximation: each CJK character is one token, everything
/// else averages four characters per token.
pub fn approx_token_count(text: &str) -> usize {
    let (lo, hi) = CJK_RANGE;
    let mut cjk = 0usize;
    let mut other = 0usize;
    for ch in text.chars() {
        if (lo..=hi).contains(&ch) {
            cjk += 1;
        } else {
            other += 1;
        }
    }
    cjk + other / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_counts_one_each() {
        assert_eq!(approx_token_count("中华人民"), 4);
    }

    #[test]
    fn ascii_counts_quarter() {
        assert_eq!(approx_token_count("abcdefgh"), 2);
    }

    #[test]
    fn mixed_text() {
        // 2 CJK + 8 ASCII = 2 + 2.
        assert_eq!(approx_token_count("中文abcdefgh"), 4);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(approx_token_count(""), 0);
    }

    #[test]
    fn heuristic_counter_matches_free_function() {
        let counter = TokenCounter::Heuristic;
        assert_eq!(counter.count("中文abcd"), approx_token_count("中文abcd"));
    }

    #[test]
    fn default_config_uses_heuristic() {
        let counter = TokenCounter::from_config(&ChunkingConfig::default());
        assert!(matches!(counter, TokenCounter::Heuristic));
    }
}
