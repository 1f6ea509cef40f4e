//! Per-law structural index: chapters, articles, and their contents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One chapter of a law.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterInfo {
    /// Full chapter title, e.g. "第一章 总则".
    pub title: String,
    /// Article numbers belonging to this chapter, ascending.
    #[serde(default)]
    pub article_nums: Vec<u32>,
}

/// One article of a law.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleInfo {
    /// Chapter the article belongs to, when known.
    #[serde(default)]
    pub chapter_num: Option<u32>,
    /// Full article text.
    pub content: String,
}

/// Chapter→articles→content structure of one legal document.
///
/// Invariants: every article listed under a chapter also exists in
/// `articles`; article numbers are unique within one structure. The `repair`
/// pass re-establishes the chapter listings from the article records, which
/// makes loading tolerant of partially-written files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LawStructure {
    /// The law's name, e.g. "中华人民共和国传染病防治法".
    pub law_name: String,
    /// Source document identifier.
    pub source: String,
    /// Chapters keyed by chapter number.
    #[serde(default)]
    pub chapters: BTreeMap<u32, ChapterInfo>,
    /// Articles keyed by article number.
    #[serde(default)]
    pub articles: BTreeMap<u32, ArticleInfo>,
}

impl LawStructure {
    /// Ensure every article's chapter lists it, and keep listings sorted.
    pub fn repair(&mut self) {
        for (art_num, article) in &self.articles {
            if let Some(ch) = article.chapter_num {
                let entry = self.chapters.entry(ch).or_insert_with(|| ChapterInfo {
                    title: format!("第{ch}章"),
                    article_nums: Vec::new(),
                });
                if !entry.article_nums.contains(art_num) {
                    entry.article_nums.push(*art_num);
                }
            }
        }
        for chapter in self.chapters.values_mut() {
            chapter.article_nums.sort_unstable();
            chapter.article_nums.dedup();
        }
    }

    /// Total number of indexed articles.
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_backfills_chapter_listing() {
        let mut s = LawStructure {
            law_name: "测试法".into(),
            source: "test.txt".into(),
            ..Default::default()
        };
        s.articles.insert(
            3,
            ArticleInfo { chapter_num: Some(1), content: "第三条 内容".into() },
        );
        s.articles.insert(
            1,
            ArticleInfo { chapter_num: Some(1), content: "第一条 内容".into() },
        );
        s.repair();
        assert_eq!(s.chapters[&1].article_nums, vec![1, 3]);
    }

    #[test]
    fn repair_is_idempotent() {
        let mut s = LawStructure::default();
        s.articles.insert(2, ArticleInfo { chapter_num: Some(4), content: "x".into() });
        s.repair();
        s.repair();
        assert_eq!(s.chapters[&4].article_nums, vec![2]);
    }
}
