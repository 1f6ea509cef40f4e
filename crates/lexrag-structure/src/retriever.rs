//! Exact structural retrieval over loaded law structures.
//!
//! Lookups are independent of vector similarity: a chapter query returns a
//! synthesized chapter overview (scored below the substantive text) plus
//! every article of the chapter in numeric order; an article query returns
//! that article's full content. Law-name matching is strict substring
//! matching; an unmatched law name yields zero results rather than
//! falling through to unrelated laws.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use lexrag_core::chunk::{Chunk, ContentType};
use lexrag_core::models::{LawStructure, QueryInfo};

/// Score given to synthesized overview chunks, deliberately below article
/// content so ranking surfaces substantive text first.
const OVERVIEW_SCORE: f32 = 0.5;
/// Score given to article content returned by structural lookup.
const ARTICLE_SCORE: f32 = 0.95;
/// Default score for structural results that carry none.
const DEFAULT_SCORE: f32 = 0.9;

static LAW_NAME_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\x{4e00}-\x{9fa5}《》、]{4,}法)").expect("static regex"));

pub struct StructureRetriever {
    laws: Vec<LawStructure>,
}

impl StructureRetriever {
    pub fn new(laws: Vec<LawStructure>) -> Self {
        Self { laws }
    }

    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
    }

    pub fn law_names(&self) -> impl Iterator<Item = &str> {
        self.laws.iter().map(|l| l.law_name.as_str())
    }

    /// Laws whose name contains `name` as a substring. An empty `name`
    /// matches every law.
    fn matching_laws<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LawStructure> {
        self.laws.iter().filter(move |law| law.law_name.contains(name))
    }

    /// Fuzzy law-name lookup: one synthesized overview chunk per matched
    /// law, listing its chapters.
    pub fn retrieve_by_law_name(&self, name: &str) -> Vec<Chunk> {
        let mut out = Vec::new();
        for law in self.matching_laws(name) {
            let chapters: Vec<String> = law
                .chapters
                .iter()
                .map(|(num, info)| format!("{num}. {}", info.title))
                .collect();
            let mut chunk = Chunk::new(
                format!("《{}》包含以下章节:\n{}", law.law_name, chapters.join("\n")),
                law.source.clone(),
                ContentType::LawOverview,
            );
            chunk.law_name = Some(law.law_name.clone());
            chunk.score = Some(DEFAULT_SCORE);
            out.push(chunk);
        }
        out
    }

    /// All articles of one chapter, preceded by a chapter-overview chunk.
    /// An empty `law_name` searches every law.
    pub fn retrieve_by_chapter(&self, law_name: &str, chapter_num: u32) -> Vec<Chunk> {
        let mut out = Vec::new();
        for law in self.matching_laws(law_name) {
            let Some(chapter) = law.chapters.get(&chapter_num) else { continue };
            if chapter.article_nums.is_empty() {
                continue;
            }

            let listing: Vec<String> =
                chapter.article_nums.iter().map(|n| format!("第{n}条")).collect();
            let mut overview = Chunk::new(
                format!(
                    "《{}》{}包含以下条款:\n{}",
                    law.law_name,
                    chapter.title,
                    listing.join("、")
                ),
                law.source.clone(),
                ContentType::ChapterOverview,
            );
            overview.law_name = Some(law.law_name.clone());
            overview.chapter_num = Some(chapter_num);
            overview.chapter_title = Some(chapter.title.clone());
            overview.score = Some(OVERVIEW_SCORE);
            out.push(overview);

            for article_num in &chapter.article_nums {
                let Some(article) = law.articles.get(article_num) else { continue };
                let mut chunk =
                    Chunk::new(article.content.clone(), law.source.clone(), ContentType::ArticleContent);
                chunk.law_name = Some(law.law_name.clone());
                chunk.chapter_num = Some(chapter_num);
                chunk.chapter_title = Some(chapter.title.clone());
                chunk.article_num = Some(*article_num);
                chunk.score = Some(ARTICLE_SCORE);
                out.push(chunk);
            }
        }
        out
    }

    /// Exact single-article lookup. An empty `law_name` searches every law.
    pub fn retrieve_by_article(&self, law_name: &str, article_num: u32) -> Vec<Chunk> {
        let mut out = Vec::new();
        for law in self.matching_laws(law_name) {
            let Some(article) = law.articles.get(&article_num) else { continue };
            let mut chunk =
                Chunk::new(article.content.clone(), law.source.clone(), ContentType::ArticleContent);
            chunk.law_name = Some(law.law_name.clone());
            chunk.chapter_num = article.chapter_num;
            chunk.article_num = Some(article_num);
            chunk.score = Some(ARTICLE_SCORE);
            out.push(chunk);
        }
        out
    }

    /// Route a parsed query to the structural lookups.
    ///
    /// With law names present, matching is strict: unmatched names yield
    /// zero results. Without law names, chapter/article references are
    /// resolved across all indexed laws.
    pub fn retrieve_by_query(&self, info: &QueryInfo) -> Vec<Chunk> {
        let mut law_names = info.law_names.clone();
        if law_names.is_empty() {
            if let Some(caps) = LAW_NAME_IN_TEXT.captures(&info.original_query) {
                law_names.push(caps[1].to_string());
            }
        }

        let mut out = Vec::new();
        if !law_names.is_empty() {
            let matched: Vec<&LawStructure> = law_names
                .iter()
                .flat_map(|name| self.matching_laws(name))
                .collect();
            if matched.is_empty() {
                debug!(?law_names, "no indexed law matches the query's law names");
                return Vec::new();
            }
            for law in matched {
                if !info.chapter_refs.is_empty() {
                    for chapter_ref in &info.chapter_refs {
                        out.extend(self.retrieve_by_chapter(&law.law_name, chapter_ref.num));
                    }
                } else if !info.article_refs.is_empty() {
                    for article_ref in &info.article_refs {
                        out.extend(self.retrieve_by_article(&law.law_name, article_ref.num));
                    }
                } else {
                    out.extend(self.retrieve_by_law_name(&law.law_name));
                }
            }
        } else if !info.chapter_refs.is_empty() {
            for chapter_ref in &info.chapter_refs {
                out.extend(self.retrieve_by_chapter("", chapter_ref.num));
            }
        } else if !info.article_refs.is_empty() {
            for article_ref in &info.article_refs {
                out.extend(self.retrieve_by_article("", article_ref.num));
            }
        }

        for chunk in &mut out {
            if chunk.score.is_none() {
                chunk.score = Some(DEFAULT_SCORE);
            }
        }
        debug!(results = out.len(), "structural retrieval complete");
        out
    }
}
