//! Query classification and structural-reference extraction.

use std::sync::LazyLock;

use regex::Regex;

use lexrag_chunk::chinese_numeral_to_int;
use lexrag_core::models::{NumberRef, QueryInfo};

const CN_NUM: &str = "[一二三四五六七八九十百千万]";

static LEGAL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("第{CN_NUM}+[章条款项]")).expect("static regex")
});

static ARTICLE_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^第{CN_NUM}+条$")).expect("static regex"));

static CHAPTER_LISTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "第{CN_NUM}+章有哪些条款|第{CN_NUM}+章包含(哪些|什么)条款|第{CN_NUM}+章的条款"
    ))
    .expect("static regex")
});

static QUOTED_LAW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("《([^》]+法)》").expect("static regex"));

static CHAPTER_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("第({CN_NUM}+)章")).expect("static regex"));

static ARTICLE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("第({CN_NUM}+)条")).expect("static regex"));

static YEAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}年)").expect("static regex"));

static MEETING_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(第{CN_NUM}+届.*?会议)")).expect("static regex")
});

const LEGAL_KEYWORDS: [&str; 6] = ["法律", "条例", "规定", "法规", "实施细则", "条款"];

/// Pattern-matching query classifier.
#[derive(Debug, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether the query is about legal documents at all (structural
    /// reference or legal keyword present).
    pub fn is_legal_query(&self, query: &str) -> bool {
        LEGAL_REF.is_match(query) || LEGAL_KEYWORDS.iter().any(|kw| query.contains(kw))
    }

    /// A bare single-article query, e.g. "第二条".
    pub fn is_article_query(&self, query: &str) -> bool {
        ARTICLE_ONLY.is_match(query)
    }

    /// A chapter-listing query, e.g. "第三章有哪些条款".
    pub fn is_chapter_query(&self, query: &str) -> bool {
        CHAPTER_LISTING.is_match(query)
    }

    /// Extract every structural reference from the query: bracketed law
    /// names, chapter/article numbers, year and meeting constraints.
    pub fn parse(&self, query: &str) -> QueryInfo {
        let law_names = QUOTED_LAW
            .captures_iter(query)
            .map(|c| c[1].to_string())
            .collect();
        let chapter_refs = number_refs(&CHAPTER_REF, query, "章");
        let article_refs = number_refs(&ARTICLE_REF, query, "条");
        let year_refs = YEAR_REF.captures_iter(query).map(|c| c[1].to_string()).collect();
        let meeting_refs = MEETING_REF.captures_iter(query).map(|c| c[1].to_string()).collect();
        QueryInfo {
            original_query: query.to_string(),
            law_names,
            chapter_refs,
            article_refs,
            year_refs,
            meeting_refs,
        }
    }
}

fn number_refs(re: &Regex, query: &str, unit: &str) -> Vec<NumberRef> {
    re.captures_iter(query)
        .filter_map(|c| {
            let num = chinese_numeral_to_int(&c[1]);
            if num == 0 || num > u32::MAX as u64 {
                return None;
            }
            Some(NumberRef { text: format!("第{}{unit}", &c[1]), num: num as u32 })
        })
        .collect()
}
