//! Structured references extracted from a user query.

use serde::{Deserialize, Serialize};

/// A numbered structural reference, e.g. "第三条" → `{text: "第三条", num: 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRef {
    /// The reference as written in the query.
    pub text: String,
    /// The parsed number.
    pub num: u32,
}

/// Everything structural the classifier could extract from a query.
///
/// Empty vectors mean "no such reference found"; the retrieval orchestrator
/// routes on which of these are populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInfo {
    /// The query as the user typed it.
    pub original_query: String,
    /// Law names quoted in 《》 brackets.
    #[serde(default)]
    pub law_names: Vec<String>,
    /// Chapter references ("第X章").
    #[serde(default)]
    pub chapter_refs: Vec<NumberRef>,
    /// Article references ("第X条").
    #[serde(default)]
    pub article_refs: Vec<NumberRef>,
    /// Year constraints ("2001年").
    #[serde(default)]
    pub year_refs: Vec<String>,
    /// Meeting constraints ("第九届…会议").
    #[serde(default)]
    pub meeting_refs: Vec<String>,
}

impl QueryInfo {
    /// Whether any structural reference was extracted at all.
    pub fn has_structural_refs(&self) -> bool {
        !self.law_names.is_empty() || !self.chapter_refs.is_empty() || !self.article_refs.is_empty()
    }
}
