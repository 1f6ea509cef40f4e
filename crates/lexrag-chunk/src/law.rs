//! Structural splitter for Chinese legal documents.
//!
//! A legal document becomes one `Header` chunk (front matter with parsed
//! adoption/revision metadata) followed by one `ArticleContent` chunk per
//! article. An article runs from its "第X条" marker until the next marker
//! with a strictly greater number; out-of-order or repeated numbers are
//! treated as citations inside the current article's body, not as new
//! articles. Chapter headings ("第X章 …") are tracked and attached to the
//! articles that follow them.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use lexrag_core::chunk::{Chunk, ContentType, HeaderMeta};

use crate::numerals::chinese_numeral_to_int;

static ARTICLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第([一二三四五六七八九十百千万零]+)条").expect("static regex"));

static ARTICLE_DETECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第[一二三四五六七八九十百千万]+条").expect("static regex"));

static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^第([一二三四五六七八九十百千万零]+)章\s*(.*)$").expect("static regex")
});

static LAW_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\x{4e00}-\x{9fa5}《》、]{4,}法)").expect("static regex"));

static PASSED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"（?(\d{4}年\d{1,2}月\d{1,2}日)[^）]*?通过").expect("static regex")
});

static REVISED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"根据(\d{4}年\d{1,2}月\d{1,2}日)[^）]*?(?:修正|修改)").expect("static regex")
});

static MEETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(第[一二三四五六七八九十]{1,3}届全国人民代表大会常务委员会[^）]*会议)")
        .expect("static regex")
});

/// Whether the text looks like a Chinese legal document (contains an
/// article marker anywhere).
pub fn detect_legal_document(text: &str) -> bool {
    ARTICLE_DETECT.is_match(text)
}

/// Parse adoption date, revision dates, and meeting references out of a
/// legal document's header block.
pub fn extract_law_metadata(text: &str) -> HeaderMeta {
    HeaderMeta {
        passed_date: PASSED_DATE.captures(text).map(|c| c[1].to_string()),
        revised_dates: REVISED_DATE
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect(),
        meetings: MEETING.captures_iter(text).map(|c| c[1].to_string()).collect(),
    }
}

/// Extract the law's name from its first characters; "未知法律" when the
/// text does not open with a recognizable title.
pub fn extract_law_title(text: &str) -> String {
    LAW_TITLE
        .captures(text.trim_start())
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "未知法律".to_string())
}

/// An accepted article marker inside the document.
struct Marker {
    /// Byte offset of the marker start.
    start: usize,
    num: u32,
}

/// Find article markers that actually open a new article.
///
/// A candidate counts only when it sits at the start of the text / a line
/// or after whitespace, and its number is strictly greater than the last
/// accepted one. Everything else ("见第五条" citations, repeated numbers)
/// stays inside the current article's body.
fn accepted_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut last_num: u64 = 0;
    for caps in ARTICLE_MARKER.captures_iter(text) {
        let m = caps.get(0).expect("full match");
        let at_boundary = m.start() == 0
            || text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        if !at_boundary {
            continue;
        }
        let num = chinese_numeral_to_int(&caps[1]);
        if num <= last_num || num > u32::MAX as u64 {
            continue;
        }
        last_num = num;
        markers.push(Marker { start: m.start(), num: num as u32 });
    }
    markers
}

/// Split a legal document into a header chunk plus one chunk per article.
///
/// Empty input yields zero chunks. A document with no recognizable article
/// markers yields zero chunks as well; the caller falls back to generic
/// chunking in that case.
pub fn split_legal_document(text: &str, source: &str) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let law_title = extract_law_title(text);
    let markers = accepted_markers(text);
    if markers.is_empty() {
        debug!(source, "no article markers found");
        return Vec::new();
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current_chapter: Option<(u32, String)> = None;

    // Header block: everything before the first accepted marker, minus
    // chapter-heading lines (which set the chapter for following articles).
    let header_region = &text[..markers[0].start];
    let mut header_lines: Vec<&str> = Vec::new();
    for line in header_region.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if let Some((num, title)) = parse_chapter_line(line.trim()) {
            current_chapter = Some((num, title));
        } else {
            header_lines.push(line);
        }
    }
    if !header_lines.is_empty() {
        let header_text = header_lines.join("\n");
        let mut header = Chunk::new(header_text.clone(), source, ContentType::Header);
        header.law_name = Some(law_title.clone());
        header.header_meta = Some(extract_law_metadata(&header_text));
        chunks.push(header);
    }

    // One chunk per accepted marker; its body runs to the next marker.
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
        let region = &text[marker.start..end];

        let article_chapter = current_chapter.clone();
        let mut body_lines: Vec<&str> = Vec::new();
        for line in region.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            if let Some((num, title)) = parse_chapter_line(line.trim()) {
                // A chapter heading inside this region belongs to the
                // articles that follow, not to this body.
                current_chapter = Some((num, title));
            } else {
                body_lines.push(line);
            }
        }

        let mut article = Chunk::new(body_lines.join("\n").trim().to_string(), source, ContentType::ArticleContent);
        article.law_name = Some(law_title.clone());
        article.article_num = Some(marker.num);
        if let Some((num, title)) = &article_chapter {
            article.chapter_num = Some(*num);
            article.chapter_title = Some(title.clone());
        }
        chunks.push(article);
    }

    let total = chunks.len();
    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = i;
        chunk.total_chunks = total;
    }
    debug!(source, articles = markers.len(), chapters = ?current_chapter, "split legal document");
    chunks
}

/// Parse a chapter heading line, returning `(chapter_num, full_title)`.
fn parse_chapter_line(line: &str) -> Option<(u32, String)> {
    let caps = CHAPTER_LINE.captures(line)?;
    let num = chinese_numeral_to_int(&caps[1]);
    if num == 0 || num > u32::MAX as u64 {
        return None;
    }
    Some((num as u32, line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LAW: &str = "中华人民共和国示例法\n\
（2001年12月29日第九届全国人民代表大会常务委员会第二十五次会议通过 根据2015年4月24日第十二届全国人民代表大会常务委员会第十四次会议《关于修改〈中华人民共和国示例法〉的决定》修正）\n\
第一章 总则\n\
第一条 为了示例目的，制定本法。\n\
第二条 本法适用于全部示例场景。\n\
依照第五十条的规定处理。\n\
第二章 管理\n\
第三条 示例管理由主管部门负责。\n";

    #[test]
    fn detects_legal_documents() {
        assert!(detect_legal_document("第一条 内容"));
        assert!(!detect_legal_document("这是一段普通文本。"));
    }

    #[test]
    fn extracts_law_title() {
        assert_eq!(extract_law_title(SAMPLE_LAW), "中华人民共和国示例法");
        assert_eq!(extract_law_title("没有标题"), "未知法律");
    }

    #[test]
    fn extracts_header_metadata() {
        let meta = extract_law_metadata(SAMPLE_LAW);
        assert_eq!(meta.passed_date.as_deref(), Some("2001年12月29日"));
        assert_eq!(meta.revised_dates, vec!["2015年4月24日"]);
        assert!(meta.meetings[0].contains("第九届"));
    }

    #[test]
    fn splits_header_and_articles() {
        let chunks = split_legal_document(SAMPLE_LAW, "sample.txt");
        assert_eq!(chunks[0].content_type, ContentType::Header);
        assert!(chunks[0].header_meta.is_some());
        let articles: Vec<_> = chunks
            .iter()
            .filter(|c| c.content_type == ContentType::ArticleContent)
            .collect();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].article_num, Some(1));
        assert_eq!(articles[1].article_num, Some(2));
        assert_eq!(articles[2].article_num, Some(3));
    }

    #[test]
    fn citation_stays_in_body() {
        let chunks = split_legal_document(SAMPLE_LAW, "sample.txt");
        let second = chunks
            .iter()
            .find(|c| c.article_num == Some(2))
            .expect("article 2");
        assert!(second.text.contains("依照第五十条的规定处理"));
    }

    #[test]
    fn chapters_attach_to_articles() {
        let chunks = split_legal_document(SAMPLE_LAW, "sample.txt");
        let first = chunks.iter().find(|c| c.article_num == Some(1)).unwrap();
        let third = chunks.iter().find(|c| c.article_num == Some(3)).unwrap();
        assert_eq!(first.chapter_num, Some(1));
        assert!(first.chapter_title.as_deref().unwrap().contains("总则"));
        assert_eq!(third.chapter_num, Some(2));
    }

    #[test]
    fn inline_markers_split_two_articles() {
        let chunks = split_legal_document("第一条 A内容 第二条 B内容", "s.txt");
        let articles: Vec<_> = chunks
            .iter()
            .filter(|c| c.content_type == ContentType::ArticleContent)
            .collect();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].article_num, Some(1));
        assert_eq!(articles[1].article_num, Some(2));
        assert!(articles[0].text.contains("A内容"));
        assert!(!articles[0].text.contains("B内容"));
        assert!(articles[1].text.contains("B内容"));
        assert!(!articles[1].text.contains("A内容"));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_legal_document("", "s.txt").is_empty());
        assert!(split_legal_document("  \n ", "s.txt").is_empty());
    }

    #[test]
    fn repeated_number_is_continuation() {
        let text = "第一条 甲。\n第一条 这行是引用，不是新条款。\n第二条 乙。";
        let chunks = split_legal_document(text, "s.txt");
        let articles: Vec<_> = chunks
            .iter()
            .filter(|c| c.content_type == ContentType::ArticleContent)
            .collect();
        assert_eq!(articles.len(), 2);
        assert!(articles[0].text.contains("这行是引用"));
    }

    #[test]
    fn no_markers_yields_empty_for_fallback() {
        assert!(split_legal_document("普通文本，没有条款。", "s.txt").is_empty());
    }
}
