//! Build a `LawStructure` from structural-splitter output.

use tracing::debug;

use lexrag_core::chunk::{Chunk, ContentType};
use lexrag_core::models::{ArticleInfo, ChapterInfo, LawStructure};

/// Assemble the per-law structure from a document's chunks.
///
/// Returns `None` when the chunks contain no numbered articles; the
/// document then has no structural index and is served by vector search
/// only.
pub fn build_structure(chunks: &[Chunk]) -> Option<LawStructure> {
    let first = chunks.first()?;
    let mut structure = LawStructure {
        law_name: first
            .law_name
            .clone()
            .unwrap_or_else(|| "未知法律".to_string()),
        source: first.source.clone(),
        ..Default::default()
    };

    for chunk in chunks {
        if chunk.content_type != ContentType::ArticleContent {
            continue;
        }
        let Some(article_num) = chunk.article_num else { continue };
        structure.articles.insert(
            article_num,
            ArticleInfo { chapter_num: chunk.chapter_num, content: chunk.text.clone() },
        );
        if let Some(chapter_num) = chunk.chapter_num {
            let entry = structure.chapters.entry(chapter_num).or_insert_with(|| ChapterInfo {
                title: chunk
                    .chapter_title
                    .clone()
                    .unwrap_or_else(|| format!("第{chapter_num}章")),
                article_nums: Vec::new(),
            });
            if !entry.article_nums.contains(&article_num) {
                entry.article_nums.push(article_num);
            }
        }
    }

    if structure.articles.is_empty() {
        return None;
    }
    structure.repair();
    debug!(
        law = %structure.law_name,
        articles = structure.articles.len(),
        chapters = structure.chapters.len(),
        "law structure built"
    );
    Some(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(num: u32, chapter: Option<u32>, text: &str) -> Chunk {
        let mut c = Chunk::new(text, "law.txt", ContentType::ArticleContent);
        c.law_name = Some("示例法".into());
        c.article_num = Some(num);
        c.chapter_num = chapter;
        c.chapter_title = chapter.map(|n| format!("第{n}章 标题"));
        c
    }

    #[test]
    fn builds_articles_and_chapters() {
        let chunks = vec![
            article(1, Some(1), "第一条 甲"),
            article(2, Some(1), "第二条 乙"),
            article(3, Some(2), "第三条 丙"),
        ];
        let s = build_structure(&chunks).unwrap();
        assert_eq!(s.law_name, "示例法");
        assert_eq!(s.article_count(), 3);
        assert_eq!(s.chapters[&1].article_nums, vec![1, 2]);
        assert_eq!(s.chapters[&2].article_nums, vec![3]);
        assert_eq!(s.articles[&2].content, "第二条 乙");
    }

    #[test]
    fn chapterless_articles_still_index() {
        let chunks = vec![article(1, None, "第一条 甲")];
        let s = build_structure(&chunks).unwrap();
        assert_eq!(s.article_count(), 1);
        assert!(s.chapters.is_empty());
    }

    #[test]
    fn no_articles_is_none() {
        let header = Chunk::new("标题", "law.txt", ContentType::Header);
        assert!(build_structure(&[header]).is_none());
        assert!(build_structure(&[]).is_none());
    }

    #[test]
    fn from_real_splitter_output() {
        let text = "示例示范法\n第一章 总则\n第一条 甲。\n第二条 乙。\n第二章 附则\n第三条 丙。\n";
        let chunks = lexrag_chunk::split_legal_document(text, "law.txt");
        let s = build_structure(&chunks).unwrap();
        assert_eq!(s.article_count(), 3);
        assert_eq!(s.chapters[&1].article_nums, vec![1, 2]);
        assert_eq!(s.chapters[&2].article_nums, vec![3]);
    }
}
