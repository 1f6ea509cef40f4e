//! Answer-grounding prompt assembly.
//!
//! Groups evidence by law and chapter, orders articles numerically, merges
//! duplicate-article fragments (stripping repeated citation prefixes), and
//! appends the fixed answer-formatting contract. With no evidence at all,
//! the prompt instead instructs the model to state plainly that nothing was
//! found before offering a clearly labeled guess.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use lexrag_core::chunk::Chunk;

static ARTICLE_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("第([一二三四五六七八九十百千]+)条").expect("static regex"));

static CITATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^《.*?》\\s*第[一二三四五六七八九十百千]+条[：:]\\s*").expect("static regex")
});

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new("\n+").expect("static regex"));

/// Build the grounding prompt for a question and its evidence set.
pub fn build_prompt(question: &str, docs: &[Chunk]) -> String {
    if docs.is_empty() {
        return format!(
            "### 系统指令 ###\n\
             你是一个严格遵循指令的知识库问答助手。对于以下问题，知识库中没有找到任何相关信息。\
             你必须首先明确告知用户\"未在知识库中找到相关内容\"，使用这个精确的词语。\
             然后，你可以基于你的常识提供一个可能的回答，但必须在回答前明确标注\
             \"以下是我的推测，不基于知识库内容，仅供参考:\"。\
             你必须遵循这个格式，不得省略这些提示语。\n\n\
             ### 用户问题 ###\n{question}"
        );
    }

    let merged = merge_same_articles(docs);

    // Group by law + chapter, keeping group order stable.
    let mut groups: BTreeMap<String, Vec<&Chunk>> = BTreeMap::new();
    for doc in &merged {
        let law = doc.law_name.as_deref().unwrap_or("未知法律");
        let chapter = doc.chapter_title.as_deref().unwrap_or("未分章内容");
        groups.entry(format!("{law} - {chapter}")).or_default().push(doc);
    }

    let mut sections: Vec<String> = Vec::new();
    for (group_key, mut group_docs) in groups {
        group_docs.sort_by_key(|d| d.article_num.unwrap_or(u32::MAX));
        let mut lines = vec![format!("【{group_key}】:")];
        for doc in group_docs {
            let law = doc.law_name.as_deref().unwrap_or("未知法律");
            let content = BLANK_RUNS.replace_all(doc.text.trim(), "\n");
            if let Some(num) = doc.article_num {
                lines.push(format!("{law} 第{num}条：{content}"));
            } else if let Some(caps) = ARTICLE_IN_TEXT.captures(&content) {
                lines.push(format!("{law} 第{}条：{content}", &caps[1]));
            } else {
                lines.push(content.into_owned());
            }
        }
        sections.push(lines.join("\n"));
    }

    let mut prompt = sections.join("\n\n");
    prompt.push_str(&format!("\n\n### 用户问题 ###\n{question}\n\n"));
    prompt.push_str(ANSWER_CONTRACT);
    prompt
}

/// The fixed answer-formatting contract appended to every grounded prompt.
const ANSWER_CONTRACT: &str = "### 回答要求 ###\n\
请根据上述知识库内容回答问题。你必须严格按照以下格式规范回答:\n\n\
1. 首先使用加粗文本直接给出答案:\n\
- 如果是选择题，格式为\"**答案是X**\"（其中X为正确选项字母）\n\
- 如果是问答题，格式为\"**答案：...**\"\n\n\
2. 然后换行并加粗显示\"**理由：**\"，接着简洁地解释理由\n\n\
3. 最后换行并加粗显示\"**引用法条：**\"\n\n\
4. 再换行列出相关法条，格式为\"《法律名称》**第X条**：内容\"\n\
- 如有多个法条，每个法条必须单独一行显示\n\
- 同一条法条的多个部分必须合并在一起展示，不要重复法条编号\n\
- 如果一个法条有多个分段，按照原文分段显示，但只在开始处标注一次条款号\n\
- 段落之间要有明确的换行\n\n\
注意事项：\n\
- 确保整个回答格式清晰，避免任何内容重复\n\
- 答案部分要简洁明确\n\
- 所有标题（答案、理由、引用法条）必须加粗显示\n\
- 法条中的\"第X条\"部分也要加粗显示，但仅在各条开始处显示一次\n\
- 不同部分之间必须换行分隔\n\n\
如果知识库内容不足以回答问题，请明确说明\"**知识库中未找到相关信息**\"，\
然后可以基于你的一般知识给出可能的答案，但必须明确标注\
\"**以下是我的推测，仅供参考：**\"，并按照上述格式规范排版回答。\n";

/// Merge fragments of the same article (same law + article number) into
/// one chunk, ordered by relevance, stripping repeated citation prefixes
/// and exact duplicates. Chunks without an article number pass through.
fn merge_same_articles(docs: &[Chunk]) -> Vec<Chunk> {
    let mut passthrough: Vec<Chunk> = Vec::new();
    let mut groups: BTreeMap<(String, u32), Vec<&Chunk>> = BTreeMap::new();

    for doc in docs {
        let article_num = doc.article_num.or_else(|| {
            ARTICLE_IN_TEXT
                .captures(&doc.text)
                .map(|c| lexrag_chunk::chinese_numeral_to_int(&c[1]))
                .filter(|n| *n > 0 && *n <= u32::MAX as u64)
                .map(|n| n as u32)
        });
        match article_num {
            None => passthrough.push(doc.clone()),
            Some(num) => {
                let law = doc.law_name.clone().unwrap_or_else(|| "未知法律".to_string());
                groups.entry((law, num)).or_default().push(doc);
            }
        }
    }

    let mut merged: Vec<Chunk> = Vec::new();
    for ((_, num), mut group) in groups {
        if group.len() == 1 {
            let mut only = group[0].clone();
            only.article_num = only.article_num.or(Some(num));
            merged.push(only);
            continue;
        }
        group.sort_by(|a, b| {
            b.score_or_zero().partial_cmp(&a.score_or_zero()).unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut parts: Vec<String> = Vec::new();
        for doc in &group {
            let stripped = CITATION_PREFIX.replace(doc.text.trim(), "").to_string();
            if !parts.iter().any(|p| p.contains(&stripped)) {
                parts.push(stripped);
            }
        }
        let mut combined = group[0].clone();
        combined.text = parts.join("\n\n");
        combined.article_num = combined.article_num.or(Some(num));
        merged.push(combined);
    }

    passthrough.extend(merged);
    passthrough
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::chunk::ContentType;

    fn article(law: &str, num: u32, text: &str, score: f32) -> Chunk {
        let mut c = Chunk::new(text, "law.txt", ContentType::ArticleContent);
        c.law_name = Some(law.to_string());
        c.article_num = Some(num);
        c.score = Some(score);
        c
    }

    #[test]
    fn no_evidence_prompt_demands_disclosure() {
        let p = build_prompt("问题？", &[]);
        assert!(p.contains("未在知识库中找到相关内容"));
        assert!(p.contains("以下是我的推测"));
        assert!(p.contains("问题？"));
    }

    #[test]
    fn grounded_prompt_groups_and_orders() {
        let docs = vec![
            article("甲法", 9, "第九条 后面的条款", 0.9),
            article("甲法", 2, "第二条 前面的条款", 0.8),
        ];
        let p = build_prompt("问题", &docs);
        let pos2 = p.find("第2条").unwrap();
        let pos9 = p.find("第9条").unwrap();
        assert!(pos2 < pos9, "articles must be numerically ordered");
        assert!(p.contains("【甲法 - 未分章内容】"));
        assert!(p.contains("### 回答要求 ###"));
    }

    #[test]
    fn duplicate_article_fragments_merge() {
        let docs = vec![
            article("甲法", 5, "《甲法》第五条：第一段内容", 0.9),
            article("甲法", 5, "第二段内容", 0.5),
        ];
        let p = build_prompt("问题", &docs);
        // One citation header for the article, both parts present.
        assert_eq!(p.matches("甲法 第5条：").count(), 1);
        assert!(p.contains("第一段内容"));
        assert!(p.contains("第二段内容"));
    }

    #[test]
    fn merge_keeps_standalone_chunks() {
        let mut plain = Chunk::new("没有条款号的内容", "x.txt", ContentType::Generic);
        plain.law_name = Some("甲法".into());
        let merged = merge_same_articles(&[plain]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn answer_contract_is_always_appended() {
        let docs = vec![article("甲法", 1, "第一条 内容", 1.0)];
        let p = build_prompt("问题", &docs);
        assert!(p.contains("**引用法条：**"));
        assert!(p.contains("**理由：**"));
    }
}
