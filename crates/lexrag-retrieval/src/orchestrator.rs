//! The hybrid retrieval orchestrator.
//!
//! Per-query state machine: classify → exact-structural and/or vector →
//! metadata filter → rerank → sibling merge → cache. Exact-structural
//! results carry a ceiling score and keep priority over vector duplicates
//! throughout reranking.

use std::sync::Arc;

use tracing::{debug, info, warn};

use lexrag_chunk::merge_sibling_chunks;
use lexrag_core::chunk::{Chunk, ContentType};
use lexrag_core::config::RetrievalConfig;
use lexrag_core::models::QueryInfo;
use lexrag_core::traits::RerankProvider;
use lexrag_embeddings::EmbeddingEngine;
use lexrag_index::IndexHandle;
use lexrag_structure::StructureRetriever;

use crate::cache::RetrievalCache;
use crate::classify::QueryClassifier;

/// Ceiling score assigned to exact structural matches.
const EXACT_SCORE: f32 = 1.0;
/// Default score for vector hits that lost theirs along the way.
const VECTOR_DEFAULT_SCORE: f32 = 0.5;
/// Score for results of the waived-threshold fallback pass.
const FALLBACK_SCORE: f32 = 0.3;

pub struct HybridRetriever {
    collection: String,
    index: IndexHandle,
    embedder: Arc<EmbeddingEngine>,
    structures: StructureRetriever,
    reranker: Option<Box<dyn RerankProvider>>,
    classifier: QueryClassifier,
    cache: RetrievalCache,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        collection: impl Into<String>,
        index: IndexHandle,
        embedder: Arc<EmbeddingEngine>,
        structures: StructureRetriever,
        reranker: Option<Box<dyn RerankProvider>>,
        config: RetrievalConfig,
    ) -> Self {
        let cache = RetrievalCache::new(&config);
        Self {
            collection: collection.into(),
            index,
            embedder,
            structures,
            reranker,
            classifier: QueryClassifier::new(),
            cache,
            config,
        }
    }

    /// Run the full retrieval pipeline for one query. Returns an ordered,
    /// deduplicated, citation-ready evidence set (possibly empty).
    pub fn retrieve(&self, query: &str) -> Vec<Chunk> {
        let cache_key = self.cache.key(query, &self.collection);
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached.as_ref().clone();
        }

        let info = self.classifier.parse(query);
        let top_k = self.config.top_k.max(1);

        // Chapter-listing queries are served whole from the structural
        // index: the overview plus every article, already ordered.
        if self.classifier.is_chapter_query(query) {
            if let Some(chapter_ref) = info.chapter_refs.first() {
                let law_name = info.law_names.first().map(String::as_str).unwrap_or("");
                let docs = self.structures.retrieve_by_chapter(law_name, chapter_ref.num);
                if !docs.is_empty() {
                    info!(query, results = docs.len(), "chapter listing served structurally");
                    self.cache.put(cache_key, docs.clone());
                    return docs;
                }
            }
        }

        let mut docs: Vec<Chunk> = Vec::new();

        // Exact path first for anything that smells legal.
        if self.classifier.is_legal_query(query) {
            docs.extend(self.exact_structural(query, &info));
            debug!(query, exact = docs.len(), "exact-structural results");
        }

        // Vector path whenever exact results are insufficient.
        if docs.len() < top_k {
            let vector_docs = self.vector_search(query, top_k, &docs);
            docs.extend(vector_docs);
        }

        // Metadata constraints: drop anything whose metadata contradicts an
        // explicit year / meeting / law-name constraint.
        docs = filter_by_metadata(docs, &info);

        // An article query wants article text, not synthesized listings.
        if !info.article_refs.is_empty() {
            docs.retain(|d| {
                !matches!(d.content_type, ContentType::LawOverview | ContentType::ChapterOverview)
            });
        }

        docs = self.rerank_and_truncate(query, docs, top_k);

        // Waived-threshold fallback: never return nothing when the index
        // has anything vector-similar at all.
        if docs.is_empty() {
            docs = self.fallback_vector(query, top_k);
        }

        docs = merge_sibling_chunks(&docs);

        self.cache.put(cache_key, docs.clone());
        info!(query, results = docs.len(), "retrieval complete");
        docs
    }

    /// Build the answer-grounding prompt for a query and its evidence.
    pub fn build_prompt(&self, question: &str, docs: &[Chunk]) -> String {
        crate::prompt::build_prompt(question, docs)
    }

    /// Exact structural lookup with the vector-assisted expansion for bare
    /// article queries.
    fn exact_structural(&self, query: &str, info: &QueryInfo) -> Vec<Chunk> {
        let mut docs = self.structures.retrieve_by_query(info);

        // A query naming an article wants the article bodies only.
        if !info.article_refs.is_empty() {
            docs.retain(|d| d.content_type == ContentType::ArticleContent);
        }
        for doc in &mut docs {
            doc.exact_match = true;
            doc.score = Some(EXACT_SCORE);
        }
        if !docs.is_empty() {
            return docs;
        }

        // Bare article query with no structural hit: expand with the
        // configured default law (never a hardcoded one) and verify the
        // marker text appears in the retrieved content.
        if self.classifier.is_article_query(query) {
            if let Some(article_ref) = info.article_refs.first() {
                let mut expansions: Vec<String> = Vec::new();
                if !info.law_names.is_empty() {
                    expansions.extend(info.law_names.iter().map(|n| format!("{n}{query}")));
                } else if let Some(default_law) = &self.config.default_law {
                    expansions.push(format!("{default_law}{query}"));
                }
                for expanded in expansions {
                    debug!(%expanded, "trying expanded article query");
                    let hits = self.vector_search(&expanded, self.config.top_k.max(1) * 4, &[]);
                    let mut confirmed: Vec<Chunk> = hits
                        .into_iter()
                        .filter(|d| d.text.contains(&article_ref.text))
                        .collect();
                    if !confirmed.is_empty() {
                        for doc in &mut confirmed {
                            doc.exact_match = true;
                            doc.score = Some(EXACT_SCORE);
                        }
                        return confirmed;
                    }
                }
            }
        }
        Vec::new()
    }

    /// Vector-similarity search, deduplicated against already-collected
    /// text.
    fn vector_search(&self, query: &str, k: usize, existing: &[Chunk]) -> Vec<Chunk> {
        let query_vec = self.embedder.embed_one(query);
        let index = match self.index.read() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "index lock poisoned, skipping vector search");
                return Vec::new();
            }
        };
        let hits = index.search(&query_vec, k);
        drop(index);

        let seen: std::collections::HashSet<&str> =
            existing.iter().map(|d| d.text.as_str()).collect();
        hits.into_iter()
            .map(|h| h.chunk)
            .filter(|c| !seen.contains(c.text.as_str()))
            .map(|mut c| {
                if c.score.is_none() {
                    c.score = Some(VECTOR_DEFAULT_SCORE);
                }
                c
            })
            .collect()
    }

    /// Rerank (when configured), sort descending, truncate to top-k, apply
    /// the relevance threshold, waiving it when that would empty the set.
    fn rerank_and_truncate(&self, query: &str, mut docs: Vec<Chunk>, top_k: usize) -> Vec<Chunk> {
        if docs.is_empty() {
            return docs;
        }

        if let Some(reranker) = &self.reranker {
            let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
            match reranker.rerank(query, &texts) {
                Ok(scores) if scores.len() == docs.len() => {
                    for (doc, score) in docs.iter_mut().zip(scores) {
                        if doc.exact_match {
                            // Exact matches keep their ceiling; reranking
                            // never demotes them below it.
                            doc.score = Some(score.max(doc.score_or_zero()));
                        } else {
                            doc.score = Some(score);
                        }
                    }
                }
                Ok(scores) => {
                    warn!(expected = docs.len(), got = scores.len(), "reranker count mismatch, keeping prior scores");
                }
                Err(e) => {
                    warn!(error = %e, "reranker failed, keeping prior scores");
                }
            }
        }

        docs.sort_by(|a, b| {
            b.score_or_zero()
                .partial_cmp(&a.score_or_zero())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        docs.truncate(top_k);

        let threshold = self.config.score_threshold;
        if threshold > 0.0 {
            let kept: Vec<Chunk> =
                docs.iter().filter(|d| d.score_or_zero() >= threshold).cloned().collect();
            if !kept.is_empty() {
                return kept;
            }
            debug!(threshold, "threshold would empty the result set, waiving it");
        }
        docs
    }

    /// Final unfiltered pass: top-k raw vector results at a floor score.
    fn fallback_vector(&self, query: &str, top_k: usize) -> Vec<Chunk> {
        let mut docs = self.vector_search(query, top_k, &[]);
        for doc in &mut docs {
            doc.score = Some(doc.score_or_zero().max(FALLBACK_SCORE));
        }
        docs
    }
}

/// Drop documents whose metadata contradicts an explicit constraint from
/// the query. Documents lacking the relevant metadata are kept: absence
/// is not contradiction.
fn filter_by_metadata(docs: Vec<Chunk>, info: &QueryInfo) -> Vec<Chunk> {
    let mut docs = docs;
    if !info.year_refs.is_empty() {
        docs.retain(|d| match &d.header_meta {
            Some(meta) => {
                let matches_year = |date: &str| info.year_refs.iter().any(|y| date.contains(y.as_str()));
                meta.passed_date.as_deref().map(matches_year).unwrap_or(true)
                    || meta.revised_dates.iter().any(|d| matches_year(d))
            }
            None => true,
        });
    }
    if !info.meeting_refs.is_empty() {
        docs.retain(|d| match &d.header_meta {
            Some(meta) if !meta.meetings.is_empty() => meta
                .meetings
                .iter()
                .any(|m| info.meeting_refs.iter().any(|q| m.contains(q.as_str()))),
            _ => true,
        });
    }
    if !info.law_names.is_empty() {
        docs.retain(|d| match &d.law_name {
            Some(law) => info.law_names.iter().any(|n| law.contains(n.as_str())),
            None => true,
        });
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    use lexrag_core::config::{ChunkingConfig, EmbeddingConfig, EmbeddingProviderKind};
    use lexrag_core::errors::{EmbeddingError, RetrievalError};
    use lexrag_core::models::{ArticleInfo, ChapterInfo, LawStructure};
    use lexrag_core::traits::EmbeddingProvider;
    use lexrag_index::VectorIndex;

    /// Deterministic 4-dim embedding keyed off simple text features; counts
    /// invocations so cache tests can assert providers are not re-hit.
    struct StubEmbedder {
        calls: Arc<AtomicUsize>,
    }
    impl EmbeddingProvider for StubEmbedder {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let a = t.contains("婚姻") as u8 as f32;
                    let b = t.contains("计划") as u8 as f32;
                    let c = t.contains("第三条") as u8 as f32;
                    vec![a, b, c, 1.0]
                })
                .collect())
        }
        fn name(&self) -> &str {
            "stub"
        }
    }

    struct StubReranker {
        calls: Arc<AtomicUsize>,
    }
    impl RerankProvider for StubReranker {
        fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(documents
                .iter()
                .map(|d| if d.contains(&query[..query.len().min(6)]) { 0.8 } else { 0.2 })
                .collect())
        }
        fn name(&self) -> &str {
            "stub-reranker"
        }
    }

    fn embed_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: EmbeddingProviderKind::OpenAiCompatible,
            model: "stub".into(),
            base_url: "http://stub".into(),
            api_key: None,
            max_token_limit: 1000,
            max_batch_size: 16,
            default_dimension: 4,
            max_retries: 1,
            retry_base_delay_ms: 1,
            request_timeout_secs: 1,
        }
    }

    fn engine(calls: Arc<AtomicUsize>) -> Arc<EmbeddingEngine> {
        Arc::new(EmbeddingEngine::with_provider(
            Box::new(StubEmbedder { calls }),
            embed_config(),
            &ChunkingConfig::default(),
        ))
    }

    fn law() -> LawStructure {
        let mut s = LawStructure {
            law_name: "中华人民共和国示例法".into(),
            source: "law.txt".into(),
            ..Default::default()
        };
        s.chapters.insert(1, ChapterInfo { title: "第一章 总则".into(), article_nums: vec![3] });
        s.articles.insert(
            3,
            ArticleInfo { chapter_num: Some(1), content: "第三条 婚姻自由的内容".into() },
        );
        s
    }

    fn seeded_index(embedder: &EmbeddingEngine) -> IndexHandle {
        let texts = ["第三条 婚姻自由的内容", "计划生育相关说明", "完全无关的文本"];
        let chunks: Vec<Chunk> = texts
            .iter()
            .map(|t| {
                let mut c = Chunk::new(*t, "law.txt", ContentType::Generic);
                c.law_name = Some("中华人民共和国示例法".into());
                c
            })
            .collect();
        let vectors =
            embedder.embed_batch(&texts.iter().map(|t| t.to_string()).collect::<Vec<_>>());
        let mut index = VectorIndex::new();
        index.add(&chunks, &vectors).unwrap();
        Arc::new(RwLock::new(index))
    }

    fn retriever_with(
        reranker: Option<Box<dyn RerankProvider>>,
        embed_calls: Arc<AtomicUsize>,
    ) -> HybridRetriever {
        let embedder = engine(embed_calls);
        let index = seeded_index(&embedder);
        HybridRetriever::new(
            "user_1_kb",
            index,
            embedder,
            StructureRetriever::new(vec![law()]),
            reranker,
            RetrievalConfig::default(),
        )
    }

    #[test]
    fn exact_match_takes_priority() {
        let r = retriever_with(None, Arc::new(AtomicUsize::new(0)));
        let docs = r.retrieve("《示例法》第三条");
        assert!(!docs.is_empty());
        assert!(docs[0].exact_match);
        assert_eq!(docs[0].article_num, Some(3));
        // The vector duplicate of the same article never outranks the
        // exact-structural result.
        let dup_pos = docs.iter().position(|d| !d.exact_match && d.text.contains("第三条"));
        if let Some(pos) = dup_pos {
            assert!(pos > 0);
        }
    }

    #[test]
    fn chapter_listing_returns_overview_plus_articles() {
        let r = retriever_with(None, Arc::new(AtomicUsize::new(0)));
        let docs = r.retrieve("第一章有哪些条款");
        assert_eq!(docs[0].content_type, ContentType::ChapterOverview);
        assert!(docs.iter().any(|d| d.article_num == Some(3)));
    }

    #[test]
    fn cache_prevents_provider_reinvocation() {
        let embed_calls = Arc::new(AtomicUsize::new(0));
        let rerank_calls = Arc::new(AtomicUsize::new(0));
        let r = retriever_with(
            Some(Box::new(StubReranker { calls: rerank_calls.clone() })),
            embed_calls.clone(),
        );

        let first = r.retrieve("计划生育政策");
        let embeds_after_first = embed_calls.load(Ordering::SeqCst);
        let reranks_after_first = rerank_calls.load(Ordering::SeqCst);
        assert!(!first.is_empty());

        let second = r.retrieve("计划生育政策");
        assert_eq!(embed_calls.load(Ordering::SeqCst), embeds_after_first);
        assert_eq!(rerank_calls.load(Ordering::SeqCst), reranks_after_first);

        // Identical ordered results.
        let a: Vec<&str> = first.iter().map(|d| d.text.as_str()).collect();
        let b: Vec<&str> = second.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn plain_query_uses_vector_path() {
        let r = retriever_with(None, Arc::new(AtomicUsize::new(0)));
        let docs = r.retrieve("计划生育政策");
        assert!(!docs.is_empty());
        assert!(docs.iter().all(|d| !d.exact_match));
    }

    #[test]
    fn unmatched_law_name_filters_out_contradictions() {
        let r = retriever_with(None, Arc::new(AtomicUsize::new(0)));
        let docs = r.retrieve("《完全别的法》的规定");
        // Every returned doc carries our law's name, which contradicts the
        // requested one, so all are dropped, and the fallback pass is only
        // reached when the filtered set is empty before reranking.
        assert!(docs.iter().all(|d| d.law_name.is_none() || d.score_or_zero() >= FALLBACK_SCORE));
    }

    #[test]
    fn metadata_year_filter_drops_contradictions() {
        let mut with_meta = Chunk::new("内容", "law.txt", ContentType::Header);
        with_meta.header_meta = Some(lexrag_core::chunk::HeaderMeta {
            passed_date: Some("2001年12月29日".into()),
            revised_dates: vec![],
            meetings: vec![],
        });
        let mut without_meta = Chunk::new("别的", "law.txt", ContentType::Generic);
        without_meta.header_meta = None;

        let info = QueryInfo {
            original_query: "1999年通过的规定".into(),
            year_refs: vec!["1999年".into()],
            ..Default::default()
        };
        let kept = filter_by_metadata(vec![with_meta, without_meta], &info);
        // The 2001 document contradicts the explicit 1999 constraint; the
        // metadata-less one is kept.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "别的");
    }
}
