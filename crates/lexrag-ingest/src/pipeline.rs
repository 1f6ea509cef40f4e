//! The ingestion pipeline.
//!
//! Per file: ledger dedup check → extract → structural or generic split →
//! token-limit enforcement → embed and merge per batch → record the file's
//! hash. A file's hash enters the ledger only after its final batch is
//! merged and saved, so cancellation leaves the ledger consistent with what
//! the index actually holds. Per-file failures are isolated into the
//! returned `FailureReport`; only missing configuration is fatal upstream.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use lexrag_chunk::{
    detect_legal_document, enforce_token_limit, split_generic, split_legal_document, TokenCounter,
};
use lexrag_core::chunk::{hash_bytes, Chunk};
use lexrag_core::config::RagConfig;
use lexrag_core::models::{FailureReport, TaskStatus};
use lexrag_core::traits::{ProgressSink, TextExtractor};
use lexrag_embeddings::EmbeddingEngine;
use lexrag_index::IndexManager;
use lexrag_structure::{build_structure, StructureStore};

/// One file to ingest.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub filename: String,
    pub declared_type: String,
}

/// One ingestion request.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Collection (index) name, already owner-qualified.
    pub collection: String,
    pub files: Vec<SourceFile>,
    /// Recompute everything, ignoring and replacing the hash ledger.
    pub force_rebuild: bool,
}

pub struct IngestionPipeline {
    config: RagConfig,
    counter: TokenCounter,
    embedder: Arc<EmbeddingEngine>,
    index: Arc<IndexManager>,
    structures: StructureStore,
    extractor: Box<dyn TextExtractor>,
    sink: Arc<dyn ProgressSink>,
}

impl IngestionPipeline {
    pub fn new(
        config: RagConfig,
        embedder: Arc<EmbeddingEngine>,
        index: Arc<IndexManager>,
        extractor: Box<dyn TextExtractor>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let structures = StructureStore::new(index.root());
        let counter = TokenCounter::from_config(&config.chunking);
        Self { config, counter, embedder, index, structures, extractor, sink }
    }

    /// Run on a background thread; the caller keeps the task id it already
    /// has and polls the progress sink.
    pub fn spawn(
        self: Arc<Self>,
        task_id: String,
        request: IngestRequest,
    ) -> std::thread::JoinHandle<FailureReport> {
        std::thread::spawn(move || self.run(&task_id, &request))
    }

    /// Run the full ingestion synchronously. Returns the failure report;
    /// per-file problems are recorded there, never raised.
    pub fn run(&self, task_id: &str, request: &IngestRequest) -> FailureReport {
        let mut report = FailureReport::default();
        let collection = &request.collection;
        self.sink.update_progress(task_id, TaskStatus::Initializing, "正在初始化...", 0, 1);

        if request.force_rebuild {
            if let Err(e) = self.index.reset_collection(collection) {
                self.sink.update_progress(
                    task_id,
                    TaskStatus::Error,
                    &format!("重建索引失败: {e}"),
                    0,
                    1,
                );
                report.record_file(collection.clone(), format!("重建索引失败: {e}"));
                return report;
            }
        }

        let handle = self.index.load_or_create(collection);
        let total = request.files.len().max(1);

        for (file_idx, file) in request.files.iter().enumerate() {
            if self.check_cancelled(task_id, file_idx, total) {
                report.degradations.extend(self.embedder.drain_events());
                return report;
            }
            self.sink.update_progress(
                task_id,
                TaskStatus::Processing,
                &format!("处理文件: {}", file.filename),
                file_idx,
                total,
            );

            let raw = match std::fs::read(&file.path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(file = %file.filename, error = %e, "unreadable file skipped");
                    report.record_file(file.filename.clone(), format!("读取失败: {e}"));
                    continue;
                }
            };
            let file_hash = hash_bytes(&raw);
            drop(raw);

            if !request.force_rebuild && self.index.already_ingested(collection, &file_hash) {
                debug!(file = %file.filename, "already ingested, skipping");
                continue;
            }

            let extraction =
                self.extractor.extract(&file.path, &file.filename, &file.declared_type);
            if !extraction.ok {
                report.record_file(file.filename.clone(), extraction.text);
                continue;
            }

            let chunks = self.chunk_file(&extraction.text, &file.filename);
            if chunks.is_empty() {
                debug!(file = %file.filename, "no chunks produced");
                self.record_file_hash(collection, &file.filename, file_hash, &mut report);
                continue;
            }

            // Embed and merge batch-by-batch so cancellation between
            // batches discards only unsaved work.
            match self.embed_and_merge(task_id, collection, &handle, &chunks, file_idx, total) {
                BatchOutcome::Completed => {
                    self.record_file_hash(collection, &file.filename, file_hash, &mut report);
                    info!(file = %file.filename, chunks = chunks.len(), "file ingested");
                }
                BatchOutcome::Cancelled => {
                    // Saved batches stay; the file's hash is deliberately
                    // not recorded so a rerun picks it up again.
                    report.degradations.extend(self.embedder.drain_events());
                    return report;
                }
                BatchOutcome::Failed(reason) => {
                    report.record_file(file.filename.clone(), reason);
                }
            }
        }

        report.degradations.extend(self.embedder.drain_events());
        let message = if report.failed_files.is_empty() {
            "完成! 所有文件处理成功".to_string()
        } else {
            format!("完成，{} 个文件失败", report.failed_files.len())
        };
        self.sink.update_progress(task_id, TaskStatus::Completed, &message, total, total);
        report
    }

    /// Split one file's text: structural for legal documents (falling back
    /// to generic on parse failure), generic otherwise; then enforce the
    /// token budget on every chunk.
    fn chunk_file(&self, text: &str, filename: &str) -> Vec<Chunk> {
        let chunking = &self.config.chunking;
        let base = if detect_legal_document(text) {
            let law_chunks = split_legal_document(text, filename);
            if law_chunks.is_empty() {
                warn!(file = filename, "legal parse produced nothing, using generic splitter");
                split_generic(text, filename, chunking.sentence_size)
            } else {
                if let Some(structure) = build_structure(&law_chunks) {
                    if let Err(e) = self.structures.save(&structure) {
                        warn!(file = filename, error = %e, "law structure not persisted");
                    }
                }
                law_chunks
            }
        } else {
            split_generic(text, filename, chunking.sentence_size)
        };

        base.iter()
            .flat_map(|chunk| {
                enforce_token_limit(chunk, chunking.max_tokens, chunking.overlap, &self.counter)
            })
            .collect()
    }

    fn embed_and_merge(
        &self,
        task_id: &str,
        collection: &str,
        handle: &lexrag_index::IndexHandle,
        chunks: &[Chunk],
        file_idx: usize,
        total_files: usize,
    ) -> BatchOutcome {
        let batch_size = self.config.index.batch_size.max(1);
        for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
            if self.check_cancelled(task_id, file_idx, total_files) {
                return BatchOutcome::Cancelled;
            }
            self.sink.update_progress(
                task_id,
                TaskStatus::Embedding,
                &format!(
                    "正在生成向量 ({}-{}/{})...",
                    batch_idx * batch_size + 1,
                    (batch_idx * batch_size + batch.len()).min(chunks.len()),
                    chunks.len()
                ),
                file_idx,
                total_files,
            );

            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts);

            let merged = self.index.add_documents(collection, handle, batch, &vectors, |_, _| {
                !self.sink.is_cancelled(task_id)
            });
            match merged {
                Ok(n) if n < batch.len() => return BatchOutcome::Cancelled,
                Ok(_) => {}
                Err(e) => return BatchOutcome::Failed(format!("写入索引失败: {e}")),
            }
        }
        BatchOutcome::Completed
    }

    fn record_file_hash(
        &self,
        collection: &str,
        filename: &str,
        hash: String,
        report: &mut FailureReport,
    ) {
        if let Err(e) = self.index.record_ingested(collection, hash) {
            warn!(file = filename, error = %e, "hash ledger not updated");
            report.record_file(filename, format!("哈希账本写入失败: {e}"));
        }
    }

    fn check_cancelled(&self, task_id: &str, progress: usize, total: usize) -> bool {
        if self.sink.is_cancelled(task_id) {
            info!(task_id, "cancellation observed, stopping cleanly");
            self.sink.update_progress(task_id, TaskStatus::Cancelled, "任务已取消", progress, total);
            return true;
        }
        false
    }
}

enum BatchOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lexrag_core::config::{EmbeddingConfig, EmbeddingProviderKind, IndexConfig};
    use lexrag_core::errors::EmbeddingError;
    use lexrag_core::traits::EmbeddingProvider;

    use crate::extractor::PlainTextExtractor;
    use crate::task::TaskStore;

    struct StubEmbedder;
    impl EmbeddingProvider for StubEmbedder {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| vec![t.chars().count() as f32, 1.0]).collect())
        }
        fn name(&self) -> &str {
            "stub"
        }
    }

    fn config(root: &std::path::Path) -> RagConfig {
        RagConfig {
            embedding: Some(EmbeddingConfig {
                provider: EmbeddingProviderKind::OpenAiCompatible,
                model: "stub".into(),
                base_url: "http://stub".into(),
                api_key: None,
                max_token_limit: 512,
                max_batch_size: 8,
                default_dimension: 2,
                max_retries: 1,
                retry_base_delay_ms: 1,
                request_timeout_secs: 1,
            }),
            index: IndexConfig { root_dir: root.to_path_buf(), batch_size: 2 },
            ..Default::default()
        }
    }

    fn pipeline(
        cfg: &RagConfig,
        sink: Arc<dyn ProgressSink>,
    ) -> (Arc<IngestionPipeline>, Arc<IndexManager>) {
        let embedder = Arc::new(EmbeddingEngine::with_provider(
            Box::new(StubEmbedder),
            cfg.embedding.clone().unwrap(),
            &cfg.chunking,
        ));
        let index = Arc::new(IndexManager::new(&cfg.index).unwrap());
        let pipeline = Arc::new(IngestionPipeline::new(
            cfg.clone(),
            embedder,
            index.clone(),
            Box::new(PlainTextExtractor::new()),
            sink,
        ));
        (pipeline, index)
    }

    fn write_files(dir: &std::path::Path) -> Vec<SourceFile> {
        let law = dir.join("law.txt");
        std::fs::write(
            &law,
            "示范条例法\n第一章 总则\n第一条 甲内容。\n第二条 乙内容。\n",
        )
        .unwrap();
        let plain = dir.join("plain.txt");
        std::fs::write(&plain, "这是普通文本。它有两句话。").unwrap();
        vec![
            SourceFile { path: law, filename: "law.txt".into(), declared_type: "text/plain".into() },
            SourceFile {
                path: plain,
                filename: "plain.txt".into(),
                declared_type: "text/plain".into(),
            },
        ]
    }

    #[test]
    fn ingests_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let store = Arc::new(TaskStore::new());
        let (pipeline, index) = pipeline(&cfg, store.clone());

        let task_id = store.create_task();
        let request = IngestRequest {
            collection: "user_1_kb".into(),
            files: write_files(dir.path()),
            force_rebuild: false,
        };
        let report = pipeline.run(&task_id, &request);
        assert!(report.failed_files.is_empty());

        let task = store.get(&task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, task.total);

        let handle = index.load_or_create("user_1_kb");
        assert!(handle.read().unwrap().len() >= 3, "law header + 2 articles + plain text");

        // The law structure was persisted.
        let structures = StructureStore::new(index.root()).load_all();
        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].article_count(), 2);
    }

    #[test]
    fn rerun_skips_already_ingested_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let store = Arc::new(TaskStore::new());
        let (pipeline, index) = pipeline(&cfg, store.clone());
        let files = write_files(dir.path());

        let request = IngestRequest {
            collection: "user_1_kb".into(),
            files: files.clone(),
            force_rebuild: false,
        };
        pipeline.run(&store.create_task(), &request);
        let handle = index.load_or_create("user_1_kb");
        let after_first = handle.read().unwrap().len();

        pipeline.run(&store.create_task(), &request);
        assert_eq!(handle.read().unwrap().len(), after_first, "rerun must not duplicate");
    }

    #[test]
    fn force_rebuild_replaces_collection() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let store = Arc::new(TaskStore::new());
        let (pipeline, index) = pipeline(&cfg, store.clone());
        let files = write_files(dir.path());

        let mut request = IngestRequest {
            collection: "user_1_kb".into(),
            files,
            force_rebuild: false,
        };
        pipeline.run(&store.create_task(), &request);
        let handle = index.load_or_create("user_1_kb");
        let baseline = handle.read().unwrap().len();

        request.force_rebuild = true;
        pipeline.run(&store.create_task(), &request);
        assert_eq!(handle.read().unwrap().len(), baseline, "rebuild reproduces the same chunks");
    }

    #[test]
    fn unreadable_file_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let store = Arc::new(TaskStore::new());
        let (pipeline, index) = pipeline(&cfg, store.clone());

        let mut files = write_files(dir.path());
        files.push(SourceFile {
            path: dir.path().join("missing.txt"),
            filename: "missing.txt".into(),
            declared_type: "".into(),
        });
        let request =
            IngestRequest { collection: "user_1_kb".into(), files, force_rebuild: false };
        let report = pipeline.run(&store.create_task(), &request);

        assert_eq!(report.failed_files.len(), 1);
        assert!(report.failed_files.contains_key("missing.txt"));
        // The healthy files still made it in.
        let handle = index.load_or_create("user_1_kb");
        assert!(handle.read().unwrap().len() >= 3);
    }

    /// A sink that reports cancellation once the first file has finished.
    struct CancelAfterFirstFile {
        inner: TaskStore,
        files_done: AtomicUsize,
    }
    impl ProgressSink for CancelAfterFirstFile {
        fn update_progress(
            &self,
            task_id: &str,
            status: TaskStatus,
            message: &str,
            progress: usize,
            total: usize,
        ) {
            if status == TaskStatus::Processing {
                self.files_done.store(progress, Ordering::SeqCst);
            }
            self.inner.update_progress(task_id, status, message, progress, total);
        }
        fn is_cancelled(&self, _task_id: &str) -> bool {
            self.files_done.load(Ordering::SeqCst) >= 1
        }
    }

    #[test]
    fn cancellation_keeps_only_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let store = TaskStore::new();
        let task_id = store.create_task();
        let sink = Arc::new(CancelAfterFirstFile { inner: store, files_done: AtomicUsize::new(0) });
        let (pipeline, index) = pipeline(&cfg, sink.clone());

        let files = write_files(dir.path());
        let first_file = files[0].filename.clone();
        let request =
            IngestRequest { collection: "user_1_kb".into(), files, force_rebuild: false };
        pipeline.run(&task_id, &request);

        // First file fully ingested and recorded; second never started.
        let first_hash = lexrag_core::chunk::hash_bytes(
            &std::fs::read(dir.path().join(&first_file)).unwrap(),
        );
        assert!(index.already_ingested("user_1_kb", &first_hash));

        let handle = index.load_or_create("user_1_kb");
        let chunks = handle.read().unwrap();
        assert!(chunks.chunks().iter().all(|c| c.source == first_file));
    }
}
