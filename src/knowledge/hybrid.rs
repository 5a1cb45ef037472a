//! 하이브리드 검색 - BM25 + Flat 벡터 인덱스 통합
//!
//! 코퍼스와 두 인덱스를 하나의 불변 스냅샷으로 묶어 관리합니다.
//! 재빌드는 새 스냅샷을 독립적으로 만든 뒤 락 아래에서 `Arc`를 교체하므로,
//! 진행 중인 검색은 항상 완전한 이전 스냅샷이나 완전한 새 스냅샷 중 하나만 봅니다.
//! 재빌드가 실패하면 이전 스냅샷이 그대로 유지됩니다.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::RagError;

use super::artifact;
use super::chunker::{default_chunker, Chunker};
use super::classifier::CategoryClassifier;
use super::fusion::{fuse, RetrievalHit, RetrievedContext, SearchMethod};
use super::lexical::LexicalIndex;
use super::store::Corpus;
use super::vector::{l2_normalize, VectorIndex, VectorMeta};

// ============================================================================
// Snapshot
// ============================================================================

/// 불변 인덱스 스냅샷
///
/// `vector`가 `None`이면 벡터 인덱스가 아직 메모리에 올라오지 않은 상태입니다.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    /// 발행 세대 (재빌드마다 1씩 증가)
    pub generation: u64,
    pub corpus: Arc<Corpus>,
    pub lexical: Arc<LexicalIndex>,
    pub vector: Option<Arc<VectorIndex>>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self::from_corpus(0, Corpus::empty(), None)
    }

    fn from_corpus(generation: u64, corpus: Corpus, vector: Option<VectorIndex>) -> Self {
        let lexical = LexicalIndex::build(&corpus);
        Self {
            generation,
            corpus: Arc::new(corpus),
            lexical: Arc::new(lexical),
            vector: vector.map(Arc::new),
        }
    }
}

/// 하이브리드 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct HybridStats {
    pub generation: u64,
    pub chunk_count: usize,
    /// 벡터 인덱스가 로딩되지 않았으면 `None`
    pub vector_count: Option<usize>,
    pub categories: BTreeMap<String, usize>,
}

// ============================================================================
// HybridRetriever
// ============================================================================

/// 하이브리드 검색기
///
/// 전역 싱글턴 대신 호출자가 소유하는 엔진 인스턴스입니다.
/// 쿼리는 `&self`로 동시에 수행할 수 있고, 재빌드는 내부 뮤텍스로 직렬화됩니다.
pub struct HybridRetriever {
    config: RagConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    classifier: CategoryClassifier,
    chunker: Box<dyn Chunker>,
    snapshot: RwLock<Arc<IndexSnapshot>>,
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl HybridRetriever {
    /// 빈 스냅샷으로 생성 (임베딩 프로바이더 없음)
    pub fn new(config: RagConfig) -> Self {
        Self {
            config,
            embedder: None,
            classifier: CategoryClassifier::with_defaults(),
            chunker: default_chunker(),
            snapshot: RwLock::new(Arc::new(IndexSnapshot::empty())),
            rebuild_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// 임베딩 프로바이더 지정
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// 분류 규칙 지정
    pub fn with_classifier(mut self, classifier: CategoryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// 기존 데이터로 열기
    ///
    /// 코퍼스를 읽어 BM25 인덱스를 만들고, 벡터 인덱스는 첫 벡터 검색 때
    /// 저장된 아티팩트에서 로딩합니다.
    pub fn open(config: RagConfig) -> Self {
        let retriever = Self::new(config);
        let corpus = Corpus::load(&retriever.config.data_root, retriever.chunker.as_ref());
        tracing::info!(
            "Opened corpus: {} chunks from {:?}",
            corpus.len(),
            retriever.config.data_root
        );
        retriever.replace_snapshot(IndexSnapshot::from_corpus(0, corpus, None));
        retriever
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// 현재 스냅샷
    pub fn current(&self) -> Arc<IndexSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// 현재 발행 세대
    pub fn generation(&self) -> u64 {
        self.current().generation
    }

    fn replace_snapshot(&self, snapshot: IndexSnapshot) {
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(snapshot);
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// 코퍼스 전체 재빌드
    ///
    /// 코퍼스 로딩 → BM25 빌드 → 임베딩 + 벡터 인덱스 빌드 → 아티팩트 저장 → 발행.
    /// 빈 코퍼스는 저장된 아티팩트를 삭제하고 빈 인덱스를 발행합니다.
    ///
    /// # Returns
    /// 발행된 청크 수
    pub async fn rebuild(&self, corpus_root: &Path) -> Result<usize> {
        let _guard = self.rebuild_lock.lock().await;

        let corpus = Corpus::load(corpus_root, self.chunker.as_ref());
        let chunk_count = corpus.len();

        let vector = if corpus.is_empty() {
            artifact::remove(&self.config.index_dir)
                .context("Failed to remove vector artifacts")?;
            VectorIndex::empty()
        } else {
            let index = self.build_vector_index(&corpus).await?;
            artifact::save(&self.config.index_dir, &index)
                .context("Failed to save vector artifacts")?;
            index
        };

        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let generation = guard.generation + 1;
        *guard = Arc::new(IndexSnapshot::from_corpus(generation, corpus, Some(vector)));
        drop(guard);

        tracing::info!(
            "Published index generation {}: {} chunks from {:?}",
            generation,
            chunk_count,
            corpus_root
        );
        Ok(chunk_count)
    }

    /// 저장된 데이터 루트로 재빌드
    pub async fn reindex(&self) -> Result<usize> {
        let root = self.config.data_root.clone();
        self.rebuild(&root).await
    }

    async fn build_vector_index(&self, corpus: &Corpus) -> Result<VectorIndex> {
        let embedder = self.require_embedder()?;
        let batch_size = self.config.embed_batch_size.max(1);

        let texts: Vec<String> = corpus.chunks().iter().map(|c| c.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_idx, batch) in texts.chunks(batch_size).enumerate() {
            let vectors = embedder
                .embed_batch(batch)
                .await
                .with_context(|| format!("Failed to embed batch {}", batch_idx))?;

            if vectors.len() != batch.len() {
                return Err(RagError::EmbeddingCount {
                    expected: batch.len(),
                    actual: vectors.len(),
                }
                .into());
            }

            for mut vector in vectors {
                l2_normalize(&mut vector);
                embeddings.push(vector);
            }
            tracing::debug!("Embedded batch {} ({} chunks)", batch_idx, batch.len());
        }

        let metas = corpus.chunks().iter().map(VectorMeta::from).collect();
        Ok(VectorIndex::build(metas, embeddings)?)
    }

    fn require_embedder(&self) -> Result<&Arc<dyn EmbeddingProvider>> {
        self.embedder
            .as_ref()
            .context("No embedding provider configured")
    }

    /// 스냅샷의 벡터 인덱스 (필요 시 아티팩트에서 지연 로딩)
    ///
    /// 재빌드가 진행 중이면 디스크의 아티팩트가 아직 발행되지 않은 새 세대일 수
    /// 있으므로 로딩하지 않고 빈 인덱스를 돌려줍니다. 로딩 결과는 `snapshot`이
    /// 여전히 현재 세대일 때만 설치됩니다.
    fn resident_vector(&self, snapshot: &IndexSnapshot) -> Arc<VectorIndex> {
        if let Some(vector) = &snapshot.vector {
            return Arc::clone(vector);
        }

        let Ok(_rebuild) = self.rebuild_lock.try_lock() else {
            tracing::debug!("Rebuild in progress, skipping lazy vector load");
            return Arc::new(VectorIndex::empty());
        };

        let current = self.current();
        if current.generation != snapshot.generation {
            return Arc::new(VectorIndex::empty());
        }
        if let Some(vector) = &current.vector {
            return Arc::clone(vector);
        }

        let loaded = Arc::new(artifact::load(&self.config.index_dir).unwrap_or_default());

        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(vector) = &guard.vector {
            return Arc::clone(vector);
        }
        if guard.generation == snapshot.generation {
            let mut updated = IndexSnapshot::clone(&guard);
            updated.vector = Some(Arc::clone(&loaded));
            *guard = Arc::new(updated);
            tracing::info!("Loaded vector index: {} entries", loaded.len());
        }
        loaded
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// 쿼리의 허용 카테고리 (`None`이면 제한 없음)
    pub fn classify_categories(&self, query: &str) -> Option<Vec<String>> {
        self.classifier.classify(query).map(<[String]>::to_vec)
    }

    /// BM25 키워드 검색
    ///
    /// 허용 카테고리에 해당하는 청크가 없으면 전체 코퍼스에서 검색합니다.
    pub fn search_lexical(
        &self,
        query: &str,
        k: usize,
        allowed: Option<&[String]>,
    ) -> Vec<RetrievalHit> {
        Self::lexical_hits(&self.current(), query, k, allowed)
    }

    fn lexical_hits(
        snapshot: &IndexSnapshot,
        query: &str,
        k: usize,
        allowed: Option<&[String]>,
    ) -> Vec<RetrievalHit> {
        snapshot
            .lexical
            .search(query, k, allowed)
            .into_iter()
            .filter_map(|(idx, score)| {
                snapshot.corpus.get(idx).map(|chunk| RetrievalHit {
                    text: chunk.text.clone(),
                    source: chunk.source_label(),
                    chunk_id: chunk.chunk_id.clone(),
                    category: chunk.category.clone(),
                    score,
                    method: SearchMethod::Lexical,
                })
            })
            .collect()
    }

    /// 벡터 유사도 검색
    ///
    /// 허용 카테고리 밖의 결과는 버리며 전체 코퍼스로 되돌아가지 않습니다.
    /// 인덱스가 비어있거나 아티팩트가 없으면 빈 목록을 반환합니다.
    pub async fn search_vector(
        &self,
        query: &str,
        k: usize,
        allowed: Option<&[String]>,
    ) -> Result<Vec<RetrievalHit>> {
        let snapshot = self.current();
        self.vector_hits(&snapshot, query, k, allowed).await
    }

    async fn vector_hits(
        &self,
        snapshot: &IndexSnapshot,
        query: &str,
        k: usize,
        allowed: Option<&[String]>,
    ) -> Result<Vec<RetrievalHit>> {
        let index = self.resident_vector(snapshot);
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedder = self.require_embedder()?;
        let mut query_vec = embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;
        if query_vec.len() != index.dimension() {
            return Err(RagError::EmbeddingDimension {
                expected: index.dimension(),
                actual: query_vec.len(),
            }
            .into());
        }
        l2_normalize(&mut query_vec);

        let allowed: Option<Vec<String>> = allowed
            .filter(|a| !a.is_empty())
            .map(|a| a.iter().map(|c| c.to_lowercase()).collect());

        let hits = index
            .search(&query_vec, k)
            .into_iter()
            .filter_map(|(idx, similarity)| index.metas().get(idx).map(|m| (m, similarity)))
            .filter(|(meta, _)| match &allowed {
                Some(allowed) => allowed.contains(&meta.category.to_lowercase()),
                None => true,
            })
            .map(|(meta, similarity)| RetrievalHit {
                text: meta.text.clone(),
                source: meta.source.clone(),
                chunk_id: meta.chunk_id.clone(),
                category: meta.category.clone(),
                score: similarity,
                method: SearchMethod::Vector,
            })
            .collect();

        Ok(hits)
    }

    /// 질의 → 분류 → 벡터/키워드 검색 → 통합
    ///
    /// 두 검색 모두 같은 스냅샷을 사용합니다.
    /// 한쪽 인덱스가 실패하면 경고를 남기고 빈 결과로 대체합니다.
    pub async fn retrieve(&self, query: &str) -> RetrievedContext {
        let snapshot = self.current();
        let allowed = self.classify_categories(query);
        if let Some(categories) = &allowed {
            tracing::debug!("Restricting query to categories {:?}", categories);
        }

        let k = self.config.top_k;
        let vector_hits = if self.has_embedder() {
            match self.vector_hits(&snapshot, query, k, allowed.as_deref()).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("Vector search failed: {:#}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let lexical_hits = Self::lexical_hits(&snapshot, query, k, allowed.as_deref());

        RetrievedContext::from_hits(fuse(vector_hits, lexical_hits, self.config.final_limit))
    }

    /// 저장소 통계
    pub fn stats(&self) -> HybridStats {
        let snapshot = self.current();
        HybridStats {
            generation: snapshot.generation,
            chunk_count: snapshot.corpus.len(),
            vector_count: snapshot.vector.as_ref().map(|v| v.len()),
            categories: snapshot.corpus.category_counts(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HashEmbedding;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RagConfig) {
        let dir = TempDir::new().unwrap();
        let config = RagConfig::with_home(dir.path());
        let root = &config.data_root;
        std::fs::create_dir_all(root.join("kuran")).unwrap();
        std::fs::create_dir_all(root.join("hadis")).unwrap();
        std::fs::create_dir_all(root.join("fikih")).unwrap();
        std::fs::write(root.join("kuran/fatiha.txt"), "kuran ayet\n\nfatiha suresi").unwrap();
        std::fs::write(root.join("hadis/buhari.txt"), "hadis rivayet\n\nniyet ve amel").unwrap();
        std::fs::write(root.join("fikih/namaz.txt"), "namaz vakti").unwrap();
        (dir, config)
    }

    fn retriever(config: &RagConfig, embedder: &Arc<HashEmbedding>) -> HybridRetriever {
        HybridRetriever::new(config.clone()).with_embedder(embedder.clone())
    }

    #[tokio::test]
    async fn test_rebuild_publishes_new_generation() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let engine = retriever(&config, &embedder);
        assert_eq!(engine.generation(), 0);

        let count = engine.rebuild(&config.data_root).await.unwrap();
        assert_eq!(count, 5);
        assert_eq!(engine.generation(), 1);

        let stats = engine.stats();
        assert_eq!(stats.chunk_count, 5);
        assert_eq!(stats.vector_count, Some(5));
        assert_eq!(stats.categories.get("hadis"), Some(&2));
        assert!(artifact::ArtifactPaths::in_dir(&config.index_dir).exists());
    }

    #[tokio::test]
    async fn test_lexical_search_after_rebuild() {
        let (_dir, config) = setup();
        let engine = retriever(&config, &Arc::new(HashEmbedding::new(32)));
        engine.rebuild(&config.data_root).await.unwrap();

        let hits = engine.search_lexical("ayet", 5, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "kuran ayet");
        assert_eq!(hits[0].category, "kuran");
        assert_eq!(hits[0].method, SearchMethod::Lexical);
    }

    #[tokio::test]
    async fn test_vector_filter_is_strict() {
        let (_dir, config) = setup();
        let engine = retriever(&config, &Arc::new(HashEmbedding::new(32)));
        engine.rebuild(&config.data_root).await.unwrap();

        let allowed = vec!["tefsir".to_string()];
        let vector = engine.search_vector("ayet", 5, Some(&allowed)).await.unwrap();
        assert!(vector.is_empty());

        // 키워드 검색은 같은 조건에서 전체 코퍼스로 되돌아감
        let lexical = engine.search_lexical("ayet", 5, Some(&allowed));
        assert_eq!(lexical.len(), 1);
    }

    #[tokio::test]
    async fn test_vector_filter_keeps_allowed_categories() {
        let (_dir, config) = setup();
        let engine = retriever(&config, &Arc::new(HashEmbedding::new(32)));
        engine.rebuild(&config.data_root).await.unwrap();

        let allowed = vec!["HADIS".to_string()];
        let hits = engine.search_vector("hadis rivayet", 5, Some(&allowed)).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.category == "hadis"));
        assert_eq!(hits[0].text, "hadis rivayet");
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let engine = retriever(&config, &embedder);
        engine.rebuild(&config.data_root).await.unwrap();
        let before = engine.search_vector("fatiha suresi ayet", 3, None).await.unwrap();

        let reopened = HybridRetriever::open(config.clone()).with_embedder(embedder.clone());
        assert_eq!(reopened.stats().vector_count, None);
        let after = reopened.search_vector("fatiha suresi ayet", 3, None).await.unwrap();
        assert_eq!(reopened.stats().vector_count, Some(5));

        let keys = |hits: &[RetrievalHit]| {
            hits.iter()
                .map(|h| (h.source.clone(), h.chunk_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&before), keys(&after));
        for (a, b) in before.iter().zip(&after) {
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_lazy_load_skipped_while_rebuild_holds_lock() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let reopened = HybridRetriever::open(config.clone()).with_embedder(embedder.clone());

        // 발행 전 구간: 새 코퍼스의 아티팩트는 이미 디스크에 있음
        std::fs::write(config.data_root.join("kuran/bakara.txt"), "bakara suresi").unwrap();
        retriever(&config, &embedder).rebuild(&config.data_root).await.unwrap();
        let rebuilding = reopened.rebuild_lock.lock().await;

        assert!(reopened.search_vector("bakara suresi", 5, None).await.unwrap().is_empty());
        let snapshot = reopened.current();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.corpus.len(), 5);
        assert!(snapshot.vector.is_none());
        drop(rebuilding);
    }

    #[tokio::test]
    async fn test_stale_snapshot_does_not_install_vectors() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let engine = HybridRetriever::open(config.clone()).with_embedder(embedder.clone());
        let stale = engine.current();

        engine.rebuild(&config.data_root).await.unwrap();
        assert!(engine.resident_vector(&stale).is_empty());
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.stats().vector_count, Some(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queries_during_rebuild_see_whole_snapshots() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let engine = Arc::new(retriever(&config, &embedder));
        engine.rebuild(&config.data_root).await.unwrap();

        std::fs::write(
            config.data_root.join("kuran/bakara.txt"),
            "bakara suresi\n\nayet el kursi",
        )
        .unwrap();

        let rebuild = {
            let engine = Arc::clone(&engine);
            let root = config.data_root.clone();
            tokio::spawn(async move { engine.rebuild(&root).await })
        };

        loop {
            let done = rebuild.is_finished();
            let snapshot = engine.current();
            let expected = if snapshot.generation == 1 { 5 } else { 7 };
            assert_eq!(snapshot.corpus.len(), expected);
            assert_eq!(snapshot.lexical.len(), expected);
            if let Some(vector) = &snapshot.vector {
                assert_eq!(vector.len(), expected);
            }

            let hits = engine.search_vector("bakara suresi", 10, None).await.unwrap();
            assert!(hits.len() == 5 || hits.len() == 7);

            if done {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(rebuild.await.unwrap().unwrap(), 7);
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.stats().vector_count, Some(7));
    }

    #[tokio::test]
    async fn test_missing_artifacts_give_empty_vector_results() {
        let (_dir, config) = setup();
        let engine =
            HybridRetriever::open(config.clone()).with_embedder(Arc::new(HashEmbedding::new(32)));
        assert!(engine.search_vector("ayet", 5, None).await.unwrap().is_empty());
        assert_eq!(engine.stats().vector_count, Some(0));
    }

    #[tokio::test]
    async fn test_failed_embedding_keeps_previous_snapshot() {
        let (_dir, config) = setup();
        let embedder = Arc::new(HashEmbedding::new(32));
        let engine = retriever(&config, &embedder);
        engine.rebuild(&config.data_root).await.unwrap();

        std::fs::write(config.data_root.join("kuran/bakara.txt"), "bakara suresi").unwrap();
        embedder.set_failing(true);
        assert!(engine.rebuild(&config.data_root).await.is_err());

        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.stats().chunk_count, 5);
        assert!(engine.search_lexical("bakara", 5, None).is_empty());

        embedder.set_failing(false);
        engine.rebuild(&config.data_root).await.unwrap();
        assert_eq!(engine.generation(), 2);
        assert_eq!(engine.search_lexical("bakara", 5, None).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_corpus_removes_artifacts() {
        let (dir, config) = setup();
        let engine = retriever(&config, &Arc::new(HashEmbedding::new(32)));
        engine.rebuild(&config.data_root).await.unwrap();

        let empty_root = dir.path().join("empty");
        assert_eq!(engine.rebuild(&empty_root).await.unwrap(), 0);
        assert!(!artifact::ArtifactPaths::in_dir(&config.index_dir).exists());
        assert!(engine.search_lexical("ayet", 5, None).is_empty());
        assert!(engine.search_vector("ayet", 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_classifies_and_fuses() {
        let (_dir, config) = setup();
        let engine = retriever(&config, &Arc::new(HashEmbedding::new(32)));
        engine.rebuild(&config.data_root).await.unwrap();

        assert_eq!(
            engine.classify_categories("Bu hadis sahih mi?"),
            Some(vec!["hadis".to_string()])
        );

        let ctx = engine.retrieve("hadis rivayet").await;
        assert!(!ctx.is_empty());
        assert!(ctx.hits.iter().all(|h| h.category == "hadis"));
        assert_eq!(ctx.hits[0].method, SearchMethod::Vector);

        // 같은 청크는 한 번만 포함
        let mut keys: Vec<_> = ctx.hits.iter().map(|h| h.citation()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(ctx.citations.len(), total);
        assert!(ctx.context_text.starts_with("[Kaynak] buhari.txt (buhari.txt-0)"));
    }

    #[tokio::test]
    async fn test_retrieve_without_embedder_uses_lexical_only() {
        let (_dir, config) = setup();
        let engine = HybridRetriever::open(config.clone());
        let ctx = engine.retrieve("namaz").await;
        assert_eq!(ctx.hits.len(), 1);
        assert_eq!(ctx.hits[0].method, SearchMethod::Lexical);
    }

    #[tokio::test]
    async fn test_rebuild_without_embedder_fails() {
        let (_dir, config) = setup();
        let engine = HybridRetriever::new(config.clone());
        assert!(engine.rebuild(&config.data_root).await.is_err());
        assert_eq!(engine.generation(), 0);
    }
}
