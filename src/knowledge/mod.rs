//! Knowledge 모듈 - 하이브리드 검색 엔진
//!
//! - Store: 코퍼스 로딩 + 카테고리 추론
//! - Lexical: BM25 키워드 검색
//! - Vector: Flat 내적 벡터 검색 + 아티팩트 영속화
//! - Classifier: 쿼리 → 허용 카테고리
//! - Fusion: 벡터 우선 중복 제거 통합
//! - Hybrid: 버전 스냅샷 기반 검색기

mod artifact;
mod chunker;
mod classifier;
mod fusion;
mod hybrid;
mod lexical;
mod store;
mod vector;

// Re-exports
pub use artifact::{ArtifactPaths, INDEX_FILE, META_FILE};
pub use chunker::{default_chunker, Chunker, ParagraphChunker};
pub use classifier::{default_rules, normalize_for_matching, CategoryClassifier, CategoryRule};
pub use fusion::{fuse, RetrievalHit, RetrievedContext, SearchMethod, DEFAULT_FUSION_LIMIT};
pub use hybrid::{HybridRetriever, HybridStats, IndexSnapshot};
pub use lexical::{tokenize, Bm25Params, LexicalIndex};
pub use store::{infer_category, Chunk, Corpus, ROOT_CATEGORY};
pub use vector::{l2_normalize, VectorIndex, VectorMeta};
