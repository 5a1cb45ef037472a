//! irfan-rag - 종교 문헌 코퍼스용 하이브리드 검색 엔진
//!
//! BM25 키워드 검색 + Flat 벡터 유사도 검색을 결합하고,
//! 업로드된 PDF를 코퍼스 텍스트로 변환하는 수집 파이프라인을 제공합니다.

pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod guardrails;
pub mod ingest;
pub mod knowledge;

mod persistence;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::RagConfig;
pub use embedding::{create_embedder, get_api_key, has_api_key, EmbeddingProvider, GeminiEmbedding};
pub use error::{RagError, RagResult};
pub use extractor::{PdfExtractor, TextExtractor};
pub use guardrails::{check_query, has_prompt_injection, is_in_allowed_domain, QueryVerdict};
pub use ingest::{submit_pdf, IngestReport, IngestState, IngestionPipeline};
pub use knowledge::{
    fuse, CategoryClassifier, Chunk, Corpus, HybridRetriever, HybridStats, RetrievalHit,
    RetrievedContext, SearchMethod,
};
