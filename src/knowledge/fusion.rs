//! Result Fusion - 벡터 + 키워드 결과 통합 및 중복 제거
//!
//! 벡터 결과를 먼저, 키워드 결과를 나중에 순회하면서 `(source, chunk_id)`가
//! 처음 나온 항목만 남깁니다. 두 인덱스 모두에서 찾은 청크는 벡터 점수와 위치를 유지합니다.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

/// 최종 결과 기본 개수
pub const DEFAULT_FUSION_LIMIT: usize = 5;

// ============================================================================
// Types
// ============================================================================

/// 검색 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// 벡터 유사도 검색
    Vector,
    /// BM25 키워드 검색
    Lexical,
}

/// 통합 검색 결과 (두 인덱스 공통)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub text: String,
    pub source: String,
    pub chunk_id: String,
    pub category: String,
    /// 인덱스 고유 점수 (벡터: 코사인, 키워드: BM25)
    pub score: f32,
    pub method: SearchMethod,
}

impl RetrievalHit {
    /// 중복 제거 키
    pub fn key(&self) -> (&str, &str) {
        (&self.source, &self.chunk_id)
    }

    /// 인용 문자열 `<source>#<chunk_id>`
    pub fn citation(&self) -> String {
        format!("{}#{}", self.source, self.chunk_id)
    }

    /// LLM 컨텍스트 블록
    pub fn context_block(&self) -> String {
        let label = Path::new(&self.source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.clone());
        format!("[Kaynak] {} ({})\n{}", label, self.chunk_id, self.text)
    }
}

/// 통합 결과 + 인용 + 컨텍스트
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievedContext {
    pub hits: Vec<RetrievalHit>,
    pub citations: Vec<String>,
    /// 컨텍스트 블록을 빈 줄로 연결한 텍스트
    pub context_text: String,
}

impl RetrievedContext {
    pub fn from_hits(hits: Vec<RetrievalHit>) -> Self {
        let citations = hits.iter().map(RetrievalHit::citation).collect();
        let context_text = hits
            .iter()
            .map(RetrievalHit::context_block)
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            hits,
            citations,
            context_text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

// ============================================================================
// Fusion
// ============================================================================

/// 결과 통합
///
/// # Arguments
/// * `vector_hits` - 벡터 검색 결과 (우선)
/// * `lexical_hits` - 키워드 검색 결과
/// * `limit` - 최종 결과 수
pub fn fuse(
    vector_hits: Vec<RetrievalHit>,
    lexical_hits: Vec<RetrievalHit>,
    limit: usize,
) -> Vec<RetrievalHit> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::with_capacity(limit.min(vector_hits.len() + lexical_hits.len()));

    for hit in vector_hits.into_iter().chain(lexical_hits) {
        if merged.len() >= limit {
            break;
        }
        let (source, chunk_id) = hit.key();
        if !seen.insert((source.to_string(), chunk_id.to_string())) {
            continue;
        }
        merged.push(hit);
    }

    merged
}

// ============================================================================
// Tests
// ============================================================================
