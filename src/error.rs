//! 에러 타입
//!
//! 라이브러리 경계에서 호출자가 구분해야 하는 도메인 에러입니다.
//! 나머지 경로는 `anyhow::Result` + `.context()`를 사용합니다.

use thiserror::Error;

/// 검색 엔진 도메인 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 업로드 검증 실패 (외부 HTTP 계층으로 그대로 전달됨)
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// 임베딩 차원 불일치
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimension { expected: usize, actual: usize },

    /// 임베딩 프로바이더가 입력 개수와 다른 벡터 수를 반환
    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, actual: usize },

    /// 벡터 인덱스/메타데이터 쌍 불일치
    #[error("vector artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Encode(#[from] bincode::Error),
}

pub type RagResult<T> = std::result::Result<T, RagError>;
