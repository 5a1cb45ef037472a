//! Vector Index - 정확한 내적(Flat IP) 벡터 검색
//!
//! L2 정규화된 벡터에 대한 전수 내적 검색이므로 점수는 코사인 유사도와 같습니다.
//! 벡터 `i`와 메타데이터 `i`는 같은 청크를 가리킵니다.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, RagResult};

use super::store::Chunk;

// ============================================================================
// Types
// ============================================================================

/// 벡터 메타데이터 (청크 필드 사본)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMeta {
    pub text: String,
    pub source: String,
    pub chunk_id: String,
    pub category: String,
}

impl From<&Chunk> for VectorMeta {
    fn from(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            source: chunk.source_label(),
            chunk_id: chunk.chunk_id.clone(),
            category: chunk.category.clone(),
        }
    }
}

/// Flat 내적 인덱스
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    /// row-major, `metas.len() * dimension`
    vectors: Vec<f32>,
    metas: Vec<VectorMeta>,
}

impl VectorIndex {
    /// 빈 인덱스
    pub fn empty() -> Self {
        Self::default()
    }

    /// 메타데이터와 임베딩으로 인덱스 구성
    ///
    /// 모든 벡터의 차원이 같아야 하며 개수는 메타데이터와 일치해야 합니다.
    pub fn build(metas: Vec<VectorMeta>, embeddings: Vec<Vec<f32>>) -> RagResult<Self> {
        if metas.len() != embeddings.len() {
            return Err(RagError::EmbeddingCount {
                expected: metas.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 && !metas.is_empty() {
            return Err(RagError::EmbeddingDimension {
                expected: 1,
                actual: 0,
            });
        }
        let mut vectors = Vec::with_capacity(dimension * embeddings.len());
        for embedding in embeddings {
            if embedding.len() != dimension {
                return Err(RagError::EmbeddingDimension {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            vectors.extend(embedding);
        }

        Ok(Self {
            dimension,
            vectors,
            metas,
        })
    }

    /// 저장된 원시 데이터로 복원 (길이 검증 포함)
    ///
    /// 헤더의 차원은 신뢰하지 않습니다. 오버플로나 0 차원은 불일치로 처리합니다.
    pub(crate) fn from_parts(
        dimension: usize,
        vectors: Vec<f32>,
        metas: Vec<VectorMeta>,
    ) -> RagResult<Self> {
        let expected = dimension
            .checked_mul(metas.len())
            .filter(|_| dimension > 0 || metas.is_empty());
        if expected != Some(vectors.len()) {
            return Err(RagError::ArtifactMismatch(format!(
                "{} floats for {} entries of dimension {}",
                vectors.len(),
                metas.len(),
                dimension
            )));
        }
        Ok(Self {
            dimension,
            vectors,
            metas,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn metas(&self) -> &[VectorMeta] {
        &self.metas
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// 상위 `k`개 최근접 이웃 (유사도 내림차순, 동점이면 위치 오름차순)
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 || self.dimension == 0 || query.len() != self.dimension {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// L2 정규화 (영벡터는 그대로)
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
