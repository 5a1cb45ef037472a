//! 테스트용 협력 객체

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::EmbeddingProvider;
use crate::extractor::TextExtractor;
use crate::knowledge::tokenize;

/// 해시 기반 bag-of-words 임베딩 (결정적)
pub struct HashEmbedding {
    dimension: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// 이후 호출을 모두 실패시킴
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let idx = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            vector[idx] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("embedding service unavailable");
        }
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// 파일 텍스트를 폼피드 기준 페이지로 나누는 추출기
///
/// 내용에 `CORRUPT`가 있으면 실패합니다.
#[derive(Default)]
pub struct FakeExtractor {
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(path)?;
        if text.contains("CORRUPT") {
            bail!("cannot parse {:?}", path);
        }
        Ok(text.split('\x0c').map(str::to_string).collect())
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
