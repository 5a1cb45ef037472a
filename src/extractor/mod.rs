//! 콘텐츠 추출 모듈
//!
//! 원본 문서(PDF)를 순서가 있는 텍스트 블록(페이지) 목록으로 변환합니다.
//! 수집 파이프라인은 [`TextExtractor`] 트레이트에만 의존합니다.

pub mod pdf;

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

// ============================================================================
// TextExtractor Trait
// ============================================================================

/// 문서 텍스트 추출기
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 문서에서 페이지/섹션별 텍스트 블록 추출 (빈 페이지는 빈 문자열)
    async fn extract(&self, path: &Path) -> Result<Vec<String>>;

    /// 처리 가능한 확장자 (소문자, 점 제외)
    fn extensions(&self) -> &[&'static str];

    /// 추출기 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// PdfExtractor
// ============================================================================

/// pdf-extract 기반 PDF 추출기
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        let path = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&path))
            .await
            .context("PDF extraction task failed")??;

        Ok(pages.into_iter().map(|(_, text)| text).collect())
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn name(&self) -> &'static str {
        "pdf-extract"
    }
}

// ============================================================================
// Tests
// ============================================================================
