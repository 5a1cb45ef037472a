//! Text Chunking Module
//!
//! 문서를 빈 줄 경계(문단)로 분할합니다.
//! 문단 하나가 검색의 최소 단위(청크)입니다.

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할 (빈 청크는 포함하지 않음)
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// ParagraphChunker
// ============================================================================

/// 문단 청커
///
/// `"\n\n"` 기준으로 나누고, 각 문단의 앞뒤 공백을 제거한 뒤 빈 문단을 버립니다.
/// 연속된 빈 줄은 빈 문단을 만들 뿐이므로 결과에 영향을 주지 않습니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParagraphChunker;

impl Chunker for ParagraphChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.replace("\r\n", "\n");
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn name(&self) -> &'static str {
        "ParagraphChunker"
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(ParagraphChunker)
}

// ============================================================================
// Tests
// ============================================================================
