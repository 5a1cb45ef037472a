//! Chunk Store - 코퍼스 로딩 및 카테고리 추론
//!
//! 코퍼스 루트 아래의 `.txt`/`.md` 문서를 재귀적으로 읽어
//! 문단 단위 청크의 순서 있는 목록을 만듭니다.
//! 이 순서가 두 인덱스(BM25, 벡터)의 위치 정렬 기준입니다.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::chunker::Chunker;

/// 루트 바로 아래 문서의 카테고리
pub const ROOT_CATEGORY: &str = "root";

/// 코퍼스로 읽는 확장자
const CORPUS_EXTENSIONS: [&str; 2] = ["txt", "md"];

// ============================================================================
// Types
// ============================================================================

/// 문서 청크
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// 문단 텍스트
    pub text: String,
    /// 원본 파일 경로
    pub source: PathBuf,
    /// `<파일명>-<순번>` (파일 내에서 유일)
    pub chunk_id: String,
    /// 최상위 하위 디렉토리명
    pub category: String,
}

impl Chunk {
    /// 인용/중복 제거에 쓰는 원본 경로 문자열
    pub fn source_label(&self) -> String {
        self.source.display().to_string()
    }
}

/// 코퍼스 - 디렉토리 순회 순서대로 정렬된 청크 목록
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    root: PathBuf,
    chunks: Vec<Chunk>,
}

impl Corpus {
    /// 빈 코퍼스
    pub fn empty() -> Self {
        Self::default()
    }

    /// 청크 목록으로 직접 생성
    pub fn from_chunks(root: impl Into<PathBuf>, chunks: Vec<Chunk>) -> Self {
        Self {
            root: root.into(),
            chunks,
        }
    }

    /// 디렉토리에서 코퍼스 로딩
    ///
    /// 디렉토리가 없거나 읽을 수 없으면 빈 코퍼스를 반환합니다.
    /// 잘못된 UTF-8 바이트는 대체 문자로 치환됩니다.
    pub fn load(root: &Path, chunker: &dyn Chunker) -> Self {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let mut chunks = Vec::new();

        if !root.is_dir() {
            tracing::debug!("Corpus root not found: {:?}", root);
            return Self { root, chunks };
        }

        let walker = WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read corpus entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_corpus_file(entry.path()) {
                continue;
            }

            let path = entry.path();
            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    continue;
                }
            };
            let raw = String::from_utf8_lossy(&bytes);

            let file_name = entry.file_name().to_string_lossy().into_owned();
            let category = infer_category(&root, path);

            for (idx, paragraph) in chunker.chunk(&raw).into_iter().enumerate() {
                chunks.push(Chunk {
                    text: paragraph,
                    source: path.to_path_buf(),
                    chunk_id: format!("{}-{}", file_name, idx),
                    category: category.clone(),
                });
            }
        }

        tracing::debug!("Loaded {} chunks from {:?}", chunks.len(), root);
        Self { root, chunks }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// 카테고리별 청크 수
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for chunk in &self.chunks {
            *counts.entry(chunk.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_corpus_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| CORPUS_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// 경로 구조로 카테고리 추론
///
/// 파일이 속한 디렉토리의 루트 기준 첫 경로 세그먼트. 루트 바로 아래이거나
/// 루트 밖이면 [`ROOT_CATEGORY`].
pub fn infer_category(root: &Path, file: &Path) -> String {
    let Some(dir) = file.parent() else {
        return ROOT_CATEGORY.to_string();
    };

    match dir.strip_prefix(root) {
        Ok(rel) => match rel.components().next() {
            Some(Component::Normal(top)) => top.to_string_lossy().into_owned(),
            _ => ROOT_CATEGORY.to_string(),
        },
        Err(_) => ROOT_CATEGORY.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
