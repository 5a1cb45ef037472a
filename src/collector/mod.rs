//! 업로드 파일 수집 모듈
//!
//! 업로드 루트를 순회하여 지원하는 원본 문서(PDF)를 수집합니다.
//! 각 파일은 업로드 루트 기준 상대 경로(상태 키), 카테고리, 수정 시간을 가집니다.

use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::knowledge::ROOT_CATEGORY;

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 업로드 파일 정보
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedFile {
    /// 파일 절대 경로
    pub path: PathBuf,
    /// 업로드 루트 기준 상대 경로 ('/' 구분자)
    pub key: String,
    /// 최상위 하위 디렉토리명 (없으면 root)
    pub category: String,
    /// 수정 시간 (UNIX epoch 기준 초)
    pub modified: f64,
}

impl CollectedFile {
    /// 업로드 루트와 파일 경로에서 생성
    pub fn from_path(root: &Path, path: PathBuf) -> Result<Self> {
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;

        let modified = metadata
            .modified()
            .with_context(|| format!("Modification time unavailable: {:?}", path))?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let relative = path.strip_prefix(root).unwrap_or(&path);
        let key = relative_key(relative);
        let category = upload_category(relative);

        Ok(Self {
            path,
            key,
            category,
            modified,
        })
    }

    /// 확장자를 뺀 파일명
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// 상대 경로를 플랫폼 독립 키로 변환
fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// 카테고리 = 최상위 하위 디렉토리 (루트 바로 아래 파일은 root)
fn upload_category(relative: &Path) -> String {
    let parts: Vec<_> = relative
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    match parts.as_slice() {
        [Component::Normal(dir), _, ..] => dir.to_string_lossy().into_owned(),
        _ => ROOT_CATEGORY.to_string(),
    }
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 수집할 확장자 (소문자, 점 제외)
    pub extensions: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::for_extensions(&["pdf"])
    }
}

impl CollectorConfig {
    /// 확장자 목록으로 생성
    pub fn for_extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }
}

/// 업로드 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 업로드 루트 재귀 수집
    ///
    /// 숨김 파일은 건너뛰며 결과는 경로 기준으로 정렬됩니다.
    /// 루트가 없으면 빈 목록을 반환합니다.
    pub fn collect_directory(&self, root: &Path) -> Vec<CollectedFile> {
        if !root.is_dir() {
            tracing::debug!("Upload root not found: {:?}", root);
            return Vec::new();
        }

        let mut files = Vec::new();

        // 업로드 트리는 .gitignore 규칙과 무관
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            if !self.is_supported(entry.path()) {
                continue;
            }

            match CollectedFile::from_path(root, entry.path().to_path_buf()) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!("Failed to collect file: {:#}", e);
                }
            }
        }

        tracing::debug!("Collected {} files from {:?}", files.len(), root);
        files
    }

    /// 확장자 지원 여부
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================
