//! 수집 파이프라인 - 업로드 PDF → 코퍼스 텍스트 → 재빌드
//!
//! 업로드 루트를 순회해 새로 들어왔거나 수정된 PDF만 텍스트로 변환하고,
//! 하나라도 변환되면 전체 재빌드 후 수집 상태를 저장합니다.
//!
//! 상태 전이 (파일 키별):
//! `Unseen → Converted(T)`, `Converted(T) → Converted(T')` (T' > T 일 때만)
//! 업로드에서 삭제된 파일의 상태와 변환 결과는 정리하지 않습니다.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::collector::{CollectedFile, CollectorConfig, FileCollector};
use crate::config::RagConfig;
use crate::error::{RagError, RagResult};
use crate::extractor::TextExtractor;
use crate::knowledge::HybridRetriever;
use crate::persistence::atomic_write;

// ============================================================================
// Ingestion State
// ============================================================================

/// 수집 상태 - 업로드 상대 경로 → 마지막 처리 시점의 수정 시간(초)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngestState {
    entries: BTreeMap<String, f64>,
}

impl IngestState {
    /// 상태 파일 로딩
    ///
    /// 파일이 없거나 손상되었으면 빈 상태로 시작합니다.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read ingest state {:?}: {}", path, e);
                }
                return Self::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ignoring corrupt ingest state {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// 상태 파일 저장 (원자적 교체)
    pub fn save(&self, path: &Path) -> RagResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(path, &json)?;
        Ok(())
    }

    /// 변환이 필요한지 (처음 보거나 더 최근에 수정됨)
    pub fn needs_processing(&self, key: &str, modified: f64) -> bool {
        match self.entries.get(key) {
            Some(&seen) => modified > seen,
            None => true,
        }
    }

    pub fn record(&mut self, key: &str, modified: f64) {
        self.entries.insert(key.to_string(), modified);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 가장 최근 수정 시간
    pub fn latest(&self) -> Option<f64> {
        self.entries.values().copied().reduce(f64::max)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// 수집 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// 발견한 PDF 수
    pub scanned: usize,
    /// 텍스트로 변환한 수
    pub converted: usize,
    /// 추출 실패로 건너뛴 수
    pub failed: usize,
}

/// 수집 파이프라인
pub struct IngestionPipeline {
    collector: FileCollector,
    extractor: Arc<dyn TextExtractor>,
    corpus_root: PathBuf,
    state_path: PathBuf,
}

impl IngestionPipeline {
    pub fn new(config: &RagConfig, extractor: Arc<dyn TextExtractor>) -> Self {
        let collector = FileCollector::new(CollectorConfig::for_extensions(extractor.extensions()));
        Self {
            collector,
            extractor,
            corpus_root: config.data_root.clone(),
            state_path: config.state_path.clone(),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// 업로드 루트 수집
    ///
    /// 변환된 파일이 있으면 `retriever`를 재빌드하고 발행에 성공한 뒤에만 상태를 저장합니다.
    /// 재빌드가 실패하면 상태 파일은 그대로 남아 다음 실행에서 다시 변환됩니다.
    /// 추출에 실패한 파일도 상태에 기록되지만, 변환된 파일이 없는 실행에서는
    /// 상태 파일을 쓰지 않으므로 다음 실행에서 다시 시도됩니다.
    pub async fn ingest(&self, upload_root: &Path, retriever: &HybridRetriever) -> Result<IngestReport> {
        std::fs::create_dir_all(upload_root)
            .with_context(|| format!("Failed to create upload root: {:?}", upload_root))?;

        let mut state = IngestState::load(&self.state_path);
        let mut report = IngestReport::default();

        for file in self.collector.collect_directory(upload_root) {
            report.scanned += 1;
            if !state.needs_processing(&file.key, file.modified) {
                continue;
            }

            match self.convert(&file).await {
                Ok(target) => {
                    tracing::debug!("Converted {} -> {:?}", file.key, target);
                    report.converted += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", file.key, e);
                    report.failed += 1;
                }
            }
            state.record(&file.key, file.modified);
        }

        if report.converted > 0 {
            retriever
                .rebuild(&self.corpus_root)
                .await
                .context("Rebuild after ingestion failed")?;
            state
                .save(&self.state_path)
                .context("Failed to save ingest state")?;
        }

        tracing::info!(
            "Ingestion finished: scanned {}, converted {}, failed {}",
            report.scanned,
            report.converted,
            report.failed
        );
        Ok(report)
    }

    /// PDF 하나를 `<corpus_root>/<category>/<stem>.txt`로 변환
    async fn convert(&self, file: &CollectedFile) -> Result<PathBuf> {
        let blocks = self.extractor.extract(&file.path).await?;
        let text = blocks
            .iter()
            .filter(|b| !b.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n");

        let target = self
            .corpus_root
            .join(&file.category)
            .join(format!("{}.txt", file.stem()));
        atomic_write(&target, text.as_bytes())
            .with_context(|| format!("Failed to write {:?}", target))?;
        Ok(target)
    }

    /// 시작 시 부트스트랩 - 코퍼스 재빌드 후 업로드 수집
    pub async fn bootstrap(
        &self,
        upload_root: &Path,
        retriever: &HybridRetriever,
    ) -> Result<(usize, IngestReport)> {
        let chunks = retriever.rebuild(&self.corpus_root).await?;
        let report = self.ingest(upload_root, retriever).await?;
        Ok((chunks, report))
    }
}

// ============================================================================
// Upload Submission
// ============================================================================

/// 업로드 PDF를 `<upload_root>/<category>/<파일명>`으로 복사
///
/// 다음 `ingest` 실행에서 변환됩니다.
///
/// # Errors
/// 확장자가 `.pdf`가 아니거나 카테고리가 잘못되면 [`RagError::InvalidUpload`]
pub fn submit_pdf(upload_root: &Path, category: &str, file: &Path) -> RagResult<PathBuf> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RagError::InvalidUpload(format!("missing file name: {:?}", file)))?;

    let is_pdf = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(RagError::InvalidUpload(format!("PDF bekleniyor: {}", file_name)));
    }

    let category = validate_category(category)?;
    if !file.is_file() {
        return Err(RagError::InvalidUpload(format!("file not found: {:?}", file)));
    }

    let target_dir = upload_root.join(category);
    std::fs::create_dir_all(&target_dir)?;
    let target = target_dir.join(file_name);
    let bytes = std::fs::read(file)?;
    atomic_write(&target, &bytes)?;

    tracing::info!("Accepted upload {:?} into category '{}'", target, category);
    Ok(target)
}

/// 카테고리는 비어있지 않은 단일 경로 세그먼트
fn validate_category(category: &str) -> RagResult<&str> {
    let category = category.trim();
    let mut components = Path::new(category).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None)
            if !category.contains(['/', '\\']) && !category.starts_with('.') =>
        {
            Ok(category)
        }
        _ => Err(RagError::InvalidUpload(format!("invalid category: {:?}", category))),
    }
}

// ============================================================================
// Tests
// ============================================================================
