//! 설정 모듈
//!
//! 데이터 디렉토리 레이아웃과 검색 파라미터를 관리합니다.
//! 기본 위치: ~/.irfan-rag/ (환경변수로 덮어쓰기 가능)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 홈 디렉토리 환경변수
pub const ENV_HOME: &str = "IRFAN_RAG_HOME";
/// 코퍼스(.txt/.md) 루트 환경변수
pub const ENV_DATA_DIR: &str = "IRFAN_DATA_DIR";
/// PDF 업로드 루트 환경변수
pub const ENV_UPLOAD_DIR: &str = "IRFAN_UPLOAD_DIR";
/// 벡터 인덱스 디렉토리 환경변수
pub const ENV_INDEX_DIR: &str = "IRFAN_INDEX_DIR";
/// 수집 상태 파일 환경변수
pub const ENV_STATE_PATH: &str = "IRFAN_STATE_PATH";
/// 인덱스별 검색 개수 환경변수
pub const ENV_TOP_K: &str = "IRFAN_TOP_K";

/// 기본 홈 디렉토리 (~/.irfan-rag/)
pub fn get_home_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".irfan-rag")
}

/// 검색 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// 정규 코퍼스 루트 (카테고리 = 최상위 하위 디렉토리)
    pub data_root: PathBuf,
    /// PDF 업로드 루트
    pub upload_root: PathBuf,
    /// 벡터 인덱스 아티팩트 디렉토리
    pub index_dir: PathBuf,
    /// 수집 상태 JSON 파일
    pub state_path: PathBuf,
    /// 인덱스별 검색 결과 수
    pub top_k: usize,
    /// 통합 후 최종 결과 수
    pub final_limit: usize,
    /// 임베딩 배치 크기
    pub embed_batch_size: usize,
}

impl RagConfig {
    /// 홈 디렉토리 기준 기본 레이아웃
    pub fn with_home(home: &Path) -> Self {
        Self {
            data_root: home.join("data"),
            upload_root: home.join("uploads").join("pdf"),
            index_dir: home.join("app_data").join("faiss"),
            state_path: home.join("app_data").join("ingest_state.json"),
            top_k: 5,
            final_limit: 5,
            embed_batch_size: 64,
        }
    }

    /// 환경변수를 반영한 설정
    ///
    /// `IRFAN_RAG_HOME`이 레이아웃의 기준이 되고, 개별 경로 변수가 있으면 우선합니다.
    pub fn from_env() -> Self {
        let home = env_path(ENV_HOME).unwrap_or_else(get_home_dir);
        let mut config = Self::with_home(&home);

        if let Some(p) = env_path(ENV_DATA_DIR) {
            config.data_root = p;
        }
        if let Some(p) = env_path(ENV_UPLOAD_DIR) {
            config.upload_root = p;
        }
        if let Some(p) = env_path(ENV_INDEX_DIR) {
            config.index_dir = p;
        }
        if let Some(p) = env_path(ENV_STATE_PATH) {
            config.state_path = p;
        }
        if let Ok(raw) = std::env::var(ENV_TOP_K) {
            match raw.trim().parse::<usize>() {
                Ok(k) if k > 0 => config.top_k = k,
                _ => tracing::warn!("Ignoring invalid {}={:?}", ENV_TOP_K, raw),
            }
        }

        config
    }

    /// 필요한 디렉토리 생성
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_root)?;
        std::fs::create_dir_all(&self.upload_root)?;
        std::fs::create_dir_all(&self.index_dir)?;
        if let Some(parent) = self.state_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self::with_home(&get_home_dir())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
