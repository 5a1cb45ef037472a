//! 벡터 인덱스 아티팩트 - 디스크 영속화
//!
//! 인덱스 블롭(bincode)과 메타데이터(JSON 배열) 두 파일을 한 쌍으로 다룹니다.
//! 블롭 헤더에는 포맷 버전, 차원, 개수, 메타데이터 파일의 SHA-256이 들어있어
//! 반쯤 쓰인 쌍이나 서로 다른 빌드의 파일 조합을 감지할 수 있습니다.
//! 검증에 실패한 쌍은 "인덱스 없음"으로 취급합니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RagError, RagResult};
use crate::persistence::{atomic_write, remove_if_exists};

use super::vector::{VectorIndex, VectorMeta};

/// 인덱스 블롭 파일명
pub const INDEX_FILE: &str = "index.bin";
/// 메타데이터 파일명
pub const META_FILE: &str = "meta.json";

const FORMAT_VERSION: u32 = 1;

/// 블롭 직렬화 형식
#[derive(Debug, Serialize, Deserialize)]
struct IndexBlob {
    format_version: u32,
    dimension: u64,
    count: u64,
    meta_sha256: String,
    vectors: Vec<f32>,
}

/// 아티팩트 경로 쌍
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub meta: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            index: dir.join(INDEX_FILE),
            meta: dir.join(META_FILE),
        }
    }

    /// 두 파일이 모두 존재하는지
    pub fn exists(&self) -> bool {
        self.index.is_file() && self.meta.is_file()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// 인덱스 저장 (기존 아티팩트 덮어쓰기)
///
/// 메타데이터를 먼저 쓰고 블롭을 나중에 씁니다. 블롭이 새 메타데이터의
/// 해시를 들고 있으므로 중간에 중단되면 로딩 시 불일치로 감지됩니다.
pub fn save(dir: &Path, index: &VectorIndex) -> RagResult<()> {
    let paths = ArtifactPaths::in_dir(dir);
    std::fs::create_dir_all(dir)?;

    let meta_json = serde_json::to_vec(index.metas())?;
    let blob = IndexBlob {
        format_version: FORMAT_VERSION,
        dimension: index.dimension() as u64,
        count: index.len() as u64,
        meta_sha256: sha256_hex(&meta_json),
        vectors: index.raw_vectors().to_vec(),
    };
    let blob_bytes = bincode::serialize(&blob)?;

    atomic_write(&paths.meta, &meta_json)?;
    atomic_write(&paths.index, &blob_bytes)?;

    tracing::debug!(
        "Saved vector index: {} entries (dim={}) to {:?}",
        index.len(),
        index.dimension(),
        dir
    );
    Ok(())
}

/// 인덱스 로딩
///
/// 파일이 없거나 쌍이 맞지 않으면 `None`을 반환합니다.
pub fn load(dir: &Path) -> Option<VectorIndex> {
    match try_load(dir) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!("Ignoring vector artifacts in {:?}: {}", dir, e);
            None
        }
    }
}

fn try_load(dir: &Path) -> RagResult<Option<VectorIndex>> {
    let paths = ArtifactPaths::in_dir(dir);
    if !paths.exists() {
        tracing::debug!("No vector artifacts in {:?}", dir);
        return Ok(None);
    }

    let blob_bytes = std::fs::read(&paths.index)?;
    let meta_bytes = std::fs::read(&paths.meta)?;

    let blob: IndexBlob = bincode::deserialize(&blob_bytes)?;
    if blob.format_version != FORMAT_VERSION {
        return Err(RagError::ArtifactMismatch(format!(
            "unsupported format version {}",
            blob.format_version
        )));
    }
    if blob.meta_sha256 != sha256_hex(&meta_bytes) {
        return Err(RagError::ArtifactMismatch(
            "metadata checksum does not match index".to_string(),
        ));
    }

    let metas: Vec<VectorMeta> = serde_json::from_slice(&meta_bytes)?;
    if metas.len() as u64 != blob.count {
        return Err(RagError::ArtifactMismatch(format!(
            "index holds {} entries, metadata holds {}",
            blob.count,
            metas.len()
        )));
    }

    let dimension = usize::try_from(blob.dimension).map_err(|_| {
        RagError::ArtifactMismatch(format!("dimension {} out of range", blob.dimension))
    })?;
    let index = VectorIndex::from_parts(dimension, blob.vectors, metas)?;
    tracing::debug!("Loaded vector index: {} entries from {:?}", index.len(), dir);
    Ok(Some(index))
}

/// 아티팩트 삭제
pub fn remove(dir: &Path) -> RagResult<()> {
    let paths = ArtifactPaths::in_dir(dir);
    remove_if_exists(&paths.index)?;
    remove_if_exists(&paths.meta)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
