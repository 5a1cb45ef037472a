//! CLI 모듈
//!
//! irfan-rag CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::RagConfig;
use crate::embedding::{create_embedder, has_api_key};
use crate::extractor::PdfExtractor;
use crate::guardrails::{check_query, QueryVerdict};
use crate::ingest::{submit_pdf, IngestState, IngestionPipeline};
use crate::knowledge::{fuse, ArtifactPaths, HybridRetriever, RetrievedContext, SearchMethod};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "irfan-rag")]
#[command(version, about = "Irfan 하이브리드 검색 엔진", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 코퍼스 전체 재빌드
    Reindex {
        /// 재빌드 후 업로드 폴더도 수집
        #[arg(long)]
        with_uploads: bool,
    },

    /// 업로드 폴더의 새 PDF 수집
    Ingest {
        /// 업로드 폴더 (기본: 설정값)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// PDF를 업로드 폴더에 등록
    Upload {
        /// 카테고리 (예: kuran, hadis, gizli-ilimler)
        #[arg(short, long)]
        category: String,

        /// PDF 파일 경로
        file: PathBuf,

        /// 등록 후 바로 수집
        #[arg(long)]
        ingest: bool,
    },

    /// 코퍼스 검색
    Query {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// 키워드 검색만 사용 (API 키 불필요)
        #[arg(long)]
        lexical_only: bool,

        /// 가드레일 검사 생략
        #[arg(long)]
        no_guard: bool,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = RagConfig::from_env();
    config
        .ensure_dirs()
        .context("데이터 디렉토리 생성 실패")?;

    match cli.command {
        Commands::Reindex { with_uploads } => cmd_reindex(config, with_uploads).await,
        Commands::Ingest { dir } => cmd_ingest(config, dir).await,
        Commands::Upload {
            category,
            file,
            ingest,
        } => cmd_upload(config, &category, file, ingest).await,
        Commands::Query {
            query,
            limit,
            lexical_only,
            no_guard,
        } => cmd_query(config, &query, limit, lexical_only, no_guard).await,
        Commands::Status => cmd_status(config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn require_api_key() -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\n\
             설정 방법:\n  \
             export GEMINI_API_KEY=your-api-key\n  \
             또는\n  \
             export GOOGLE_AI_API_KEY=your-api-key\n\n\
             API 키 발급: https://aistudio.google.com/app/apikey"
        );
    }
    Ok(())
}

/// 임베딩 프로바이더가 연결된 검색기
fn open_retriever(config: RagConfig) -> Result<HybridRetriever> {
    let embedder = create_embedder().context("임베딩 프로바이더 생성 실패")?;
    Ok(HybridRetriever::open(config).with_embedder(embedder))
}

fn pipeline(config: &RagConfig) -> IngestionPipeline {
    IngestionPipeline::new(config, Arc::new(PdfExtractor::new()))
}

/// 재빌드 명령어 (reindex)
async fn cmd_reindex(config: RagConfig, with_uploads: bool) -> Result<()> {
    require_api_key()?;
    let upload_root = config.upload_root.clone();
    let retriever = open_retriever(config)?;

    println!("[*] 코퍼스 재빌드 중: {}", retriever.config().data_root.display());

    if with_uploads {
        let (chunks, report) = pipeline(retriever.config())
            .bootstrap(&upload_root, &retriever)
            .await
            .context("재빌드 실패")?;
        println!("[OK] 재빌드 완료: {} 청크", chunks);
        println!(
            "[OK] 업로드 수집: 발견 {}, 변환 {}, 실패 {}",
            report.scanned, report.converted, report.failed
        );
    } else {
        let chunks = retriever.reindex().await.context("재빌드 실패")?;
        println!("[OK] 재빌드 완료: {} 청크", chunks);
    }

    println!("     세대: {}", retriever.generation());
    Ok(())
}

/// 수집 명령어 (ingest)
async fn cmd_ingest(config: RagConfig, dir: Option<PathBuf>) -> Result<()> {
    require_api_key()?;
    let upload_root = dir.unwrap_or_else(|| config.upload_root.clone());
    let retriever = open_retriever(config)?;

    println!("[*] 업로드 폴더 수집 중: {}", upload_root.display());

    let report = pipeline(retriever.config())
        .ingest(&upload_root, &retriever)
        .await
        .context("수집 실패")?;

    if report.scanned == 0 {
        println!("[!] 수집할 PDF가 없습니다.");
        return Ok(());
    }

    println!(
        "[OK] 완료: 발견 {}, 변환 {}, 실패 {}",
        report.scanned, report.converted, report.failed
    );
    if report.converted == 0 {
        println!("     변경된 파일이 없어 재빌드를 건너뛰었습니다.");
    }
    Ok(())
}

/// 업로드 명령어 (upload)
async fn cmd_upload(config: RagConfig, category: &str, file: PathBuf, ingest: bool) -> Result<()> {
    let saved = submit_pdf(&config.upload_root, category, &file)?;
    println!("[OK] 등록됨: {}", saved.display());

    if ingest {
        cmd_ingest(config, None).await?;
    } else {
        println!("     다음 `irfan-rag ingest` 실행 시 변환됩니다.");
    }
    Ok(())
}

/// 검색 명령어 (query)
async fn cmd_query(
    config: RagConfig,
    query: &str,
    limit: usize,
    lexical_only: bool,
    no_guard: bool,
) -> Result<()> {
    if !no_guard {
        match check_query(query) {
            QueryVerdict::Allowed => {}
            QueryVerdict::Injection => {
                println!("[!] 요청이 거부되었습니다: 지시 무시/탈옥 시도로 보입니다.");
                return Ok(());
            }
            QueryVerdict::OutOfDomain => {
                println!("[!] 허용된 주제(Kur'ân, hadis, havas) 밖의 질문입니다.");
                return Ok(());
            }
        }
    }

    println!("[*] 검색 중: \"{}\"", query);

    let context = if lexical_only {
        let retriever = HybridRetriever::open(config);
        let allowed = retriever.classify_categories(query);
        let hits = retriever.search_lexical(query, limit, allowed.as_deref());
        RetrievedContext::from_hits(fuse(Vec::new(), hits, limit))
    } else {
        require_api_key()?;
        let mut config = config;
        config.final_limit = limit;
        config.top_k = config.top_k.max(limit);
        open_retriever(config)?.retrieve(query).await
    };

    if context.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", context.hits.len());

    for (i, hit) in context.hits.iter().enumerate() {
        let method_str = match hit.method {
            SearchMethod::Vector => "VEC",
            SearchMethod::Lexical => "BM25",
        };

        println!(
            "{}. [{}] [점수: {:.4}] [{}] {}",
            i + 1,
            method_str,
            hit.score,
            hit.category,
            hit.chunk_id
        );
        println!("   출처: {}", hit.source);
        println!("   내용: {}", truncate_text(&hit.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: RagConfig) -> Result<()> {
    println!("irfan-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 코퍼스: {}", config.data_root.display());
    println!("[*] 업로드: {}", config.upload_root.display());
    println!("[*] 인덱스: {}", config.index_dir.display());

    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    let state = IngestState::load(&config.state_path);
    println!("[OK] 수집 상태: {} 파일", state.len());
    if let Some(latest) = state.latest() {
        if let Some(ts) = chrono::DateTime::from_timestamp(latest as i64, 0) {
            println!("     최근 업로드 수정: {}", ts.format("%Y-%m-%d %H:%M"));
        }
    }

    let retriever = HybridRetriever::open(config);
    let stats = retriever.stats();
    println!("[OK] 청크: {} 건", stats.chunk_count);
    for (category, count) in &stats.categories {
        println!("     {:<16} {}", category, count);
    }

    let paths = ArtifactPaths::in_dir(&retriever.config().index_dir);
    if paths.exists() {
        let size = std::fs::metadata(&paths.index).map(|m| m.len()).unwrap_or(0)
            + std::fs::metadata(&paths.meta).map(|m| m.len()).unwrap_or(0);
        println!("[OK] 벡터 인덱스: {}", format_bytes(size as usize));
    } else {
        println!("[!] 벡터 인덱스: 없음 (`irfan-rag reindex` 실행 필요)");
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
