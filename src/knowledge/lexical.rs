//! Lexical Index - BM25 키워드 검색
//!
//! [`bm25`](https://crates.io/crates/bm25) 크레이트의 검색 엔진을 감싸며,
//! 문서 ID는 빌드에 사용한 코퍼스의 청크 위치입니다.
//! 증분 갱신은 지원하지 않으며, 코퍼스가 바뀌면 다시 빌드합니다.

use std::collections::HashSet;
use std::fmt;

use bm25::{Document, SearchEngine, SearchEngineBuilder, Tokenizer};

use super::store::Corpus;

// ============================================================================
// Tokenizer
// ============================================================================

/// 토큰화 - 소문자 변환, 줄바꿈을 공백으로, 공백 분할, 빈 토큰 제거
pub fn tokenize(text: &str) -> Vec<String> {
    text.replace('\n', " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty())
        .collect()
}

/// 코퍼스와 쿼리에 같은 규칙을 적용하는 BM25 토크나이저 (어간 추출/불용어 없음)
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusTokenizer;

impl Tokenizer for CorpusTokenizer {
    fn tokenize(&self, input_text: &str) -> Vec<String> {
        tokenize(input_text)
    }
}

// ============================================================================
// BM25 Parameters
// ============================================================================

/// BM25 파라미터
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// 단어 빈도 포화 계수
    pub k1: f32,
    /// 문서 길이 정규화 계수
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

// ============================================================================
// LexicalIndex
// ============================================================================

/// BM25 인덱스
///
/// 위치 `i`는 빌드에 사용한 코퍼스의 `i`번째 청크를 가리킵니다.
pub struct LexicalIndex {
    search_engine: SearchEngine<u32, u32, CorpusTokenizer>,
    /// 청크별 카테고리 (소문자)
    categories: Vec<String>,
}

impl fmt::Debug for LexicalIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexicalIndex")
            .field("documents", &self.categories.len())
            .finish()
    }
}

impl LexicalIndex {
    /// 코퍼스로 인덱스 빌드
    pub fn build(corpus: &Corpus) -> Self {
        Self::build_with_params(corpus, Bm25Params::default())
    }

    pub fn build_with_params(corpus: &Corpus, params: Bm25Params) -> Self {
        let documents: Vec<Document<u32>> = corpus
            .chunks()
            .iter()
            .enumerate()
            .map(|(i, chunk)| Document {
                id: i as u32,
                contents: chunk.text.clone(),
            })
            .collect();
        let categories = corpus
            .chunks()
            .iter()
            .map(|chunk| chunk.category.to_lowercase())
            .collect();

        let search_engine =
            SearchEngineBuilder::<u32, u32, CorpusTokenizer>::with_tokenizer_and_documents(
                CorpusTokenizer,
                documents,
            )
            .k1(params.k1)
            .b(params.b)
            .build();

        tracing::debug!("Built BM25 index: {} chunks", corpus.len());

        Self {
            search_engine,
            categories,
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// 키워드 검색
    ///
    /// 상위 `k`개를 점수 내림차순으로 반환하며 0 이하 점수는 제외합니다.
    /// `allowed`가 비어있지 않으면 해당 카테고리(대소문자 무시)만 후보로 삼고,
    /// 후보가 하나도 없으면 전체 코퍼스로 되돌아갑니다.
    ///
    /// # Returns
    /// (코퍼스 위치, 점수) 목록
    pub fn search(&self, query: &str, k: usize, allowed: Option<&[String]>) -> Vec<(usize, f32)> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }

        let restrict: Option<HashSet<String>> = allowed
            .filter(|a| !a.is_empty())
            .map(|a| a.iter().map(|c| c.to_lowercase()).collect())
            .filter(|allowed: &HashSet<String>| {
                let present = self.categories.iter().any(|c| allowed.contains(c));
                if !present {
                    tracing::debug!("No chunks in categories {:?}, using full corpus", allowed);
                }
                present
            });

        // 필터링 전에 잘리지 않도록 매칭되는 모든 청크를 받음
        let mut results: Vec<(usize, f32)> = self
            .search_engine
            .search(query, self.len())
            .into_iter()
            .map(|result| (result.document.id as usize, result.score))
            .filter(|(i, score)| *score > 0.0 && *i < self.categories.len())
            .filter(|(i, _)| match &restrict {
                Some(allowed) => allowed.contains(&self.categories[*i]),
                None => true,
            })
            .collect();

        // 동점이면 코퍼스 순서
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(k);
        results
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::store::Chunk;

    fn corpus(entries: &[(&str, &str)]) -> Corpus {
        let chunks = entries
            .iter()
            .enumerate()
            .map(|(i, (category, text))| Chunk {
                text: text.to_string(),
                source: format!("/data/{}/doc{}.txt", category, i).into(),
                chunk_id: format!("doc{}.txt-0", i),
                category: category.to_string(),
            })
            .collect();
        Corpus::from_chunks("/data", chunks)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Hello   World\n"), vec!["hello", "world"]);
        assert_eq!(tokenize("A\nB\tC"), vec!["a", "b", "c"]);
        assert!(tokenize("   \n ").is_empty());
    }

    #[test]
    fn test_tokenizer_keeps_words_intact() {
        // 불용어 제거/어간 추출 없이 그대로
        assert_eq!(
            CorpusTokenizer.tokenize("The Ayetler and Suresi"),
            vec!["the", "ayetler", "and", "suresi"]
        );
    }

    #[test]
    fn test_search_single_term() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "kuran ayet"),
            ("hadis", "hadis rivayet"),
            ("fikih", "namaz vakti"),
        ]));

        let results = index.search("ayet", 5, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 0);
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "Fatiha Suresi"),
            ("kuran", "bakara suresi uzun"),
            ("hadis", "sahih hadis"),
        ]));

        let results = index.search("FATIHA", 5, None);
        assert_eq!(results.first().map(|r| r.0), Some(0));
    }

    #[test]
    fn test_search_orders_by_score() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "ayet"),
            ("kuran", "ayet ayet tefsir"),
            ("hadis", "hadis"),
            ("hadis", "rivayet"),
            ("fikih", "namaz"),
        ]));

        let results = index.search("ayet tefsir", 5, None);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "dua bir"),
            ("hadis", "dua iki"),
            ("havas", "dua üç"),
            ("fikih", "namaz"),
        ]));

        let results = index.search("dua", 2, None);
        assert_eq!(results.len(), 2);
        // 동점은 코퍼스 순서
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 1);
    }

    #[test]
    fn test_category_filter_restricts_candidates() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "dua ve ayet"),
            ("hadis", "dua ve hadis"),
            ("havas", "vird"),
        ]));

        let allowed = vec!["HADIS".to_string()];
        let results = index.search("dua", 5, Some(&allowed));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn test_category_filter_applies_before_truncation() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "dua dua dua"),
            ("kuran", "dua dua"),
            ("hadis", "dua"),
            ("fikih", "namaz"),
        ]));

        let allowed = vec!["hadis".to_string()];
        let results = index.search("dua", 1, Some(&allowed));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 2);
    }

    #[test]
    fn test_category_filter_falls_back_to_full_corpus() {
        let index = LexicalIndex::build(&corpus(&[
            ("kuran", "kuran ayet"),
            ("hadis", "hadis rivayet"),
            ("fikih", "namaz vakti"),
        ]));

        let allowed = vec!["tefsir".to_string()];
        let filtered = index.search("ayet rivayet", 2, Some(&allowed));
        let unfiltered = index.search("ayet rivayet", 2, None);
        assert!(!unfiltered.is_empty());
        assert_eq!(filtered, unfiltered);
    }

    #[test]
    fn test_empty_allowed_means_no_restriction() {
        let index = LexicalIndex::build(&corpus(&[("kuran", "ayet"), ("hadis", "hadis"), ("x", "y")]));
        let empty: Vec<String> = vec![];
        assert_eq!(index.search("ayet", 3, Some(&empty)), index.search("ayet", 3, None));
    }

    #[test]
    fn test_empty_index() {
        let index = LexicalIndex::build(&Corpus::empty());
        assert!(index.is_empty());
        assert!(index.search("ayet", 5, None).is_empty());
    }

    #[test]
    fn test_unknown_terms_score_zero() {
        let index = LexicalIndex::build(&corpus(&[("kuran", "ayet"), ("hadis", "hadis"), ("x", "y")]));
        assert!(index.search("bilinmeyen", 5, None).is_empty());
    }
}
