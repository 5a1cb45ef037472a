//! Category Classifier - 쿼리 → 허용 카테고리
//!
//! 우선순위가 있는 규칙 테이블을 순서대로 평가합니다.
//! 정규화된 쿼리에 마커 문구가 하나라도 포함된 첫 규칙이 허용 카테고리를 결정하고,
//! 일치하는 규칙이 없으면 제한 없이 전체 코퍼스를 검색합니다.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Normalization
// ============================================================================

/// 매칭용 정규화
///
/// 소문자 변환 → NFKD 분해 후 결합 문자 제거 → 터키어 문자 ASCII 치환.
/// 예: `"Mustafa İLOĞLU"` → `"mustafa iloglu"`
pub fn normalize_for_matching(text: &str) -> String {
    text.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'ç' => 'c',
            'ğ' => 'g',
            'ı' => 'i',
            'ö' => 'o',
            'ş' => 's',
            'ü' => 'u',
            'â' => 'a',
            'î' => 'i',
            'û' => 'u',
            other => other,
        })
        .collect()
}

// ============================================================================
// Rule Table
// ============================================================================

/// 분류 규칙 (도메인 태그, 마커 문구, 허용 카테고리)
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub domain: String,
    /// 정규화된 형태의 마커 문구
    pub markers: Vec<String>,
    pub categories: Vec<String>,
}

impl CategoryRule {
    pub fn new(domain: &str, markers: &[&str], categories: &[&str]) -> Self {
        Self {
            domain: domain.to_string(),
            markers: markers.iter().map(|m| normalize_for_matching(m)).collect(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn matches(&self, normalized_query: &str) -> bool {
        self.markers.iter().any(|m| normalized_query.contains(m.as_str()))
    }
}

/// 기본 규칙 테이블 (우선순위 순)
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            "gizli",
            &[
                "gizli ilimler hazinesi",
                "mustafa iloglu",
                "havas",
                "ruhaniyat",
                "vird",
            ],
            &["gizli-ilimler", "havas"],
        ),
        CategoryRule::new("hadis", &["hadis", "bukhari", "muslim", "rivayet"], &["hadis"]),
        CategoryRule::new(
            "kuran",
            &["kuran", "ayet", "sure", "tefsir", "fatiha", "bakara", "nisa", "yasin"],
            &["kuran", "tefsir"],
        ),
    ]
}

// ============================================================================
// CategoryClassifier
// ============================================================================

/// 카테고리 분류기
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<CategoryRule>,
}

impl CategoryClassifier {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_rules())
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// 첫 번째로 일치한 규칙
    pub fn matching_rule(&self, query: &str) -> Option<&CategoryRule> {
        let normalized = normalize_for_matching(query);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// 허용 카테고리 (`None`이면 제한 없음)
    pub fn classify(&self, query: &str) -> Option<&[String]> {
        self.matching_rule(query).map(|rule| rule.categories.as_slice())
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_turkish() {
        assert_eq!(normalize_for_matching("Mustafa İLOĞLU"), "mustafa iloglu");
        assert_eq!(normalize_for_matching("Kur'ân-ı Kerîm"), "kur'an-i kerim");
        assert_eq!(normalize_for_matching("ŞÜKÜR Çağrı"), "sukur cagri");
    }

    #[test]
    fn test_classify_kuran() {
        let classifier = CategoryClassifier::with_defaults();
        let cats = classifier.classify("Fâtiha sûresinin tefsiri nedir?");
        assert_eq!(cats, Some(&["kuran".to_string(), "tefsir".to_string()][..]));
    }

    #[test]
    fn test_classify_priority_order() {
        let classifier = CategoryClassifier::with_defaults();

        // hadis 규칙이 kuran 규칙보다 우선
        let rule = classifier.matching_rule("Bu ayet ile ilgili hadis var mı?").unwrap();
        assert_eq!(rule.domain, "hadis");

        // gizli 규칙이 가장 우선
        let rule = classifier.matching_rule("Havas ilmi ve hadis rivayetleri").unwrap();
        assert_eq!(rule.domain, "gizli");
        assert_eq!(
            classifier.classify("Mustafa İloğlu'nun kitabı"),
            Some(&["gizli-ilimler".to_string(), "havas".to_string()][..])
        );
    }

    #[test]
    fn test_classify_no_match() {
        let classifier = CategoryClassifier::with_defaults();
        assert_eq!(classifier.classify("merhaba, nasılsın?"), None);
        assert_eq!(classifier.classify(""), None);
    }

    #[test]
    fn test_custom_rules() {
        let classifier = CategoryClassifier::new(vec![CategoryRule::new(
            "dua",
            &["Duâ"],
            &["dualar"],
        )]);
        assert_eq!(
            classifier.classify("sabah DUASI"),
            Some(&["dualar".to_string()][..])
        );
    }
}
