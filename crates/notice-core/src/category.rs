//! 공시 카테고리 정규화와 지정 규칙 테이블.
//!
//! 카테고리 라벨 매칭은 의도적으로 부분 문자열 방식입니다 (예: "지정"이
//! "재지정"에도 매칭). 라벨들이 실제 공시 문구 안에서 서로를 포함하기 때문에
//! 우선순위가 있는 규칙 목록을 앞에서부터 평가해 첫 매칭을 채택하고,
//! 긴 라벨을 먼저 검사해 짧은 라벨이 긴 라벨을 잡아먹지 않도록 합니다.
//! 매칭 전략 자체는 여기 이름 붙은 술어들 뒤에 격리되어 있어 교체가 국소적입니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

/// "지정해제 및 재지정 예고" — 스킵 필터의 유일한 예외 라벨.
pub const RELEASE_LABEL: &str = "지정해제 및 재지정 예고";

/// 배수 규칙 없이 15영업일 신고가만 쓰는 라벨.
pub const HIGH_ONLY_LABEL: &str = "초장기불건전예고";

/// 배수 계산에서 제외할 키워드 (부분 포함 매칭).
const SKIP_KEYWORDS: [&str; 2] = ["재지정", "지정"];

/// 미매칭 카테고리의 정렬 순위 기본값.
pub const UNRANKED: usize = 10_000;

/// 투자경고 예고 카테고리의 기준가 산출 규칙.
#[derive(Debug, Clone, Copy)]
pub struct WarningRule {
    /// 카테고리 라벨 (부분 문자열 매칭)
    pub label: &'static str,
    /// 내일 기준 N영업일 전 종가를 기준가로 사용
    pub offset_business_days: usize,
    /// 기준 종가에 곱할 배수
    pub multiplier: Decimal,
}

/// 규칙 테이블. 매칭 우선순위 순서이므로 순서를 바꾸면 안 됨
/// ("단기예고"는 "초단기예고"의 부분 문자열).
pub static WARNING_RULES: &[WarningRule] = &[
    WarningRule {
        label: "초단기예고",
        offset_business_days: 3,
        multiplier: dec!(2.0), // 100% 상승
    },
    WarningRule {
        label: "단기예고",
        offset_business_days: 5,
        multiplier: dec!(1.6), // 60% 상승
    },
    WarningRule {
        label: "장기예고",
        offset_business_days: 15,
        multiplier: dec!(2.0), // 100% 상승
    },
    WarningRule {
        label: "단기불건전예고",
        offset_business_days: 5,
        multiplier: dec!(1.45), // 45% 상승 + 소수계좌 요건
    },
];

/// 레코드 갱신 시 다시 채워 넣는 보조 가격 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuxField {
    /// `D-3_price` (당일 기준 2영업일 전 종가)
    D3,
    /// `D-5_price` (당일 기준 4영업일 전 종가)
    D5,
    /// `D-5_45_price` (당일 기준 4영업일 전 종가, 45% 규칙용)
    D5_45,
    /// `D-15_price` (당일 기준 14영업일 전 종가)
    D15,
    /// `high_price` (최근 14영업일 종가 신고가)
    High,
}

/// JSON 카테고리 값(배열/문자열)을 공백 제거된 문자열 목록으로 정규화.
pub fn normalize_categories(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                Vec::new()
            } else {
                vec![t.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

/// 카테고리 목록의 업서트 키: 중복 제거 + 사전순 정렬 + `|` 조인.
///
/// 같은 멀티셋이면 순서/중복과 무관하게 항상 같은 키가 나온다.
/// 업서트 동일성의 기반이므로 프로퍼티 테스트로 검증한다.
pub fn category_key_of(categories: &[String]) -> String {
    let mut arr: Vec<&str> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    arr.sort_unstable();
    arr.dedup();
    arr.join("|")
}

/// JSON 카테고리 값에서 곧바로 업서트 키 계산.
pub fn category_key(value: &Value) -> String {
    category_key_of(&normalize_categories(value))
}

/// "지정해제 및 재지정 예고" 포함 여부.
pub fn has_release_category(categories: &[String]) -> bool {
    categories.iter().any(|c| c.contains(RELEASE_LABEL))
}

/// 배수 계산 제외 대상 여부.
///
/// "지정"/"재지정"을 포함하면 제외하되, 지정해제/재지정 예고는 별도 경로로
/// 처리되므로 예외.
pub fn is_skip_category(categories: &[String]) -> bool {
    if has_release_category(categories) {
        return false;
    }
    categories
        .iter()
        .any(|c| SKIP_KEYWORDS.iter().any(|w| c.contains(w)))
}

/// 단기과열 "지정예고" 라벨 포함 여부.
pub fn has_overheating_notice(categories: &[String]) -> bool {
    categories.iter().any(|c| c.contains("단기과열 지정예고"))
}

/// 단기과열 "지정" 확정 라벨 포함 여부 ("지정예고"는 제외).
pub fn has_overheating_designation(categories: &[String]) -> bool {
    categories
        .iter()
        .any(|c| c.contains("단기과열 지정") && !c.contains("지정예고"))
}

/// 카테고리 목록에서 투자경고 규칙 라벨 식별.
///
/// 우선순위 목록을 앞에서부터 평가해 첫 매칭을 채택한다.
/// [`HIGH_ONLY_LABEL`]은 다른 라벨들을 부분 문자열로 포함하므로 가장 먼저 검사.
pub fn match_warning_label(categories: &[String]) -> Option<&'static str> {
    if categories.iter().any(|c| c.contains(HIGH_ONLY_LABEL)) {
        return Some(HIGH_ONLY_LABEL);
    }
    WARNING_RULES
        .iter()
        .find(|rule| categories.iter().any(|c| c.contains(rule.label)))
        .map(|rule| rule.label)
}

/// 라벨에 해당하는 배수 규칙 조회.
pub fn rule_for(label: &str) -> Option<&'static WarningRule> {
    WARNING_RULES.iter().find(|r| r.label == label)
}

/// 갱신 작업이 채워야 하는 보조 필드 집합 (카테고리 합집합).
pub fn required_refresh_fields(categories: &[String]) -> Vec<AuxField> {
    let mut needs = Vec::new();
    let has = |label: &str| categories.iter().any(|c| c.contains(label));
    if has("초단기예고") {
        needs.extend([AuxField::D3, AuxField::High]);
    }
    if has("단기예고") {
        needs.extend([AuxField::D5, AuxField::High]);
    }
    if has("단기불건전예고") {
        needs.push(AuxField::D5_45);
    }
    if has("장기예고") {
        needs.extend([AuxField::D15, AuxField::High]);
    }
    needs.sort_unstable();
    needs.dedup();
    needs
}

/// 투자경고 저장소 정렬용 카테고리 우선순위 (작을수록 먼저).
const WARNING_DISPLAY_ORDER: [&str; 7] = [
    "단기예고",
    "장기예고",
    "초단기예고",
    "단기불건전예고",
    "초장기불건전예고",
    "지정",
    RELEASE_LABEL,
];

/// 레코드 카테고리들 중 가장 높은 표시 우선순위(=가장 작은 순위).
///
/// 완전일치를 먼저 보고, 부분일치는 가장 긴 라벨을 우선해 "지정"이
/// "지정해제 및 재지정 예고"를 잡아먹지 않도록 한다.
pub fn warning_display_rank(categories: &[String]) -> usize {
    if categories.is_empty() {
        return WARNING_DISPLAY_ORDER.len() + 99;
    }

    let mut best = WARNING_DISPLAY_ORDER.len() + 99;
    for c in categories {
        if let Some(rank) = WARNING_DISPLAY_ORDER
            .iter()
            .position(|label| *label == c.as_str())
        {
            best = best.min(rank);
            continue;
        }
        let mut matches: Vec<(usize, usize)> = Vec::new();
        for (rank, label) in WARNING_DISPLAY_ORDER.iter().enumerate() {
            if c.contains(label) {
                matches.push((label.chars().count(), rank));
            }
        }
        // 긴 라벨 우선, 길이가 같으면 낮은 순위 우선
        matches.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        if let Some(&(_, rank)) = matches.first() {
            best = best.min(rank);
        }
    }
    best
}

/// 공시 목록 메시지의 섹션별 라벨 우선순위.
pub fn section_priority(section: &str) -> &'static [&'static str] {
    match section {
        "투자주의" => &["소수계좌 매수관여", "소수계좌 거래집중", "단일계좌 거래량 상위"],
        "단기과열" => &["지정예고", "지정"],
        "투자경고" => &[
            "초단기예고",
            "단기예고",
            "단기불건전예고",
            "장기예고",
            "초장기불건전예고",
            "재지정예고",
            "재지정",
            "지정",
        ],
        "투자위험" => &["투위예고", "투위해제", "투위지정"],
        "거래정지" => &["정지예고", "투경정지", "투위최초정지", "투위중정지"],
        _ => &[],
    }
}

/// 섹션 기준 카테고리 우선순위 (매칭 없으면 [`UNRANKED`]).
pub fn section_rank(section: &str, categories: &[String]) -> usize {
    let order = section_priority(section);
    if order.is_empty() || categories.is_empty() {
        return UNRANKED;
    }
    for (rank, label) in order.iter().enumerate() {
        if categories.iter().any(|c| c.contains(label)) {
            return rank;
        }
    }
    UNRANKED
}
