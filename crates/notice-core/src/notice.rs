//! 원시 공시 JSON 접근 헬퍼.
//!
//! 수집기(외부 협력자)가 남긴 공시 배열은 소스마다 날짜 필드명이 달라
//! 넓은 후보 목록을 순서대로 검사합니다.

use serde_json::Value;

use crate::calendar::normalize_ymd_value;
use crate::category::normalize_categories;

/// 공시 항목에서 인정하는 날짜 필드명 후보.
pub const DATE_FIELD_CANDIDATES: &[&str] = &[
    "base_date",
    "baseDate",
    "date",
    "noticed_at",
    "notice_date",
    "noticeDt",
    "publish_date",
    "reg_date",
    "disclosure_date",
    "disclosureDt",
    "time",
    "timestamp",
    "created_at",
    "yyyymmdd",
];

/// 공시 항목의 유효 기준일 (`YYYYMMDD`, 없으면 빈 문자열).
pub fn notice_date(item: &Value) -> String {
    for key in DATE_FIELD_CANDIDATES {
        if let Some(v) = item.get(key) {
            let ymd = normalize_ymd_value(v);
            if !ymd.is_empty() {
                return ymd;
            }
        }
    }
    String::new()
}

/// 공시 항목이 기준일 당일 것인지 판별.
pub fn is_same_day(item: &Value, base_ymd: &str) -> bool {
    DATE_FIELD_CANDIDATES.iter().any(|key| {
        item.get(key)
            .map(|v| {
                let ymd = normalize_ymd_value(v);
                !ymd.is_empty() && ymd == base_ymd
            })
            .unwrap_or(false)
    })
}

/// 종목코드 필드 (공백 제거).
pub fn stock_code(item: &Value) -> String {
    item.get("stock_code")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// 종목명 필드 (공백 제거).
pub fn stock_name(item: &Value) -> String {
    item.get("stock_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// 카테고리 필드 (정규화된 목록).
pub fn categories(item: &Value) -> Vec<String> {
    item.get("categories")
        .map(normalize_categories)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notice_date_candidates() {
        let item = json!({ "reg_date": "2025-09-26", "title": "지정예고" });
        assert_eq!(notice_date(&item), "20250926");

        let item = json!({ "title": "지정예고" });
        assert_eq!(notice_date(&item), "");
    }

    #[test]
    fn test_is_same_day() {
        let item = json!({ "date": "2025-09-26" });
        assert!(is_same_day(&item, "20250926"));
        assert!(!is_same_day(&item, "20250925"));

        // 첫 후보가 비어도 다른 후보 필드로 판별
        let item = json!({ "base_date": "", "timestamp": "2025-09-26T09:00:00Z" });
        assert!(is_same_day(&item, "20250926"));
    }

    #[test]
    fn test_field_accessors() {
        let item = json!({
            "stock_code": " 000880 ",
            "stock_name": "한화",
            "categories": ["초단기예고", " "],
        });
        assert_eq!(stock_code(&item), "000880");
        assert_eq!(stock_name(&item), "한화");
        assert_eq!(categories(&item), vec!["초단기예고".to_string()]);
    }
}
