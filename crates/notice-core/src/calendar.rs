//! 달력 키 정규화.
//!
//! 수집 경로마다 제각각인 날짜 표기를 8자리 `YYYYMMDD` 키로 통일합니다.
//! 파싱에 실패하면 빈 문자열을 반환하며, 호출자는 빈 값을 "날짜 불명"으로
//! 취급합니다 (에러로 전파하지 않음).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// 임의 문자열을 `YYYYMMDD` 키로 정규화.
///
/// 허용 형태 (우선순위 순):
/// 1. 숫자 8자리 이상 — 앞 8자리를 실제 달력 날짜로 검증
/// 2. `YYYY-MM-DD` / `YYYY/MM/DD` / `YYYY.MM.DD` — 앞 10글자만 사용
/// 3. ISO-8601 타임스탬프 (`Z`는 UTC 오프셋 0으로 해석)
pub fn normalize_ymd(value: &str) -> String {
    let s = value.trim();
    if s.is_empty() {
        return String::new();
    }

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 8 {
        let ymd = &digits[..8];
        if NaiveDate::parse_from_str(ymd, "%Y%m%d").is_ok() {
            return ymd.to_string();
        }
    }

    let head: String = s.chars().take(10).collect();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(&head, fmt) {
            return d.format("%Y%m%d").to_string();
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")) {
        return dt.format("%Y%m%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y%m%d").to_string();
    }

    String::new()
}

/// JSON 값(문자열/숫자)을 `YYYYMMDD` 키로 정규화.
pub fn normalize_ymd_value(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_ymd(s),
        Value::Number(n) => normalize_ymd(&n.to_string()),
        _ => String::new(),
    }
}

/// `YYYYMMDD` 키를 [`NaiveDate`]로 변환.
pub fn parse_ymd(ymd: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(ymd, "%Y%m%d").ok()
}
