//! 업서트 저장소.
//!
//! 카테고리 계열별로 JSON 문서 하나 — 매 실행마다 통째로 읽어 병합하고
//! 통째로 다시 씁니다 (append 아님). 쓰기는 임시 파일 + rename의 원자적
//! 교체라 중간에 죽어도 저장소는 이전 상태 그대로 남습니다.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use notice_core::calendar::normalize_ymd;
use notice_core::category::{category_key_of, warning_display_rank};
use notice_core::{DesignationRecord, TradingCalendar};

use crate::error::Result;
use crate::modules::window::retention_window;

/// JSON 배열 파일 로드 (없음/빈 파일/손상 → 빈 목록).
pub fn load_json_array(path: &Path) -> Vec<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => s,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(path = %path.display(), "JSON 배열이 아님 — 빈 목록으로 취급");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), "JSON 파싱 실패 — 빈 목록으로 취급: {}", e);
            Vec::new()
        }
    }
}

/// 지정 레코드 저장소 로드. 역직렬화 안 되는 항목은 경고 후 버린다.
pub fn load_records(path: &Path) -> Vec<DesignationRecord> {
    load_json_array(path)
        .into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(rec) => Some(rec),
            Err(e) => {
                warn!(path = %path.display(), "레코드 역직렬화 실패, 제외: {}", e);
                None
            }
        })
        .collect()
}

/// 저장소를 원자적으로 저장 (임시 파일 → rename).
pub fn save_records(path: &Path, records: &[DesignationRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(records)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// 보관 범위 필터 + 동일성 키 업서트 + 결정적 정렬.
///
/// 동일 키 `(date, stock_code, 카테고리 키)`는 신규 레코드가 기존을 통째로
/// 교체한다 (필드 병합 아님). 범위 밖 날짜는 무조건 제거.
pub fn merge_records(
    existing: Vec<DesignationRecord>,
    cutoff: &str,
    anchor: &str,
    new_rows: Vec<DesignationRecord>,
) -> Vec<DesignationRecord> {
    let in_window = |rec: &DesignationRecord| {
        let ymd = normalize_ymd(&rec.date);
        !ymd.is_empty() && ymd.as_str() >= cutoff && ymd.as_str() <= anchor
    };

    let mut index: HashMap<(String, String, String), DesignationRecord> = HashMap::new();
    for rec in existing.into_iter().filter(in_window) {
        if let Some(key) = rec.identity_key() {
            index.insert(key, rec);
        }
    }
    for rec in new_rows {
        if let Some(key) = rec.identity_key() {
            index.insert(key, rec); // 동일 키면 덮어쓰기
        }
    }

    let mut merged: Vec<DesignationRecord> = index.into_values().collect();
    sort_records(&mut merged);
    merged
}

/// 표시 순서 정렬: 날짜 블록 내림차순, 블록 안에서는
/// 카테고리 우선순위 → 종목명 → 코드(6자리 패딩) → 카테고리 키 오름차순.
pub fn sort_records(records: &mut [DesignationRecord]) {
    records.sort_by(|a, b| {
        let key = |r: &DesignationRecord| {
            (
                std::cmp::Reverse(normalize_ymd(&r.date)),
                warning_display_rank(&r.categories),
                r.stock_name.trim().to_string(),
                format!("{:0>6}", r.stock_code.trim()),
                category_key_of(&r.categories),
            )
        };
        key(a).cmp(&key(b))
    });
}

/// 저장소에 신규 레코드 업서트 후 저장. 병합 결과 건수를 반환.
pub async fn upsert_store(
    cal: &dyn TradingCalendar,
    path: &Path,
    base_ymd: &str,
    new_rows: Vec<DesignationRecord>,
    keep_days: usize,
) -> Result<usize> {
    let (cutoff, anchor) = retention_window(cal, base_ymd, keep_days).await;
    debug!(cutoff = %cutoff, anchor = %anchor, "보관 범위");

    let existing = load_records(path);
    let merged = merge_records(existing, &cutoff, &anchor, new_rows);
    save_records(path, &merged)?;
    Ok(merged.len())
}
