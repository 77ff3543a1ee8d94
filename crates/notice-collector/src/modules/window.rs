//! 영업일 보관 범위 계산.
//!
//! 오라클에 하루씩 물어보며 뒤로 걷는 단순한 방식입니다. 실제 시장 달력에서
//! 연휴가 열흘을 넘는 일은 없으므로 탐색 상한을 두고, 넘으면 크게 실패합니다.

use chrono::Duration;
use tracing::warn;

use notice_core::calendar::parse_ymd;
use notice_core::{CalendarError, TradingCalendar};

/// 연속 비영업일 탐색 상한 (달력일).
const MAX_SCAN_DAYS: usize = 30;

/// `ymd`와 같거나 그 이전 중 가장 가까운 영업일.
pub async fn nearest_business_day_on_or_before(
    cal: &dyn TradingCalendar,
    ymd: &str,
) -> Result<String, CalendarError> {
    let mut d = parse_ymd(ymd)
        .ok_or_else(|| CalendarError::Lookup(format!("기준일 파싱 실패: {}", ymd)))?;

    for _ in 0..=MAX_SCAN_DAYS {
        let key = d.format("%Y%m%d").to_string();
        if cal.is_business_day(&key).await? {
            return Ok(key);
        }
        d -= Duration::days(1);
    }
    Err(CalendarError::Exhausted(format!(
        "{} 이전 {}일 내 영업일 없음",
        ymd, MAX_SCAN_DAYS
    )))
}

/// `anchor_ymd` 기준 최근 `n`영업일 범위 `(cutoff, anchor)`.
///
/// `anchor`는 `anchor_ymd`와 같거나 그 이전의 최근 영업일,
/// `cutoff`는 anchor를 포함해 영업일 `n`개를 거슬러 올라간 날짜.
/// 닫힌 구간 `[cutoff, anchor]`에는 오라클 기준 영업일이 정확히 `n`개 있다.
pub async fn business_day_cutoff(
    cal: &dyn TradingCalendar,
    anchor_ymd: &str,
    n: usize,
) -> Result<(String, String), CalendarError> {
    let anchor = nearest_business_day_on_or_before(cal, anchor_ymd).await?;
    let mut d = parse_ymd(&anchor)
        .ok_or_else(|| CalendarError::Lookup(format!("기준일 파싱 실패: {}", anchor)))?;

    let mut kept = 1; // anchor 포함
    let mut misses = 0;
    while kept < n {
        d -= Duration::days(1);
        let key = d.format("%Y%m%d").to_string();
        if cal.is_business_day(&key).await? {
            kept += 1;
            misses = 0;
        } else {
            misses += 1;
            if misses > MAX_SCAN_DAYS {
                return Err(CalendarError::Exhausted(format!(
                    "{} 이전 {}일 내 영업일 없음",
                    key, MAX_SCAN_DAYS
                )));
            }
        }
    }
    Ok((d.format("%Y%m%d").to_string(), anchor))
}

/// 보관 범위 결정 (오라클 실패 시 달력일 폴백).
///
/// 폴백은 원시 기준일에서 달력일 `n`일짜리 창 — 성능 저하일 뿐 치명 오류가
/// 아니다.
pub async fn retention_window(
    cal: &dyn TradingCalendar,
    base_ymd: &str,
    n: usize,
) -> (String, String) {
    match business_day_cutoff(cal, base_ymd, n).await {
        Ok(window) => window,
        Err(e) => {
            warn!("영업일 범위 계산 실패, 달력일 폴백: {}", e);
            let cutoff = parse_ymd(base_ymd)
                .map(|d| (d - Duration::days(n as i64 - 1)).format("%Y%m%d").to_string())
                .unwrap_or_else(|| base_ymd.to_string());
            (cutoff, base_ymd.to_string())
        }
    }
}
