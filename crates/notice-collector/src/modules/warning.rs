//! 투자경고 기준가 계산.
//!
//! 당일 투자경고 공시의 카테고리를 규칙 테이블에 대응시켜 지정 기준가를
//! 계산하고, 다음날 독립 갱신에 쓰일 보조 종가 필드를 함께 저장합니다.
//! "지정해제 및 재지정 예고"는 기준가 규칙이 아니라 해제 기준 종가만
//! 기록하는 별도 경로입니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use notice_core::category::{
    has_release_category, is_skip_category, match_warning_label, rule_for, HIGH_ONLY_LABEL,
};
use notice_core::{DailyPrice, DesignationRecord, PriceHistoryProvider, TradingCalendar};

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::prices::{close_at_anchor_offset, close_at_offset, rolling_high};
use crate::modules::store::{load_json_array, upsert_store};
use crate::modules::targets::{collect_targets, NoticeTarget};
use crate::stats::CalcStats;

/// 계산 시 조회하는 일별 시세 수.
const HISTORY_COUNT: usize = 40;
/// 지정가 비교에 쓰는 신고가 창 (영업일).
const DESIGNATION_HIGH_WINDOW: usize = 15;
/// 보조 필드에 저장하는 신고가 창 (영업일).
const AUX_HIGH_WINDOW: usize = 14;

/// 규칙 기준가 계산.
///
/// 반환: (지정가, 기준일, 기준일 종가).
/// - 초장기불건전예고: 최근 15영업일 신고가만 사용
/// - 그 외: `max(기준 종가 × 배수, 15영업일 신고가)` — 같으면 규칙 쪽
///   기준일을 보고한다 (`>=`)
pub fn calc_designation_price(rows: &[DailyPrice], label: &str) -> (i64, String, i64) {
    if rows.is_empty() {
        return (0, "-".to_string(), 0);
    }

    let (high, high_date) = rolling_high(rows, DESIGNATION_HIGH_WINDOW);
    if label == HIGH_ONLY_LABEL {
        return (high, high_date, high);
    }

    let Some(rule) = rule_for(label) else {
        return (high, high_date, high);
    };

    let (base_date, base_close) = close_at_anchor_offset(rows, rule.offset_business_days);
    let rule_price = if base_close > 0 {
        (Decimal::from(base_close) * rule.multiplier)
            .trunc()
            .to_i64()
            .unwrap_or(0)
    } else {
        0
    };

    if rule_price >= high {
        (rule_price, base_date, base_close)
    } else {
        (high, high_date, high)
    }
}

/// 카테고리별 보조 종가 필드 채우기 (당일 기준 오프셋).
fn attach_aux_fields(rec: &mut DesignationRecord, label: &str, rows: &[DailyPrice]) {
    let high = rolling_high(rows, AUX_HIGH_WINDOW).0;
    match label {
        "초단기예고" => {
            rec.d3_price = Some(close_at_offset(rows, 2).1);
            rec.high_price = Some(high);
        }
        "단기예고" => {
            rec.d5_price = Some(close_at_offset(rows, 4).1);
            rec.high_price = Some(high);
        }
        "단기불건전예고" => {
            rec.d5_45_price = Some(close_at_offset(rows, 4).1);
            rec.high_price = Some(high);
        }
        "장기예고" => {
            rec.d15_price = Some(close_at_offset(rows, 14).1);
            rec.high_price = Some(high);
        }
        HIGH_ONLY_LABEL => {
            rec.high_price = Some(high);
        }
        _ => {}
    }
}

/// 대상 종목들에 대해 레코드 계산.
pub async fn compute_records(
    prices: &dyn PriceHistoryProvider,
    base_ymd: &str,
    targets: &[NoticeTarget],
) -> (Vec<DesignationRecord>, CalcStats) {
    let mut stats = CalcStats {
        targets: targets.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for t in targets {
        let code = t.stock_code.as_str();
        let name = t.stock_name.as_str();

        // 1) 지정해제/재지정 예고 — 전 거래일 종가를 해제 기준으로 기록
        if has_release_category(&t.categories) {
            let rows = prices.daily_prices(code, base_ymd, HISTORY_COUNT).await;
            if rows.is_empty() {
                warn!(stock = %name, code = %code, "지정해제/재지정: 시세 데이터 없음");
                stats.no_data += 1;
                continue;
            }
            let (applied_date, close) = close_at_offset(&rows, 1);
            info!(
                stock = %name,
                code = %code,
                release_price = close,
                applied_date = %applied_date,
                "지정해제 및 재지정 예고"
            );
            let mut rec =
                DesignationRecord::new(name, code, t.categories.clone(), base_ymd);
            rec.release_price = Some(close);
            out.push(rec);
            stats.computed += 1;
            continue;
        }

        // 2) 지정/재지정 등 계산 제외 분류
        if is_skip_category(&t.categories) {
            debug!(stock = %name, code = %code, "계산 생략 (제외 분류)");
            stats.skipped += 1;
            continue;
        }

        // 3) 규칙 라벨 식별
        let Some(label) = match_warning_label(&t.categories) else {
            debug!(stock = %name, code = %code, "계산 생략 (해당 규칙 없음)");
            stats.skipped += 1;
            continue;
        };

        let rows = prices.daily_prices(code, base_ymd, HISTORY_COUNT).await;
        if rows.is_empty() {
            warn!(stock = %name, code = %code, "시세 데이터 없음");
            stats.no_data += 1;
            continue;
        }

        let (designated, base_date, base_close) = calc_designation_price(&rows, label);
        if designated <= 0 {
            warn!(stock = %name, code = %code, label = %label, "기준가 계산 실패");
            stats.skipped += 1;
            continue;
        }

        info!(
            stock = %name,
            code = %code,
            label = %label,
            designated = designated,
            base_date = %base_date,
            base_close = base_close,
            "투자경고 기준가"
        );

        let mut rec = DesignationRecord::new(name, code, t.categories.clone(), base_ymd);
        rec.first_price = Some(designated);
        attach_aux_fields(&mut rec, label, &rows);
        out.push(rec);
        stats.computed += 1;
    }

    (out, stats)
}

/// 투자경고 공시 → 기준가 계산 → 저장소 업서트.
pub async fn calc_warning_prices(
    prices: &dyn PriceHistoryProvider,
    cal: &dyn TradingCalendar,
    config: &CollectorConfig,
    base_ymd: &str,
) -> Result<CalcStats> {
    let notices = load_json_array(&config.warning_notices_path());
    let targets = collect_targets(&notices, base_ymd, true);
    info!(base_date = %base_ymd, targets = targets.len(), "투자경고 대상");

    let (records, mut stats) = compute_records(prices, base_ymd, &targets).await;
    stats.store_total = upsert_store(
        cal,
        &config.warning_store_path(),
        base_ymd,
        records,
        config.keep_days,
    )
    .await?;
    Ok(stats)
}
