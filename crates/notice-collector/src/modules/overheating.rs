//! 단기과열 기준가 기록.
//!
//! 배수 규칙 없이 당일(또는 가장 근접 최신일) 종가를 그대로 기록합니다.
//! "지정예고"는 `first_price`, "지정" 확정은 `designated_price` — 한 공시가
//! 둘 다 달고 있으면 두 필드 모두 채웁니다.

use tracing::{debug, info, warn};

use notice_core::category::{has_overheating_designation, has_overheating_notice};
use notice_core::{DesignationRecord, PriceHistoryProvider, TradingCalendar};

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::prices::close_on_or_nearest;
use crate::modules::store::{load_json_array, upsert_store};
use crate::modules::targets::{collect_targets, NoticeTarget};
use crate::stats::CalcStats;

const HISTORY_COUNT: usize = 40;

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

        let rows = prices.daily_prices(code, base_ymd, HISTORY_COUNT).await;
        if rows.is_empty() {
            warn!(stock = %name, code = %code, "시세 데이터 없음");
            stats.no_data += 1;
            continue;
        }

        let (applied_date, close) = close_on_or_nearest(&rows, base_ymd);
        let has_notice = has_overheating_notice(&t.categories);
        let has_designation = has_overheating_designation(&t.categories);

        if !(has_notice || has_designation) {
            debug!(stock = %name, code = %code, "인식 가능한 단기과열 분류 없음");
            stats.skipped += 1;
            continue;
        }

        let mut rec = DesignationRecord::new(name, code, t.categories.clone(), base_ymd);
        if has_notice {
            rec.first_price = Some(close);
            info!(
                stock = %name,
                code = %code,
                first_price = close,
                applied_date = %applied_date,
                "단기과열 지정예고"
            );
        }
        if has_designation {
            rec.designated_price = Some(close);
            info!(
                stock = %name,
                code = %code,
                designated_price = close,
                applied_date = %applied_date,
                "단기과열 지정"
            );
        }
        out.push(rec);
        stats.computed += 1;
    }

    (out, stats)
}

/// 단기과열 공시 → 종가 기록 → 저장소 업서트.
pub async fn calc_overheating_prices(
    prices: &dyn PriceHistoryProvider,
    cal: &dyn TradingCalendar,
    config: &CollectorConfig,
    base_ymd: &str,
) -> Result<CalcStats> {
    let notices = load_json_array(&config.overheating_notices_path());
    // 업서트 키가 카테고리까지 포함하므로 코드 중복 제거 없이 모두 처리
    let targets = collect_targets(&notices, base_ymd, false);
    info!(base_date = %base_ymd, targets = targets.len(), "단기과열 대상");

    let (records, mut stats) = compute_records(prices, base_ymd, &targets).await;
    stats.store_total = upsert_store(
        cal,
        &config.overheating_store_path(),
        base_ymd,
        records,
        config.keep_days,
    )
    .await?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notice_core::DailyPrice;

    struct FixedPrices(Vec<DailyPrice>);

    #[async_trait]
    impl PriceHistoryProvider for FixedPrices {
        async fn daily_prices(&self, _code: &str, _base: &str, _count: usize) -> Vec<DailyPrice> {
            self.0.clone()
        }
    }

    fn target(cats: &[&str]) -> NoticeTarget {
        NoticeTarget {
            stock_code: "222220".to_string(),
            stock_name: "나래".to_string(),
            categories: cats.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_notice_stores_first_price() {
        let prices = FixedPrices(vec![DailyPrice::new("20250926", 5120)]);
        let (records, stats) =
            compute_records(&prices, "20250926", &[target(&["단기과열 지정예고"])]).await;

        assert_eq!(stats.computed, 1);
        assert_eq!(records[0].first_price, Some(5120));
        assert_eq!(records[0].designated_price, None);
    }

    #[tokio::test]
    async fn test_designation_stores_designated_price() {
        let prices = FixedPrices(vec![DailyPrice::new("20250926", 5120)]);
        let (records, _) =
            compute_records(&prices, "20250926", &[target(&["단기과열 지정"])]).await;

        assert_eq!(records[0].designated_price, Some(5120));
        assert_eq!(records[0].first_price, None);
    }

    #[tokio::test]
    async fn test_unrecognized_category_skipped() {
        let prices = FixedPrices(vec![DailyPrice::new("20250926", 5120)]);
        let (records, stats) =
            compute_records(&prices, "20250926", &[target(&["기타 분류"])]).await;

        assert!(records.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_empty_history_omitted() {
        let prices = FixedPrices(Vec::new());
        let (records, stats) =
            compute_records(&prices, "20250926", &[target(&["단기과열 지정예고"])]).await;

        assert!(records.is_empty());
        assert_eq!(stats.no_data, 1);
    }

    #[tokio::test]
    async fn test_nearest_close_fallback() {
        // 기준일 행이 아직 없으면 최신 행 종가 사용
        let prices = FixedPrices(vec![DailyPrice::new("20250925", 4980)]);
        let (records, _) =
            compute_records(&prices, "20250926", &[target(&["단기과열 지정예고"])]).await;

        assert_eq!(records[0].first_price, Some(4980));
    }
}
