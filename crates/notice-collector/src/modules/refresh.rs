//! 과거 레코드 보조필드 갱신.
//!
//! 확정된 지정가는 건드리지 않고, 당일이 아닌 레코드의 보조 종가 필드만
//! 최신 시세로 다시 채웁니다. 0/결측 값은 기존 값을 덮지 않습니다.

use std::collections::BTreeMap;

use tracing::info;

use notice_core::category::{has_release_category, required_refresh_fields, AuxField};
use notice_core::calendar::normalize_ymd;
use notice_core::PriceHistoryProvider;

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::prices::{close_at_offset, rolling_high};
use crate::modules::store::{load_records, save_records};
use crate::stats::RefreshStats;

/// 갱신 시 조회하는 일별 시세 수.
const HISTORY_COUNT: usize = 60;
const AUX_HIGH_WINDOW: usize = 14;

/// 투자경고 저장소의 과거 레코드 보조필드 갱신.
///
/// - 지정해제/재지정 레코드: 전일 종가를 `D-2_price`로
/// - 그 외: 카테고리 합집합이 요구하는 필드만 당일 기준 오프셋으로
pub async fn refresh_warning_aux(
    prices: &dyn PriceHistoryProvider,
    config: &CollectorConfig,
    today_ymd: &str,
) -> Result<RefreshStats> {
    let path = config.warning_store_path();
    let mut records = load_records(&path);
    let mut stats = RefreshStats::default();

    if records.is_empty() {
        info!("투자경고 저장소 비어있음 — 갱신 대상 없음");
        return Ok(stats);
    }

    for rec in records.iter_mut() {
        let rec_date = normalize_ymd(&rec.date);
        if rec_date.is_empty() || rec_date == today_ymd {
            continue; // 당일 레코드는 계산 단계가 이미 채움
        }
        let code = rec.stock_code.trim().to_string();
        if code.is_empty() {
            stats.skipped += 1;
            continue;
        }

        let rows = prices.daily_prices(&code, today_ymd, HISTORY_COUNT).await;
        if rows.is_empty() {
            stats.skipped += 1;
            continue;
        }

        if has_release_category(&rec.categories) {
            let d2 = close_at_offset(&rows, 1).1;
            if d2 > 0 {
                rec.d2_price = Some(d2);
                stats.updated += 1;
            } else {
                stats.skipped += 1;
            }
            tokio::time::sleep(config.request_delay()).await;
            continue;
        }

        let needs = required_refresh_fields(&rec.categories);
        if needs.is_empty() {
            stats.skipped += 1;
            continue;
        }

        let mut any_updated = false;
        for field in needs {
            let value = match field {
                AuxField::D3 => close_at_offset(&rows, 2).1,
                AuxField::D5 => close_at_offset(&rows, 4).1,
                AuxField::D5_45 => close_at_offset(&rows, 4).1,
                AuxField::D15 => close_at_offset(&rows, 14).1,
                AuxField::High => rolling_high(&rows, AUX_HIGH_WINDOW).0,
            };
            if value > 0 {
                match field {
                    AuxField::D3 => rec.d3_price = Some(value),
                    AuxField::D5 => rec.d5_price = Some(value),
                    AuxField::D5_45 => rec.d5_45_price = Some(value),
                    AuxField::D15 => rec.d15_price = Some(value),
                    AuxField::High => rec.high_price = Some(value),
                }
                any_updated = true;
            }
        }

        if any_updated {
            stats.updated += 1;
        } else {
            stats.skipped += 1;
        }
        tokio::time::sleep(config.request_delay()).await;
    }

    save_records(&path, &records)?;
    Ok(stats)
}

/// 단기과열 저장소 전 레코드에 전일 종가(`D-1_price`) 반영.
pub async fn refresh_overheating_aux(
    prices: &dyn PriceHistoryProvider,
    config: &CollectorConfig,
    today_ymd: &str,
) -> Result<RefreshStats> {
    let path = config.overheating_store_path();
    let mut records = load_records(&path);
    let mut stats = RefreshStats::default();

    if records.is_empty() {
        info!("단기과열 저장소 비어있음 — 갱신 대상 없음");
        return Ok(stats);
    }

    // 코드 단위로 최신 종가를 먼저 모아 중복 조회를 줄인다
    let codes: std::collections::BTreeSet<String> = records
        .iter()
        .map(|r| r.stock_code.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let mut latest_close: BTreeMap<String, i64> = BTreeMap::new();
    for code in &codes {
        let rows = prices.daily_prices(code, today_ymd, HISTORY_COUNT).await;
        let close = rows.first().map(|r| r.close).unwrap_or(0);
        latest_close.insert(code.clone(), close);
        tokio::time::sleep(config.request_delay()).await;
    }

    for rec in records.iter_mut() {
        let code = rec.stock_code.trim();
        if code.is_empty() {
            stats.skipped += 1;
            continue;
        }
        match latest_close.get(code) {
            Some(&close) if close > 0 => {
                rec.d1_price = Some(close);
                stats.updated += 1;
            }
            _ => stats.skipped += 1,
        }
    }

    save_records(&path, &records)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notice_core::{DailyPrice, DesignationRecord};
    use std::path::PathBuf;

    struct FixedPrices(Vec<DailyPrice>);

    #[async_trait]
    impl PriceHistoryProvider for FixedPrices {
        async fn daily_prices(&self, _code: &str, _base: &str, _count: usize) -> Vec<DailyPrice> {
            self.0.clone()
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> CollectorConfig {
        CollectorConfig {
            data_dir: PathBuf::from(dir.path()),
            keep_days: 10,
            base_date: None,
            request_delay_ms: 0,
        }
    }

    fn rows() -> Vec<DailyPrice> {
        (0..20)
            .map(|i| DailyPrice::new(format!("202509{:02}", 26 - i), 10000 - i as i64 * 100))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_skips_today_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let mut today = DesignationRecord::new("한화", "000880", vec!["초단기예고".into()], "20250926");
        today.d3_price = Some(1);
        save_records(&config.warning_store_path(), &[today.clone()]).unwrap();

        let stats = refresh_warning_aux(&FixedPrices(rows()), &config, "20250926")
            .await
            .unwrap();
        assert_eq!(stats.updated, 0);

        let stored = load_records(&config.warning_store_path());
        assert_eq!(stored[0].d3_price, Some(1)); // 당일 레코드 보존
    }

    #[tokio::test]
    async fn test_refresh_patches_past_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let past = DesignationRecord::new("한화", "000880", vec!["초단기예고".into()], "20250924");
        save_records(&config.warning_store_path(), &[past]).unwrap();

        let stats = refresh_warning_aux(&FixedPrices(rows()), &config, "20250926")
            .await
            .unwrap();
        assert_eq!(stats.updated, 1);

        let stored = load_records(&config.warning_store_path());
        assert_eq!(stored[0].d3_price, Some(9800)); // 당일 기준 2영업일 전
        assert_eq!(stored[0].high_price, Some(10000));
        assert_eq!(stored[0].first_price, None); // 지정가는 손대지 않음
    }

    #[tokio::test]
    async fn test_refresh_release_record_gets_d2() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let release = DesignationRecord::new(
            "한화",
            "000880",
            vec!["지정해제 및 재지정 예고".into()],
            "20250924",
        );
        save_records(&config.warning_store_path(), &[release]).unwrap();

        refresh_warning_aux(&FixedPrices(rows()), &config, "20250926")
            .await
            .unwrap();

        let stored = load_records(&config.warning_store_path());
        assert_eq!(stored[0].d2_price, Some(9900)); // 전일 종가
    }

    #[tokio::test]
    async fn test_refresh_zero_value_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let mut past = DesignationRecord::new("한화", "000880", vec!["초단기예고".into()], "20250924");
        past.d3_price = Some(7777);
        save_records(&config.warning_store_path(), &[past]).unwrap();

        // 종가가 전부 0인 비정상 시세
        let zero_rows: Vec<DailyPrice> =
            (0..20).map(|i| DailyPrice::new(format!("202509{:02}", 26 - i), 0)).collect();
        let stats = refresh_warning_aux(&FixedPrices(zero_rows), &config, "20250926")
            .await
            .unwrap();
        assert_eq!(stats.updated, 0);

        let stored = load_records(&config.warning_store_path());
        assert_eq!(stored[0].d3_price, Some(7777));
    }

    #[tokio::test]
    async fn test_overheating_refresh_sets_d1() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let rec = DesignationRecord::new("나래", "222220", vec!["단기과열 지정예고".into()], "20250924");
        save_records(&config.overheating_store_path(), &[rec]).unwrap();

        let stats = refresh_overheating_aux(&FixedPrices(rows()), &config, "20250926")
            .await
            .unwrap();
        assert_eq!(stats.updated, 1);

        let stored = load_records(&config.overheating_store_path());
        assert_eq!(stored[0].d1_price, Some(10000)); // 최신 종가
    }
}
