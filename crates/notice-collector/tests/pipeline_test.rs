//! 파이프라인 통합 테스트.
//!
//! 공시 JSON → 기준가 계산 → 업서트 저장까지를 목 제공자로 관통한다.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Datelike;
use serde_json::json;

use notice_collector::modules::store::load_records;
use notice_collector::modules::{calc_overheating_prices, calc_warning_prices};
use notice_collector::CollectorConfig;
use notice_core::calendar::parse_ymd;
use notice_core::{CalendarError, DailyPrice, DesignationRecord, PriceHistoryProvider, TradingCalendar};

// ================================================================================================
// 목 제공자
// ================================================================================================

/// 종목별 고정 시세.
struct MapPrices {
    rows: HashMap<String, Vec<DailyPrice>>,
}

#[async_trait]
impl PriceHistoryProvider for MapPrices {
    async fn daily_prices(&self, code: &str, _base: &str, count: usize) -> Vec<DailyPrice> {
        let mut rows = self.rows.get(code).cloned().unwrap_or_default();
        rows.truncate(count);
        rows
    }
}

/// 주말만 비영업일인 달력.
struct WeekdayCalendar;

#[async_trait]
impl TradingCalendar for WeekdayCalendar {
    async fn is_business_day(&self, ymd: &str) -> Result<bool, CalendarError> {
        let d = parse_ymd(ymd).ok_or_else(|| CalendarError::Lookup(ymd.to_string()))?;
        Ok(!matches!(d.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun))
    }
}

// ================================================================================================
// 헬퍼
// ================================================================================================

fn config_in(dir: &tempfile::TempDir) -> CollectorConfig {
    CollectorConfig {
        data_dir: PathBuf::from(dir.path()),
        keep_days: 10,
        base_date: None,
        request_delay_ms: 0,
    }
}

/// 2025-09-26(금) 기준 최신→과거 15영업일 시세.
fn history() -> Vec<DailyPrice> {
    let dates = [
        "20250926", "20250925", "20250924", "20250923", "20250922", "20250919", "20250918",
        "20250917", "20250916", "20250915", "20250912", "20250911", "20250910", "20250909",
        "20250908",
    ];
    let closes: [i64; 15] = [
        12000, 10000, 9800, 9600, 9400, 9000, 8800, 8600, 8400, 8200, 8000, 7800, 7600, 7400, 7200,
    ];
    dates
        .iter()
        .zip(closes)
        .map(|(d, c)| DailyPrice::new(*d, c))
        .collect()
}

fn prices_for(code: &str) -> MapPrices {
    MapPrices {
        rows: HashMap::from([(code.to_string(), history())]),
    }
}

fn write_warning_notices(config: &CollectorConfig, notices: serde_json::Value) {
    std::fs::write(config.warning_notices_path(), notices.to_string()).unwrap();
}

// ================================================================================================
// 투자경고 파이프라인
// ================================================================================================

#[tokio::test]
async fn test_short_term_rule_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_warning_notices(
        &config,
        json!([{
            "stock_name": "한화",
            "stock_code": "000880",
            "categories": ["단기예고"],
            "date": "2025-09-26",
        }]),
    );

    let stats = calc_warning_prices(&prices_for("000880"), &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();
    assert_eq!(stats.computed, 1);

    let records = load_records(&config.warning_store_path());
    assert_eq!(records.len(), 1);
    // 내일 기준 5영업일 전(rows[4]=9400) × 1.6 = 15040 > 15영업일 신고가 12000
    assert_eq!(records[0].first_price, Some(15040));
    assert_eq!(records[0].d5_price, Some(9400)); // 당일 기준 4영업일 전
    assert_eq!(records[0].high_price, Some(12000)); // 14영업일 신고가
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_warning_notices(
        &config,
        json!([
            { "stock_name": "한화", "stock_code": "000880", "categories": ["단기예고"], "date": "2025-09-26" },
            { "stock_name": "해제종목", "stock_code": "111110", "categories": ["지정해제 및 재지정 예고"], "date": "2025-09-26" },
        ]),
    );

    let prices = MapPrices {
        rows: HashMap::from([
            ("000880".to_string(), history()),
            ("111110".to_string(), history()),
        ]),
    };

    calc_warning_prices(&prices, &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();
    let first = std::fs::read(config.warning_store_path()).unwrap();

    calc_warning_prices(&prices, &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();
    let second = std::fs::read(config.warning_store_path()).unwrap();

    // 동일 입력 + 동일 시세 → 바이트 단위 동일 저장소
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_identity_key_unique_after_upsert() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    // 같은 종목, 카테고리 순서만 다른 두 공시 — 업서트 키는 동일해야 함
    write_warning_notices(
        &config,
        json!([
            { "stock_name": "한화", "stock_code": "000880", "categories": ["단기예고", "초단기예고"], "date": "2025-09-26" },
        ]),
    );

    calc_warning_prices(&prices_for("000880"), &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();

    // 기존 레코드의 카테고리 순서를 뒤집은 채 다시 실행
    let mut records = load_records(&config.warning_store_path());
    records[0].categories.reverse();
    notice_collector::modules::store::save_records(&config.warning_store_path(), &records).unwrap();

    calc_warning_prices(&prices_for("000880"), &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();

    let records = load_records(&config.warning_store_path());
    let keys: HashSet<_> = records.iter().map(|r| r.identity_key().unwrap()).collect();
    assert_eq!(records.len(), keys.len());
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_retention_purges_old_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_warning_notices(&config, json!([]));

    // 보관 범위(금요일 기준 영업일 10개 = 09/15..09/26) 밖의 레코드를 미리 심음
    let stale = DesignationRecord::new("옛종목", "999990", vec!["단기예고".into()], "20250901");
    let kept = DesignationRecord::new("신규종목", "888880", vec!["단기예고".into()], "20250922");
    notice_collector::modules::store::save_records(
        &config.warning_store_path(),
        &[stale, kept],
    )
    .unwrap();

    calc_warning_prices(
        &MapPrices { rows: HashMap::new() },
        &WeekdayCalendar,
        &config,
        "20250926",
    )
    .await
    .unwrap();

    let records = load_records(&config.warning_store_path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].stock_code, "888880");
}

#[tokio::test]
async fn test_release_category_produces_release_price() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_warning_notices(
        &config,
        json!([{
            "stock_name": "해제종목",
            "stock_code": "111110",
            "categories": ["지정해제 및 재지정 예고"],
            "date": "2025-09-26",
        }]),
    );

    calc_warning_prices(&prices_for("111110"), &WeekdayCalendar, &config, "20250926")
        .await
        .unwrap();

    let records = load_records(&config.warning_store_path());
    assert_eq!(records.len(), 1);
    // 스킵 필터에 걸리지 않고 전 거래일 종가가 release_price로
    assert_eq!(records[0].release_price, Some(10000));
    assert_eq!(records[0].first_price, None);
}

#[tokio::test]
async fn test_empty_history_stock_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    write_warning_notices(
        &config,
        json!([{
            "stock_name": "시세없음",
            "stock_code": "777770",
            "categories": ["단기예고"],
            "date": "2025-09-26",
        }]),
    );

    let stats = calc_warning_prices(
        &MapPrices { rows: HashMap::new() },
        &WeekdayCalendar,
        &config,
        "20250926",
    )
    .await
    .unwrap();

    assert_eq!(stats.no_data, 1);
    // 0원 자리 표시 레코드 없이 통째로 빠져야 함
    assert!(load_records(&config.warning_store_path()).is_empty());
}

// ================================================================================================
// 단기과열 파이프라인
// ================================================================================================

#[tokio::test]
async fn test_overheating_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    std::fs::write(
        config.overheating_notices_path(),
        json!([
            { "stock_name": "나래", "stock_code": "222220", "categories": ["단기과열 지정예고"], "date": "2025-09-26" },
            { "stock_name": "나래", "stock_code": "222220", "categories": ["단기과열 지정"], "date": "2025-09-26" },
        ])
        .to_string(),
    )
    .unwrap();

    let stats = calc_overheating_prices(
        &prices_for("222220"),
        &WeekdayCalendar,
        &config,
        "20250926",
    )
    .await
    .unwrap();
    assert_eq!(stats.computed, 2);

    // 카테고리가 달라 키가 다름 — 두 레코드 모두 보존
    let records = load_records(&config.overheating_store_path());
    assert_eq!(records.len(), 2);

    let notice = records.iter().find(|r| r.first_price.is_some()).unwrap();
    let designation = records.iter().find(|r| r.designated_price.is_some()).unwrap();
    assert_eq!(notice.first_price, Some(12000));
    assert_eq!(designation.designated_price, Some(12000));
}
