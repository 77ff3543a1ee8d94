//! 리포트 조립.
//!
//! 저장소/공시 파일을 읽어 당일 필터를 적용하고, 포맷터(notification 크레이트)로
//! 메시지를 만듭니다. 파일 IO는 여기까지 — 포맷터는 순수 함수입니다.

use serde_json::Value;

use notice_core::calendar::normalize_ymd;
use notice_core::category::has_release_category;
use notice_core::{notice, DesignationRecord};

use crate::config::CollectorConfig;
use crate::modules::store::{load_json_array, load_records};

/// 공시 목록 메시지의 섹션 데이터 로드 (당일 필터 적용).
pub fn listing_sections(config: &CollectorConfig, base_ymd: &str) -> Vec<(String, Vec<Value>)> {
    config
        .listing_sources()
        .into_iter()
        .map(|(title, path)| {
            let entries: Vec<Value> = load_json_array(&path)
                .into_iter()
                .filter(|item| notice::is_same_day(item, base_ymd))
                .collect();
            (title.to_string(), entries)
        })
        .collect()
}

/// 당일 공시 목록 메시지.
pub fn build_listing_message(config: &CollectorConfig, base_ymd: &str) -> String {
    let sections = listing_sections(config, base_ymd);
    notice_notification::message::build_notice_listing(base_ymd, &sections)
}

/// 당일 기준가 다이제스트 (보낼 내용 없으면 `None`).
///
/// 투자경고 쪽은 지정해제/재지정 레코드를 제외한다 — 해제 가격은
/// 기준가 다이제스트의 대상이 아니다.
pub fn build_digest_message(config: &CollectorConfig, base_ymd: &str) -> Option<String> {
    let today = |rec: &DesignationRecord| normalize_ymd(&rec.date) == base_ymd;

    let overheating_today: Vec<DesignationRecord> = load_records(&config.overheating_store_path())
        .into_iter()
        .filter(today)
        .collect();

    let warning_today: Vec<DesignationRecord> = load_records(&config.warning_store_path())
        .into_iter()
        .filter(|rec| today(rec) && !has_release_category(&rec.categories))
        .collect();

    notice_notification::message::build_price_digest(&overheating_today, &warning_today)
}
