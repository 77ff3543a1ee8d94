//! 지정 레코드와 일별 시세 행 모델.

use serde::{Deserialize, Serialize};

use crate::calendar::normalize_ymd;
use crate::category::category_key_of;

/// 한 종목의 하루 치 시세 요약.
///
/// 조회 결과 시퀀스는 반드시 최신→과거 순이어야 오프셋 조회가 의미를 가진다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPrice {
    /// 거래일 (`YYYYMMDD`)
    pub date: String,
    /// 종가 (원 단위 정수)
    pub close: i64,
}

impl DailyPrice {
    pub fn new(date: impl Into<String>, close: i64) -> Self {
        Self {
            date: date.into(),
            close,
        }
    }
}

/// 업서트 저장소에 영속되는 지정 레코드.
///
/// 동일성 키는 `(date, stock_code, 카테고리 키)` — 같은 키의 레코드는
/// 최대 1건만 존재하며, 재계산 시 레코드 전체가 교체된다 (필드 병합 아님).
/// 직렬화 필드명은 저장 파일의 기존 포맷을 따른다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignationRecord {
    pub stock_name: String,
    pub stock_code: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// 공시 기준일 (`YYYYMMDD`)
    pub date: String,

    /// 계산된 지정가 (투자경고 예고) / 당일 종가 (단기과열 지정예고)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_price: Option<i64>,
    /// 단기과열 지정 확정 시 당일 종가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designated_price: Option<i64>,
    /// 지정해제 및 재지정 예고: 당일(또는 가장 근접 최신일) 종가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_price: Option<i64>,

    #[serde(rename = "D-3_price", skip_serializing_if = "Option::is_none")]
    pub d3_price: Option<i64>,
    #[serde(rename = "D-5_price", skip_serializing_if = "Option::is_none")]
    pub d5_price: Option<i64>,
    #[serde(rename = "D-5_45_price", skip_serializing_if = "Option::is_none")]
    pub d5_45_price: Option<i64>,
    #[serde(rename = "D-15_price", skip_serializing_if = "Option::is_none")]
    pub d15_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_price: Option<i64>,

    /// 갱신 작업이 채우는 전일 종가 (단기과열 저장소)
    #[serde(rename = "D-1_price", skip_serializing_if = "Option::is_none")]
    pub d1_price: Option<i64>,
    /// 갱신 작업이 채우는 전일 종가 (지정해제/재지정 레코드)
    #[serde(rename = "D-2_price", skip_serializing_if = "Option::is_none")]
    pub d2_price: Option<i64>,
}

impl DesignationRecord {
    /// 가격 필드가 모두 빈 새 레코드 생성.
    pub fn new(
        stock_name: impl Into<String>,
        stock_code: impl Into<String>,
        categories: Vec<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            stock_name: stock_name.into(),
            stock_code: stock_code.into(),
            categories,
            date: date.into(),
            first_price: None,
            designated_price: None,
            release_price: None,
            d3_price: None,
            d5_price: None,
            d5_45_price: None,
            d15_price: None,
            high_price: None,
            d1_price: None,
            d2_price: None,
        }
    }

    /// 업서트 동일성 키. 날짜/코드가 비정상이면 `None` (업서트 대상 제외).
    pub fn identity_key(&self) -> Option<(String, String, String)> {
        let ymd = normalize_ymd(&self.date);
        let code = self.stock_code.trim();
        if ymd.is_empty() || code.is_empty() {
            return None;
        }
        Some((ymd, code.to_string(), category_key_of(&self.categories)))
    }
}
