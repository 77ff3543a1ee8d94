//! 외부 협력자 트레이트.
//!
//! 파이프라인 본체는 이 두 시임만 알고, KIS 구현과 테스트 목은
//! 각자 이 트레이트를 구현합니다.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::DailyPrice;

/// 영업일 질의 실패.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// 조회 자체가 실패 (네트워크/응답 오류)
    #[error("영업일 조회 실패: {0}")]
    Lookup(String),
    /// 달력상 영업일을 찾지 못함 (탐색 상한 초과)
    #[error("영업일 탐색 한도 초과: {0}")]
    Exhausted(String),
}

/// 일별 시세 이력 제공자.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// 종목의 일별 종가를 최신→과거 순으로 최대 `count`개 반환.
    ///
    /// 제공자 오류는 빈 시퀀스로 대체된다 — 호출자는 빈 결과를
    /// "오늘은 이 종목 데이터 없음"으로 취급해 건너뛴다.
    async fn daily_prices(&self, stock_code: &str, base_ymd: &str, count: usize) -> Vec<DailyPrice>;
}

/// 영업일 판별 오라클.
#[async_trait]
pub trait TradingCalendar: Send + Sync {
    /// 해당 달력일이 거래일인지 질의.
    ///
    /// 오류는 호출자에게 전파된다 — 보관 범위 계산은 달력일 기준
    /// 폴백으로, 실행 게이트는 휴장 취급으로 각자 복구한다.
    async fn is_business_day(&self, ymd: &str) -> Result<bool, CalendarError>;
}
