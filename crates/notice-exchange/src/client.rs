//! KIS 시세 API 클라이언트.
//!
//! 파이프라인이 쓰는 두 엔드포인트만 다룹니다:
//! - 일별 시세 (`inquire-daily-price`, tr `FHKST01010400`)
//! - 휴장일 조회 (`chk-holiday`, tr `CTCA0903R`)

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use chrono_tz::Asia::Seoul;
use serde_json::Value;
use tracing::warn;

use notice_core::{CalendarError, DailyPrice, PriceHistoryProvider, TradingCalendar};

use crate::auth::{KisCredentials, TokenManager};
use crate::error::{ExchangeError, Result};
use crate::KIS_BASE;

const DAILY_PRICE_PATH: &str = "/uapi/domestic-stock/v1/quotations/inquire-daily-price";
const DAILY_PRICE_TR: &str = "FHKST01010400";
const HOLIDAY_PATH: &str = "/uapi/domestic-stock/v1/quotations/chk-holiday";
const HOLIDAY_TR: &str = "CTCA0903R";

/// KIS 시세 클라이언트.
pub struct KisClient {
    base_url: String,
    credentials: KisCredentials,
    tokens: TokenManager,
    http: reqwest::Client,
}

impl KisClient {
    /// 실전 도메인으로 클라이언트 생성.
    pub fn new(credentials: KisCredentials, token_cache: impl Into<PathBuf>) -> Result<Self> {
        Self::with_base_url(credentials, KIS_BASE, token_cache)
    }

    /// 베이스 URL 지정 생성 (테스트용).
    pub fn with_base_url(
        credentials: KisCredentials,
        base_url: impl Into<String>,
        token_cache: impl Into<PathBuf>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let tokens = TokenManager::new(credentials.clone(), base_url.clone(), token_cache)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url,
            credentials,
            tokens,
            http,
        })
    }

    /// 일별 종가 조회 (최신→과거 정렬, 최대 `count`개).
    ///
    /// 조회 구간은 기준일에서 달력일 `2 × count`일 전부터 오늘까지 —
    /// 주말/휴장일을 감안해 거래일 `count`개를 넉넉히 덮는다.
    pub async fn get_daily_prices(
        &self,
        stock_code: &str,
        base_ymd: &str,
        count: usize,
    ) -> Result<Vec<DailyPrice>> {
        let today = chrono::Utc::now().with_timezone(&Seoul).date_naive();
        let base = NaiveDate::parse_from_str(base_ymd, "%Y%m%d").unwrap_or(today);
        let start = (base - Duration::days(count as i64 * 2))
            .format("%Y%m%d")
            .to_string();
        let end = today.format("%Y%m%d").to_string();

        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, DAILY_PRICE_PATH);
        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("accept", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .header("appkey", &self.credentials.app_key)
            .header("appsecret", &self.credentials.app_secret)
            .header("tr_id", DAILY_PRICE_TR)
            .header("custtype", "P")
            .query(&[
                ("FID_COND_MRKT_DIV_CODE", "J"),
                ("FID_INPUT_ISCD", stock_code),
                ("FID_INPUT_DATE_1", start.as_str()),
                ("FID_INPUT_DATE_2", end.as_str()),
                ("FID_PERIOD_DIV_CODE", "D"),
                ("FID_ORG_ADJ_PRC", "0"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let mut rows = parse_daily_rows(&body);
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(count);
        Ok(rows)
    }

    /// 해당 날짜가 거래일인지 조회.
    pub async fn check_business_day(&self, ymd: &str) -> Result<bool> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, HOLIDAY_PATH);
        let response = self
            .http
            .get(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("authorization", format!("Bearer {}", token))
            .header("appkey", &self.credentials.app_key)
            .header("appsecret", &self.credentials.app_secret)
            .header("tr_id", HOLIDAY_TR)
            .header("custtype", "P")
            .query(&[
                ("BASS_DT", ymd),
                ("CTX_AREA_NK", ""),
                ("CTX_AREA_FK", ""),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let output = body
            .get("output")
            .and_then(Value::as_array)
            .ok_or_else(|| ExchangeError::Api("휴장일 응답이 비어있음".to_string()))?;

        let row = output
            .iter()
            .find(|item| item.get("bass_dt").and_then(Value::as_str) == Some(ymd))
            .ok_or_else(|| ExchangeError::Api(format!("기준일({}) 데이터 없음", ymd)))?;

        Ok(row.get("bzdy_yn").and_then(Value::as_str) == Some("Y"))
    }

    /// 토큰 관리자 접근 (강제 갱신 등).
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}

/// 일별 시세 응답의 `output`을 행 목록으로 변환.
///
/// 단건 응답이 객체로 오는 경우가 있어 배열/객체 모두 받는다.
/// 거래일이 빠진 행은 버린다.
fn parse_daily_rows(body: &Value) -> Vec<DailyPrice> {
    let output = body.get("output").cloned().unwrap_or(Value::Null);
    let items: Vec<Value> = match output {
        Value::Array(arr) => arr,
        Value::Object(_) => vec![output],
        _ => Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| {
            let date = item.get("stck_bsop_date").and_then(Value::as_str)?.trim();
            if date.is_empty() {
                return None;
            }
            let close = item.get("stck_clpr").map(parse_price).unwrap_or(0);
            Some(DailyPrice::new(date, close))
        })
        .collect()
}

/// 종가 필드 파싱 (쉼표 포함 문자열/숫자 모두 허용, 실패 시 0).
fn parse_price(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.replace(',', "").trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl PriceHistoryProvider for KisClient {
    async fn daily_prices(&self, stock_code: &str, base_ymd: &str, count: usize) -> Vec<DailyPrice> {
        match self.get_daily_prices(stock_code, base_ymd, count).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(stock_code = %stock_code, "일별시세 조회 실패: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TradingCalendar for KisClient {
    async fn is_business_day(&self, ymd: &str) -> std::result::Result<bool, CalendarError> {
        self.check_business_day(ymd)
            .await
            .map_err(|e| CalendarError::Lookup(e.to_string()))
    }
}
