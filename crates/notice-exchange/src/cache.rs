//! 실행 단위 시세 캐시.
//!
//! 한 번의 파이프라인 실행 안에서 같은 종목을 중복 조회하지 않도록
//! 종목코드 기준으로 결과를 기억합니다. 수명은 정확히 한 실행 —
//! 실행마다 새로 만들어 주입하며, 프로세스 전역 싱글턴이 아닙니다.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use notice_core::{CalendarError, DailyPrice, PriceHistoryProvider, TradingCalendar};

/// 종목코드 → 조회 결과 메모이제이션 래퍼.
///
/// 같은 실행 안에서는 첫 조회 결과가 그대로 재사용된다 (빈 결과 포함 —
/// 실패한 종목을 반복 조회하지 않기 위함).
pub struct CachedPriceProvider<P> {
    inner: P,
    rows: Mutex<HashMap<String, Vec<DailyPrice>>>,
}

impl<P> CachedPriceProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            rows: Mutex::new(HashMap::new()),
        }
    }

    /// 내부 제공자 참조.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: PriceHistoryProvider> PriceHistoryProvider for CachedPriceProvider<P> {
    async fn daily_prices(&self, stock_code: &str, base_ymd: &str, count: usize) -> Vec<DailyPrice> {
        let mut cache = self.rows.lock().await;
        if let Some(rows) = cache.get(stock_code) {
            debug!(stock_code = %stock_code, "시세 캐시 적중");
            return rows.clone();
        }
        let rows = self.inner.daily_prices(stock_code, base_ymd, count).await;
        cache.insert(stock_code.to_string(), rows.clone());
        rows
    }
}

#[async_trait]
impl<P: TradingCalendar + Send + Sync> TradingCalendar for CachedPriceProvider<P> {
    async fn is_business_day(&self, ymd: &str) -> Result<bool, CalendarError> {
        self.inner.is_business_day(ymd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceHistoryProvider for CountingProvider {
        async fn daily_prices(&self, _code: &str, _base: &str, _count: usize) -> Vec<DailyPrice> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![DailyPrice::new("20250926", 12000)]
        }
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let cached = CachedPriceProvider::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });

        let first = cached.daily_prices("000880", "20250926", 40).await;
        let second = cached.daily_prices("000880", "20250926", 60).await;

        assert_eq!(first, second);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }
}
