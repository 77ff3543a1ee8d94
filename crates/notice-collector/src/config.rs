//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Asia::Seoul;
use tracing::{info, warn};

use notice_core::calendar::{normalize_ymd, parse_ymd};

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 공시/저장소 JSON이 놓이는 디렉터리
    pub data_dir: PathBuf,
    /// 저장소 보관 영업일 수
    pub keep_days: usize,
    /// 기준일 고정값 (`YYYYMMDD`, 비우면 KST 오늘)
    pub base_date: Option<String>,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            data_dir: PathBuf::from(env_var_or("NOTICE_DATA_DIR", "data")),
            keep_days: env_var_parse("NOTICE_KEEP_DAYS", 10),
            base_date: std::env::var("NOTICE_BASE_DATE").ok().filter(|s| !s.is_empty()),
            request_delay_ms: env_var_parse("KIS_REQUEST_DELAY_MS", 120),
        }
    }

    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 투자경고 공시 입력 파일
    pub fn warning_notices_path(&self) -> PathBuf {
        self.data_dir.join("warning_notices.json")
    }

    /// 단기과열 공시 입력 파일
    pub fn overheating_notices_path(&self) -> PathBuf {
        self.data_dir.join("overheating_notices.json")
    }

    /// 투자경고 기준가 저장소
    pub fn warning_store_path(&self) -> PathBuf {
        self.data_dir.join("warning_prices.json")
    }

    /// 단기과열 기준가 저장소
    pub fn overheating_store_path(&self) -> PathBuf {
        self.data_dir.join("overheating_prices.json")
    }

    /// KIS 토큰 캐시 파일
    pub fn token_cache_path(&self) -> PathBuf {
        self.data_dir.join("token.json")
    }

    /// 공시 목록 메시지의 섹션 소스 (제목, 파일 경로). 표시 순서 고정.
    pub fn listing_sources(&self) -> Vec<(&'static str, PathBuf)> {
        [
            ("투자주의", "caution_notices.json"),
            ("단기과열", "overheating_notices.json"),
            ("투자경고", "warning_notices.json"),
            ("투자위험", "danger_notices.json"),
            ("거래정지", "suspension_notices.json"),
        ]
        .into_iter()
        .map(|(title, file)| (title, self.data_dir.join(file)))
        .collect()
    }

    /// 실행 기준일 결정.
    ///
    /// CLI 인자 → 설정값 → KST 오늘 순. 설정값이 실제 시계와 하루 넘게
    /// 어긋나면 오래된 고정값으로 판단하고 오늘로 대체한다.
    pub fn resolve_base_date(&self, cli_override: Option<&str>) -> String {
        if let Some(raw) = cli_override {
            let ymd = normalize_ymd(raw);
            if !ymd.is_empty() {
                info!(base_date = %ymd, "CLI 기준일 오버라이드");
                return ymd;
            }
            warn!("CLI 날짜 형식 인식 실패, 무시: {}", raw);
        }

        let today = kst_today();
        let configured = self
            .base_date
            .as_deref()
            .map(normalize_ymd)
            .unwrap_or_default();
        if configured.is_empty() {
            return today;
        }

        match (parse_ymd(&configured), parse_ymd(&today)) {
            (Some(cfg), Some(now)) if (now - cfg).num_days().abs() > 1 => {
                warn!(
                    configured = %configured,
                    today = %today,
                    "설정 기준일이 현재와 하루 이상 차이 — 오늘로 대체"
                );
                today
            }
            (Some(_), _) => configured,
            _ => today,
        }
    }
}

/// KST 오늘 날짜 키.
pub fn kst_today() -> String {
    chrono::Utc::now()
        .with_timezone(&Seoul)
        .format("%Y%m%d")
        .to_string()
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수 문자열 (없으면 기본값)
fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
