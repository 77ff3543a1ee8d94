//! KIS 접근 토큰 관리.
//!
//! 토큰은 하루 가까이 유효하므로 발급 결과를 JSON 파일에 캐시하고,
//! 만료 전까지 재사용합니다. 발급은 단순 client_credentials POST 한 번.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ExchangeError, Result};

/// KIS 앱 자격증명.
#[derive(Debug, Clone)]
pub struct KisCredentials {
    pub app_key: String,
    pub app_secret: String,
}

impl KisCredentials {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }

    /// 환경 변수(`KIS_APP_KEY`, `KIS_APP_SECRET`)에서 로드.
    pub fn from_env() -> Result<Self> {
        let app_key = std::env::var("KIS_APP_KEY")
            .map_err(|_| ExchangeError::Auth("KIS_APP_KEY 환경변수 없음".to_string()))?;
        let app_secret = std::env::var("KIS_APP_SECRET")
            .map_err(|_| ExchangeError::Auth("KIS_APP_SECRET 환경변수 없음".to_string()))?;
        Ok(Self::new(app_key, app_secret))
    }
}

/// 파일에 캐시되는 토큰.
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// 파일 캐시 기반 토큰 관리자.
pub struct TokenManager {
    credentials: KisCredentials,
    base_url: String,
    cache_path: PathBuf,
    http: reqwest::Client,
}

impl TokenManager {
    pub fn new(
        credentials: KisCredentials,
        base_url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            credentials,
            base_url: base_url.into(),
            cache_path: cache_path.into(),
            http,
        })
    }

    /// 유효한 접근 토큰 반환 (캐시 우선, 만료 시 재발급).
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.load_cached() {
            return Ok(token);
        }
        self.issue_token().await
    }

    /// 캐시를 무시하고 강제 재발급.
    pub async fn refresh(&self) -> Result<String> {
        self.issue_token().await
    }

    fn load_cached(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.cache_path).ok()?;
        let cached: CachedToken = match serde_json::from_str(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %self.cache_path.display(), "토큰 캐시 파싱 실패: {}", e);
                return None;
            }
        };

        let remaining = cached.expires_at - Utc::now();
        if remaining <= Duration::zero() {
            debug!("캐시된 토큰 만료됨");
            return None;
        }
        debug!(
            remaining_mins = remaining.num_minutes(),
            "캐시된 토큰 재사용"
        );
        Some(cached.access_token)
    }

    async fn issue_token(&self) -> Result<String> {
        info!("KIS 접근 토큰 발급 요청");
        let url = format!("{}/oauth2/tokenP", self.base_url);
        let body = serde_json::json!({
            "grant_type": "client_credentials",
            "appkey": self.credentials.app_key,
            "appsecret": self.credentials.app_secret,
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Auth(format!("HTTP {}: {}", status, text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::Auth(format!("토큰 응답 파싱 실패: {}", e)))?;

        self.store(&token.access_token)?;
        info!("새 토큰 발급 및 저장 완료");
        Ok(token.access_token)
    }

    fn store(&self, access_token: &str) -> Result<()> {
        // KIS 토큰 수명은 24시간 — 여유를 두고 23시간 59분으로 캐시
        let cached = CachedToken {
            access_token: access_token.to_string(),
            expires_at: Utc::now() + Duration::hours(23) + Duration::minutes(59),
        };
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.cache_path, serde_json::to_string(&cached)?.as_bytes())?;
        Ok(())
    }

    /// 캐시 파일 경로.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}
