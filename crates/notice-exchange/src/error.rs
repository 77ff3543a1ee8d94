//! 거래소 연동 에러 타입.

use thiserror::Error;

/// KIS 연동 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/전송 오류
    #[error("네트워크 오류: {0}")]
    Network(#[from] reqwest::Error),

    /// API 응답이 기대 형태가 아님
    #[error("API 응답 오류: {0}")]
    Api(String),

    /// 토큰 발급/갱신 실패
    #[error("인증 실패: {0}")]
    Auth(String),

    /// 토큰 캐시 파일 입출력 오류
    #[error("토큰 캐시 오류: {0}")]
    TokenCache(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::Api(err.to_string())
    }
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, ExchangeError>;
