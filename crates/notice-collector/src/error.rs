//! 에러 타입 정의.

use std::fmt;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// KIS 연동 에러
    Exchange(notice_exchange::ExchangeError),
    /// 영업일 조회 에러
    Calendar(notice_core::CalendarError),
    /// 저장소 파일 입출력 에러
    Io(std::io::Error),
    /// JSON 직렬화/역직렬화 에러
    Json(serde_json::Error),
    /// 알림 전송 에러
    Notification(notice_notification::NotificationError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Exchange(e) => write!(f, "Exchange error: {}", e),
            Self::Calendar(e) => write!(f, "Calendar error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Notification(e) => write!(f, "Notification error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<notice_exchange::ExchangeError> for CollectorError {
    fn from(err: notice_exchange::ExchangeError) -> Self {
        Self::Exchange(err)
    }
}

impl From<notice_core::CalendarError> for CollectorError {
    fn from(err: notice_core::CalendarError) -> Self {
        Self::Calendar(err)
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<notice_notification::NotificationError> for CollectorError {
    fn from(err: notice_notification::NotificationError) -> Self {
        Self::Notification(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
