//! 공시 알림 전송.
//!
//! 포맷된 리포트를 텔레그램 채널로 전달합니다. 전송 실패는 로그로 남기고
//! 에러로 반환할 뿐, 재시도하거나 프로세스 종료 코드로 승격하지 않습니다.

pub mod message;
pub mod telegram;

use thiserror::Error;

pub use telegram::{TelegramConfig, TelegramSender};

/// 알림 전송 에러.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 메시지 전송 실패
    #[error("전송 실패: {0}")]
    SendFailed(String),

    /// 설정 누락/오류
    #[error("설정 오류: {0}")]
    Config(String),
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, NotificationError>;
