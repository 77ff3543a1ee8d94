//! 텔레그램 알림 전송기.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, ParseMode};
use teloxide::Bot;
use tracing::{debug, error, info};

use crate::{NotificationError, Result};

/// 텔레그램 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// 봇 토큰
    pub bot_token: String,
    /// 대상 채팅 ID
    pub chat_id: i64,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id,
            enabled: true,
        }
    }

    /// 환경 변수(`TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`)에서 설정 로드.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?.parse().ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        Some(Self {
            bot_token,
            chat_id,
            enabled,
        })
    }
}

/// 텔레그램 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    bot: Bot,
}

impl TelegramSender {
    pub fn new(config: TelegramConfig) -> Self {
        let bot = Bot::new(&config.bot_token);
        Self { config, bot }
    }

    /// 환경 변수에서 전송기 생성.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty()
    }

    /// HTML 파싱 모드로 메시지 전송.
    ///
    /// 실패는 로그와 에러 반환까지 — 호출자가 종료 코드로 승격하지 않는다.
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.is_enabled() {
            debug!("텔레그램 전송이 비활성화되어 있습니다");
            return Ok(());
        }

        match self
            .bot
            .send_message(ChatId(self.config.chat_id), text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => {
                info!("텔레그램 전송 완료");
                Ok(())
            }
            Err(e) => {
                error!("텔레그램 전송 실패: {}", e);
                Err(NotificationError::SendFailed(e.to_string()))
            }
        }
    }
}
