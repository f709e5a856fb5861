use crate::alerts::{MentionStyle, compose_text};
use teloxide::{Bot, prelude::Requester, types::ChatId};
use thiserror::Error;
use tracing::{info, warn};
use valwatch_common::Alert;

/// Telegram rejects messages longer than this many UTF-16 code units.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("message for {operator_address} is {length} units long, limit is {limit}")]
    MessageTooLong {
        operator_address: String,
        length: usize,
        limit: usize,
    },
}

/// Delivery collaborator that receives finished alerts.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let message = telegram_message(alert)?;
        self.bot.send_message(self.chat_id, message).await?;
        Ok(())
    }
}

/// Plain-text Telegram message: the alert body followed by `@handle` mentions.
pub fn telegram_message(alert: &Alert) -> Result<String, DeliveryError> {
    let message = compose_text(&alert.body, &alert.subscribers, MentionStyle::Handle);
    let length = message.encode_utf16().count();
    if length > TELEGRAM_MESSAGE_LIMIT {
        return Err(DeliveryError::MessageTooLong {
            operator_address: alert.operator_address.clone(),
            length,
            limit: TELEGRAM_MESSAGE_LIMIT,
        });
    }
    Ok(message)
}

/// Writes alerts to the log. Used when no chat channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, alert: &Alert) -> Result<(), DeliveryError> {
        if alert.is_critical {
            warn!(
                category = %alert.category,
                operator_address = %alert.operator_address,
                "{}",
                alert.text
            );
        } else {
            info!(
                category = %alert.category,
                operator_address = %alert.operator_address,
                "{}",
                alert.text
            );
        }
        Ok(())
    }
}
