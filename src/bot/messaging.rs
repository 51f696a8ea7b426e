//! Common messaging utilities for the Telegram bot.
//!
//! Contains the shared send path that splits long aggregated reports
//! across multiple messages.

use crate::utils;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

/// Maximum message length for Telegram with safety margin.
/// Telegram's official limit is 4096, but we use 4000 to account for
/// HTML tags and other formatting that may be added.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// Sends a long message by splitting it into multiple parts.
///
/// Parts are split on line boundaries where possible so one report line
/// never straddles two messages, and each part is sent with HTML parsing.
///
/// # Errors
///
/// Returns an error if any message fails to send.
pub async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for part in utils::split_long_message(text, TELEGRAM_MESSAGE_LIMIT) {
        bot.send_message(chat_id, part)
            .parse_mode(ParseMode::Html)
            .await?;
    }

    Ok(())
}
