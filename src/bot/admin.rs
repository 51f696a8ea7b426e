//! Admin console: broadcast, ban management, stats, restart.
//!
//! Every entry point re-checks the admin allow-list; the console is
//! reachable only through `/admin` and its inline buttons.

use crate::bot::handlers::message_user;
use crate::bot::state::State;
use crate::bot::views;
use crate::gate::AccessGate;
use crate::registry::ResultRegistry;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{ChatId, ParseMode, UserId},
};
use tracing::{debug, info, warn};

/// Admin panel handler
///
/// # Errors
///
/// Returns an error if the panel or the refusal cannot be sent.
pub async fn panel(bot: Bot, msg: Message, gate: Arc<AccessGate>) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    gate.remember(user).await;

    if !gate.is_admin(user) {
        info!("User {user} was refused the admin panel.");
        bot.send_message(msg.chat.id, views::not_authorized_text())
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, views::admin_panel_text())
        .parse_mode(ParseMode::Html)
        .reply_markup(views::admin_keyboard())
        .await?;
    Ok(())
}

/// Admin console buttons: arms a capture mode, shows stats, or restarts.
///
/// Non-admins get a callback answer and nothing else.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent or the dialogue state cannot
/// be updated.
pub async fn handle_admin_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
    registry: Arc<ResultRegistry>,
) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let user = q.from.id;

    if !gate.is_admin(user) {
        warn!("User {user} tapped admin callback '{data}' without access.");
        bot.answer_callback_query(q.id.clone())
            .text(views::not_allowed_text())
            .await?;
        return Ok(());
    }

    let _ = bot.answer_callback_query(q.id.clone()).await;
    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .ok_or_else(|| anyhow!("Admin callback '{data}' arrived without a source message"))?;

    match data {
        views::CALLBACK_ADMIN_BROADCAST => {
            dialogue
                .update(State::AwaitingBroadcast)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            bot.send_message(chat_id, views::broadcast_prompt_text())
                .await?;
        }
        views::CALLBACK_ADMIN_BAN => {
            dialogue
                .update(State::AwaitingBan)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            bot.send_message(chat_id, views::ban_prompt_text()).await?;
        }
        views::CALLBACK_ADMIN_UNBAN => {
            dialogue
                .update(State::AwaitingUnban)
                .await
                .map_err(|e| anyhow!(e.to_string()))?;
            bot.send_message(chat_id, views::unban_prompt_text()).await?;
        }
        views::CALLBACK_ADMIN_STATS => {
            let text = views::stats_text(
                gate.user_count().await,
                gate.banned_count().await,
                gate.admin_count(),
                registry.entry_count(),
            );
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        views::CALLBACK_ADMIN_RESTART => {
            warn!("Admin {user} requested a restart, exiting for the supervisor.");
            bot.send_message(chat_id, views::restarting_text()).await?;
            std::process::exit(1);
        }
        other => debug!("Unhandled admin callback data: '{other}'"),
    }

    Ok(())
}

/// Broadcast text from an armed admin, copied to every known user.
///
/// Per-recipient failures (blocked bot, deleted account) are logged and
/// skipped; the mode is consumed afterwards.
///
/// # Errors
///
/// Returns an error if the confirmation cannot be sent or the dialogue
/// state cannot be updated.
pub async fn capture_broadcast(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    if !require_admin(&dialogue, &gate, user).await? {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    gate.remember(user).await;

    let recipients = gate.known_users().await;
    let total = recipients.len();
    let mut sent = 0usize;
    for recipient in recipients {
        match bot
            .send_message(ChatId(recipient.0.cast_signed()), text)
            .await
        {
            Ok(_) => sent += 1,
            Err(err) => debug!("Broadcast to {recipient} failed: {err}"),
        }
    }
    info!("Admin {user} broadcast a message to {sent}/{total} users.");

    bot.send_message(msg.chat.id, views::broadcast_done_text())
        .await?;
    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// User id from an armed admin, added to the ban set
///
/// # Errors
///
/// Returns an error if the confirmation cannot be sent or the dialogue
/// state cannot be updated.
pub async fn capture_ban(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    if !require_admin(&dialogue, &gate, user).await? {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    gate.remember(user).await;

    match text.trim().parse::<u64>() {
        Ok(id) => {
            gate.ban(UserId(id)).await;
            info!("Admin {user} banned user {id}.");
            bot.send_message(msg.chat.id, views::ban_done_text(id))
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, views::numeric_id_required_text())
                .await?;
        }
    }

    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// User id from an armed admin, removed from the ban set
///
/// # Errors
///
/// Returns an error if the confirmation cannot be sent or the dialogue
/// state cannot be updated.
pub async fn capture_unban(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    if !require_admin(&dialogue, &gate, user).await? {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    gate.remember(user).await;

    match text.trim().parse::<u64>() {
        Ok(id) => {
            gate.unban(UserId(id)).await;
            info!("Admin {user} unbanned user {id}.");
            bot.send_message(msg.chat.id, views::unban_done_text(id))
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, views::numeric_id_required_text())
                .await?;
        }
    }

    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Drops a capture state reached by a non-admin. Returns true for admins.
async fn require_admin(
    dialogue: &Dialogue<State, InMemStorage<State>>,
    gate: &Arc<AccessGate>,
    user: UserId,
) -> Result<bool> {
    if gate.is_admin(user) {
        return Ok(true);
    }
    debug!("User {user} reached an admin capture state without access.");
    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(false)
}
