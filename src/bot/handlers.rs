use crate::bot::state::{CheckMode, State};
use crate::bot::{admin, messaging, views};
use crate::config::Settings;
use crate::gate::AccessGate;
use crate::probe::ProbeEngine;
use crate::registry::ResultRegistry;
use crate::utils;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::{
    dispatching::dialogue::InMemStorage,
    net::Download,
    prelude::*,
    types::{ChatAction, ChatId, ParseMode, UserId},
    utils::command::BotCommands,
};
use tracing::{debug, info};

// Helper function to get user name from Message
fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Extracts the sender of a message, if Telegram attached one
#[must_use]
pub fn message_user(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| u.id)
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Greet the user or show the join gate
    #[command(description = "Start the bot.")]
    Start,
    /// Open the API/URL checker menu
    #[command(description = "Check APIs and URLs.")]
    Api,
    /// Open the proxy checker menu
    #[command(description = "Check HTTP proxies.")]
    Proxy,
    /// Open the admin console
    #[command(description = "Admin control panel.")]
    Admin,
}

/// Checks channel membership and shows the join gate when it is missing.
/// Returns true if the user may proceed.
async fn check_member_access(
    bot: &Bot,
    msg: &Message,
    settings: &Arc<Settings>,
    gate: &Arc<AccessGate>,
    user: UserId,
) -> Result<bool> {
    if gate.is_channel_member(bot, user).await {
        return Ok(true);
    }

    info!("User {user} is not a channel member, showing the join gate.");
    bot.send_message(msg.chat.id, views::join_required_text())
        .reply_markup(views::join_keyboard(settings))
        .await?;
    Ok(false)
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the greeting cannot be sent.
pub async fn start(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    gate.remember(user).await;

    let user_name = get_user_name(&msg);
    info!("User {user} ({user_name}) initiated /start command.");

    if gate.is_channel_member(&bot, user).await {
        bot.send_message(msg.chat.id, views::member_welcome_text())
            .parse_mode(ParseMode::Html)
            .await?;
    } else {
        bot.send_message(msg.chat.id, views::join_gate_text())
            .parse_mode(ParseMode::Html)
            .reply_markup(views::join_keyboard(&settings))
            .await?;
    }

    Ok(())
}

/// API menu handler
///
/// # Errors
///
/// Returns an error if the menu cannot be sent.
pub async fn api_menu(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    gate.remember(user).await;

    if !check_member_access(&bot, &msg, &settings, &gate, user).await? {
        return Ok(());
    }

    bot.send_message(msg.chat.id, views::api_menu_text())
        .reply_markup(views::api_mode_keyboard())
        .await?;
    Ok(())
}

/// Proxy menu handler
///
/// # Errors
///
/// Returns an error if the menu cannot be sent.
pub async fn proxy_menu(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    gate: Arc<AccessGate>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    gate.remember(user).await;

    if !check_member_access(&bot, &msg, &settings, &gate, user).await? {
        return Ok(());
    }

    bot.send_message(msg.chat.id, views::proxy_menu_text())
        .reply_markup(views::proxy_mode_keyboard())
        .await?;
    Ok(())
}

/// Text received while a check mode is armed: probed as a single target.
///
/// The mode's proxy/API side decides the probe, the result message carries
/// re-check and delete buttons, and the mode is consumed.
///
/// # Errors
///
/// Returns an error if the result cannot be sent or the dialogue state
/// cannot be updated.
pub async fn handle_target_text(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    mode: CheckMode,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
    registry: Arc<ResultRegistry>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    let target = msg.text().unwrap_or("").trim().to_string();
    if target.is_empty() {
        return Ok(());
    }

    gate.remember(user).await;
    debug!(
        "User {user} submitted a target in {mode:?} mode: '{}'",
        utils::truncate_str(&target, 48)
    );

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let report = if mode.is_proxy() {
        engine.check_proxy(&target).await
    } else {
        engine.check_api(&target).await
    };

    let token = registry.register(&target).await;
    bot.send_message(msg.chat.id, report.render())
        .parse_mode(ParseMode::Html)
        .reply_markup(views::result_keyboard(&token, &target))
        .await?;

    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Document received while a check mode is armed: bulk check, one target
/// per line, all verdicts aggregated into a single reply.
///
/// # Errors
///
/// Returns an error if the file cannot be downloaded, the reply cannot be
/// sent, or the dialogue state cannot be updated.
pub async fn handle_document(
    bot: Bot,
    msg: Message,
    dialogue: Dialogue<State, InMemStorage<State>>,
    mode: CheckMode,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
) -> Result<()> {
    let Some(user) = message_user(&msg) else {
        return Ok(());
    };
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    gate.remember(user).await;
    info!("User {user} uploaded a bulk file in {mode:?} mode.");

    bot.send_chat_action(msg.chat.id, ChatAction::Typing).await?;

    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf).await?;

    let content = String::from_utf8_lossy(&buf);
    let targets = utils::parse_target_lines(&content);

    if targets.is_empty() {
        bot.send_message(msg.chat.id, views::empty_file_text())
            .await?;
        dialogue
            .exit()
            .await
            .map_err(|e| anyhow!(e.to_string()))?;
        return Ok(());
    }

    let mut verdicts = Vec::with_capacity(targets.len());
    for target in &targets {
        let report = if mode.is_proxy() {
            engine.check_proxy(target).await
        } else {
            engine.check_api(target).await
        };
        verdicts.push(report.render());
    }

    info!(
        "Bulk check finished for user {user}: {} target(s).",
        targets.len()
    );
    messaging::send_long_message(&bot, msg.chat.id, &verdicts.join("\n\n")).await?;

    dialogue
        .exit()
        .await
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Inline button dispatcher
///
/// # Errors
///
/// Returns an error if a reply cannot be sent or the dialogue state cannot
/// be updated.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: Dialogue<State, InMemStorage<State>>,
    gate: Arc<AccessGate>,
    engine: Arc<ProbeEngine>,
    registry: Arc<ResultRegistry>,
) -> Result<()> {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let user = q.from.id;
    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .ok_or_else(|| anyhow!("Callback '{data}' arrived without a source message"))?;

    if data == views::CALLBACK_JOIN_CHECK {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        let verdict = if gate.is_channel_member(&bot, user).await {
            info!("User {user} passed the join re-check.");
            views::access_granted_text()
        } else {
            views::still_not_joined_text()
        };
        bot.send_message(chat_id, verdict).await?;
        return Ok(());
    }

    if let Some(mode) = views::mode_for_callback(&data) {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        debug!("User {user} armed {mode:?} mode.");
        dialogue
            .update(State::AwaitingTarget(mode))
            .await
            .map_err(|e| anyhow!(e.to_string()))?;
        bot.send_message(chat_id, views::mode_prompt_text()).await?;
        return Ok(());
    }

    if data.starts_with(views::ADMIN_CALLBACK_PREFIX) {
        return admin::handle_admin_callback(bot, q, dialogue, gate, registry).await;
    }

    if let Some(token) = data.strip_prefix(views::RECHECK_PREFIX) {
        return recheck_result(&bot, &q, chat_id, token, &engine, &registry).await;
    }

    if let Some(token) = data.strip_prefix(views::DELETE_PREFIX) {
        return delete_result(&bot, &q, chat_id, token, &registry).await;
    }

    // Answer anyway so the client stops its spinner
    let _ = bot.answer_callback_query(q.id.clone()).await;
    debug!("Unhandled callback data from user {user}: '{data}'");
    Ok(())
}

/// Probes the stored target again and sends a fresh result message with
/// its own token; the original message is left untouched.
async fn recheck_result(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    token: &str,
    engine: &Arc<ProbeEngine>,
    registry: &Arc<ResultRegistry>,
) -> Result<()> {
    let Some(target) = registry.resolve(token).await else {
        bot.answer_callback_query(q.id.clone())
            .text(views::expired_result_text())
            .await?;
        return Ok(());
    };
    let _ = bot.answer_callback_query(q.id.clone()).await;

    bot.send_chat_action(chat_id, ChatAction::Typing).await?;
    let report = engine.recheck(&target).await;

    let fresh = registry.register(&target).await;
    bot.send_message(chat_id, report.render())
        .parse_mode(ParseMode::Html)
        .reply_markup(views::result_keyboard(&fresh, &target))
        .await?;
    Ok(())
}

/// Deletes the result message and forgets its token
async fn delete_result(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    token: &str,
    registry: &Arc<ResultRegistry>,
) -> Result<()> {
    if registry.resolve(token).await.is_none() {
        bot.answer_callback_query(q.id.clone())
            .text(views::expired_result_text())
            .await?;
        return Ok(());
    }
    let _ = bot.answer_callback_query(q.id.clone()).await;

    if let Some(message) = q.message.as_ref() {
        if let Err(err) = bot.delete_message(chat_id, message.id()).await {
            debug!("Could not delete result message in chat {chat_id}: {err}");
        }
    }
    registry.forget(token).await;
    Ok(())
}
