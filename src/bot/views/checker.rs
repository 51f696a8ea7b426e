//! Checker mode UI components
//!
//! Contains keyboards, text messages, and callback data for the join gate,
//! the mode menus, and check results.

use crate::bot::state::CheckMode;
use crate::config::Settings;
use crate::probe::TargetKind;
use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Callback data
// ─────────────────────────────────────────────────────────────────────────────

/// Callback data for re-verifying channel membership
pub const CALLBACK_JOIN_CHECK: &str = "chk_join";
/// Callback data for the single API/URL mode
pub const CALLBACK_API_SINGLE: &str = "api_single";
/// Callback data for the bulk API/URL mode
pub const CALLBACK_API_BULK: &str = "api_bulk";
/// Callback data for the single proxy mode
pub const CALLBACK_PROXY_SINGLE: &str = "proxy_single";
/// Callback data for the bulk proxy mode
pub const CALLBACK_PROXY_BULK: &str = "proxy_bulk";
/// Prefix carried by re-check buttons, followed by a result token
pub const RECHECK_PREFIX: &str = "re|";
/// Prefix carried by delete buttons, followed by a result token
pub const DELETE_PREFIX: &str = "del|";

/// Resolves mode-menu callback data to the selected check mode
#[must_use]
pub fn mode_for_callback(data: &str) -> Option<CheckMode> {
    match data {
        CALLBACK_API_SINGLE => Some(CheckMode::ApiSingle),
        CALLBACK_API_BULK => Some(CheckMode::ApiBulk),
        CALLBACK_PROXY_SINGLE => Some(CheckMode::ProxySingle),
        CALLBACK_PROXY_BULK => Some(CheckMode::ProxyBulk),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Greeting shown to users who have not joined the gate channel yet
pub fn join_gate_text() -> &'static str {
    r#"🚀 <b>Welcome to ALL IN ONE Checker — The Future of API &amp; Proxy Scanning</b>

To unlock access, please join our public channel first.

<b>Upcoming Features:</b>
• 🤖 AI-powered smart validations
• 🔍 Proxy pattern detection
• 📊 API performance analytics
• 🧠 Auto-fix suggestions
• 🔐 Secure cloud scan history
• ⚡ Multi-layer deep scan engine

Join the channel and come back!"#
}

/// Greeting shown to channel members
pub fn member_welcome_text() -> &'static str {
    r#"👋 <b>Welcome!</b>

Use:
• <code>/api</code> — API/URL Checker
• <code>/proxy</code> — Proxy Checker
"#
}

/// Shown when a gated command arrives from a non-member
pub fn join_required_text() -> &'static str {
    "Join public channel first!"
}

/// Caption above the API mode menu
pub fn api_menu_text() -> &'static str {
    "Choose API mode:"
}

/// Caption above the proxy mode menu
pub fn proxy_menu_text() -> &'static str {
    "Choose Proxy mode:"
}

/// Prompt sent after a mode was selected
pub fn mode_prompt_text() -> &'static str {
    "Send your input now:"
}

/// Join re-check verdict for members
pub fn access_granted_text() -> &'static str {
    "✅ Access granted! Use /api or /proxy"
}

/// Join re-check verdict for non-members
pub fn still_not_joined_text() -> &'static str {
    "❌ You still haven't joined!"
}

/// Shown when a bulk upload contains no usable lines
pub fn empty_file_text() -> &'static str {
    "⚠ No valid lines found in file."
}

/// Callback answer for re-check or delete taps on a forgotten result
pub fn expired_result_text() -> &'static str {
    "❌ Expired."
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Join-gate keyboard: channel links plus the membership re-check button.
///
/// The private invite row only appears when an invite link is configured,
/// and link buttons are dropped when their URL fails to parse.
#[must_use]
pub fn join_keyboard(settings: &Settings) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    match Url::parse(&settings.channel_join_url()) {
        Ok(url) => rows.push(vec![InlineKeyboardButton::url("📢 Join Public", url)]),
        Err(err) => debug!("Skipping public channel button, bad URL: {err}"),
    }

    if let Some(link) = settings.private_invite_link() {
        match Url::parse(link) {
            Ok(url) => rows.push(vec![InlineKeyboardButton::url("🔒 Join Private", url)]),
            Err(err) => debug!("Skipping private invite button, bad URL: {err}"),
        }
    }

    rows.push(vec![InlineKeyboardButton::callback(
        "✔ I Joined",
        CALLBACK_JOIN_CHECK,
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Get the API mode menu keyboard
///
/// # Examples
///
/// ```
/// use aio_checker::bot::views::api_mode_keyboard;
/// let keyboard = api_mode_keyboard();
/// assert_eq!(keyboard.inline_keyboard.len(), 2);
/// ```
#[must_use]
pub fn api_mode_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Single API/URL",
            CALLBACK_API_SINGLE,
        )],
        vec![InlineKeyboardButton::callback("Bulk TXT", CALLBACK_API_BULK)],
    ])
}

/// Get the proxy mode menu keyboard
#[must_use]
pub fn proxy_mode_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Single Proxy",
            CALLBACK_PROXY_SINGLE,
        )],
        vec![InlineKeyboardButton::callback(
            "Bulk TXT",
            CALLBACK_PROXY_BULK,
        )],
    ])
}

/// Keyboard attached to every check result.
///
/// Always offers re-check and delete for the given result token; adds an
/// open-in-browser row when the checked target is a parseable URL.
#[must_use]
pub fn result_keyboard(token: &str, target: &str) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![InlineKeyboardButton::callback(
            "🔁 Re-Check",
            format!("{RECHECK_PREFIX}{token}"),
        )],
        vec![InlineKeyboardButton::callback(
            "❌ Delete",
            format!("{DELETE_PREFIX}{token}"),
        )],
    ];

    if TargetKind::classify(target) == TargetKind::Url {
        if let Ok(url) = Url::parse(target) {
            rows.push(vec![InlineKeyboardButton::url("🌐 Open URL", url)]);
        }
    }

    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("expected callback button, got {other:?}"),
        }
    }

    fn settings(private_link: Option<&str>) -> Settings {
        Settings {
            bot_token: "token".to_string(),
            public_channel: "@gate".to_string(),
            private_link: private_link.map(ToString::to_string),
            admins_str: None,
        }
    }

    #[test]
    fn test_mode_for_callback_mapping() {
        assert_eq!(mode_for_callback("api_single"), Some(CheckMode::ApiSingle));
        assert_eq!(mode_for_callback("api_bulk"), Some(CheckMode::ApiBulk));
        assert_eq!(
            mode_for_callback("proxy_single"),
            Some(CheckMode::ProxySingle)
        );
        assert_eq!(mode_for_callback("proxy_bulk"), Some(CheckMode::ProxyBulk));
        assert_eq!(mode_for_callback("chk_join"), None);
        assert_eq!(mode_for_callback(""), None);
    }

    #[test]
    fn test_result_keyboard_carries_token() {
        let keyboard = result_keyboard("abcdef123456", "sk-secret");

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(callback_data(&keyboard.inline_keyboard[0][0]), "re|abcdef123456");
        assert_eq!(callback_data(&keyboard.inline_keyboard[1][0]), "del|abcdef123456");
    }

    #[test]
    fn test_result_keyboard_adds_open_url_row_for_urls() {
        let keyboard = result_keyboard("tok", "https://api.example.com/v1");
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[2][0].text, "🌐 Open URL");
    }

    #[test]
    fn test_result_keyboard_skips_open_url_for_non_urls() {
        assert_eq!(result_keyboard("tok", "1.2.3.4:8080").inline_keyboard.len(), 2);
        assert_eq!(result_keyboard("tok", "sk-abc").inline_keyboard.len(), 2);
        // URL-shaped but unparseable stays without the row
        assert_eq!(
            result_keyboard("tok", "http://bad host/").inline_keyboard.len(),
            2
        );
    }

    #[test]
    fn test_join_keyboard_with_private_link() {
        let keyboard = join_keyboard(&settings(Some("https://t.me/+abc123")));

        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "📢 Join Public");
        assert_eq!(keyboard.inline_keyboard[1][0].text, "🔒 Join Private");
        assert_eq!(callback_data(&keyboard.inline_keyboard[2][0]), "chk_join");
    }

    #[test]
    fn test_join_keyboard_without_private_link() {
        let keyboard = join_keyboard(&settings(None));

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "📢 Join Public");
        assert_eq!(callback_data(&keyboard.inline_keyboard[1][0]), "chk_join");
    }
}
