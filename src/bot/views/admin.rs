//! Admin console UI components

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Callback data
// ─────────────────────────────────────────────────────────────────────────────

/// Shared prefix of every admin console callback
pub const ADMIN_CALLBACK_PREFIX: &str = "adm_";
/// Callback data for starting a broadcast
pub const CALLBACK_ADMIN_BROADCAST: &str = "adm_broadcast";
/// Callback data for starting a ban
pub const CALLBACK_ADMIN_BAN: &str = "adm_ban";
/// Callback data for starting an unban
pub const CALLBACK_ADMIN_UNBAN: &str = "adm_unban";
/// Callback data for the stats panel
pub const CALLBACK_ADMIN_STATS: &str = "adm_stats";
/// Callback data for restarting the bot
pub const CALLBACK_ADMIN_RESTART: &str = "adm_restart";

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Admin console header
pub fn admin_panel_text() -> &'static str {
    "👑 <b>Admin Control Panel</b>"
}

/// Reply to `/admin` from a non-admin
pub fn not_authorized_text() -> &'static str {
    "❌ Not authorized."
}

/// Callback answer for admin buttons tapped by a non-admin
pub fn not_allowed_text() -> &'static str {
    "❌ Not allowed"
}

/// Prompt for the broadcast message
pub fn broadcast_prompt_text() -> &'static str {
    "📢 Send message for broadcast:"
}

/// Prompt for the user id to ban
pub fn ban_prompt_text() -> &'static str {
    "🚫 Send user ID to ban:"
}

/// Prompt for the user id to unban
pub fn unban_prompt_text() -> &'static str {
    "🔓 Send user ID to unban:"
}

/// Confirmation once the broadcast finished
pub fn broadcast_done_text() -> &'static str {
    "📢 Broadcast Sent!"
}

/// Shown when a ban or unban input is not a numeric user id
pub fn numeric_id_required_text() -> &'static str {
    "⚠ Send a numeric user ID."
}

/// Confirmation for a completed ban
#[must_use]
pub fn ban_done_text(user_id: u64) -> String {
    format!("🚫 User {user_id} banned.")
}

/// Confirmation for a completed unban
#[must_use]
pub fn unban_done_text(user_id: u64) -> String {
    format!("🔓 User {user_id} unbanned.")
}

/// Notice sent right before the process exits for a restart
pub fn restarting_text() -> &'static str {
    "♻ Restarting bot..."
}

/// Stats panel body
#[must_use]
pub fn stats_text(
    total_users: usize,
    banned_users: usize,
    admins: usize,
    live_results: u64,
) -> String {
    format!(
        r#"📊 <b>Bot Stats</b>
• Total Users: {total_users}
• Banned Users: {banned_users}
• Admins: {admins}
• Active Results: {live_results}
• Status: Running
"#
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Get the admin console keyboard
#[must_use]
pub fn admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "📢 Broadcast",
            CALLBACK_ADMIN_BROADCAST,
        )],
        vec![InlineKeyboardButton::callback(
            "🚫 Ban User",
            CALLBACK_ADMIN_BAN,
        )],
        vec![InlineKeyboardButton::callback(
            "🔓 Unban User",
            CALLBACK_ADMIN_UNBAN,
        )],
        vec![InlineKeyboardButton::callback(
            "📊 Bot Stats",
            CALLBACK_ADMIN_STATS,
        )],
        vec![InlineKeyboardButton::callback(
            "♻ Restart",
            CALLBACK_ADMIN_RESTART,
        )],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_keyboard_layout() {
        let keyboard = admin_keyboard();

        assert_eq!(keyboard.inline_keyboard.len(), 5);
        for row in &keyboard.inline_keyboard {
            assert_eq!(row.len(), 1);
        }
        assert_eq!(keyboard.inline_keyboard[0][0].text, "📢 Broadcast");
        assert_eq!(keyboard.inline_keyboard[4][0].text, "♻ Restart");
    }

    #[test]
    fn test_stats_text_interpolation() {
        let text = stats_text(12, 3, 2, 7);

        assert!(text.contains("Total Users: 12"));
        assert!(text.contains("Banned Users: 3"));
        assert!(text.contains("Admins: 2"));
        assert!(text.contains("Active Results: 7"));
        assert!(text.contains("Status: Running"));
    }
}
