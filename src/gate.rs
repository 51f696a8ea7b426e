//! Access control
//!
//! Static admin allow-list, the known-users set fed by incoming messages,
//! the mutable ban set, and the channel-membership gate. Membership is
//! re-queried from Telegram on every gated action; any query failure
//! (network error, bot not in the channel, unknown user) counts as not a
//! member.

use std::collections::HashSet;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient, UserId};
use tokio::sync::RwLock;
use tracing::debug;

/// Who may do what: admins, known users, banned users, channel members
pub struct AccessGate {
    admins: HashSet<UserId>,
    channel: String,
    known_users: RwLock<HashSet<UserId>>,
    banned: RwLock<HashSet<UserId>>,
}

impl AccessGate {
    /// Gate for the given admin ids and `@username` gate channel
    #[must_use]
    pub fn new(admins: HashSet<u64>, channel_username: String) -> Self {
        Self {
            admins: admins.into_iter().map(UserId).collect(),
            channel: channel_username,
            known_users: RwLock::new(HashSet::new()),
            banned: RwLock::new(HashSet::new()),
        }
    }

    /// Whether the user is on the configured admin allow-list
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    /// Whether the user has been banned by an admin
    pub async fn is_banned(&self, user: UserId) -> bool {
        self.banned.read().await.contains(&user)
    }

    /// Adds the user to the ban set
    pub async fn ban(&self, user: UserId) {
        self.banned.write().await.insert(user);
    }

    /// Removes the user from the ban set
    pub async fn unban(&self, user: UserId) {
        self.banned.write().await.remove(&user);
    }

    /// Records the user in the known-users set for broadcast and stats
    pub async fn remember(&self, user: UserId) {
        self.known_users.write().await.insert(user);
    }

    /// Snapshot of every known user, taken so broadcast sends hold no lock
    pub async fn known_users(&self) -> Vec<UserId> {
        self.known_users.read().await.iter().copied().collect()
    }

    /// Number of users seen so far
    pub async fn user_count(&self) -> usize {
        self.known_users.read().await.len()
    }

    /// Number of banned users
    pub async fn banned_count(&self) -> usize {
        self.banned.read().await.len()
    }

    /// Number of configured admins
    #[must_use]
    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    /// Live membership query against the gate channel, fail-closed
    pub async fn is_channel_member(&self, bot: &Bot, user: UserId) -> bool {
        let channel = Recipient::ChannelUsername(self.channel.clone());
        match bot.get_chat_member(channel, user).await {
            Ok(member) => matches!(
                member.status(),
                ChatMemberStatus::Owner | ChatMemberStatus::Administrator | ChatMemberStatus::Member
            ),
            Err(err) => {
                debug!("Membership query for {user} failed, treating as non-member: {err}");
                false
            }
        }
    }
}
