use serde::{Deserialize, Serialize};

/// Check flow selected from a mode menu
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckMode {
    /// One API key or URL per message
    ApiSingle,
    /// Uploaded file with one API key or URL per line
    ApiBulk,
    /// One proxy per message
    ProxySingle,
    /// Uploaded file with one proxy per line
    ProxyBulk,
}

impl CheckMode {
    /// Whether this mode probes proxies rather than APIs
    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::ProxySingle | Self::ProxyBulk)
    }
}

/// Represents the current state of the user dialogue
#[derive(Clone, Serialize, Deserialize, Default)]
pub enum State {
    /// No pending input
    #[default]
    Idle,
    /// User picked a check mode and owes the next input
    AwaitingTarget(CheckMode),
    /// Admin is about to send the broadcast text
    AwaitingBroadcast,
    /// Admin is about to send a user id to ban
    AwaitingBan,
    /// Admin is about to send a user id to unban
    AwaitingUnban,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_sides() {
        assert!(!CheckMode::ApiSingle.is_proxy());
        assert!(!CheckMode::ApiBulk.is_proxy());
        assert!(CheckMode::ProxySingle.is_proxy());
        assert!(CheckMode::ProxyBulk.is_proxy());
    }
}
