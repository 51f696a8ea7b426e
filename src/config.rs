//! Configuration and settings management
//!
//! Loads settings from environment variables and defines probe constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,

    /// Public channel username (with or without a leading `@`) users must join
    pub public_channel: String,

    /// Optional invite link to a private channel, shown on the join prompt
    pub private_link: Option<String>,

    /// Comma-separated list of admin user IDs
    #[serde(rename = "admins")]
    pub admins_str: Option<String>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use aio_checker::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key
    /// (`BOT_TOKEN`, `PUBLIC_CHANNEL`) is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Fallback: check environment variables directly if config didn't pick them up
        if settings.private_link.is_none() {
            if let Ok(val) = std::env::var("PRIVATE_LINK") {
                if !val.is_empty() {
                    settings.private_link = Some(val);
                }
            }
        }
        if settings.admins_str.is_none() {
            if let Ok(val) = std::env::var("ADMINS") {
                if !val.is_empty() {
                    settings.admins_str = Some(val);
                }
            }
        }

        Ok(settings)
    }

    /// Returns the set of Telegram IDs with access to the admin console
    #[must_use]
    pub fn admins(&self) -> HashSet<u64> {
        self.admins_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<u64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Channel identifier in the `@username` form expected by membership queries
    #[must_use]
    pub fn channel_username(&self) -> String {
        let trimmed = self.public_channel.trim();
        if trimmed.starts_with('@') {
            trimmed.to_string()
        } else {
            format!("@{trimmed}")
        }
    }

    /// Public `t.me` link for the join button
    #[must_use]
    pub fn channel_join_url(&self) -> String {
        format!(
            "https://t.me/{}",
            self.public_channel.trim().trim_start_matches('@')
        )
    }

    /// Private invite link, if one is configured and non-blank
    #[must_use]
    pub fn private_invite_link(&self) -> Option<&str> {
        self.private_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn base_settings() -> Settings {
        Settings {
            bot_token: "dummy".to_string(),
            public_channel: "@checker_channel".to_string(),
            private_link: None,
            admins_str: None,
        }
    }

    // Env scenarios live in one test to avoid variable races between threads
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Standard loading with an empty optional treated as unset
        env::set_var("BOT_TOKEN", "123456:dummy_token");
        env::set_var("PUBLIC_CHANNEL", "@some_channel");
        env::set_var("PRIVATE_LINK", "");

        let settings = Settings::new()?;
        assert_eq!(settings.bot_token, "123456:dummy_token");
        assert_eq!(settings.public_channel, "@some_channel");
        // ignore_empty plus the fallback's is_empty guard leave it unset
        assert_eq!(settings.private_link, None);

        // 2. Optional picked up when present
        env::set_var("PRIVATE_LINK", "https://t.me/+abcdef");
        let settings = Settings::new()?;
        assert_eq!(
            settings.private_link,
            Some("https://t.me/+abcdef".to_string())
        );

        // 3. Missing required token fails loading
        env::remove_var("BOT_TOKEN");
        assert!(Settings::new().is_err());

        env::remove_var("PUBLIC_CHANNEL");
        env::remove_var("PRIVATE_LINK");
        Ok(())
    }

    #[test]
    fn test_admin_list_parsing() {
        let mut settings = base_settings();

        // Comma
        settings.admins_str = Some("123,456".to_string());
        let admins = settings.admins();
        assert!(admins.contains(&123));
        assert!(admins.contains(&456));
        assert_eq!(admins.len(), 2);

        // Space
        settings.admins_str = Some("111 222".to_string());
        let admins = settings.admins();
        assert!(admins.contains(&111));
        assert!(admins.contains(&222));
        assert_eq!(admins.len(), 2);

        // Semicolon and mixed
        settings.admins_str = Some("333; 444, 555".to_string());
        let admins = settings.admins();
        assert!(admins.contains(&333));
        assert!(admins.contains(&444));
        assert!(admins.contains(&555));
        assert_eq!(admins.len(), 3);

        // Non-numeric entries are skipped
        settings.admins_str = Some("abc, 777".to_string());
        let admins = settings.admins();
        assert!(admins.contains(&777));
        assert_eq!(admins.len(), 1);

        // Unset list means no admins
        settings.admins_str = None;
        assert!(settings.admins().is_empty());
    }

    #[test]
    fn test_channel_normalization() {
        let mut settings = base_settings();
        assert_eq!(settings.channel_username(), "@checker_channel");
        assert_eq!(settings.channel_join_url(), "https://t.me/checker_channel");

        settings.public_channel = "bare_name".to_string();
        assert_eq!(settings.channel_username(), "@bare_name");
        assert_eq!(settings.channel_join_url(), "https://t.me/bare_name");
    }

    #[test]
    fn test_private_invite_link_blank_is_none() {
        let mut settings = base_settings();
        settings.private_link = Some("   ".to_string());
        assert_eq!(settings.private_invite_link(), None);

        settings.private_link = Some("https://t.me/+invite".to_string());
        assert_eq!(settings.private_invite_link(), Some("https://t.me/+invite"));
    }
}

// Probe configuration
/// Timeout for API and URL probes
pub const API_PROBE_TIMEOUT_SECS: u64 = 8;
/// Timeout for proxy relay probes
pub const PROXY_PROBE_TIMEOUT_SECS: u64 = 6;
/// Endpoint used to validate bearer credentials
pub const BEARER_CHECK_URL: &str = "https://httpbin.org/bearer";
/// Endpoint that echoes the caller's egress IP, fetched through the proxy under test
pub const IP_ECHO_URL: &str = "https://api.ipify.org";

// Result registry configuration
/// Length of a rendered result token
pub const RESULT_TOKEN_LEN: usize = 12;
/// Time-to-live for stored result tokens
pub const RESULT_TOKEN_TTL_SECS: u64 = 3600;
/// Maximum number of live result tokens
pub const RESULT_REGISTRY_CAPACITY: u64 = 10_000;
