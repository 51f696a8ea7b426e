//! Result token registry
//!
//! Maps the short opaque tokens carried by Re-Check/Delete buttons back to
//! the target string that produced the rendered result. Entries are bounded
//! by capacity and TTL, so a token on a stale message can expire; pressing
//! its button then yields the expired-action notice instead of a probe.

use crate::config::{RESULT_REGISTRY_CAPACITY, RESULT_TOKEN_LEN, RESULT_TOKEN_TTL_SECS};
use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

/// Token-to-target store backing the result action buttons
#[derive(Clone)]
pub struct ResultRegistry {
    /// Moka cache storing token -> target with automatic TTL eviction
    cache: Cache<String, String>,
}

impl ResultRegistry {
    /// Registry with the default capacity and TTL bounds
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(RESULT_TOKEN_TTL_SECS, RESULT_REGISTRY_CAPACITY)
    }

    /// Registry with explicit bounds
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - Time-to-live for stored tokens
    /// * `max_capacity` - Maximum number of live tokens
    #[must_use]
    pub fn with_limits(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Stores a target and returns the fresh token identifying it
    ///
    /// Every registration mints a new token, including re-checks of a
    /// target that is already stored under an older one.
    pub async fn register(&self, target: &str) -> String {
        let mut token = Uuid::new_v4().as_simple().to_string();
        token.truncate(RESULT_TOKEN_LEN);
        self.cache.insert(token.clone(), target.to_string()).await;
        token
    }

    /// Looks up the target a token was minted for, `None` once expired
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.cache.get(token).await
    }

    /// Drops a token, making later presses of its buttons expire
    pub async fn forget(&self, token: &str) {
        self.cache.invalidate(token).await;
    }

    /// Returns the current number of live tokens
    ///
    /// Useful for monitoring and health checks.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ResultRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_resolve_round_trip() {
        let registry = ResultRegistry::with_limits(60, 100);

        let token = registry.register("https://api.example.com").await;
        assert_eq!(
            registry.resolve(&token).await.as_deref(),
            Some("https://api.example.com")
        );
    }

    #[tokio::test]
    async fn test_forget_makes_token_unresolvable() {
        let registry = ResultRegistry::with_limits(60, 100);

        let token = registry.register("1.2.3.4:8080").await;
        registry.forget(&token).await;

        assert_eq!(registry.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let registry = ResultRegistry::with_limits(60, 100);

        assert_eq!(registry.resolve("deadbeef0000").await, None);
    }

    #[tokio::test]
    async fn test_tokens_are_short_hex_and_distinct() {
        let registry = ResultRegistry::with_limits(60, 100);

        let first = registry.register("target").await;
        let second = registry.register("target").await;

        assert_eq!(first.len(), RESULT_TOKEN_LEN);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        // Same target, fresh token every time
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_entry_count() {
        let registry = ResultRegistry::with_limits(60, 100);

        registry.register("one").await;
        registry.register("two").await;

        // Manually run pending tasks to update the entry count
        registry.cache.run_pending_tasks().await;

        assert_eq!(registry.entry_count(), 2);
    }
}
