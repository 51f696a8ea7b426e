#![deny(missing_docs)]
//! Telegram bot that validates API endpoints, keys, and HTTP proxies.
//!
//! Access to the checkers is gated behind channel membership. Every check
//! result carries re-check and delete buttons backed by a bounded token
//! registry, and admins get broadcast, ban management, stats, and restart.

/// Telegram bot surface: handlers, dialogue state, views.
pub mod bot;
/// Configuration management.
pub mod config;
/// Admin allow-list, ban set, and channel-membership gate.
pub mod gate;
/// Probe engine for API, URL, and proxy checks.
pub mod probe;
/// Result token registry backing the re-check and delete buttons.
pub mod registry;
/// Utility functions.
pub mod utils;
