//! View layer for bot UI components
//!
//! Contains keyboards, messages, and callback data for the Telegram UI.

pub mod admin;
pub mod checker;

pub use admin::*;
pub use checker::*;
