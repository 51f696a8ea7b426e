/// Admin console handlers (broadcast, ban management, stats, restart)
pub mod admin;
/// General command and message handlers
pub mod handlers;
/// Common messaging utilities (split long messages)
pub mod messaging;
/// User state and dialogue management
pub mod state;
/// View layer for UI components (keyboards, messages, callback data)
pub mod views;
