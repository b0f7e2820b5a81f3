pub mod api;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod messages;
pub mod notifications;
pub mod query;
pub mod server;
pub mod session;
