//! Gateway integration
//!
//! Event types and the dispatch loop, plus the serenity-backed Discord
//! adapter that feeds them.

mod discord;
mod events;

pub use discord::{DiscordConnection, DiscordPlatform};
pub use events::{log_ready, EventLoop, GatewayEvent, ReadyInfo};
