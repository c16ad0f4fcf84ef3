//! Ipisto - Discord bot that reports the public IP of its host
//!
//! Ipisto keeps a gateway session open, registers a single slash command and
//! answers each invocation with the public address of the machine it runs
//! on, as reported by an IP echo service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Discord gateway (serenity)                │
//! └───────────────┬──────────────────────────────▲───────────────┘
//!                 │ GatewayEvent (mpsc)          │ defer / follow-up
//! ┌───────────────▼───────────────┐   ┌──────────┴───────────────┐
//! │           EventLoop           │──►│    InteractionHandler     │
//! │  Ready → log identity         │   │  Received → Acknowledged  │
//! │  InteractionCreate → spawn    │   │  → Resolved → Delivered   │
//! └───────────────────────────────┘   └──────────┬───────────────┘
//!                                                │ GET
//!                                     ┌──────────▼───────────────┐
//!                                     │         IpFetcher         │
//!                                     └──────────────────────────┘
//!
//! ShutdownCoordinator: SIGINT/SIGTERM → cancel → deregister → release
//! ```
//!
//! ## Modules
//!
//! - [`app`]: startup, serving and teardown sequence
//! - [`command`]: slash command registration
//! - [`interaction`]: per-invocation state machine
//! - [`fetcher`]: public IP lookup
//! - [`gateway`]: gateway events, dispatch loop and Discord adapter
//! - [`shutdown`]: signals and scoped connection release
//! - [`config`]: configuration management

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod interaction;
pub mod shutdown;

pub use app::App;
pub use config::IpistoConfig;
pub use error::{Error, FetchError, Result};
