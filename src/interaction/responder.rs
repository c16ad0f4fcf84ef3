//! Platform calls made on behalf of an interaction

use super::types::Interaction;
use crate::error::Result;
use async_trait::async_trait;

/// Sends responses for an interaction back to the platform
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Send the deferred acknowledgment ("thinking…")
    async fn defer(&self, interaction: &Interaction) -> Result<()>;

    /// Send a plain-text follow-up message after a deferral
    async fn follow_up(&self, interaction: &Interaction, content: &str) -> Result<()>;
}
