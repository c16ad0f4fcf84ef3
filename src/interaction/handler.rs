//! Interaction handler
//!
//! Drives one slash command invocation through
//! acknowledge → fetch → deliver. Every step is attempted exactly once and
//! a failure ends the flow for that interaction only.

use super::responder::InteractionResponder;
use super::types::{Interaction, InteractionOutcome, InteractionState, Invoker, Stage};
use crate::fetcher::IpFetcher;
use std::fmt::Display;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handles invocations of the public IP command
pub struct InteractionHandler {
    command_name: String,
    fetcher: IpFetcher,
    responder: Arc<dyn InteractionResponder>,
}

impl InteractionHandler {
    /// Create a handler answering `command_name`
    pub fn new(
        command_name: impl Into<String>,
        fetcher: IpFetcher,
        responder: Arc<dyn InteractionResponder>,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            fetcher,
            responder,
        }
    }

    /// Run the full flow for one interaction.
    ///
    /// Events for other commands return [`InteractionOutcome::Ignored`]
    /// without any side effect. `cancel` is checked before the deferral and
    /// raced against the fetch and the follow-up.
    pub async fn handle(
        &self,
        interaction: Interaction,
        cancel: &CancellationToken,
    ) -> InteractionOutcome {
        if interaction.command_name != self.command_name {
            return InteractionOutcome::Ignored;
        }

        log_activation(&interaction);
        let mut progress = Progress::new(&interaction);

        if cancel.is_cancelled() {
            return progress.fail(Stage::Acknowledge, "shutdown in progress");
        }
        if let Err(e) = self.responder.defer(&interaction).await {
            return progress.fail(Stage::Acknowledge, e);
        }
        progress.advance(InteractionState::Acknowledged);
        tracing::info!(
            interaction_id = interaction.id,
            "interaction responded successfully"
        );

        let address = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return progress.fail(Stage::Fetch, "shutdown in progress");
            }
            result = self.fetcher.fetch() => match result {
                Ok(address) => address,
                Err(e) => return progress.fail(Stage::Fetch, e),
            },
        };
        progress.advance(InteractionState::Resolved);
        tracing::info!(
            interaction_id = interaction.id,
            public_ip = %address,
            "IP address retrieved"
        );

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return progress.fail(Stage::FollowUp, "shutdown in progress");
            }
            result = self.responder.follow_up(&interaction, &address) => result,
        };
        if let Err(e) = sent {
            return progress.fail(Stage::FollowUp, e);
        }
        progress.advance(InteractionState::Delivered);
        tracing::info!(
            interaction_id = interaction.id,
            "command responded successfully, exiting handler"
        );

        InteractionOutcome::Delivered { address }
    }
}

fn log_activation(interaction: &Interaction) {
    match &interaction.invoker {
        Invoker::DirectMessage { user, user_id } => tracing::info!(
            interaction_id = interaction.id,
            dm_user = %user,
            dm_user_id = user_id,
            "command activated in a DM"
        ),
        Invoker::GuildMember {
            user,
            user_id,
            guild_id,
        } => tracing::info!(
            interaction_id = interaction.id,
            guild_user = %user,
            guild_user_id = user_id,
            guild_id,
            "command activated in a guild"
        ),
        Invoker::Unknown => tracing::info!(
            interaction_id = interaction.id,
            "command activated by unknown means"
        ),
    }
}

/// Current state of one interaction, with transition logging
struct Progress<'a> {
    interaction: &'a Interaction,
    state: InteractionState,
}

impl<'a> Progress<'a> {
    fn new(interaction: &'a Interaction) -> Self {
        Self {
            interaction,
            state: InteractionState::Received,
        }
    }

    fn advance(&mut self, next: InteractionState) {
        debug_assert!(self.state.can_transition_to(next));
        tracing::debug!(
            interaction_id = self.interaction.id,
            user_id = ?self.interaction.invoker.user_id(),
            from = %self.state,
            to = %next,
            "interaction state changed"
        );
        self.state = next;
    }

    fn fail(&mut self, stage: Stage, reason: impl Display) -> InteractionOutcome {
        let reason = reason.to_string();
        tracing::error!(
            interaction_id = self.interaction.id,
            invoker = %self.interaction.invoker,
            from = %self.state,
            %stage,
            error = %reason,
            "interaction failed"
        );
        self.advance(InteractionState::Failed);
        InteractionOutcome::Failed { stage, reason }
    }
}
