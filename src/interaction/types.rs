//! Interaction data model

use std::fmt;

/// One invocation of a slash command, as delivered by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Platform-assigned interaction id
    pub id: u64,
    /// Continuation token used for the deferral and the follow-up
    pub token: String,
    /// Name of the invoked command
    pub command_name: String,
    /// Who triggered the command
    pub invoker: Invoker,
}

/// Where an interaction came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invoker {
    /// Invoked from a direct message
    DirectMessage { user: String, user_id: u64 },
    /// Invoked by a member of a guild
    GuildMember {
        user: String,
        user_id: u64,
        guild_id: u64,
    },
    /// Neither a DM user nor a guild member was attached
    Unknown,
}

impl Invoker {
    /// Id of the invoking user, if known
    pub fn user_id(&self) -> Option<u64> {
        match self {
            Self::DirectMessage { user_id, .. } | Self::GuildMember { user_id, .. } => {
                Some(*user_id)
            }
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectMessage { user, user_id } => write!(f, "{} ({}) via DM", user, user_id),
            Self::GuildMember {
                user,
                user_id,
                guild_id,
            } => write!(f, "{} ({}) in guild {}", user, user_id, guild_id),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-interaction state
///
/// ```text
/// Received → Acknowledged → Resolved → Delivered
///     └──────────┴─────────────┴──────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    /// Event accepted for the configured command
    Received,
    /// Deferred acknowledgment sent
    Acknowledged,
    /// Public address resolved
    Resolved,
    /// Follow-up message sent
    Delivered,
    /// A step failed; nothing further is attempted
    Failed,
}

impl InteractionState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Received, Self::Acknowledged)
            | (Self::Acknowledged, Self::Resolved)
            | (Self::Resolved, Self::Delivered) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Step of the flow in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acknowledge,
    Fetch,
    FollowUp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Acknowledge => "acknowledge",
            Self::Fetch => "fetch",
            Self::FollowUp => "follow_up",
        };
        f.write_str(s)
    }
}

/// Final result of handling one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The event was for another command; nothing was done
    Ignored,
    /// The address was delivered to the invoker
    Delivered { address: String },
    /// The flow stopped at `stage`
    Failed { stage: Stage, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(InteractionState::Received.can_transition_to(InteractionState::Acknowledged));
        assert!(InteractionState::Acknowledged.can_transition_to(InteractionState::Resolved));
        assert!(InteractionState::Resolved.can_transition_to(InteractionState::Delivered));
    }

    #[test]
    fn test_no_skipping_steps() {
        assert!(!InteractionState::Received.can_transition_to(InteractionState::Resolved));
        assert!(!InteractionState::Received.can_transition_to(InteractionState::Delivered));
        assert!(!InteractionState::Acknowledged.can_transition_to(InteractionState::Delivered));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        for state in [
            InteractionState::Received,
            InteractionState::Acknowledged,
            InteractionState::Resolved,
        ] {
            assert!(state.can_transition_to(InteractionState::Failed));
        }
        assert!(!InteractionState::Delivered.can_transition_to(InteractionState::Failed));
        assert!(!InteractionState::Failed.can_transition_to(InteractionState::Failed));
    }

    #[test]
    fn test_invoker_display_and_user_id() {
        let dm = Invoker::DirectMessage {
            user: "alice".to_string(),
            user_id: 42,
        };
        assert_eq!(dm.to_string(), "alice (42) via DM");
        assert_eq!(dm.user_id(), Some(42));

        let member = Invoker::GuildMember {
            user: "bob".to_string(),
            user_id: 7,
            guild_id: 99,
        };
        assert_eq!(member.to_string(), "bob (7) in guild 99");

        assert_eq!(Invoker::Unknown.user_id(), None);
    }
}
