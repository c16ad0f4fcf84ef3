//! Slash command interactions
//!
//! Data model for a single invocation and the handler that answers it.

mod handler;
mod responder;
mod types;

pub use handler::InteractionHandler;
pub use responder::InteractionResponder;
pub use types::{Interaction, InteractionOutcome, InteractionState, Invoker, Stage};
