//! Slash command registration

mod registrar;
mod types;

pub use registrar::{CommandApi, CommandRegistrar};
pub use types::{CommandSpec, RegisteredCommand, COMMAND_DESCRIPTION};
