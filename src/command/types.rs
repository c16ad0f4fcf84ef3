//! Slash command definitions

/// Description shown for the public IP command
pub const COMMAND_DESCRIPTION: &str = "Get public IP of this bot's server";

/// A command to be registered with the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
}

impl CommandSpec {
    /// Create a command spec
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Platform-side registration record of a slash command.
///
/// Not `Clone`: the record is consumed by deregistration, so a process can
/// only remove what it registered, once.
#[derive(Debug, PartialEq, Eq)]
pub struct RegisteredCommand {
    /// Id assigned by the platform
    pub id: u64,
    pub name: String,
    pub description: String,
}
