//! Command registration lifecycle

use super::types::{CommandSpec, RegisteredCommand};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Platform operations on global slash commands
#[async_trait]
pub trait CommandApi: Send + Sync {
    /// Create the command and return the platform's record of it
    async fn create_command(&self, spec: &CommandSpec) -> Result<RegisteredCommand>;

    /// Delete the command with the given id
    async fn delete_command(&self, command_id: u64) -> Result<()>;
}

/// Registers the slash command at startup and removes it at shutdown
pub struct CommandRegistrar {
    api: Arc<dyn CommandApi>,
}

impl CommandRegistrar {
    /// Create a registrar backed by `api`
    pub fn new(api: Arc<dyn CommandApi>) -> Self {
        Self { api }
    }

    /// Register `spec`. A failure is fatal for the caller.
    pub async fn register(&self, spec: &CommandSpec) -> Result<RegisteredCommand> {
        tracing::info!(slash_command_name = %spec.name, "registering command");

        let command = self.api.create_command(spec).await.map_err(|e| match e {
            Error::Registration(_) => e,
            other => Error::Registration(other.to_string()),
        })?;

        tracing::info!(
            command_id = command.id,
            slash_command_name = %command.name,
            "command registered"
        );
        Ok(command)
    }

    /// Remove a registered command.
    ///
    /// Errors from the platform, including "unknown command" for an
    /// already-removed definition, are returned as-is.
    pub async fn deregister(&self, command: RegisteredCommand) -> Result<()> {
        tracing::info!(command_id = command.id, "deleting command");

        self.api
            .delete_command(command.id)
            .await
            .map_err(|e| match e {
                Error::Deregistration(_) => e,
                other => Error::Deregistration(other.to_string()),
            })?;

        tracing::info!(command_id = command.id, "command deleted");
        Ok(())
    }
}
