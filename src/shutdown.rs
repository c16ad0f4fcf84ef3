//! Termination signals and ordered teardown
//!
//! The gateway connection is wrapped in a [`ConnectionGuard`] as soon as it
//! is open. Every exit path releases it exactly once: `release()` closes it
//! gracefully, dropping an unreleased guard aborts it.

use crate::command::{CommandRegistrar, RegisteredCommand};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Signal that triggered a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for the first SIGINT or SIGTERM
#[cfg(unix)]
pub async fn wait_for_signal() -> Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())
        .map_err(|e| Error::Signal(format!("failed to install SIGINT handler: {}", e)))?;
    let mut terminate = signal(SignalKind::terminate())
        .map_err(|e| Error::Signal(format!("failed to install SIGTERM handler: {}", e)))?;

    tokio::select! {
        _ = interrupt.recv() => Ok(ShutdownSignal::Interrupt),
        _ = terminate.recv() => Ok(ShutdownSignal::Terminate),
    }
}

/// Wait for Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_signal() -> Result<ShutdownSignal> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Signal(format!("failed to listen for Ctrl+C: {}", e)))?;
    Ok(ShutdownSignal::Interrupt)
}

/// A persistent gateway connection that must be released once
#[async_trait]
pub trait GatewayConnection: Send {
    /// Close the connection gracefully
    async fn close(&mut self);

    /// Tear the connection down without waiting
    fn abort(&mut self);
}

/// Owns a gateway connection and releases it exactly once
pub struct ConnectionGuard<C: GatewayConnection> {
    connection: Option<C>,
}

impl<C: GatewayConnection> ConnectionGuard<C> {
    /// Take ownership of an open connection
    pub fn new(connection: C) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    /// Close the connection gracefully
    pub async fn release(mut self) {
        if let Some(mut connection) = self.connection.take() {
            tracing::info!("closing gateway connection");
            connection.close().await;
        }
    }
}

impl<C: GatewayConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            tracing::warn!("gateway connection dropped without release, aborting");
            connection.abort();
        }
    }
}

/// Blocks until a termination signal, then tears down in order:
/// cancel in-flight work, deregister the command, release the connection.
pub struct ShutdownCoordinator<C: GatewayConnection> {
    connection: ConnectionGuard<C>,
    cancel: CancellationToken,
}

impl<C: GatewayConnection> ShutdownCoordinator<C> {
    /// Create a coordinator owning `connection`
    pub fn new(connection: ConnectionGuard<C>, cancel: CancellationToken) -> Self {
        Self { connection, cancel }
    }

    /// Abandon startup: cancel, release the connection, hand back `error`
    pub async fn abort_startup(self, error: Error) -> Error {
        tracing::error!(error = %error, "startup failed");
        self.cancel.cancel();
        self.connection.release().await;
        error
    }

    /// Wait for `signal`, then deregister `command` and release the
    /// connection. The deregistration result is returned after release.
    pub async fn run<S>(
        self,
        registrar: &CommandRegistrar,
        command: RegisteredCommand,
        signal: S,
    ) -> Result<()>
    where
        S: Future<Output = Result<ShutdownSignal>>,
    {
        let signal_result = signal.await;
        match &signal_result {
            Ok(received) => tracing::info!(signal = %received, "signal to stop received"),
            Err(e) => tracing::error!(error = %e, "signal handling failed, stopping"),
        }

        self.cancel.cancel();

        let deregistered = registrar.deregister(command).await;
        if let Err(e) = &deregistered {
            tracing::error!(error = %e, "error while deleting command");
        }

        self.connection.release().await;

        deregistered?;
        signal_result?;
        tracing::info!("exiting");
        Ok(())
    }
}
