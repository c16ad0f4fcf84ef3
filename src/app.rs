//! Bot lifecycle
//!
//! ```text
//! connect ─► register ─► serve events ─► signal ─► deregister ─► release
//!               │                                       │
//!               └── failure: release, exit non-zero     └── failure: release, exit non-zero
//! ```

use crate::command::{CommandRegistrar, CommandSpec};
use crate::error::Result;
use crate::gateway::{log_ready, EventLoop, GatewayEvent, ReadyInfo};
use crate::interaction::InteractionHandler;
use crate::shutdown::{ConnectionGuard, GatewayConnection, ShutdownCoordinator, ShutdownSignal};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A configured bot, ready to serve one gateway session
pub struct App {
    spec: CommandSpec,
    registrar: CommandRegistrar,
    handler: Arc<InteractionHandler>,
}

impl App {
    /// Create the app
    pub fn new(spec: CommandSpec, registrar: CommandRegistrar, handler: InteractionHandler) -> Self {
        Self {
            spec,
            registrar,
            handler: Arc::new(handler),
        }
    }

    /// Serve an open connection until `signal` resolves.
    ///
    /// Registers the command, dispatches `events` until shutdown, then
    /// deregisters and releases the connection. The connection is released
    /// exactly once on every path.
    pub async fn serve<C, S>(
        self,
        connection: C,
        ready: &ReadyInfo,
        events: mpsc::Receiver<GatewayEvent>,
        signal: S,
    ) -> Result<()>
    where
        C: GatewayConnection,
        S: Future<Output = Result<ShutdownSignal>>,
    {
        let cancel = CancellationToken::new();
        let coordinator = ShutdownCoordinator::new(ConnectionGuard::new(connection), cancel.clone());
        log_ready(ready);

        let command = match self.registrar.register(&self.spec).await {
            Ok(command) => command,
            Err(e) => return Err(coordinator.abort_startup(e).await),
        };

        let event_loop = EventLoop::new(self.handler.clone(), cancel.child_token());
        let events_task = tokio::spawn(event_loop.run(events));

        let result = coordinator.run(&self.registrar, command, signal).await;

        if let Err(e) = events_task.await {
            tracing::warn!(error = %e, "event loop task failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandApi, RegisteredCommand};
    use crate::error::Error;
    use crate::fetcher::IpFetcher;
    use crate::interaction::{Interaction, InteractionResponder, Invoker};
    use crate::shutdown::tests::{FakeConnection, ReleaseCounter};
    use async_trait::async_trait;
    use reqwest::Url;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    struct FakePlatform {
        created: Mutex<Vec<String>>,
        deleted: Mutex<Vec<u64>>,
        fail_create: bool,
        follow_ups: mpsc::UnboundedSender<String>,
    }

    impl FakePlatform {
        fn new(fail_create: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let platform = Arc::new(Self {
                created: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                fail_create,
                follow_ups: tx,
            });
            (platform, rx)
        }
    }

    #[async_trait]
    impl CommandApi for FakePlatform {
        async fn create_command(&self, spec: &CommandSpec) -> Result<RegisteredCommand> {
            self.created.lock().unwrap().push(spec.name.clone());
            if self.fail_create {
                return Err(Error::Registration("Missing Access".to_string()));
            }
            Ok(RegisteredCommand {
                id: 9001,
                name: spec.name.clone(),
                description: spec.description.clone(),
            })
        }

        async fn delete_command(&self, command_id: u64) -> Result<()> {
            self.deleted.lock().unwrap().push(command_id);
            Ok(())
        }
    }

    #[async_trait]
    impl InteractionResponder for FakePlatform {
        async fn defer(&self, _interaction: &Interaction) -> Result<()> {
            Ok(())
        }

        async fn follow_up(&self, _interaction: &Interaction, content: &str) -> Result<()> {
            let _ = self.follow_ups.send(content.to_string());
            Ok(())
        }
    }

    fn ready() -> ReadyInfo {
        ReadyInfo {
            user_name: "ipisto".to_string(),
            discriminator: None,
            user_id: 10,
            application_id: 10,
        }
    }

    fn create_app(platform: Arc<FakePlatform>, url: Url) -> App {
        let handler = InteractionHandler::new(
            "publicip",
            IpFetcher::new(reqwest::Client::new(), url),
            platform.clone(),
        );
        App::new(
            CommandSpec::new("publicip", "Get public IP of this bot's server"),
            CommandRegistrar::new(platform),
            handler,
        )
    }

    #[tokio::test]
    async fn test_serve_until_sigterm() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ip")
            .with_status(200)
            .with_body("93.184.216.34")
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/ip", server.url())).unwrap();

        let (platform, mut follow_ups) = FakePlatform::new(false);
        let counter = Arc::new(ReleaseCounter::default());
        let (events_tx, events_rx) = mpsc::channel(8);
        let (signal_tx, signal_rx) = oneshot::channel();

        let app = create_app(platform.clone(), url);
        let serving = tokio::spawn({
            let connection = FakeConnection(counter.clone());
            async move {
                app.serve(connection, &ready(), events_rx, async move {
                    signal_rx
                        .await
                        .map_err(|_| Error::Signal("sender dropped".to_string()))
                })
                .await
            }
        });

        events_tx
            .send(GatewayEvent::InteractionCreate(Interaction {
                id: 1,
                token: "t".to_string(),
                command_name: "publicip".to_string(),
                invoker: Invoker::Unknown,
            }))
            .await
            .unwrap();
        assert_eq!(follow_ups.recv().await.unwrap(), "93.184.216.34");

        signal_tx.send(ShutdownSignal::Terminate).unwrap();
        serving.await.unwrap().unwrap();

        assert_eq!(*platform.created.lock().unwrap(), vec!["publicip".to_string()]);
        assert_eq!(*platform.deleted.lock().unwrap(), vec![9001]);
        assert_eq!(counter.releases(), 1);
    }

    #[tokio::test]
    async fn test_registration_failure_releases_without_deregistering() {
        let (platform, _follow_ups) = FakePlatform::new(true);
        let counter = Arc::new(ReleaseCounter::default());
        let (_events_tx, events_rx) = mpsc::channel(8);
        let app = create_app(platform.clone(), Url::parse("http://127.0.0.1:9/ip").unwrap());

        let result = app
            .serve(
                FakeConnection(counter.clone()),
                &ready(),
                events_rx,
                async { Ok(ShutdownSignal::Interrupt) },
            )
            .await;

        assert!(matches!(result, Err(Error::Registration(_))));
        assert!(platform.deleted.lock().unwrap().is_empty());
        assert_eq!(counter.releases(), 1);
    }
}
