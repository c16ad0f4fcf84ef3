//! Gateway events and the dispatch loop
//!
//! The gateway adapter pushes [`GatewayEvent`]s into a channel; the
//! [`EventLoop`] routes each variant to its handler. Interactions are
//! independent of each other and each one runs on its own task.

use crate::interaction::{Interaction, InteractionHandler, InteractionOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity reported by the gateway once the session is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyInfo {
    pub user_name: String,
    pub discriminator: Option<u16>,
    pub user_id: u64,
    pub application_id: u64,
}

/// Events consumed from the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Session is ready
    Ready(ReadyInfo),
    /// A slash command was invoked
    InteractionCreate(Interaction),
}

/// Log the bot identity from a ready event
pub fn log_ready(info: &ReadyInfo) {
    tracing::info!(
        username = %info.user_name,
        discriminator = ?info.discriminator,
        id = info.user_id,
        application_id = info.application_id,
        "logged in"
    );
}

/// Routes gateway events to their handlers until cancelled
pub struct EventLoop {
    handler: Arc<InteractionHandler>,
    cancel: CancellationToken,
}

impl EventLoop {
    /// Create an event loop
    pub fn new(handler: Arc<InteractionHandler>, cancel: CancellationToken) -> Self {
        Self { handler, cancel }
    }

    /// Consume events until the token is cancelled or the channel closes.
    ///
    /// Interaction tasks already spawned are not awaited.
    pub async fn run(self, mut events: mpsc::Receiver<GatewayEvent>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("event loop cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        self.dispatch(event);
                    }
                    None => {
                        tracing::debug!("gateway event channel closed");
                        break;
                    }
                },
            }
        }
    }

    /// Route one event. Interactions are spawned and their task returned.
    pub fn dispatch(&self, event: GatewayEvent) -> Option<JoinHandle<InteractionOutcome>> {
        match event {
            GatewayEvent::Ready(info) => {
                log_ready(&info);
                None
            }
            GatewayEvent::InteractionCreate(interaction) => {
                let handler = self.handler.clone();
                let cancel = self.cancel.child_token();
                Some(tokio::spawn(async move {
                    handler.handle(interaction, &cancel).await
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::fetcher::IpFetcher;
    use crate::interaction::{InteractionResponder, Invoker};
    use async_trait::async_trait;
    use reqwest::Url;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingResponder {
        follow_ups: Mutex<Vec<(u64, String)>>,
    }

    #[async_trait]
    impl InteractionResponder for CollectingResponder {
        async fn defer(&self, _interaction: &Interaction) -> Result<()> {
            Ok(())
        }

        async fn follow_up(&self, interaction: &Interaction, content: &str) -> Result<()> {
            self.follow_ups
                .lock()
                .unwrap()
                .push((interaction.id, content.to_string()));
            Ok(())
        }
    }

    fn create_interaction(id: u64) -> Interaction {
        Interaction {
            id,
            token: format!("token-{}", id),
            command_name: "publicip".to_string(),
            invoker: Invoker::DirectMessage {
                user: "alice".to_string(),
                user_id: 42,
            },
        }
    }

    async fn create_event_loop(
        responder: Arc<CollectingResponder>,
        cancel: CancellationToken,
    ) -> (EventLoop, mockito::ServerGuard, mockito::Mock) {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ip")
            .with_status(200)
            .with_body("203.0.113.9")
            .create_async()
            .await;
        let url = Url::parse(&format!("{}/ip", server.url())).unwrap();
        let handler = InteractionHandler::new(
            "publicip",
            IpFetcher::new(reqwest::Client::new(), url),
            responder,
        );
        (EventLoop::new(Arc::new(handler), cancel), server, mock)
    }

    #[tokio::test]
    async fn test_dispatch_ready_spawns_nothing() {
        let responder = Arc::new(CollectingResponder::default());
        let (event_loop, _server, _mock) =
            create_event_loop(responder, CancellationToken::new()).await;

        let ready = ReadyInfo {
            user_name: "ipisto".to_string(),
            discriminator: None,
            user_id: 1,
            application_id: 1,
        };
        assert!(event_loop.dispatch(GatewayEvent::Ready(ready)).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_interactions_independently() {
        let responder = Arc::new(CollectingResponder::default());
        let (event_loop, _server, _mock) =
            create_event_loop(responder.clone(), CancellationToken::new()).await;

        let first = event_loop
            .dispatch(GatewayEvent::InteractionCreate(create_interaction(1)))
            .unwrap();
        let second = event_loop
            .dispatch(GatewayEvent::InteractionCreate(create_interaction(2)))
            .unwrap();

        assert!(matches!(first.await.unwrap(), InteractionOutcome::Delivered { .. }));
        assert!(matches!(second.await.unwrap(), InteractionOutcome::Delivered { .. }));

        let mut follow_ups = responder.follow_ups.lock().unwrap().clone();
        follow_ups.sort();
        assert_eq!(
            follow_ups,
            vec![
                (1, "203.0.113.9".to_string()),
                (2, "203.0.113.9".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let responder = Arc::new(CollectingResponder::default());
        let (event_loop, _server, _mock) =
            create_event_loop(responder, CancellationToken::new()).await;
        let (tx, rx) = mpsc::channel(4);
        drop(tx);

        event_loop.run(rx).await;
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let responder = Arc::new(CollectingResponder::default());
        let cancel = CancellationToken::new();
        let (event_loop, _server, _mock) = create_event_loop(responder.clone(), cancel.clone()).await;
        let (_tx, rx) = mpsc::channel(4);

        cancel.cancel();
        event_loop.run(rx).await;

        assert!(responder.follow_ups.lock().unwrap().is_empty());
    }
}
