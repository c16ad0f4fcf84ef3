//! Discord adapter backed by serenity
//!
//! Serenity owns the websocket (handshake, heartbeats, reconnects). This
//! module only forwards its events into a channel and exposes the REST
//! calls the bot needs through the crate's platform traits.

use super::events::{GatewayEvent, ReadyInfo};
use crate::command::{CommandApi, CommandSpec, RegisteredCommand};
use crate::error::{Error, Result};
use crate::interaction::{Interaction, InteractionResponder, Invoker};
use crate::shutdown::GatewayConnection;
use serenity::builder::{
    CreateCommand, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage,
};
use serenity::client::{Client, Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::model::application::{Command, CommandInteraction, Interaction as DiscordInteraction};
use serenity::model::gateway::Ready;
use serenity::model::id::{ApplicationId, CommandId, InteractionId};
use serenity::prelude::GatewayIntents;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 256;

/// REST side of the Discord API used by the bot
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    /// Wrap a serenity HTTP client
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl InteractionResponder for DiscordPlatform {
    async fn defer(&self, interaction: &Interaction) -> Result<()> {
        let response = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        self.http
            .create_interaction_response(
                InteractionId::new(interaction.id),
                &interaction.token,
                &response,
                Vec::new(),
            )
            .await
            .map_err(|e| Error::Platform(format!("deferred response failed: {}", e)))
    }

    async fn follow_up(&self, interaction: &Interaction, content: &str) -> Result<()> {
        let followup = CreateInteractionResponseFollowup::new().content(content);
        self.http
            .create_followup_message(&interaction.token, &followup, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| Error::Platform(format!("follow-up message failed: {}", e)))
    }
}

#[async_trait::async_trait]
impl CommandApi for DiscordPlatform {
    async fn create_command(&self, spec: &CommandSpec) -> Result<RegisteredCommand> {
        let builder = CreateCommand::new(&spec.name).description(&spec.description);
        let command = Command::create_global_command(self.http.as_ref(), builder)
            .await
            .map_err(|e| Error::Registration(e.to_string()))?;

        Ok(RegisteredCommand {
            id: command.id.get(),
            name: command.name,
            description: command.description,
        })
    }

    async fn delete_command(&self, command_id: u64) -> Result<()> {
        Command::delete_global_command(self.http.as_ref(), CommandId::new(command_id))
            .await
            .map_err(|e| Error::Deregistration(e.to_string()))
    }
}

/// Serenity event handler that forwards into the dispatch channel
struct GatewayForwarder {
    events: mpsc::Sender<GatewayEvent>,
}

impl GatewayForwarder {
    async fn forward(&self, event: GatewayEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("event loop gone, dropping gateway event");
        }
    }
}

#[serenity::async_trait]
impl EventHandler for GatewayForwarder {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let info = ReadyInfo {
            user_name: ready.user.name.clone(),
            discriminator: ready.user.discriminator.map(|d| d.get()),
            user_id: ready.user.id.get(),
            application_id: ready.application.id.get(),
        };
        self.forward(GatewayEvent::Ready(info)).await;
    }

    async fn interaction_create(&self, _ctx: Context, interaction: DiscordInteraction) {
        if let DiscordInteraction::Command(command) = interaction {
            self.forward(GatewayEvent::InteractionCreate(to_interaction(&command)))
                .await;
        }
    }
}

fn to_interaction(command: &CommandInteraction) -> Interaction {
    let invoker = match (command.guild_id, &command.member) {
        (Some(guild_id), Some(member)) => Invoker::GuildMember {
            user: member.user.tag(),
            user_id: member.user.id.get(),
            guild_id: guild_id.get(),
        },
        (None, _) => Invoker::DirectMessage {
            user: command.user.tag(),
            user_id: command.user.id.get(),
        },
        (Some(_), None) => Invoker::Unknown,
    };

    Interaction {
        id: command.id.get(),
        token: command.token.clone(),
        command_name: command.data.name.clone(),
        invoker,
    }
}

/// Open gateway session
pub struct DiscordConnection {
    shard_manager: Arc<ShardManager>,
    http: Arc<Http>,
    task: JoinHandle<serenity::Result<()>>,
}

impl DiscordConnection {
    /// Open a gateway session and wait until it is ready.
    ///
    /// Returns the connection, the ready identity, and the channel the
    /// gateway's events arrive on. The application id from the ready event
    /// is bound to the HTTP client for command registration.
    pub async fn connect(
        token: &str,
    ) -> Result<(Self, ReadyInfo, mpsc::Receiver<GatewayEvent>)> {
        let (events_tx, mut events) = mpsc::channel(EVENT_BUFFER);

        tracing::info!("creating Discord session");
        let mut client = Client::builder(token, GatewayIntents::empty())
            .event_handler(GatewayForwarder { events: events_tx })
            .await
            .map_err(|e| Error::Connection(format!("failed to create Discord session: {}", e)))?;

        let shard_manager = client.shard_manager.clone();
        let http = client.http.clone();

        tracing::info!("opening websocket connection");
        let task = tokio::spawn(async move { client.start().await });

        let mut connection = Self {
            shard_manager,
            http,
            task,
        };

        match connection.wait_ready(&mut events).await {
            Ok(ready) => {
                connection
                    .http
                    .set_application_id(ApplicationId::new(ready.application_id));
                Ok((connection, ready, events))
            }
            Err(e) => {
                connection.abort();
                Err(e)
            }
        }
    }

    /// Shared HTTP client of this session
    pub fn http(&self) -> Arc<Http> {
        self.http.clone()
    }

    async fn wait_ready(&mut self, events: &mut mpsc::Receiver<GatewayEvent>) -> Result<ReadyInfo> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(GatewayEvent::Ready(info)) => return Ok(info),
                    Some(other) => {
                        tracing::debug!(event = ?other, "dropping event received before ready");
                    }
                    None => {
                        return Err(Error::Connection(
                            "gateway event channel closed before ready".to_string(),
                        ));
                    }
                },
                joined = &mut self.task => {
                    let reason = match joined {
                        Ok(Ok(())) => "gateway closed before ready".to_string(),
                        Ok(Err(e)) => e.to_string(),
                        Err(e) => format!("gateway task failed: {}", e),
                    };
                    return Err(Error::Connection(reason));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl GatewayConnection for DiscordConnection {
    async fn close(&mut self) {
        self.shard_manager.shutdown_all().await;
        match (&mut self.task).await {
            Ok(Ok(())) => tracing::info!("gateway connection closed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "gateway client stopped with error"),
            Err(e) => tracing::warn!(error = %e, "gateway task did not finish cleanly"),
        }
    }

    fn abort(&mut self) {
        self.task.abort();
    }
}
