//! Ipisto - Discord bot to get the public IP of the machine running it.

use anyhow::Result;
use clap::Parser;
use ipisto::{
    command::CommandRegistrar,
    config::{ConfigOverrides, FileConfig, IpistoConfig},
    fetcher::IpFetcher,
    gateway::{DiscordConnection, DiscordPlatform},
    interaction::InteractionHandler,
    shutdown::wait_for_signal,
    App,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ipisto")]
#[command(version)]
#[command(about = "Discord bot to get the public IP of the machine running it")]
struct Cli {
    /// Discord bot token. Must be present on the command line, in the
    /// environment or in the config file.
    #[arg(long, value_name = "TOKEN", env = "IPISTO_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG-FILE", env = "IPISTO_CONFIG")]
    config: Option<PathBuf>,

    /// Name of the Discord command to register [default: publicip]
    #[arg(long)]
    slash_command_name: Option<String>,

    /// URL that answers a GET with the caller's public IP as plain text
    /// [default: https://ipinfo.io/ip]
    #[arg(long, value_name = "URL")]
    ip_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let config = IpistoConfig::resolve(
        ConfigOverrides {
            bot_token: cli.bot_token,
            slash_command_name: cli.slash_command_name,
            ip_url: cli.ip_url,
        },
        file,
    )?;

    init_logging(cli.verbose, cli.log_json);
    tracing::info!(config_file = ?cli.config, ?config, "bot started");

    run(config).await
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ipisto={}", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(config: IpistoConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("ipisto/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let (connection, ready, events) = DiscordConnection::connect(config.bot_token()).await?;
    let platform = Arc::new(DiscordPlatform::new(connection.http()));
    let handler = InteractionHandler::new(
        config.slash_command_name.clone(),
        IpFetcher::new(client, config.ip_url.clone()),
        platform.clone(),
    );

    let app = App::new(
        config.command_spec(),
        CommandRegistrar::new(platform),
        handler,
    );
    app.serve(connection, &ready, events, wait_for_signal()).await?;

    Ok(())
}
