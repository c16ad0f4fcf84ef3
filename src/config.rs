//! Ipisto configuration management
//!
//! Values come from command-line flags or the environment, then from an
//! optional TOML file, then from defaults. The resolved [`IpistoConfig`] is
//! immutable for the life of the process.

use crate::command::{CommandSpec, COMMAND_DESCRIPTION};
use crate::error::{Error, Result};
use crate::fetcher::DEFAULT_IP_URL;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default slash command name
pub const DEFAULT_COMMAND_NAME: &str = "publicip";

/// Longest command name the platform accepts
const MAX_COMMAND_NAME_LEN: usize = 32;

/// Contents of the optional TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Bot token
    pub bot_token: Option<String>,

    /// Name of the slash command to register
    pub slash_command_name: Option<String>,

    /// IP echo service URL
    pub ip_url: Option<String>,
}

impl FileConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }
}

/// Values given explicitly on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bot_token: Option<String>,
    pub slash_command_name: Option<String>,
    pub ip_url: Option<String>,
}

/// Resolved configuration
#[derive(Clone)]
pub struct IpistoConfig {
    bot_token: String,
    /// Name of the slash command to register
    pub slash_command_name: String,
    /// IP echo service URL
    pub ip_url: Url,
}

impl IpistoConfig {
    /// Merge overrides over the file over defaults, then validate.
    ///
    /// An empty bot token counts as unset, so it falls through to the next
    /// source.
    pub fn resolve(overrides: ConfigOverrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let bot_token = non_empty(overrides.bot_token)
            .or_else(|| non_empty(file.bot_token))
            .ok_or_else(|| Error::Config("bot token is empty".to_string()))?;

        let slash_command_name = overrides
            .slash_command_name
            .or(file.slash_command_name)
            .unwrap_or_else(|| DEFAULT_COMMAND_NAME.to_string());
        validate_command_name(&slash_command_name)?;

        let ip_url = overrides
            .ip_url
            .or(file.ip_url)
            .unwrap_or_else(|| DEFAULT_IP_URL.to_string());
        let ip_url = parse_ip_url(&ip_url)?;

        Ok(Self {
            bot_token,
            slash_command_name,
            ip_url,
        })
    }

    /// Bot token used to authenticate the gateway session
    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    /// Command registered at startup
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::new(&self.slash_command_name, COMMAND_DESCRIPTION)
    }
}

impl fmt::Debug for IpistoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpistoConfig")
            .field("bot_token", &"[redacted]")
            .field("slash_command_name", &self.slash_command_name)
            .field("ip_url", &self.ip_url.as_str())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn validate_command_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_COMMAND_NAME_LEN {
        return Err(Error::Config(format!(
            "slash command name must be 1-{} characters, got {:?}",
            MAX_COMMAND_NAME_LEN, name
        )));
    }
    let valid = name
        .chars()
        .all(|c| c == '-' || c == '_' || (c.is_alphanumeric() && !c.is_uppercase()));
    if !valid {
        return Err(Error::Config(format!(
            "slash command name must be lowercase letters, digits, '-' or '_', got {:?}",
            name
        )));
    }
    Ok(())
}

fn parse_ip_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid IP URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "IP URL must use http or https, got {:?}",
            other
        ))),
    }
}
