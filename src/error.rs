//! Ipisto error types

use thiserror::Error;

/// Ipisto error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Slash command registration failed
    #[error("Registration error: {0}")]
    Registration(String),

    /// Slash command deregistration failed
    #[error("Deregistration error: {0}")]
    Deregistration(String),

    /// Platform call made on behalf of an interaction failed
    #[error("Platform error: {0}")]
    Platform(String),

    /// Public IP lookup failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Termination signal handling failed
    #[error("Signal error: {0}")]
    Signal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while resolving the public address.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The GET request could not be sent or completed
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The endpoint answered with something other than 200 OK
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// The response body could not be read
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    /// The body is not valid UTF-8
    #[error("body is not valid UTF-8 {body:?}: {source}")]
    NotUtf8 {
        body: Vec<u8>,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The body is not exactly one address literal
    #[error("invalid address literal {body:?}: {source}")]
    InvalidAddress {
        body: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Result type alias for Ipisto operations
pub type Result<T> = std::result::Result<T, Error>;
