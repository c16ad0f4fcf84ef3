//! Public IP lookup
//!
//! Issues a single GET against an IP echo service and validates the body as
//! a strict address literal. The HTTP client is always supplied by the
//! caller.

use crate::error::FetchError;
use reqwest::{StatusCode, Url};
use std::net::IpAddr;

/// Default IP echo service
pub const DEFAULT_IP_URL: &str = "https://ipinfo.io/ip";

/// Resolves the public address of this process through an IP echo service.
#[derive(Debug, Clone)]
pub struct IpFetcher {
    client: reqwest::Client,
    url: Url,
}

impl IpFetcher {
    /// Create a fetcher bound to `url`, using the given client
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Fetch and return the canonical textual form of the public address.
    ///
    /// The body must be exactly one IPv4 or IPv6 literal in UTF-8, read as
    /// raw bytes. Surrounding whitespace, a byte order mark, trailing
    /// newlines or any other content is rejected.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        fetch_public_ip(&self.client, self.url.clone()).await
    }
}

/// Single-shot lookup against `url` with an explicit client.
pub async fn fetch_public_ip(client: &reqwest::Client, url: Url) -> Result<String, FetchError> {
    let response = client.get(url).send().await.map_err(FetchError::Request)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    let body = response.bytes().await.map_err(FetchError::Body)?;
    let body = std::str::from_utf8(&body).map_err(|source| FetchError::NotUtf8 {
        body: body.to_vec(),
        source,
    })?;
    parse_address(body).map(|addr| addr.to_string())
}

/// Parse `body` as a strict address literal.
pub fn parse_address(body: &str) -> Result<IpAddr, FetchError> {
    body.parse::<IpAddr>()
        .map_err(|source| FetchError::InvalidAddress {
            body: body.to_string(),
            source,
        })
}
