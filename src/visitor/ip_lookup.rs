//! Public IP lookup through an external echo service

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("IP lookup request failed")]
    Request(#[source] reqwest::Error),
    #[error("IP lookup returned HTTP {0}")]
    Status(StatusCode),
    #[error("IP lookup response could not be decoded")]
    Decode(#[source] reqwest::Error),
}

/// Resolves the visitor's public address
#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn lookup(&self) -> Result<String, LookupError>;
}

#[derive(Debug, Deserialize)]
struct IpEcho {
    ip: String,
}

/// Lookup against an ipify-compatible service (`{"ip": "..."}`).
///
/// No timeout is set: a hanging service delays the record, it never fails it.
#[derive(Clone)]
pub struct IpifyLookup {
    client: Client,
    url: String,
}

impl IpifyLookup {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl IpLookup for IpifyLookup {
    async fn lookup(&self) -> Result<String, LookupError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(LookupError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let echo: IpEcho = response.json().await.map_err(LookupError::Decode)?;
        Ok(echo.ip)
    }
}
