//! HTTP transport used by the API client
//!
//! The client only needs "GET this URL, give me the body". Keeping that behind a
//! trait lets tests count requests without a network.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::debug;

use crate::error::{PokedexError, Result};

/// Performs a GET and returns the raw body of a successful (2xx) response
pub trait Transport: Send + Sync + std::fmt::Debug {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// `Transport` backed by reqwest with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            debug!(%url, "GET");
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PokedexError::Transport(format!("GET {url} returned {status}")));
            }
            let body = response.bytes().await?;
            Ok(body.to_vec())
        })
    }
}
