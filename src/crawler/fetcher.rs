//! Fetch transport
//!
//! This module defines the fetch contract the crawl pipeline depends on:
//! the `Fetcher` trait, and the `FetchOutcome` classification every
//! implementation must map its failures into. Ordinary network and HTTP
//! failures never escape as errors; they come back as classified outcomes
//! so the retry policy and the task ledger can act on them. The only
//! fallible moment is construction (e.g. a malformed proxy URL), which is a
//! startup error raised once, never per-request.

use crate::config::NetworkConfig;
use crate::SnapError;
use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;

/// Classified result of a single fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// Resource retrieved successfully
    Success {
        /// Response body
        bytes: Vec<u8>,
        /// Content-Type header value (may be empty)
        content_type: String,
        /// Final URL after redirects
        final_url: String,
    },

    /// The archive has no such capture (HTTP 404/410) - never retried
    NotFound,

    /// Upstream throttling (HTTP 429) - retried with backoff
    RateLimited,

    /// Transient failure (timeout, connection error, 5xx) - retried with backoff
    TransientError {
        /// Error description
        reason: String,
    },

    /// Unrecoverable for this task (proxy auth, unexpected status) - never retried
    FatalError {
        /// Error description
        reason: String,
    },
}

impl FetchOutcome {
    /// Returns true if the retry policy may re-attempt this outcome
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::TransientError { .. })
    }

    /// Returns true for a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A single-URL fetch capability
///
/// Two interchangeable implementations satisfy this contract: the plain
/// protocol client (`HttpFetcher`) and the browser-automation engine
/// (`BrowserFetcher`, feature `browser`). The crawl pipeline holds an
/// `Arc<dyn Fetcher>` and never learns which one is bound.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one URL and classifies the result
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Protocol-client fetch transport backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the HTTP fetcher from the network configuration
    ///
    /// # Errors
    ///
    /// * `SnapError::InvalidProxy` - the proxy endpoint cannot be parsed
    /// * `SnapError::Reqwest` - the client itself fails to build
    pub fn new(network: &NetworkConfig, timeout: Duration) -> Result<Self, SnapError> {
        let mut builder = Client::builder()
            .user_agent(&network.user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true);

        if let Some(proxy_url) = &network.proxy {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| SnapError::InvalidProxy(format!("{}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();
        let final_url = response.url().to_string();

        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => FetchOutcome::NotFound,
            StatusCode::TOO_MANY_REQUESTS => FetchOutcome::RateLimited,
            StatusCode::PROXY_AUTHENTICATION_REQUIRED => FetchOutcome::FatalError {
                reason: "Proxy authentication required (HTTP 407)".to_string(),
            },
            s if s.is_server_error() => FetchOutcome::TransientError {
                reason: format!("HTTP {}", s.as_u16()),
            },
            s if s.is_success() => {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                match response.bytes().await {
                    Ok(bytes) => FetchOutcome::Success {
                        bytes: bytes.to_vec(),
                        content_type,
                        final_url,
                    },
                    Err(e) => FetchOutcome::TransientError {
                        reason: format!("Body read failed: {}", e),
                    },
                }
            }
            s => FetchOutcome::FatalError {
                reason: format!("HTTP {}", s.as_u16()),
            },
        }
    }
}

/// Maps a reqwest transport error into the outcome taxonomy
fn classify_request_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::TransientError {
            reason: "Request timeout".to_string(),
        }
    } else if e.is_connect() {
        FetchOutcome::TransientError {
            reason: format!("Connection failed: {}", e),
        }
    } else if e.is_redirect() {
        FetchOutcome::FatalError {
            reason: format!("Redirect error: {}", e),
        }
    } else {
        FetchOutcome::TransientError {
            reason: e.to_string(),
        }
    }
}
