//! Browser-automation fetch transport
//!
//! Drives a headless (or headful) Chromium through the DevTools protocol.
//! Useful for captures served behind aggressive bot detection, where the
//! plain protocol client gets challenged. Satisfies the same `Fetcher`
//! contract as `HttpFetcher`; the crawl pipeline cannot tell them apart.
//!
//! Note that the browser returns the serialized DOM after load, not the raw
//! response bytes, and may incidentally execute page JavaScript. That is
//! the nature of this transport and is opaque to the core.

use crate::config::NetworkConfig;
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::SnapError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;

/// Browser-engine fetch transport backed by chromiumoxide
pub struct BrowserFetcher {
    browser: Browser,
    user_agent: String,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches the browser process and binds the CDP event loop
    ///
    /// # Errors
    ///
    /// * `SnapError::Browser` - the browser binary could not be launched or
    ///   the configuration is invalid (startup error, never per-request)
    pub async fn launch(network: &NetworkConfig, timeout: Duration) -> Result<Self, SnapError> {
        let mut builder = BrowserConfig::builder();

        if !network.headless {
            builder = builder.with_head();
        }
        if let Some(proxy) = &network.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        let config = builder.build().map_err(SnapError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SnapError::Browser(e.to_string()))?;

        // Drain CDP events for the lifetime of the browser
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            user_agent: network.user_agent.clone(),
            timeout,
        })
    }

    async fn fetch_inner(&self, url: &str) -> FetchOutcome {
        let page = match self.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                return FetchOutcome::TransientError {
                    reason: format!("Failed to open page: {}", e),
                }
            }
        };

        if let Err(e) = page.set_user_agent(self.user_agent.as_str()).await {
            tracing::debug!("Could not override user agent: {}", e);
        }

        if let Err(e) = page.goto(url).await {
            let _ = page.close().await;
            return FetchOutcome::TransientError {
                reason: format!("Navigation failed: {}", e),
            };
        }

        if let Err(e) = page.wait_for_navigation().await {
            tracing::debug!("Navigation wait ended early for {}: {}", url, e);
        }

        let content = match page.content().await {
            Ok(content) => content,
            Err(e) => {
                let _ = page.close().await;
                return FetchOutcome::TransientError {
                    reason: format!("Could not read page content: {}", e),
                };
            }
        };

        let _ = page.close().await;

        FetchOutcome::Success {
            bytes: content.into_bytes(),
            content_type: "text/html".to_string(),
            final_url: url.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::TransientError {
                reason: "Browser navigation timeout".to_string(),
            },
        }
    }
}
