// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Single-page fetches through the remote scraping proxy, with bounded retry.

use crate::models::fetch::{FetchOptions, FetchResult, OutputFormat};
use crate::models::settings::ScraperSettings;
use crate::services::credentials::Credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Fetches one page under one credential. Implementations never return
/// `Err`: every failure is described by the `FetchResult`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        url: &str,
        credential: &Credential,
        options: &FetchOptions,
    ) -> FetchResult;
}

/// How a proxy status code is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// 401/403: bad credential, or the target blocks this pairing
    Denied,
    /// 429 and gateway-side 5xx
    Retryable,
    /// Any other non-2xx
    Failed,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        401 | 403 => StatusClass::Denied,
        429 | 500 | 502 | 503 | 504 => StatusClass::Retryable,
        _ => StatusClass::Failed,
    }
}

/// Retry budget and linear backoff schedule.
/// Retry `n` (0-based) waits `(n + 1) * unit`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Backoff unit after a retryable HTTP status
    pub status_backoff: Duration,
    /// Backoff unit after a timeout or connection failure
    pub network_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            status_backoff: Duration::from_secs(3),
            network_backoff: Duration::from_secs(2),
        }
    }

    pub fn status_delay(&self, attempt: u32) -> Duration {
        self.status_backoff * (attempt + 1)
    }

    pub fn network_delay(&self, attempt: u32) -> Duration {
        self.network_backoff * (attempt + 1)
    }
}

/// Client for the ScraperAPI-style proxy: `GET <endpoint>?api_key=..&url=..`
pub struct ScraperApiClient {
    client: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy,
}

impl ScraperApiClient {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        Self::with_endpoint(
            &settings.api_endpoint,
            RetryPolicy::new(settings.max_retries),
            settings.http_timeout(),
            &settings.user_agent,
        )
    }

    pub fn with_endpoint(
        endpoint: &str,
        policy: RetryPolicy,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create proxy HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            policy,
        })
    }

    /// Query string for one proxy call
    fn query_params(
        url: &str,
        credential: &Credential,
        options: &FetchOptions,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", credential.expose().to_string()),
            ("url", url.to_string()),
            ("render_js", options.render_js.to_string()),
        ];
        match options.format {
            OutputFormat::Markdown => params.push(("output_format", "markdown".to_string())),
            // Raw markup is needed for link extraction
            OutputFormat::Html => params.push(("autoparse", "false".to_string())),
        }
        if let Some(country) = &options.country_code {
            params.push(("country_code", country.clone()));
        }
        params
    }

    async fn send_once(
        &self,
        url: &str,
        credential: &Credential,
        options: &FetchOptions,
    ) -> std::result::Result<(u16, String), reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&Self::query_params(url, credential, options))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl PageFetcher for ScraperApiClient {
    async fn fetch_page(
        &self,
        url: &str,
        credential: &Credential,
        options: &FetchOptions,
    ) -> FetchResult {
        let key = credential.masked();

        if credential.looks_like_placeholder() {
            let message = format!("Invalid/Placeholder ScraperAPI key used for {}.", url);
            error!(url, "{}", message);
            return FetchResult::failure(url, credential, 0, message, true);
        }

        let max_retries = self.policy.max_retries;
        let mut attempt: u32 = 0;

        loop {
            debug!(url, key = %key, attempt = attempt + 1, "Fetching via proxy");

            match self.send_once(url, credential, options).await {
                Ok((status, body)) => match classify_status(status) {
                    StatusClass::Success => {
                        return FetchResult::success(url, credential, status, body)
                            .with_attempts(attempt + 1);
                    }
                    StatusClass::Denied => {
                        let message = denial_message(status, url, &key);
                        error!(url, status, "{}", message);
                        return FetchResult::failure(url, credential, status, message, true)
                            .with_body(Some(body))
                            .with_attempts(attempt + 1);
                    }
                    StatusClass::Retryable if attempt < max_retries => {
                        let delay = self.policy.status_delay(attempt);
                        warn!(
                            url,
                            status,
                            key = %key,
                            delay_secs = delay.as_secs_f64(),
                            "Proxy returned retryable status, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                    StatusClass::Retryable => {
                        let message = format!(
                            "Max retries ({}) reached for {} with key {}. Last status: {}.",
                            max_retries, url, key, status
                        );
                        error!(url, status, "{}", message);
                        return FetchResult::failure(url, credential, status, message, true)
                            .with_body(Some(body))
                            .with_attempts(attempt + 1);
                    }
                    StatusClass::Failed => {
                        let message = format!(
                            "ScraperAPI returned HTTP {} for {} (key {}).",
                            status, url, key
                        );
                        error!(url, status, "{}", message);
                        return FetchResult::failure(url, credential, status, message, true)
                            .with_body(Some(body))
                            .with_attempts(attempt + 1);
                    }
                },
                Err(e) if attempt < max_retries => {
                    let delay = self.policy.network_delay(attempt);
                    warn!(
                        url,
                        key = %key,
                        timeout = e.is_timeout(),
                        delay_secs = delay.as_secs_f64(),
                        "Proxy call failed, retrying: {}",
                        e
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    let message = network_message(&e, url, &key);
                    error!(url, "{}", message);
                    return FetchResult::failure(url, credential, 0, message, true)
                        .with_attempts(attempt + 1);
                }
            }
        }
    }
}

fn denial_message(status: u16, url: &str, key: &str) -> String {
    if status == 401 {
        format!("ScraperAPI key {} FAILED (401 Unauthorized) for {}.", key, url)
    } else {
        format!(
            "ScraperAPI request FORBIDDEN ({}) for {} with key {}.",
            status, url, key
        )
    }
}

fn network_message(error: &reqwest::Error, url: &str, key: &str) -> String {
    if error.is_timeout() {
        format!("Timeout fetching {} via ScraperAPI (key {}): {}", url, key, error)
    } else {
        format!(
            "Network/RequestError for {} via ScraperAPI (key {}): {}",
            url, key, error
        )
    }
}
