// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::services::credentials::Credential;

/// Body format requested from the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw markup, needed for link discovery
    Html,
    /// Proxy-rendered markdown, used for direct summarization
    Markdown,
}

/// Per-call knobs for a single page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub format: OutputFormat,
    pub render_js: bool,
    pub country_code: Option<String>,
}

impl FetchOptions {
    pub fn html() -> Self {
        Self {
            format: OutputFormat::Html,
            render_js: true,
            country_code: None,
        }
    }

    pub fn markdown() -> Self {
        Self {
            format: OutputFormat::Markdown,
            ..Self::html()
        }
    }
}

/// Outcome of fetching one URL through the proxy
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    /// Response body, absent when no response was received
    pub body: Option<String>,
    /// HTTP status of the last response, 0 when none arrived
    pub status: u16,
    pub error: Option<String>,
    pub credential: Credential,
    /// True when the failure rules out further use of this credential/URL
    /// pairing for the current crawl
    pub is_critical: bool,
    /// Number of HTTP attempts made, 0 when rejected before any call
    pub attempts: u32,
}

impl FetchResult {
    pub fn success(url: &str, credential: &Credential, status: u16, body: String) -> Self {
        Self {
            url: url.to_string(),
            body: Some(body),
            status,
            error: None,
            credential: credential.clone(),
            is_critical: false,
            attempts: 0,
        }
    }

    pub fn failure(
        url: &str,
        credential: &Credential,
        status: u16,
        error: String,
        is_critical: bool,
    ) -> Self {
        Self {
            url: url.to_string(),
            body: None,
            status,
            error: Some(error),
            credential: credential.clone(),
            is_critical,
            attempts: 0,
        }
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Body length in characters, 0 when absent
    pub fn body_chars(&self) -> usize {
        self.body.as_deref().map_or(0, |b| b.chars().count())
    }
}
