// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Typed errors for the scraping service.
//!
//! Page and site failures are not errors here: they travel as data inside
//! crawl results. Only conditions that stop a whole request before any fetch
//! are represented.

use thiserror::Error;

/// Errors that prevent a batch from starting
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No usable proxy credential is configured
    #[error("No valid ScraperAPI keys configured on server.")]
    NoCredentials,

    /// The request failed validation at the service boundary
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors from the web search collaborator
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("could not parse search results: {0}")]
    Parse(String),
}
