// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Highest numbered `SCRAPER_API_KEY_<n>` variable that is read.
pub const MAX_NUMBERED_KEYS: usize = 16;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.82 Safari/537.36";

/// Runtime configuration for the scraping service.
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    /// Raw credential candidates, unfiltered. See `CredentialPool::from_candidates`.
    pub credential_candidates: Vec<String>,
    pub api_endpoint: String,
    pub api_timeout: Duration,
    pub max_retries: u32,
    pub min_content_length: usize,
    pub default_max_depth: usize,
    pub max_links_per_page: usize,
    pub max_concurrent_scrapes: usize,
    pub max_search_results: usize,
    /// Soft frontier cap multiplier. Tunable policy, not a structural invariant.
    pub frontier_growth_factor: f64,
    pub user_agent: String,
    pub search_endpoint: String,
    pub search_timeout: Duration,
    pub bind_addr: String,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            credential_candidates: Vec::new(),
            api_endpoint: "https://api.scraperapi.com/".to_string(),
            api_timeout: Duration::from_secs(45),
            max_retries: 1,
            min_content_length: 250,
            default_max_depth: 1,
            max_links_per_page: 3,
            max_concurrent_scrapes: 5,
            max_search_results: 5,
            frontier_growth_factor: 1.5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            search_timeout: Duration::from_secs(20),
            bind_addr: "0.0.0.0:8008".to_string(),
        }
    }
}

impl ScraperSettings {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is the normal case in deployed environments
        let _ = dotenvy::dotenv();
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Build settings from an arbitrary key lookup. Split out so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut credential_candidates: Vec<String> = lookup("SCRAPER_API_KEYS")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        for n in 1..=MAX_NUMBERED_KEYS {
            if let Some(key) = lookup(&format!("SCRAPER_API_KEY_{}", n)) {
                credential_candidates.push(key.trim().to_string());
            }
        }

        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            credential_candidates,
            api_endpoint: lookup("SCRAPER_API_ENDPOINT").unwrap_or(defaults.api_endpoint),
            api_timeout: parsed("SCRAPER_API_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.api_timeout),
            max_retries: parse_or(&lookup, "SCRAPER_MAX_RETRIES", defaults.max_retries),
            min_content_length: parse_or(
                &lookup,
                "MIN_CONTENT_LENGTH_FOR_SUMMARY",
                defaults.min_content_length,
            ),
            default_max_depth: parse_or(
                &lookup,
                "DEFAULT_MAX_DEPTH_INTERNAL_SPIDER",
                defaults.default_max_depth,
            ),
            max_links_per_page: parse_or(
                &lookup,
                "DEFAULT_MAX_LINKS_PER_PAGE_SPIDER",
                defaults.max_links_per_page,
            ),
            max_concurrent_scrapes: parse_or(
                &lookup,
                "MAX_CONCURRENT_SCRAPES",
                defaults.max_concurrent_scrapes,
            ),
            max_search_results: parse_or(
                &lookup,
                "MAX_SEARCH_RESULTS_TO_PROCESS",
                defaults.max_search_results,
            ),
            frontier_growth_factor: lookup("FRONTIER_GROWTH_FACTOR")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|factor| factor.is_finite() && *factor > 0.0)
                .unwrap_or(defaults.frontier_growth_factor),
            user_agent: lookup("DEFAULT_USER_AGENT").unwrap_or(defaults.user_agent),
            search_endpoint: lookup("SEARCH_ENDPOINT").unwrap_or(defaults.search_endpoint),
            search_timeout: parsed("SEARCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.search_timeout),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    /// Characters a single page must exceed to count as real content.
    pub fn page_substance_threshold(&self) -> usize {
        self.min_content_length / 2
    }

    /// Timeout applied to the proxy HTTP client. The proxy itself gets
    /// `api_timeout`; the extra margin covers its own rendering overhead.
    pub fn http_timeout(&self) -> Duration {
        self.api_timeout + Duration::from_secs(10)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
