// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvest_agent::app::{create_router, AppState, VERSION};
use harvest_agent::models::crawler::SpiderCrawlRequest;
use harvest_agent::models::search::SearchScrapeRequest;
use harvest_agent::models::settings::ScraperSettings;
use harvest_agent::services::logging::init_tracing;
use harvest_agent::services::orchestrator::BatchOrchestrator;
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "harvest-agent")]
#[command(about = "Multi-site spidering and search scraping through a rotating proxy key pool")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, falls back to the configured default
        #[arg(long, env = "BIND_ADDR")]
        bind: Option<String>,
    },

    /// Crawl sites once and print the merged result as JSON
    Crawl {
        /// Query used to rank internal links
        #[arg(short, long)]
        query: String,
        /// Base URL to crawl (repeatable)
        #[arg(short, long = "url", required = true)]
        urls: Vec<String>,
        /// Internal link depth
        #[arg(short, long)]
        depth: Option<usize>,
        /// Page budget per site
        #[arg(short = 'p', long)]
        max_pages: Option<usize>,
    },

    /// Search the web, scrape the top results and print them as JSON
    Search {
        #[arg(short, long)]
        query: String,
        /// Number of results to scrape
        #[arg(short = 'n', long)]
        results: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = ScraperSettings::from_env()?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| settings.bind_addr.clone());
            serve(settings, &addr).await
        }
        Commands::Crawl {
            query,
            urls,
            depth,
            max_pages,
        } => {
            let orchestrator = BatchOrchestrator::from_settings(settings)?;
            let request = SpiderCrawlRequest {
                query,
                base_urls: urls,
                max_depth_internal: depth,
                max_links_per_url: max_pages,
            };
            let response = orchestrator.spider_crawl_batch(&request).await?;
            print_json(&response)
        }
        Commands::Search { query, results } => {
            let orchestrator = BatchOrchestrator::from_settings(settings)?;
            let request = SearchScrapeRequest {
                query,
                num_results: results,
            };
            let response = orchestrator.search_and_scrape(&request).await?;
            print_json(&response)
        }
    }
}

async fn serve(settings: ScraperSettings, addr: &str) -> Result<()> {
    let orchestrator = BatchOrchestrator::from_settings(settings)?;
    let app = create_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("harvest-agent v{} listening on {}", VERSION, addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", rendered);
    Ok(())
}
