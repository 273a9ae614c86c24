// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::ScrapeError;
use crate::models::crawler::{SpiderCrawlRequest, SpiderCrawlResponse};
use crate::models::search::{SearchScrapeRequest, SearchScrapeResponse, SourceRef};
use crate::models::version::{StatusResponse, VersionResponse};
use crate::services::orchestrator::BatchOrchestrator;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `HARVEST_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("HARVEST_VERSION");

pub const AGENT_NAME: &str = "harvest-agent";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: BatchOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

fn scrape_error_response(error: ScrapeError) -> (StatusCode, String) {
    let status = match error {
        ScrapeError::NoCredentials => StatusCode::SERVICE_UNAVAILABLE,
        ScrapeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };
    (status, error.to_string())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Liveness message.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", body = StatusResponse)),
    tag = "Service"
)]
pub async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: format!("{} v{} is running", AGENT_NAME, VERSION),
    })
}

/// Build version and number of usable proxy credentials.
#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Version information", body = VersionResponse)),
    tag = "Service"
)]
pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: AGENT_NAME.to_string(),
        version: VERSION.to_string(),
        credential_pool_size: state.orchestrator.pool().len(),
    })
}

/// Crawl several sites and merge their readable text.
#[utoipa::path(
    post,
    path = "/api/spider-crawl-batch",
    request_body = SpiderCrawlRequest,
    responses(
        (status = 200, description = "Merged content and per-page errors", body = SpiderCrawlResponse),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "No valid ScraperAPI keys configured")
    ),
    tag = "Scraping"
)]
pub async fn spider_crawl_batch_handler(
    State(state): State<AppState>,
    Json(payload): Json<SpiderCrawlRequest>,
) -> Result<Json<SpiderCrawlResponse>, (StatusCode, String)> {
    state
        .orchestrator
        .spider_crawl_batch(&payload)
        .await
        .map(Json)
        .map_err(scrape_error_response)
}

/// Search the web and scrape the top results.
#[utoipa::path(
    post,
    path = "/api/search-scrape",
    request_body = SearchScrapeRequest,
    responses(
        (status = 200, description = "Merged content, sources and errors", body = SearchScrapeResponse),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "No valid ScraperAPI keys configured")
    ),
    tag = "Scraping"
)]
pub async fn search_scrape_handler(
    State(state): State<AppState>,
    Json(payload): Json<SearchScrapeRequest>,
) -> Result<Json<SearchScrapeResponse>, (StatusCode, String)> {
    state
        .orchestrator
        .search_and_scrape(&payload)
        .await
        .map(Json)
        .map_err(scrape_error_response)
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Harvest Agent API",
        description = "Multi-site spidering and search-then-scrape through a rotating proxy credential pool"
    ),
    paths(
        root_handler,
        version_handler,
        spider_crawl_batch_handler,
        search_scrape_handler
    ),
    components(schemas(
        StatusResponse,
        VersionResponse,
        SpiderCrawlRequest,
        SpiderCrawlResponse,
        SearchScrapeRequest,
        SearchScrapeResponse,
        SourceRef
    )),
    tags(
        (name = "Service", description = "Liveness and version"),
        (name = "Scraping", description = "Batch crawling and search scraping")
    )
)]
pub struct ScrapeApiDoc;

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ScrapeApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
///
/// `/api/duckduckgo-scrape` is kept as an alias of `/api/search-scrape` for
/// older clients.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/version", get(version_handler))
        .route("/api/spider-crawl-batch", post(spider_crawl_batch_handler))
        .route("/api/search-scrape", post(search_scrape_handler))
        .route("/api/duckduckgo-scrape", post(search_scrape_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::ScraperSettings;
    use crate::services::credentials::CredentialPool;
    use crate::testing::{hit, FixedExtractor, StubFetcher, StubPage, StubSearch};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const KEY: &str = "routerrouterrouterrouter0007";

    fn test_app(keys: &[&str], fetcher: StubFetcher, search: StubSearch) -> Router {
        let orchestrator = BatchOrchestrator::new(
            ScraperSettings {
                min_content_length: 20,
                ..ScraperSettings::default()
            },
            CredentialPool::from_candidates(keys.iter().copied()),
            Arc::new(fetcher),
            Arc::new(FixedExtractor),
            Arc::new(search),
        );
        create_router(AppState::new(orchestrator))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_version_endpoint_response() {
        let app = test_app(&[KEY], StubFetcher::new(), StubSearch::default());

        let response = app
            .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type, "application/json");

        let json = body_json(response).await;
        assert_eq!(json["agent"], AGENT_NAME);
        assert_eq!(json["version"], VERSION);
        assert_eq!(json["credential_pool_size"], 1);
    }

    #[tokio::test]
    async fn test_version_follows_semver_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
    }

    #[tokio::test]
    async fn test_root_reports_running() {
        let app = test_app(&[], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn test_invalid_route_returns_404() {
        let app = test_app(&[KEY], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(Request::builder().uri("/invalid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_crawl_without_credentials_is_unavailable() {
        let app = test_app(&["YOUR_KEY_HERE"], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(post_json(
                "/api/spider-crawl-batch",
                serde_json::json!({"query": "q", "base_urls": ["https://site.test/"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "No valid ScraperAPI keys configured on server."
        );
    }

    #[tokio::test]
    async fn test_crawl_rejects_empty_url_list() {
        let app = test_app(&[KEY], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(post_json(
                "/api/spider-crawl-batch",
                serde_json::json!({"query": "q", "base_urls": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_crawl_returns_merged_content() {
        let fetcher = StubFetcher::new().with_page(
            "https://site.test/",
            StubPage::html("<p>Plenty of readable words about the topic at hand.</p>"),
        );
        let app = test_app(&[KEY], fetcher, StubSearch::default());

        let response = app
            .oneshot(post_json(
                "/api/spider-crawl-batch",
                serde_json::json!({
                    "query": "topic",
                    "base_urls": ["https://site.test/"],
                    "max_depth_internal": 0
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let content = json["aggregated_content"].as_str().unwrap();
        assert!(content.starts_with("### Content from: https://site.test/"));
        assert_eq!(json["all_errors"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_search_alias_routes_to_search_scrape() {
        let search = StubSearch::with_hits(vec![hit("https://news.test/a", "Story A")]);
        let fetcher = StubFetcher::new().with_page(
            "https://news.test/a",
            StubPage::html("A markdown body long enough to count as substance."),
        );
        let app = test_app(&[KEY], fetcher, search);

        let response = app
            .oneshot(post_json(
                "/api/duckduckgo-scrape",
                serde_json::json!({"query": "story", "num_results": 1}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sources"][0]["title"], "Story A");
        assert_eq!(json["sources"][0]["url"], "https://news.test/a");
    }

    #[tokio::test]
    async fn test_search_rejects_out_of_range_result_count() {
        let app = test_app(&[KEY], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(post_json(
                "/api/search-scrape",
                serde_json::json!({"query": "q", "num_results": 11}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_openapi_document_lists_paths() {
        let app = test_app(&[], StubFetcher::new(), StubSearch::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["paths"]["/api/spider-crawl-batch"].is_object());
        assert!(json["paths"]["/api/search-scrape"].is_object());
    }
}
