// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use harvest_agent::models::fetch::FetchOptions;
use harvest_agent::services::credentials::Credential;
use harvest_agent::services::fetcher::{PageFetcher, RetryPolicy, ScraperApiClient};
use mockito::{Matcher, Server, ServerGuard};
use std::time::Duration;

const KEY: &str = "integrationintegration00c0de";
const TARGET: &str = "https://target.example/page";

fn no_backoff(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        status_backoff: Duration::ZERO,
        network_backoff: Duration::ZERO,
    }
}

fn client_for(server: &ServerGuard, max_retries: u32) -> ScraperApiClient {
    ScraperApiClient::with_endpoint(
        &format!("{}/", server.url()),
        no_backoff(max_retries),
        Duration::from_secs(5),
        "harvest-agent-test",
    )
    .unwrap()
}

fn proxy_query() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("api_key".into(), KEY.into()),
        Matcher::UrlEncoded("url".into(), TARGET.into()),
    ])
}

#[tokio::test]
async fn test_success_returns_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::AllOf(vec![
            proxy_query(),
            Matcher::UrlEncoded("autoparse".into(), "false".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body("<html><body><p>hello</p></body></html>")
        .expect(1)
        .create_async()
        .await;

    let result = client_for(&server, 1)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    mock.assert_async().await;
    assert!(result.error.is_none());
    assert_eq!(result.status, 200);
    assert_eq!(result.attempts, 1);
    assert_eq!(
        result.body.as_deref(),
        Some("<html><body><p>hello</p></body></html>")
    );
}

#[tokio::test]
async fn test_markdown_format_is_requested() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::AllOf(vec![
            proxy_query(),
            Matcher::UrlEncoded("output_format".into(), "markdown".into()),
        ]))
        .with_status(200)
        .with_body("# Heading\n\nBody")
        .expect(1)
        .create_async()
        .await;

    let result = client_for(&server, 1)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::markdown())
        .await;

    mock.assert_async().await;
    assert_eq!(result.body.as_deref(), Some("# Heading\n\nBody"));
}

#[tokio::test]
async fn test_unauthorized_is_critical_and_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(401)
        .with_body("Unauthorized")
        .expect(1)
        .create_async()
        .await;

    let result = client_for(&server, 3)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    mock.assert_async().await;
    assert!(result.is_critical);
    assert_eq!(result.status, 401);
    assert_eq!(result.attempts, 1);
    let error = result.error.unwrap();
    assert!(error.contains("401 Unauthorized"));
    assert!(error.contains("...c0de"));
    assert!(!error.contains(KEY));
}

#[tokio::test]
async fn test_forbidden_is_critical() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(403)
        .create_async()
        .await;

    let result = client_for(&server, 1)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    assert!(result.is_critical);
    assert_eq!(result.status, 403);
    assert!(result.error.unwrap().contains("FORBIDDEN (403)"));
}

#[tokio::test]
async fn test_retryable_status_exhausts_retries() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let result = client_for(&server, 2)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    mock.assert_async().await;
    assert!(result.is_critical);
    assert_eq!(result.status, 503);
    assert_eq!(result.attempts, 3);
    assert!(result.error.unwrap().starts_with("Max retries (2) reached"));
}

#[tokio::test]
async fn test_retryable_status_then_success() {
    let mut server = Server::new_async().await;
    let busy = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(200)
        .with_body("<p>second time lucky</p>")
        .expect(1)
        .create_async()
        .await;

    let result = client_for(&server, 1)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    busy.assert_async().await;
    ok.assert_async().await;
    assert!(result.error.is_none());
    assert_eq!(result.attempts, 2);
}

#[tokio::test]
async fn test_other_status_is_critical_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(proxy_query())
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let result = client_for(&server, 2)
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    mock.assert_async().await;
    assert!(result.is_critical);
    assert_eq!(result.status, 404);
    assert!(result.error.unwrap().contains("HTTP 404"));
}

#[tokio::test]
async fn test_connection_failure_is_retried_then_critical() {
    // Nothing listens on the discard port
    let client = ScraperApiClient::with_endpoint(
        "http://127.0.0.1:9/",
        no_backoff(1),
        Duration::from_secs(2),
        "harvest-agent-test",
    )
    .unwrap();

    let result = client
        .fetch_page(TARGET, &Credential::new(KEY), &FetchOptions::html())
        .await;

    assert!(result.is_critical);
    assert_eq!(result.status, 0);
    assert_eq!(result.attempts, 2);
    assert!(result.body.is_none());
}
