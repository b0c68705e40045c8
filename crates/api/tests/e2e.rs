//! End-to-end tests against a live server on an ephemeral port.

use api::{serve, ApiConfig, AppState};
use reqwest::{header, Client, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

const VALID_EMAIL: &str = "admin@admin.com";
const VALID_PASSWORD: &str = "pass";

const INVALID_EMAIL: &str = "invalid@admin.com";
const INVALID_PASSWORD: &str = "pass1";

const CSV: &str = "timestamp,temperature,rainfall,humidity,wind_speed,visibility
1690967790,14.1,6.11,20,23,M
1690999756,16.2,4.23,30,12,M
1691012723,15.7,3.56,20,11,G
1691032353,17.6,2.19,40,18,VG
1691054751,19.5,1.20,50,7,E";

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        let state = Arc::new(AppState::new(ApiConfig::default()));
        tokio::spawn(serve(listener, state));

        Self {
            base: format!("http://{}", addr),
            client: Client::new(),
        }
    }

    async fn login(&self, email: &str, password: &str) -> (Response, Option<String>) {
        let resp = self
            .client
            .post(format!("{}/api/login", self.base))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Login request failed");
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (resp, cookie)
    }

    async fn session(&self) -> String {
        let (_, cookie) = self.login(VALID_EMAIL, VALID_PASSWORD).await;
        cookie.expect("No session cookie")
    }

    async fn upload(&self) -> Response {
        let cookie = self.session().await;
        self.client
            .post(format!("{}/api/sensors/upload", self.base))
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::COOKIE, cookie)
            .body(CSV)
            .send()
            .await
            .expect("Upload request failed")
    }

    async fn search(&self, query: Value) -> Vec<Value> {
        let cookie = self.session().await;
        self.client
            .post(format!("{}/api/sensors/search", self.base))
            .header(header::COOKIE, cookie)
            .json(&query)
            .send()
            .await
            .expect("Search request failed")
            .json()
            .await
            .expect("Search response is not a JSON array")
    }
}

#[tokio::test]
async fn login_succeeds_with_valid_credentials() {
    let server = TestServer::start().await;
    let (resp, cookie) = server.login(VALID_EMAIL, VALID_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(cookie.is_some_and(|c| !c.is_empty()));
}

#[tokio::test]
async fn login_fails_with_invalid_credentials() {
    let server = TestServer::start().await;
    let (resp, cookie) = server.login(INVALID_EMAIL, INVALID_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn upload_accepts_csv() {
    let server = TestServer::start().await;
    let resp = server.upload().await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_filters_with_gte() {
    let server = TestServer::start().await;
    server.upload().await;

    let results = server.search(json!({"filters": {"humidity": {"gte": 30}}})).await;
    assert!(results.len() >= 3);
}

#[tokio::test]
async fn search_checks_equality() {
    let server = TestServer::start().await;
    server.upload().await;

    let results = server
        .search(json!({"filters": {"humidity": {"eq": 30}, "rainfall": {"eq": 4.23}}}))
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["temperature"].as_f64(), Some(16.2));
}

#[tokio::test]
async fn search_aggregates() {
    let server = TestServer::start().await;
    server.upload().await;

    let results = server
        .search(json!({"aggregate": {"column": "humidity", "operator": "SUM"}}))
        .await;
    assert_eq!(results.len(), 1);
    assert!(results[0]["humidity"].as_f64().unwrap_or_default() >= 160.0);
}

#[tokio::test]
async fn search_sorts() {
    let server = TestServer::start().await;
    server.upload().await;

    let results = server
        .search(json!({"sort": {"column": "temperature", "order": "ascending"}}))
        .await;
    assert!(results.len() >= 2);
    let first = results[0]["temperature"].as_f64().expect("temperature");
    let second = results[1]["temperature"].as_f64().expect("temperature");
    assert!(first <= second);
}

#[tokio::test]
async fn search_without_session_is_rejected() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(format!("{}/api/sensors/search", server.base))
        .json(&json!({}))
        .send()
        .await
        .expect("Search request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
