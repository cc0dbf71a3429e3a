//! Typed client for the remote finance API.
//!
//! Every request goes through [`ApiClient::request`], which attaches the
//! session's bearer token, and [`ApiClient::execute`], which watches the
//! response for authorization failures and maps errors.

mod auth;
mod bills;
mod categories;
pub mod dto;
mod goals;
mod planning;
mod reports;
mod transactions;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionManager,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionManager) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, None)
    }

    pub fn with_timeout(
        base_url: &str,
        session: SessionManager,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;
        Self::with_http(http, base_url, session)
    }

    /// Shares an existing connection pool with a different session.
    pub fn with_http(http: Client, base_url: &str, session: SessionManager) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!("invalid API base url `{base_url}`")));
        }
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request interceptor: the stored token, if any, rides along as a
    /// bearer credential.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.http.request(method, self.url(path));
        match self.session.get_token() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send(&self, rb: RequestBuilder) -> Result<Response, ApiError> {
        let req = rb.build()?;
        let method = req.method().clone();
        let path = req.url().path().to_string();
        debug!(%method, %path, "api request");

        let res = self.http.execute(req).await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = error_message(res).await;
        // Response interceptor: authorization failures are reported only.
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, %method, %path, "api rejected credentials");
            return Err(ApiError::Unauthorized { status, message });
        }
        warn!(%status, %method, %path, %message, "api request failed");
        Err(ApiError::Status { status, message })
    }

    pub(crate) async fn execute<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, ApiError> {
        let res = self.send(rb).await?;
        let body = res.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// For endpoints whose success body is empty or irrelevant.
    pub(crate) async fn execute_empty(&self, rb: RequestBuilder) -> Result<(), ApiError> {
        self.send(rb).await?;
        Ok(())
    }
}

/// Pulls `message` or `error` out of a JSON error body, else the raw text.
async fn error_message(res: Response) -> String {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(&text) {
        for field in ["message", "error"] {
            if let Some(m) = v.get(field).and_then(|m| m.as_str()) {
                return m.to_string();
            }
        }
    }
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        text.chars().take(200).collect()
    }
}

/// `/{collection}/{id}` with the id percent-encoded as a single path
/// segment. Ids that would collapse into a dot segment are refused.
pub(crate) fn item_path(collection: &str, id: &str) -> Result<String, ApiError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ApiError::Config(format!("invalid {collection} id {id:?}")));
    }
    Ok(format!("/{collection}/{}", urlencoding::encode(id)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn echo_auth(headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Json(json!({ "authorization": auth }))
    }

    fn router() -> Router {
        Router::new()
            .route("/echo", get(echo_auth))
            .route(
                "/denied",
                get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({"message": "token expired"}))) }),
            )
            .route(
                "/forbidden",
                get(|| async { (AxumStatus::FORBIDDEN, "nope") }),
            )
            .route(
                "/broken",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({"error": "db down"}))) }),
            )
            .route("/garbage", get(|| async { "not json" }))
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let base = testing::serve(router()).await;
        let session = SessionManager::in_memory();
        let client = ApiClient::new(&base, session.clone()).unwrap();

        let v: Value = client.execute(client.request(Method::GET, "/echo")).await.unwrap();
        assert_eq!(v["authorization"], Value::Null);

        session.set_token("tok-123").unwrap();
        let v: Value = client.execute(client.request(Method::GET, "echo")).await.unwrap();
        assert_eq!(v["authorization"], "Bearer tok-123");
    }

    #[tokio::test]
    async fn unauthorized_is_reported_without_clearing_session() {
        let base = testing::serve(router()).await;
        let session = SessionManager::in_memory();
        session.set_token("stale").unwrap();
        let client = ApiClient::new(&base, session.clone()).unwrap();

        let err = client
            .execute::<Value>(client.request(Method::GET, "/denied"))
            .await
            .unwrap_err();
        match err {
            ApiError::Unauthorized { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.get_token().as_deref(), Some("stale"));

        let err = client
            .execute_empty(client.request(Method::GET, "/forbidden"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status, .. } if status == StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn maps_server_errors_and_bad_bodies() {
        let base = testing::serve(router()).await;
        let client = ApiClient::new(&base, SessionManager::in_memory()).unwrap();

        let err = client
            .execute::<Value>(client.request(Method::GET, "/broken"))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::Status { message, .. } if message == "db down"));
        assert!(err.is_retryable());

        let err = client
            .execute::<Value>(client.request(Method::GET, "/garbage"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let err = client
            .execute::<Value>(client.request(Method::GET, "/missing"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        assert!(matches!(
            ApiClient::new("localhost:4000", SessionManager::in_memory()),
            Err(ApiError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1", SessionManager::in_memory()).unwrap();
        let err = client
            .execute::<Value>(client.request(Method::GET, "/echo"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
