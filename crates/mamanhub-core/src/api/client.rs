//! API client for communicating with the Ma'man Hub REST API.
//!
//! Every request is sent with `Authorization: Bearer <access_token>` when a
//! token is stored. A 401 response triggers the refresh protocol:
//!
//! ```text
//! Idle --401, not retried--> Refreshing --new token--> Refreshed --retry once--> done
//!                                 \--missing token / error--> Failed --> AuthExpired
//! ```
//!
//! `Failed` clears the stored credentials and notifies the session-expired
//! handler. A request is retried at most once; a 401 on the retry is
//! returned to the caller as `ApiError::Http`.
//!
//! `send_public` and `send_without_refresh` bypass the refresh protocol for
//! endpoints where a 401 is an answer rather than an expired session.

use std::sync::Arc;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{
    ExpiryReason, LogOnly, SessionExpired, SessionExpiredHandler, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::config::{Config, RefreshPolicy};

use super::{ApiError, ApiRequest, ApiResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Per-request refresh state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    /// Normal dispatch, no refresh for this request yet
    Idle,
    /// Got a 401 on the first attempt; a new access token is needed
    Refreshing,
    /// Holds the access token the retry must carry
    Refreshed(String),
    Failed(ExpiryReason),
}

/// API client for the Ma'man Hub backend.
/// Clone is cheap - the HTTP client, token store and refresh lock are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    refresh_path: String,
    login_route: String,
    refresh_policy: RefreshPolicy,
    store: Arc<dyn TokenStore>,
    on_expired: Arc<dyn SessionExpiredHandler>,
    refresh_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh_path", &self.refresh_path)
            .field("login_route", &self.login_route)
            .field("refresh_policy", &self.refresh_policy)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client using the given token store
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        debug!(base_url = %config.api_base_url, "Creating API client");

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            refresh_path: config.refresh_path.clone(),
            login_route: config.login_route.clone(),
            refresh_policy: config.refresh_policy,
            store,
            on_expired: Arc::new(LogOnly),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Replace the handler notified when a refresh fails
    pub fn with_session_expired_handler<H>(mut self, handler: H) -> Self
    where
        H: SessionExpiredHandler + 'static,
    {
        self.on_expired = Arc::new(handler);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Build an absolute URL. Absolute inputs are returned unchanged.
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, refreshing the access token once on a 401.
    ///
    /// Non-2xx responses are returned as `ApiError::Http` with the body
    /// untouched. Fails with `ApiError::AuthExpired` when the refresh could
    /// not produce a new token; the stored credentials are cleared first.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_with = self.store.access_token()?;
        let mut state = RefreshState::Idle;

        loop {
            state = match state {
                RefreshState::Idle => {
                    let response = self.dispatch(&request, sent_with.as_deref()).await?;
                    if response.status() != StatusCode::UNAUTHORIZED {
                        return response.error_for_status();
                    }
                    info!(
                        method = %request.method(),
                        path = request.path(),
                        "Access token rejected, attempting refresh"
                    );
                    RefreshState::Refreshing
                }
                RefreshState::Refreshing => self.refresh(sent_with.as_deref()).await,
                RefreshState::Refreshed(token) => {
                    request.mark_retried();
                    let response = self.dispatch(&request, Some(token.as_str())).await?;
                    if response.status() == StatusCode::UNAUTHORIZED {
                        warn!(path = request.path(), "Retried request still unauthorized");
                    }
                    return response.error_for_status();
                }
                RefreshState::Failed(reason) => {
                    self.expire_session(reason);
                    return Err(ApiError::AuthExpired);
                }
            };
        }
    }

    /// Send a request to a public endpoint: no bearer token, no refresh.
    ///
    /// A 401 here means the server rejected the request itself (for example
    /// a wrong password) and is returned as `ApiError::Http`.
    pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.dispatch(&request, None).await?.error_for_status()
    }

    /// Send a request with the stored access token but without the refresh
    /// protocol. A 401 is returned as `ApiError::Http`; the store and the
    /// session-expired handler are left alone.
    pub async fn send_without_refresh(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        let token = self.store.access_token()?;
        self.dispatch(&request, token.as_deref())
            .await?
            .error_for_status()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.build_url(request.path());
        debug!(
            method = %request.method(),
            url = %url,
            authenticated = token.is_some(),
            retried = request.is_retried(),
            "API request"
        );

        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "API request failed");
                return Err(e.into());
            }
        };
        let response = ApiResponse::read(response).await?;

        debug!(status = response.status().as_u16(), url = %url, "API response");
        Ok(response)
    }

    /// Obtain the access token for the retry of a request rejected while
    /// carrying `rejected_token`.
    async fn refresh(&self, rejected_token: Option<&str>) -> RefreshState {
        match self.refresh_policy {
            RefreshPolicy::PerRequest => self.refresh_credentials().await,
            RefreshPolicy::Coalesce => {
                let _guard = self.refresh_lock.lock().await;
                match self.store.access_token() {
                    Ok(Some(current)) if Some(current.as_str()) != rejected_token => {
                        debug!("Reusing access token refreshed by a concurrent request");
                        RefreshState::Refreshed(current)
                    }
                    Ok(_) => self.refresh_credentials().await,
                    Err(e) => RefreshState::Failed(ExpiryReason::Store(e.to_string())),
                }
            }
        }
    }

    async fn refresh_credentials(&self) -> RefreshState {
        match self.request_new_access_token().await {
            Ok(token) => {
                info!("Access token refreshed");
                RefreshState::Refreshed(token)
            }
            Err(reason) => RefreshState::Failed(reason),
        }
    }

    async fn request_new_access_token(&self) -> Result<String, ExpiryReason> {
        let refresh_token = self
            .store
            .refresh_token()
            .map_err(|e| ExpiryReason::Store(e.to_string()))?
            .ok_or(ExpiryReason::MissingRefreshToken)?;

        let url = self.build_url(&self.refresh_path);
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| ExpiryReason::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpiryReason::Rejected(status.as_u16()));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ExpiryReason::MalformedResponse(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(ExpiryReason::MalformedResponse(
                "empty access token".to_string(),
            ));
        }

        self.store
            .set(ACCESS_TOKEN_KEY, &body.access_token)
            .map_err(|e| ExpiryReason::Store(e.to_string()))?;
        if let Some(renewed) = body.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            self.store
                .set(REFRESH_TOKEN_KEY, renewed)
                .map_err(|e| ExpiryReason::Store(e.to_string()))?;
        }

        Ok(body.access_token)
    }

    fn expire_session(&self, reason: ExpiryReason) {
        warn!(reason = %reason, "Token refresh failed, clearing credentials");
        if let Err(e) = self.store.clear_credentials() {
            warn!(error = %e, "Failed to clear stored credentials");
        }
        self.on_expired
            .session_expired(&SessionExpired::new(self.login_route.clone(), reason));
    }

    // ===== JSON helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// POST to a public endpoint, see `send_public`
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_public(ApiRequest::post(path).json(body)?)
            .await?
            .json()
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).json(body)?).await?.json()
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::delete(path)).await?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client(base_url: &str) -> ApiClient {
        let config = Config {
            api_base_url: base_url.to_string(),
            ..Config::default()
        };
        ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_build_url() {
        let api = client("https://localhost:7220/api/");
        assert_eq!(api.base_url(), "https://localhost:7220/api");
        assert_eq!(api.build_url("/courses"), "https://localhost:7220/api/courses");
        assert_eq!(api.build_url("courses/42"), "https://localhost:7220/api/courses/42");
        assert_eq!(
            api.build_url("https://cdn.example.test/video.mp4"),
            "https://cdn.example.test/video.mp4"
        );
    }

    #[test]
    fn test_refresh_wire_format() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "R1",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "refreshToken": "R1" }));

        let parsed: RefreshResponse = serde_json::from_str(r#"{"accessToken":"A2"}"#).unwrap();
        assert_eq!(parsed.access_token, "A2");
        assert_eq!(parsed.refresh_token, None);

        let parsed: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"A2","refreshToken":"R2"}"#).unwrap();
        assert_eq!(parsed.refresh_token.as_deref(), Some("R2"));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let api = client("https://localhost:7220/api");
        api.token_store().set(ACCESS_TOKEN_KEY, "secret-token").unwrap();
        let debug = format!("{:?}", api);
        assert!(debug.contains("localhost"));
        assert!(!debug.contains("secret-token"));
    }
}
