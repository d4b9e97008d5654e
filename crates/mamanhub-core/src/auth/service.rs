//! Account endpoints: registration, login/logout, email verification,
//! password reset, and the current user.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::models::{Role, UserDto};

use super::Credentials;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub date_of_birth: NaiveDate,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_link: Option<String>,
}

impl RegisterRequest {
    /// Drop blank optional fields, and the professional fields entirely
    /// for roles that do not use them
    fn normalized(mut self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        if self.role.is_professional() {
            self.expertise = non_blank(self.expertise);
            self.portfolio_url = non_blank(self.portfolio_url);
            self.cv_link = non_blank(self.cv_link);
        } else {
            self.expertise = None;
            self.portfolio_url = None;
            self.cv_link = None;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "accessToken")]
    pub access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDto>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetPasswordBody<'a> {
    token: &'a str,
    password: &'a str,
}

/// Account operations on top of an `ApiClient`.
/// Tokens issued by login are written to the client's token store.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<serde_json::Value, ApiError> {
        let request = request.normalized();
        self.client.post_public("/auth/register", &request).await
    }

    /// Log in and persist the issued tokens
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self.client.post_public("/auth/login", request).await?;

        if let Some(access_token) = response.access_token.as_deref().filter(|t| !t.is_empty()) {
            let credentials = Credentials::new(
                access_token,
                response.refresh_token.clone().unwrap_or_default(),
            );
            self.client.token_store().save_credentials(&credentials)?;
            info!(email = %request.email, "Logged in");
        } else {
            warn!(email = %request.email, "Login response carried no access token");
        }

        Ok(response)
    }

    /// Log out on the server and forget the local tokens.
    ///
    /// Local tokens are cleared even when the server call fails. The logout
    /// call never refreshes: a 401 means the session was already gone and
    /// counts as success. A server error takes precedence over a failure to
    /// clear the store.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .client
            .send_without_refresh(ApiRequest::post("/auth/logout"))
            .await;

        let cleared = self.client.token_store().clear_credentials();
        if let Err(e) = &cleared {
            warn!(error = %e, "Failed to clear local session");
        }

        match result {
            Ok(_) => info!("Logged out"),
            Err(e) if e.status() == Some(StatusCode::UNAUTHORIZED) => {
                debug!("Session already expired on the server");
            }
            Err(e) => {
                warn!(error = %e, "Server logout failed, local session cleared");
                return Err(e);
            }
        }
        cleared?;
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<serde_json::Value, ApiError> {
        self.client
            .post_public("/auth/verify-email", &TokenBody { token })
            .await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<serde_json::Value, ApiError> {
        self.client
            .post_public("/auth/resend-verification", &EmailBody { email })
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<serde_json::Value, ApiError> {
        self.client
            .post_public("/auth/forgot-password", &EmailBody { email })
            .await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.client
            .post_public("/auth/reset-password", &ResetPasswordBody { token, password })
            .await
    }

    pub async fn current_user(&self) -> Result<UserDto, ApiError> {
        self.client.get("/auth/me").await
    }

    /// Backend URL that starts the Google OAuth flow
    pub fn google_auth_url(&self) -> String {
        self.client.build_url("/auth/google")
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.client.token_store().access_token(), Ok(Some(_)))
    }
}
