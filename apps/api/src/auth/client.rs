//! Client for the hosted identity provider's REST API.
//!
//! Every auth call in the service goes through [`IdentityProvider`]; the
//! production implementation is [`HostedAuthClient`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session is invalid or expired")]
    InvalidSession,

    #[error("identity API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected identity API response: {0}")]
    Malformed(String),
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredentials => AppError::InvalidCredentials,
            IdentityError::InvalidSession => AppError::Unauthorized,
            IdentityError::Api { status: 422, message } => AppError::Validation(message),
            other => AppError::Identity(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    fn metadata_str(&self, key: &str) -> &str {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn first_name(&self) -> &str {
        self.metadata_str("first_name")
    }

    pub fn last_name(&self) -> &str {
        self.metadata_str("last_name")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SignUpMetadata {
    pub first_name: String,
    pub last_name: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthUser, IdentityError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
    /// Resolves the user owning `access_token`.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError>;
    /// Admin listing, 1-based `page`.
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserListBody {
    users: Vec<AuthUser>,
}

#[derive(Clone)]
pub struct HostedAuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl HostedAuthClient {
    pub fn new(
        base_url: String,
        anon_key: String,
        service_role_key: String,
    ) -> Result<Self, IdentityError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url,
            anon_key,
            service_role_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn public(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    /// Turns a non-success response into an `IdentityError::Api`, pulling the
    /// human-readable message out of whichever field the provider used.
    async fn api_error(response: Response) -> IdentityError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|e| e.error_description.or(e.msg).or(e.message))
            .unwrap_or(body);
        warn!("Identity API returned {status}: {message}");
        IdentityError::Api { status, message }
    }
}

#[async_trait]
impl IdentityProvider for HostedAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let response = self
            .public(self.client.post(self.endpoint("token?grant_type=password")))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                debug!("Password sign-in succeeded for {email}");
                Ok(response.json().await?)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(IdentityError::InvalidCredentials)
            }
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthUser, IdentityError> {
        let response = self
            .public(self.client.post(self.endpoint("signup")))
            .json(&json!({ "email": email, "password": password, "data": metadata }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        // With email confirmation on, the provider returns the bare user;
        // otherwise a full session wrapping it.
        let body: Value = response.json().await?;
        let user = body.get("user").cloned().unwrap_or(body);
        serde_json::from_value(user).map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .public(self.client.post(self.endpoint("logout")))
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidSession),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .public(self.client.get(self.endpoint("user")))
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidSession),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, IdentityError> {
        let response = self
            .admin(self.client.get(self.endpoint("admin/users")))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: UserListBody = response.json().await?;
        debug!("Listed {} users (page {page})", body.users.len());
        Ok(body.users)
    }
}
