//! The two thin proxies in front of the hosted backend: the admin-secret
//! profile dump and the identity provider's paginated user listing, which is
//! limited to admin sessions.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::client::AuthUser;
use crate::auth::Session;
use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Deserialize)]
pub struct AdminSecretRequest {
    #[serde(default)]
    pub secret: Option<String>,
}

/// POST /api/admin/profiles
///
/// 403 unless `secret` matches the configured admin secret; otherwise every
/// profile row.
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Json(req): Json<AdminSecretRequest>,
) -> Result<Json<Vec<Profile>>, AppError> {
    if !state.config.admin_secret_matches(req.secret.as_deref()) {
        warn!("Admin profile listing refused: bad secret");
        return Err(AppError::Forbidden("Invalid admin secret".to_string()));
    }
    let profiles = state.store.list_profiles().await?;
    info!("Admin profile listing returned {} rows", profiles.len());
    Ok(Json(profiles))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    /// 1-based page and a limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<AuthUser>,
    pub page: u32,
    pub limit: u32,
}

/// GET /api/users?page=&limit=
///
/// Admin sessions only: the listing runs with the service-role key.
pub async fn handle_list_users(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<Pagination>,
) -> Result<Json<UserPage>, AppError> {
    if !session.is_admin() {
        warn!("User listing refused for {}", session.profile_id);
        return Err(AppError::Forbidden(
            "Only administrators can list users".to_string(),
        ));
    }
    let (page, limit) = params.resolve();
    let users = state
        .identity
        .list_users(page, limit)
        .await
        .map_err(|e| AppError::Identity(e.to_string()))?;
    Ok(Json(UserPage { users, page, limit }))
}
