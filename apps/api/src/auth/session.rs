use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{Profile, Role};
use crate::state::AppState;

/// The authenticated caller, resolved once per request and passed explicitly
/// to services and the dashboard shell.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub profile_id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub access_token: String,
}

impl Session {
    pub fn for_profile(profile: &Profile, access_token: impl Into<String>) -> Self {
        Self {
            profile_id: profile.id,
            email: profile.email.clone(),
            role: profile.role,
            access_token: access_token.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners act on their own rows; admins act on any row.
    pub fn can_act_on(&self, profile_id: Uuid) -> bool {
        self.is_admin() || self.profile_id == profile_id
    }

    pub fn require_access(&self, profile_id: Uuid) -> Result<(), AppError> {
        if self.can_act_on(profile_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You may only modify your own account".to_string(),
            ))
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = state.identity.get_user(token).await?;
        let profile = state
            .store
            .fetch_profile(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.id)))?;

        Ok(Session::for_profile(&profile, token))
    }
}
