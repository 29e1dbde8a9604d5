//! Sign-in / sign-up / sign-out routes. Credential checks happen at the
//! identity provider; these handlers only keep the profile rows in step.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::client::{AuthSession, SignUpMetadata};
use crate::auth::Session;
use crate::errors::AppError;
use crate::models::profile::{Profile, Role};
use crate::state::AppState;
use crate::store::Store;
use crate::students::service::load_or_create_student;

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub session: AuthSession,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    pub profile: Profile,
}

/// Returns the profile for `profile`'s id, creating it (and, for students,
/// the student row) when this is the account's first login.
async fn ensure_profile(store: &dyn Store, profile: Profile) -> Result<Profile, AppError> {
    let profile = match store.fetch_profile(profile.id).await? {
        Some(existing) => existing,
        None => {
            info!("First login for {}, creating profile", profile.id);
            store.insert_profile(&profile).await?
        }
    };
    if profile.role == Role::Student {
        load_or_create_student(store, &profile).await?;
    }
    Ok(profile)
}

/// POST /api/v1/auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let session = state.identity.sign_in(&email, &req.password).await?;
    let user = &session.user;
    let profile = ensure_profile(
        state.store.as_ref(),
        Profile::new_student(
            user.id,
            user.email.as_deref().unwrap_or(&email),
            user.first_name(),
            user.last_name(),
        ),
    )
    .await?;

    Ok(Json(SignInResponse { session, profile }))
}

/// POST /api/v1/auth/sign-up
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "First and last name are required".to_string(),
        ));
    }

    let metadata = SignUpMetadata {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
    };
    let user = state
        .identity
        .sign_up(&email, &req.password, &metadata)
        .await?;
    let profile = ensure_profile(
        state.store.as_ref(),
        Profile::new_student(user.id, &email, &metadata.first_name, &metadata.last_name),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    session: Session,
) -> Result<StatusCode, AppError> {
    state.identity.sign_out(&session.access_token).await?;
    info!("Signed out {}", session.profile_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SessionResponse>, AppError> {
    let profile = state
        .store
        .fetch_profile(session.profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", session.profile_id)))?;
    Ok(Json(SessionResponse { session, profile }))
}
