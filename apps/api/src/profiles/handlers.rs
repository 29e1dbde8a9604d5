use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileUpdate};
use crate::profiles::service::{delete_user, update_user};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub update: ProfileUpdate,
    #[serde(default)]
    pub admin_secret: Option<String>,
}

/// PATCH /api/v1/profiles/:id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Profile>, AppError> {
    let profile = update_user(
        state.store.as_ref(),
        &state.config,
        &session,
        id,
        &req.update,
        req.admin_secret.as_deref(),
    )
    .await?;
    Ok(Json(profile))
}

/// DELETE /api/v1/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_user(state.store.as_ref(), &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
