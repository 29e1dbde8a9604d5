//! Axum route handlers for the dashboard and its notification list.
//!
//! The shell applies read/delete locally; these routes persist the same
//! changes so they survive a reload.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Session;
use crate::dashboard::shell::{DashboardShell, DashboardSnapshot};
use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::models::profile::{Profile, Role};
use crate::state::AppState;
use crate::students::completion::{compute_completion_report, CompletionReport};
use crate::students::models::Student;
use crate::students::service::load_student_profile;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub profile: Profile,
    pub student: Option<Student>,
    pub completion: Option<CompletionReport>,
    pub dashboard: DashboardSnapshot,
}

/// GET /api/v1/dashboard
pub async fn handle_get_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardResponse>, AppError> {
    let store = state.store.as_ref();

    let (profile, student) = if session.role == Role::Student {
        let (profile, student) = load_student_profile(store, session.profile_id).await?;
        (profile, Some(student))
    } else {
        let profile = store
            .fetch_profile(session.profile_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Profile {} not found", session.profile_id))
            })?;
        (profile, None)
    };
    let completion = student.as_ref().map(compute_completion_report);

    let mut shell = DashboardShell::new(session);
    shell.mount(store).await;

    Ok(Json(DashboardResponse {
        profile,
        student,
        completion,
        dashboard: shell.snapshot(),
    }))
}

/// GET /api/v1/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(
        state.store.list_notifications(session.profile_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReadToggle {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

/// PATCH /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<ReadToggle>,
) -> Result<StatusCode, AppError> {
    if !state
        .store
        .set_notification_read(session.profile_id, id, req.read)
        .await?
    {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/notifications/:id
pub async fn handle_delete_notification(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state
        .store
        .delete_notification(session.profile_id, id)
        .await?
    {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
