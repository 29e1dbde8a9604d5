//! Axum route handlers for the student profile API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::state::AppState;
use crate::storage::DocumentKind;
use crate::students::completion::{compute_completion_report, CompletionReport};
use crate::students::models::{Student, StudentUpdate};
use crate::students::service::{load_student_profile, save_student, upload_document};

#[derive(Debug, Serialize)]
pub struct StudentProfileResponse {
    pub profile: Profile,
    pub student: Student,
    pub completion: CompletionReport,
}

impl StudentProfileResponse {
    fn new(profile: Profile, student: Student) -> Self {
        let completion = compute_completion_report(&student);
        Self {
            profile,
            student,
            completion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub kind: DocumentKind,
    pub url: String,
}

/// GET /api/v1/students/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let (profile, student) = load_student_profile(state.store.as_ref(), session.profile_id).await?;
    Ok(Json(StudentProfileResponse::new(profile, student)))
}

/// PATCH /api/v1/students/me
///
/// Accepts the editor's combined partial update. The whole resulting draft is
/// validated before anything is written.
pub async fn handle_update_me(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let (profile, student) =
        save_student(state.store.as_ref(), &session, session.profile_id, &update).await?;
    Ok(Json(StudentProfileResponse::new(profile, student)))
}

/// POST /api/v1/students/me/documents/:kind
///
/// Multipart upload with a single `file` field.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let kind: DocumentKind = kind.parse()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File content type is missing".to_string()))?;
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        let url = upload_document(
            state.store.as_ref(),
            state.storage.as_ref(),
            &session,
            kind,
            body,
            &content_type,
        )
        .await?;
        return Ok(Json(UploadResponse { kind, url }));
    }

    Err(AppError::Validation(
        "Multipart body has no 'file' field".to_string(),
    ))
}
