use bytes::Bytes;
use tracing::info;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileUpdate, Role};
use crate::storage::{object_key, DocumentKind, DocumentStorage};
use crate::store::Store;
use crate::students::editor::{describe_errors, EditorError, ProfileEditor};
use crate::students::models::{Student, StudentUpdate};

/// Returns the student record for `profile`, inserting an empty one on first login.
pub async fn load_or_create_student(store: &dyn Store, profile: &Profile) -> Result<Student, AppError> {
    if let Some(student) = store.fetch_student(profile.id).await? {
        return Ok(student);
    }
    info!("No student record for {}, creating one", profile.id);
    store.insert_student(&Student::empty(profile.id)).await
}

/// Fetches the profile and, for students, the student record. Sequenced: the
/// student lookup needs the resolved profile.
pub async fn load_student_profile(
    store: &dyn Store,
    profile_id: uuid::Uuid,
) -> Result<(Profile, Student), AppError> {
    let profile = store
        .fetch_profile(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {profile_id} not found")))?;
    if profile.role != Role::Student {
        return Err(AppError::NotFound(format!(
            "Profile {profile_id} has no student record"
        )));
    }
    let student = load_or_create_student(store, &profile).await?;
    Ok((profile, student))
}

/// Runs `update` through the profile editor: the stored records with the
/// update applied are validated as a whole draft, then the profile part and
/// the student part are written. The two writes are independent single-row
/// operations.
pub async fn save_student(
    store: &dyn Store,
    session: &Session,
    profile_id: uuid::Uuid,
    update: &StudentUpdate,
) -> Result<(Profile, Student), AppError> {
    session.require_access(profile_id)?;
    let (profile, student) = load_student_profile(store, profile_id).await?;

    let mut editor = ProfileEditor::with_update(&profile, &student, update);
    let mut saved = None;
    let slot = &mut saved;
    editor
        .submit(|full| async move {
            let profile = match &full.personal {
                Some(personal) => store.update_profile(profile_id, &personal.into()).await?,
                None => profile,
            };
            let student = store.update_student(profile_id, &full).await?;
            *slot = Some((profile, student));
            Ok(())
        })
        .await
        .map_err(|e| match e {
            EditorError::Invalid(errors) => AppError::Validation(describe_errors(&errors)),
            EditorError::Commit(e) => e,
            other => AppError::Internal(other.into()),
        })?;

    info!("Saved student profile {profile_id}");
    saved.ok_or_else(|| AppError::Internal(anyhow::anyhow!("save finished without a result")))
}

/// Uploads a CV or avatar and records its public URL on the owning row.
pub async fn upload_document(
    store: &dyn Store,
    storage: &dyn DocumentStorage,
    session: &Session,
    kind: DocumentKind,
    body: Bytes,
    content_type: &str,
) -> Result<String, AppError> {
    let profile_id = session.profile_id;
    let key = object_key(kind, profile_id, content_type, body.len())?;
    if kind == DocumentKind::Cv {
        // CVs live on the student row; make sure it exists before uploading.
        load_student_profile(store, profile_id).await?;
    }
    let url = storage.upload(&key, body, content_type).await?;

    match kind {
        DocumentKind::Cv => {
            store
                .update_student(
                    profile_id,
                    &StudentUpdate {
                        cv_url: Some(url.clone()),
                        ..Default::default()
                    },
                )
                .await?;
        }
        DocumentKind::Avatar => {
            store
                .update_profile(
                    profile_id,
                    &ProfileUpdate {
                        avatar_url: Some(url.clone()),
                        ..Default::default()
                    },
                )
                .await?;
        }
    }

    Ok(url)
}
