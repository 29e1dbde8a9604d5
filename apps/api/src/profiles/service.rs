use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileUpdate, Role};
use crate::store::Store;

/// Updates a profile. Every authorization check runs before the write:
/// elevation to admin and demotion of an admin need the configured admin
/// secret, role changes need an admin caller, and non-admins may only update
/// themselves.
pub async fn update_user(
    store: &dyn Store,
    config: &Config,
    session: &Session,
    id: Uuid,
    update: &ProfileUpdate,
    admin_secret: Option<&str>,
) -> Result<Profile, AppError> {
    if update.role == Some(Role::Admin) && !config.admin_secret_matches(admin_secret) {
        warn!(
            "Rejected admin elevation of {id} requested by {}",
            session.profile_id
        );
        return Err(AppError::Forbidden(
            "Invalid admin secret for role elevation".to_string(),
        ));
    }
    if update.role.is_some() && !session.is_admin() && update.role != Some(Role::Admin) {
        return Err(AppError::Forbidden(
            "Only administrators can change roles".to_string(),
        ));
    }
    session.require_access(id)?;

    if update.role.is_some_and(|role| role != Role::Admin) {
        let target = store
            .fetch_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))?;
        if target.is_admin() && !config.admin_secret_matches(admin_secret) {
            warn!(
                "Rejected demotion of admin {id} requested by {}",
                session.profile_id
            );
            return Err(AppError::Forbidden(
                "Invalid admin secret for demoting an administrator".to_string(),
            ));
        }
    }

    if update.is_empty() {
        return store
            .fetch_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")));
    }

    let profile = store.update_profile(id, update).await?;
    info!("Profile {id} updated by {}", session.profile_id);
    Ok(profile)
}

/// Deletes a profile. Admin profiles can never be deleted.
pub async fn delete_user(store: &dyn Store, session: &Session, id: Uuid) -> Result<(), AppError> {
    session.require_access(id)?;

    let target = store
        .fetch_profile(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))?;
    if target.is_admin() {
        warn!("Refused deletion of admin profile {id}");
        return Err(AppError::Forbidden(
            "Administrator accounts cannot be deleted".to_string(),
        ));
    }

    if !store.delete_profile(id).await? {
        return Err(AppError::NotFound(format!("Profile {id} not found")));
    }
    info!("Profile {id} deleted by {}", session.profile_id);
    Ok(())
}
