//! Remote persistence over the hosted database.
//!
//! Handlers and services only see `Arc<dyn Store>`; the production backend is
//! [`postgres::PgStore`]. Every operation touches a single row (or a
//! single-table read). There are no cross-row transactions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::models::profile::{Profile, ProfileUpdate};
use crate::models::ticket::{NewTicket, Ticket};
use crate::students::models::{Student, StudentUpdate};

pub mod postgres;

#[cfg(test)]
pub mod memory;

#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the backend, used by the health check.
    async fn ping(&self) -> Result<(), AppError>;

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError>;
    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;
    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, AppError>;
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, AppError>;
    /// Deletes a non-admin profile together with its student row.
    /// Returns `false` when no row matched.
    async fn delete_profile(&self, id: Uuid) -> Result<bool, AppError>;

    async fn fetch_student(&self, profile_id: Uuid) -> Result<Option<Student>, AppError>;
    async fn insert_student(&self, student: &Student) -> Result<Student, AppError>;
    async fn update_student(
        &self,
        profile_id: Uuid,
        update: &StudentUpdate,
    ) -> Result<Student, AppError>;

    /// Newest first.
    async fn list_notifications(&self, profile_id: Uuid) -> Result<Vec<Notification>, AppError>;
    async fn set_notification_read(
        &self,
        profile_id: Uuid,
        id: Uuid,
        read: bool,
    ) -> Result<bool, AppError>;
    async fn delete_notification(&self, profile_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn insert_ticket(&self, profile_id: Uuid, ticket: &NewTicket) -> Result<Ticket, AppError>;
    async fn list_tickets(&self, profile_id: Uuid) -> Result<Vec<Ticket>, AppError>;
}
