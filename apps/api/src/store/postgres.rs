use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::{Notification, NotificationRow};
use crate::models::profile::{Profile, ProfileRow, ProfileUpdate};
use crate::models::ticket::{NewTicket, Ticket, TICKET_STATUS_OPEN};
use crate::store::Store;
use crate::students::models::{Student, StudentRow, StudentUpdate};

/// `Store` backed by the hosted Postgres (`profiles`, `etudiants`,
/// `notifications`, `tickets`).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET role = $2, first_name = $3, last_name = $4, phone = $5,
                avatar_url = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(profile.role.as_str())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Profile::try_from)
            .collect()
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles
                (id, role, email, first_name, last_name, phone, avatar_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(profile.role.as_str())
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Created profile {} ({})", profile.id, profile.role);
        row.try_into()
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, AppError> {
        let mut profile = self
            .fetch_profile(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))?;
        profile.apply(update);
        self.write_profile(&profile).await
    }

    async fn delete_profile(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // Admin rows are also protected by a row-level policy on the hosted side.
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1 AND role <> 'admin'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let students = sqlx::query("DELETE FROM etudiants WHERE profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Deleted profile {id} ({} student row(s))",
            students.rows_affected()
        );
        Ok(true)
    }

    async fn fetch_student(&self, profile_id: Uuid) -> Result<Option<Student>, AppError> {
        Ok(
            sqlx::query_as::<_, StudentRow>("SELECT * FROM etudiants WHERE profile_id = $1")
                .bind(profile_id)
                .fetch_optional(&self.pool)
                .await?
                .map(Student::from),
        )
    }

    async fn insert_student(&self, student: &Student) -> Result<Student, AppError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            INSERT INTO etudiants
                (profile_id, education_level, school, biography, experiences, skills,
                 languages, availability, cv_url, birth_date, social_links,
                 search_preferences, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(student.profile_id)
        .bind(&student.education_level)
        .bind(&student.school)
        .bind(&student.biography)
        .bind(Json(&student.experiences))
        .bind(Json(&student.skills))
        .bind(Json(&student.languages))
        .bind(Json(&student.availability))
        .bind(&student.cv_url)
        .bind(student.birth_date)
        .bind(Json(&student.social_links))
        .bind(Json(&student.search_preferences))
        .bind(student.created_at)
        .bind(student.updated_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Created student record for profile {}", student.profile_id);
        Ok(row.into())
    }

    async fn update_student(
        &self,
        profile_id: Uuid,
        update: &StudentUpdate,
    ) -> Result<Student, AppError> {
        let mut student = self
            .fetch_student(profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {profile_id} not found")))?;
        student.apply(update);

        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            UPDATE etudiants
            SET education_level = $2, school = $3, biography = $4, experiences = $5,
                skills = $6, languages = $7, availability = $8, cv_url = $9,
                birth_date = $10, social_links = $11, search_preferences = $12,
                updated_at = $13
            WHERE profile_id = $1
            RETURNING *
            "#,
        )
        .bind(profile_id)
        .bind(&student.education_level)
        .bind(&student.school)
        .bind(&student.biography)
        .bind(Json(&student.experiences))
        .bind(Json(&student.skills))
        .bind(Json(&student.languages))
        .bind(Json(&student.availability))
        .bind(&student.cv_url)
        .bind(student.birth_date)
        .bind(Json(&student.social_links))
        .bind(Json(&student.search_preferences))
        .bind(student.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_notifications(&self, profile_id: Uuid) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE profile_id = $1 ORDER BY created_at DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn set_notification_read(
        &self,
        profile_id: Uuid,
        id: Uuid,
        read: bool,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE notifications SET read = $3 WHERE id = $1 AND profile_id = $2")
                .bind(id)
                .bind(profile_id)
                .bind(read)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_notification(&self, profile_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND profile_id = $2")
            .bind(id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_ticket(&self, profile_id: Uuid, ticket: &NewTicket) -> Result<Ticket, AppError> {
        Ok(sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (id, profile_id, subject, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(ticket.subject.trim())
        .bind(ticket.message.trim())
        .bind(TICKET_STATUS_OPEN)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_tickets(&self, profile_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        Ok(sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE profile_id = $1 ORDER BY created_at DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
