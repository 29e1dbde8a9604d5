use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::models::profile::{Profile, ProfileUpdate};
use crate::models::ticket::{NewTicket, Ticket, TICKET_STATUS_OPEN};
use crate::store::Store;
use crate::students::models::{Student, StudentUpdate};

/// In-memory `Store` for tests. `fail_reads` / `fail_writes` simulate the
/// hosted backend rejecting calls.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<Vec<Profile>>,
    students: Mutex<HashMap<Uuid, Student>>,
    notifications: Mutex<Vec<Notification>>,
    tickets: Mutex<Vec<Ticket>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

fn backend_down() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

impl MemoryStore {
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
            ..Default::default()
        }
    }

    pub fn seed_student(&self, student: Student) {
        self.students
            .lock()
            .unwrap()
            .insert(student.profile_id, student);
    }

    pub fn seed_notifications(&self, notifications: Vec<Notification>) {
        self.notifications.lock().unwrap().extend(notifications);
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    fn write_guard(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(backend_down())
        } else {
            Ok(())
        }
    }

    fn read_guard(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(backend_down())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read_guard()
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        self.read_guard()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.read_guard()?;
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, AppError> {
        self.write_guard()?;
        self.profiles.lock().unwrap().push(profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Profile, AppError> {
        self.write_guard()?;
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Profile {id} not found")))?;
        profile.apply(update);
        Ok(profile.clone())
    }

    async fn delete_profile(&self, id: Uuid) -> Result<bool, AppError> {
        self.write_guard()?;
        let mut profiles = self.profiles.lock().unwrap();
        let before = profiles.len();
        profiles.retain(|p| p.id != id || p.is_admin());
        let deleted = profiles.len() < before;
        if deleted {
            self.students.lock().unwrap().remove(&id);
        }
        Ok(deleted)
    }

    async fn fetch_student(&self, profile_id: Uuid) -> Result<Option<Student>, AppError> {
        self.read_guard()?;
        Ok(self.students.lock().unwrap().get(&profile_id).cloned())
    }

    async fn insert_student(&self, student: &Student) -> Result<Student, AppError> {
        self.write_guard()?;
        self.seed_student(student.clone());
        Ok(student.clone())
    }

    async fn update_student(
        &self,
        profile_id: Uuid,
        update: &StudentUpdate,
    ) -> Result<Student, AppError> {
        self.write_guard()?;
        let mut students = self.students.lock().unwrap();
        let student = students
            .get_mut(&profile_id)
            .ok_or_else(|| AppError::NotFound(format!("Student {profile_id} not found")))?;
        student.apply(update);
        Ok(student.clone())
    }

    async fn list_notifications(&self, profile_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.read_guard()?;
        let mut list: Vec<_> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.profile_id == profile_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn set_notification_read(
        &self,
        profile_id: Uuid,
        id: Uuid,
        read: bool,
    ) -> Result<bool, AppError> {
        self.write_guard()?;
        let mut list = self.notifications.lock().unwrap();
        match list
            .iter_mut()
            .find(|n| n.id == id && n.profile_id == profile_id)
        {
            Some(n) => {
                n.read = read;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_notification(&self, profile_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        self.write_guard()?;
        let mut list = self.notifications.lock().unwrap();
        let before = list.len();
        list.retain(|n| !(n.id == id && n.profile_id == profile_id));
        Ok(list.len() < before)
    }

    async fn insert_ticket(&self, profile_id: Uuid, ticket: &NewTicket) -> Result<Ticket, AppError> {
        self.write_guard()?;
        let ticket = Ticket {
            id: Uuid::new_v4(),
            profile_id,
            subject: ticket.subject.trim().to_string(),
            message: ticket.message.trim().to_string(),
            status: TICKET_STATUS_OPEN.to_string(),
            created_at: Utc::now(),
        };
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    async fn list_tickets(&self, profile_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        self.read_guard()?;
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.profile_id == profile_id)
            .cloned()
            .collect())
    }
}
