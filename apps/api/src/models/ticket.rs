use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A support ticket opened from the platform's contact form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub message: String,
}

pub const TICKET_STATUS_OPEN: &str = "open";
