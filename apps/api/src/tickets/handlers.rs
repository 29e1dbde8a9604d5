use axum::{extract::State, http::StatusCode, Json};

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::ticket::{NewTicket, Ticket};
use crate::state::AppState;

pub const SUBJECT_MAX_CHARS: usize = 200;
pub const MESSAGE_MAX_CHARS: usize = 5000;

fn validate_ticket(ticket: &NewTicket) -> Result<(), AppError> {
    let subject = ticket.subject.trim();
    let message = ticket.message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(AppError::Validation(
            "Subject and message are required".to_string(),
        ));
    }
    if subject.chars().count() > SUBJECT_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Subject must be at most {SUBJECT_MAX_CHARS} characters"
        )));
    }
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be at most {MESSAGE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

/// POST /api/v1/tickets
pub async fn handle_create_ticket(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    validate_ticket(&req)?;
    let ticket = state.store.insert_ticket(session.profile_id, &req).await?;
    tracing::info!("Ticket {} opened by {}", ticket.id, session.profile_id);
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/v1/tickets
pub async fn handle_list_tickets(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Ticket>>, AppError> {
    Ok(Json(state.store.list_tickets(session.profile_id).await?))
}
