use crate::db::{NewTicket, TicketBreakdown, TicketFilter, TicketPatch};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::types::{ITTicket, Severity, TicketStatus, TicketSummary, TicketUpdate};
use crate::{PlatformError, server::router::PlatformState};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// `?status=Open,In Progress&priority=high` style filters.
#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl TicketQuery {
    pub fn into_filter(self) -> Result<TicketFilter, PlatformError> {
        Ok(TicketFilter {
            statuses: parse_list(self.status.as_deref(), TicketStatus::parse, "status")?,
            priorities: parse_list(self.priority.as_deref(), Severity::parse, "priority")?,
        })
    }
}

fn parse_list<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    field: &str,
) -> Result<Vec<T>, PlatformError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(s).ok_or_else(|| PlatformError::validation(format!("Unknown {field}: {s}"))))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct TicketListing {
    pub summary: TicketSummary,
    pub tickets: Vec<ITTicket>,
}

#[derive(Debug, Deserialize)]
pub struct AssignForm {
    pub assigned_to: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: String,
}

/// GET /tickets
pub async fn list_tickets(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiQuery(query): ApiQuery<TicketQuery>,
) -> Result<Json<TicketListing>, PlatformError> {
    let filter = query.into_filter()?;
    let summary = state.storage.ticket_summary(&filter).await?;
    let tickets = state.storage.list_tickets(&filter).await?;
    Ok(Json(TicketListing { summary, tickets }))
}

/// POST /tickets
pub async fn create_ticket(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiJson(mut form): ApiJson<NewTicket>,
) -> Result<impl IntoResponse, PlatformError> {
    form.title = form.title.trim().to_string();
    if form.title.is_empty() {
        return Err(PlatformError::validation("Ticket title is required."));
    }
    let id = state.storage.insert_ticket(&form).await?;
    let ticket = state.storage.get_ticket(id).await?;
    info!(id, requester = %user.username, "ticket opened");
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets/{id}
pub async fn get_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ITTicket>, PlatformError> {
    Ok(Json(state.storage.get_ticket(id).await?))
}

/// PATCH /tickets/{id}
pub async fn update_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<TicketPatch>,
) -> Result<Json<ITTicket>, PlatformError> {
    state.storage.update_ticket(id, &patch).await?;
    Ok(Json(state.storage.get_ticket(id).await?))
}

/// DELETE /tickets/{id}
pub async fn delete_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, PlatformError> {
    state.storage.delete_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /tickets/{id}/close
pub async fn close_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ITTicket>, PlatformError> {
    let mut ticket = state.storage.get_ticket(id).await?;
    ticket.close_ticket();
    state.storage.save_ticket_state(&ticket).await?;
    Ok(Json(ticket))
}

/// POST /tickets/{id}/reopen -> only closed tickets reopen.
pub async fn reopen_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ITTicket>, PlatformError> {
    let mut ticket = state.storage.get_ticket(id).await?;
    if !ticket.reopen_ticket() {
        return Err(PlatformError::validation("Only closed tickets can be reopened."));
    }
    state.storage.save_ticket_state(&ticket).await?;
    Ok(Json(ticket))
}

/// POST /tickets/{id}/assign
pub async fn assign_ticket(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(form): ApiJson<AssignForm>,
) -> Result<Json<ITTicket>, PlatformError> {
    let assignee = form.assigned_to.trim();
    if assignee.is_empty() {
        return Err(PlatformError::validation("Assignee is required."));
    }
    let mut ticket = state.storage.get_ticket(id).await?;
    ticket.assign_to(assignee);
    state.storage.save_ticket_state(&ticket).await?;
    Ok(Json(ticket))
}

/// GET /tickets/{id}/updates
pub async fn list_ticket_updates(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<TicketUpdate>>, PlatformError> {
    Ok(Json(state.storage.list_ticket_updates(id).await?))
}

/// POST /tickets/{id}/updates
pub async fn add_ticket_update(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(form): ApiJson<CommentForm>,
) -> Result<impl IntoResponse, PlatformError> {
    let comment = form.comment.trim();
    if comment.is_empty() {
        return Err(PlatformError::validation("Comment cannot be empty."));
    }
    let update = state
        .storage
        .add_ticket_update(id, &user.username, comment)
        .await?;
    Ok((StatusCode::CREATED, Json(update)))
}

/// GET /tickets/analysis
pub async fn ticket_analysis(
    State(state): State<PlatformState>,
    _user: CurrentUser,
) -> Result<Json<TicketBreakdown>, PlatformError> {
    Ok(Json(state.storage.ticket_breakdown().await?))
}
