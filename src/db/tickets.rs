use crate::db::sqlite::{PlatformStorage, expect_affected};
use crate::error::PlatformError;
use crate::types::ticket::UNASSIGNED;
use crate::types::{CountBucket, ITTicket, Severity, TicketStatus, TicketSummary, TicketUpdate};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

const ENTITY: &str = "Ticket";
const COLUMNS: &str = "id, title, description, priority, status, assigned_to, created_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Severity,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
    pub priority: Option<Severity>,
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<String>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.status.is_none() && self.assigned_to.is_none()
    }
}

/// Restricts listings to the given statuses and priorities; an empty list means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub statuses: Vec<TicketStatus>,
    pub priorities: Vec<Severity>,
}

impl TicketFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut first = true;
        let mut clause = |qb: &mut QueryBuilder<'_, Sqlite>| {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;
        };
        if !self.statuses.is_empty() {
            clause(qb);
            qb.push("status IN (");
            let mut list = qb.separated(", ");
            for status in &self.statuses {
                list.push_bind(status.as_str());
            }
            list.push_unseparated(")");
        }
        if !self.priorities.is_empty() {
            clause(qb);
            qb.push("LOWER(priority) IN (");
            let mut list = qb.separated(", ");
            for priority in &self.priorities {
                list.push_bind(priority.as_str());
            }
            list.push_unseparated(")");
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketBreakdown {
    pub by_status: Vec<CountBucket>,
    pub by_priority: Vec<CountBucket>,
}

/// Blank assignees fall back to the column default.
fn normalize_assignee(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNASSIGNED.to_string(),
    }
}

impl PlatformStorage {
    /// Tickets matching `filter`, newest first.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<ITTicket>, PlatformError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM it_tickets"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY id DESC");
        let rows = qb
            .build_query_as::<ITTicket>()
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn get_ticket(&self, id: i64) -> Result<ITTicket, PlatformError> {
        let sql = format!("SELECT {COLUMNS} FROM it_tickets WHERE id = ?");
        sqlx::query_as::<_, ITTicket>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(PlatformError::NotFound { entity: ENTITY, id })
    }

    /// New tickets always start `Open`.
    pub async fn insert_ticket(&self, new: &NewTicket) -> Result<i64, PlatformError> {
        let assignee = normalize_assignee(new.assigned_to.as_deref());
        let result = sqlx::query(
            "INSERT INTO it_tickets (title, description, priority, status, assigned_to) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.priority.as_str())
        .bind(TicketStatus::Open.as_str())
        .bind(&assignee)
        .execute(self.pool())
        .await?;
        let id = result.last_insert_rowid();
        info!(id, title = %new.title, priority = %new.priority, assignee = %assignee, "ticket created");
        Ok(id)
    }

    pub async fn update_ticket(&self, id: i64, patch: &TicketPatch) -> Result<(), PlatformError> {
        if patch.is_empty() {
            return Err(PlatformError::NoFieldsToUpdate);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE it_tickets SET ");
        let mut set = qb.separated(", ");
        if let Some(priority) = patch.priority {
            set.push("priority = ").push_bind_unseparated(priority.as_str());
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(assignee) = patch.assigned_to.as_deref() {
            set.push("assigned_to = ")
                .push_bind_unseparated(normalize_assignee(Some(assignee)));
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(self.pool()).await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, ?patch, "ticket updated");
        Ok(())
    }

    /// Persist the status and assignee of a ticket mutated in memory.
    pub async fn save_ticket_state(&self, ticket: &ITTicket) -> Result<(), PlatformError> {
        let result = sqlx::query("UPDATE it_tickets SET status = ?, assigned_to = ? WHERE id = ?")
            .bind(ticket.status())
            .bind(ticket.assigned_to())
            .bind(ticket.id())
            .execute(self.pool())
            .await?;
        expect_affected(result, ENTITY, ticket.id())?;
        info!(id = ticket.id(), status = ticket.status(), assignee = ticket.assigned_to(), "ticket saved");
        Ok(())
    }

    /// Deleting a ticket also drops its comment thread.
    pub async fn delete_ticket(&self, id: i64) -> Result<(), PlatformError> {
        let result = sqlx::query("DELETE FROM it_tickets WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, "ticket deleted");
        Ok(())
    }

    pub async fn add_ticket_update(
        &self,
        ticket_id: i64,
        author: &str,
        comment: &str,
    ) -> Result<TicketUpdate, PlatformError> {
        // fail with NotFound rather than a foreign key error
        self.get_ticket(ticket_id).await?;
        let update = sqlx::query_as::<_, TicketUpdate>(
            r#"INSERT INTO ticket_updates (ticket_id, author, comment) VALUES (?, ?, ?)
               RETURNING id, ticket_id, author, comment, created_at"#,
        )
        .bind(ticket_id)
        .bind(author)
        .bind(comment)
        .fetch_one(self.pool())
        .await?;
        info!(ticket_id, author, "ticket comment added");
        Ok(update)
    }

    pub async fn list_ticket_updates(&self, ticket_id: i64) -> Result<Vec<TicketUpdate>, PlatformError> {
        self.get_ticket(ticket_id).await?;
        let rows = sqlx::query_as::<_, TicketUpdate>(
            r#"SELECT id, ticket_id, author, comment, created_at
               FROM ticket_updates WHERE ticket_id = ? ORDER BY id"#,
        )
        .bind(ticket_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Status counts over the tickets matching `filter`.
    pub async fn ticket_summary(&self, filter: &TicketFilter) -> Result<TicketSummary, PlatformError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT
                COUNT(*) AS total,
                COALESCE(SUM(status = 'Open'), 0) AS open,
                COALESCE(SUM(status = 'In Progress'), 0) AS in_progress,
                COALESCE(SUM(status = 'Closed'), 0) AS closed
               FROM it_tickets"#,
        );
        filter.push_where(&mut qb);
        let summary = qb
            .build_query_as::<TicketSummary>()
            .fetch_one(self.pool())
            .await?;
        Ok(summary)
    }

    pub async fn ticket_breakdown(&self) -> Result<TicketBreakdown, PlatformError> {
        Ok(TicketBreakdown {
            by_status: self.count_by("it_tickets", "status").await?,
            by_priority: self.count_by("it_tickets", "priority").await?,
        })
    }
}
