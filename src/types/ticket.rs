use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ITTicket {
    id: i64,
    title: String,
    description: String,
    priority: String,
    status: String,
    assigned_to: String,
    created_at: NaiveDateTime,
}

impl ITTicket {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        priority: impl Into<String>,
        status: impl Into<String>,
        assigned_to: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            priority: priority.into(),
            status: status.into(),
            assigned_to: assigned_to.into(),
            created_at: NaiveDateTime::default(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn assigned_to(&self) -> &str {
        &self.assigned_to
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn assign_to(&mut self, staff: impl Into<String>) {
        self.assigned_to = staff.into();
    }

    pub fn close_ticket(&mut self) {
        self.status = TicketStatus::Closed.as_str().to_string();
    }

    /// Only a closed ticket goes back to `Open`; any other status is left alone.
    /// Returns whether the status changed.
    pub fn reopen_ticket(&mut self) -> bool {
        if self.status == TicketStatus::Closed.as_str() {
            self.status = TicketStatus::Open.as_str().to_string();
            return true;
        }
        false
    }

    pub fn update_status(&mut self, status: TicketStatus) {
        self.status = status.as_str().to_string();
    }
}

impl fmt::Display for ITTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket {}: {} [{}] - {} (assigned to: {})",
            self.id, self.title, self.priority, self.status, self.assigned_to
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Open" => Some(Self::Open),
            "In Progress" => Some(Self::InProgress),
            "Closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// One entry in a ticket's comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TicketUpdate {
    pub id: i64,
    pub ticket_id: i64,
    pub author: String,
    pub comment: String,
    pub created_at: NaiveDateTime,
}
