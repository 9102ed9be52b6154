use super::severity::Severity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SecurityIncident {
    id: i64,
    incident_type: String,
    severity: String,
    status: String,
    description: String,
    created_at: NaiveDateTime,
}

impl SecurityIncident {
    pub fn new(
        id: i64,
        incident_type: impl Into<String>,
        severity: impl Into<String>,
        status: impl Into<String>,
        description: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            incident_type: incident_type.into(),
            severity: severity.into(),
            status: status.into(),
            description: description.into(),
            created_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn incident_type(&self) -> &str {
        &self.incident_type
    }

    pub fn severity(&self) -> &str {
        &self.severity
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn update_status(&mut self, status: IncidentStatus) {
        self.status = status.as_str().to_string();
    }

    /// 1 = low .. 4 = critical, 0 when the stored severity is unrecognised.
    pub fn severity_level(&self) -> u8 {
        Severity::level_of(&self.severity)
    }
}

impl fmt::Display for SecurityIncident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Incident {} [{}] {} - Status: {}",
            self.id,
            self.severity.to_uppercase(),
            self.incident_type,
            self.status
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}
