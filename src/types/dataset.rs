use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
pub const BYTES_PER_GB: f64 = BYTES_PER_MB * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Dataset {
    id: i64,
    name: String,
    size_bytes: i64,
    rows: i64,
    source: String,
    created_at: NaiveDateTime,
}

impl Dataset {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        size_bytes: i64,
        rows: i64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size_bytes,
            rows,
            source: source.into(),
            created_at: NaiveDateTime::default(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    pub fn rows(&self) -> i64 {
        self.rows
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }

    pub fn size_gb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_GB
    }
}

/// Bytes for a size entered in megabytes, truncated like the upload form does.
pub fn mb_to_bytes(size_mb: f64) -> i64 {
    (size_mb * BYTES_PER_MB) as i64
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset {}: {} ({:.2} MB, {} rows, source: {})",
            self.id,
            self.name,
            self.size_mb(),
            self.rows,
            self.source
        )
    }
}
