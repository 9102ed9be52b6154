//! Database module: schema and storage for persistent records.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the pooled `PlatformStorage` handle and shared helpers
//! - one file per table group, each adding methods to `PlatformStorage`
//! - `seed.rs`: optional demo data for a fresh database

pub mod chat;
pub mod datasets;
pub mod incidents;
pub mod schema;
pub mod seed;
pub mod sqlite;
pub mod tickets;
pub mod users;

pub use datasets::{DatasetBreakdown, DatasetPatch, NewDataset};
pub use incidents::{IncidentBreakdown, IncidentPatch, NewIncident};
pub use schema::SQLITE_INIT;
pub use sqlite::{PlatformStorage, SqlitePool};
pub use tickets::{NewTicket, TicketBreakdown, TicketFilter, TicketPatch};
