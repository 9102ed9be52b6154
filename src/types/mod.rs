//! Domain records mirrored from SQL rows, plus the small enums that validate
//! form input before it reaches a statement.

pub mod chat;
pub mod dataset;
pub mod incident;
pub mod severity;
pub mod stats;
pub mod ticket;
pub mod user;

pub use chat::{Channel, ChatMessage, ChatRole, ConversationStats};
pub use dataset::Dataset;
pub use incident::{IncidentStatus, SecurityIncident};
pub use severity::Severity;
pub use stats::{CountBucket, DatasetSummary, IncidentSummary, PlatformCounts, TicketSummary};
pub use ticket::{ITTicket, TicketStatus, TicketUpdate};
pub use user::{Role, User, UserView};
