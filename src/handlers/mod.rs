pub mod assistant;
pub mod auth;
pub mod dashboard;
pub mod datasets;
pub mod incidents;
pub mod tickets;
