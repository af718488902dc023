//! Infrastructure layer: record store adapters, reference data, transaction
//! history, configuration, and the removal orchestrator that composes them.

pub mod config;
pub mod history;
pub mod record_store;
pub mod reference_data;
pub mod removal;


pub use config::RemovalConfig;
pub use removal::{LoadingGuard, RefreshOutcome, RemovalError, RemovalService};
