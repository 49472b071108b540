//! Event Ledger Backend Library
//!
//! Events, clients, vendors and the transaction ledger of an event
//! back office, with the per-event financial rollup kept consistent with the
//! ledger inside one storage transaction.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use api::{router, AppState};
pub use config::AppConfig;
pub use error::{AppError, AppResult, LedgerError, LedgerResult};
