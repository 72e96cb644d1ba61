//! Postgres-backed implementations of the timed action ledger and the
//! moderation audit sink.

pub mod audit;
pub mod config;
pub mod ledger;

pub use audit::PgModerationAudit;
pub use config::StorageConfig;
pub use ledger::PgTimeoutLedger;
