//! Audit logging system for Tally
//!
//! Every document create, update and delete is appended to `audit.log` as one
//! JSON line, with before/after values and a short diff for updates.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
