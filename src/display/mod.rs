//! Display formatting for terminal output
//!
//! Provides utilities for formatting expenses, ledgers and audit entries
//! as plain-text tables and detail views.

pub mod expense;

pub use expense::{
    format_audit_entries, format_expense_details, format_expense_list, format_session_status,
    format_snapshot,
};
