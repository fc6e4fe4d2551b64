//! Core data models for Tally
//!
//! Expense documents, user profiles, identifiers and money parsing.

pub mod expense;
pub mod ids;
pub mod money;
pub mod profile;

pub use expense::{Expense, ExpenseRecord, ExpenseValidationError};
pub use ids::{ExpenseId, UserId};
pub use money::{format_number, format_with_symbol, parse_money, round_cents, MAX_AMOUNT};
pub use profile::UserProfile;
