//! Service layer for Tally
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, ledger arithmetic, audit logging and account lifecycle.

pub mod account;
pub mod expense;

pub use account::{AccountService, DeletionReport, Identity};
pub use expense::{ExpenseService, ExpenseSummary};
