//! Tally - running-total expense ledgers for the terminal
//!
//! Each expense belongs to a spending category and starts from an amount.
//! Debit and credit charges are folded into that amount one at a time, with
//! the running total rounded to cents after every step.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (expenses, profiles, ids, money parsing)
//! - `ledger`: Running-total arithmetic, the charge keypad and edit sessions
//! - `storage`: Per-user JSON document store with live subscriptions
//! - `audit`: Audit logging system
//! - `services`: Business logic layer
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::config::paths::TallyPaths;
//! use tally::models::UserId;
//! use tally::services::ExpenseService;
//! use tally::storage::Storage;
//!
//! let storage = Storage::new(TallyPaths::new()?)?;
//! let service = ExpenseService::new(&storage, UserId::new("u1")?)?;
//! let food = service.create("Food", "100")?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod ledger;
pub mod models;
pub mod services;
pub mod storage;

pub use error::TallyError;
