//! Expense documents
//!
//! An expense is a named ledger: a base amount plus two ordered lists of
//! signed charges. `ExpenseRecord` is exactly what the document store holds;
//! `Expense` pairs it with the id the store assigned.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ExpenseId;
use super::money::{parse_money, MoneyParseError};
use crate::ledger::LedgerSide;

/// Persisted shape of an expense document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    /// Display label
    pub category: String,

    /// Opening balance of the ledger
    pub amount: Decimal,

    /// Signed adjustments recorded on the debit side, in entry order
    #[serde(default)]
    pub debit_charges: Vec<Decimal>,

    /// Signed adjustments recorded on the credit side, in entry order
    #[serde(default)]
    pub credit_charges: Vec<Decimal>,
}

impl ExpenseRecord {
    /// A fresh ledger with no charges
    pub fn new(category: impl Into<String>, amount: Decimal) -> Self {
        Self {
            category: category.into(),
            amount,
            debit_charges: Vec::new(),
            credit_charges: Vec::new(),
        }
    }

    /// Validate raw user input and build a new record
    pub fn from_input(category: &str, amount: &str) -> Result<Self, ExpenseValidationError> {
        let category = validate_category(category)?;
        let amount = validate_amount(amount)?;
        Ok(Self::new(category, amount))
    }

    /// Charges on one side of the ledger
    pub fn charges(&self, side: LedgerSide) -> &[Decimal] {
        match side {
            LedgerSide::Debit => &self.debit_charges,
            LedgerSide::Credit => &self.credit_charges,
        }
    }

    /// Mutable charges on one side of the ledger
    pub fn charges_mut(&mut self, side: LedgerSide) -> &mut Vec<Decimal> {
        match side {
            LedgerSide::Debit => &mut self.debit_charges,
            LedgerSide::Credit => &mut self.credit_charges,
        }
    }

    /// Total number of charges on both sides
    pub fn charge_count(&self) -> usize {
        self.debit_charges.len() + self.credit_charges.len()
    }
}

/// An expense document together with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: ExpenseId,

    #[serde(flatten)]
    pub record: ExpenseRecord,
}

impl Expense {
    pub fn new(id: ExpenseId, record: ExpenseRecord) -> Self {
        Self { id, record }
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record.category)
    }
}

/// Trim and check a category label
pub fn validate_category(category: &str) -> Result<String, ExpenseValidationError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(ExpenseValidationError::EmptyCategory);
    }
    Ok(category.to_string())
}

/// Check an amount string against the money pattern
pub fn validate_amount(amount: &str) -> Result<Decimal, ExpenseValidationError> {
    parse_money(amount).map_err(|MoneyParseError::InvalidFormat(raw)| {
        ExpenseValidationError::InvalidAmount(raw)
    })
}

/// Validation errors for expense input
///
/// The display strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    EmptyCategory,
    InvalidAmount(String),
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseValidationError::EmptyCategory => write!(f, "Category may not be empty"),
            ExpenseValidationError::InvalidAmount(_) => write!(f, "Please enter a valid amount"),
        }
    }
}

impl std::error::Error for ExpenseValidationError {}
