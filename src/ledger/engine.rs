//! Running totals and charge-list mutations
//!
//! The total of an expense is its base amount with every debit charge applied
//! in order, then every credit charge in order. After each charge the running
//! total is rounded to cents if it carries more than two fractional digits.
//! Rounding per step is part of the displayed history and can differ from
//! rounding only the final sum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::money::{format_number, round_cents, saturating_add};
use crate::models::{Expense, ExpenseId, ExpenseRecord};

/// Sign applied to a typed magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Plus,
    #[default]
    Minus,
}

impl Operator {
    /// Give `magnitude` this operator's sign
    pub fn apply(self, magnitude: Decimal) -> Decimal {
        match self {
            Operator::Plus => magnitude,
            Operator::Minus if magnitude.is_zero() => Decimal::ZERO,
            Operator::Minus => -magnitude,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Operator::Plus => Operator::Minus,
            Operator::Minus => Operator::Plus,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Plus => '+',
            Operator::Minus => '-',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "plus" => Ok(Operator::Plus),
            "-" | "minus" => Ok(Operator::Minus),
            other => Err(format!("Unknown operator '{}': expected '+' or '-'", other)),
        }
    }
}

/// Which charge list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSide {
    #[default]
    Debit,
    Credit,
}

impl LedgerSide {
    pub fn toggle(self) -> Self {
        match self {
            LedgerSide::Debit => LedgerSide::Credit,
            LedgerSide::Credit => LedgerSide::Debit,
        }
    }
}

impl fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerSide::Debit => write!(f, "debit"),
            LedgerSide::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for LedgerSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "d" => Ok(LedgerSide::Debit),
            "credit" | "c" => Ok(LedgerSide::Credit),
            other => Err(format!(
                "Unknown ledger side '{}': expected 'debit' or 'credit'",
                other
            )),
        }
    }
}

/// One charge folded into the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStep {
    pub side: LedgerSide,
    pub charge: Decimal,
    /// Total after this charge, already rounded
    pub running_total: Decimal,
}

impl fmt::Display for LedgerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.charge.is_sign_negative() && !self.charge.is_zero() {
            '-'
        } else {
            '+'
        };
        write!(
            f,
            " {} {} = {}",
            sign,
            format_number(self.charge.abs()),
            format_number(self.running_total)
        )
    }
}

/// Result of folding every charge into the base amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningTotal {
    pub base: Decimal,
    pub total: Decimal,
    pub steps: Vec<LedgerStep>,
}

impl RunningTotal {
    /// Steps belonging to one side of the ledger
    pub fn steps_for(&self, side: LedgerSide) -> impl Iterator<Item = &LedgerStep> {
        self.steps.iter().filter(move |s| s.side == side)
    }

    /// Full arithmetic narrative, e.g. `100 - 5 = 95 - 5 = 90 + 20 = 110`
    pub fn narrative(&self) -> String {
        let mut out = format_number(self.base);
        for step in &self.steps {
            out.push_str(&step.to_string());
        }
        out
    }
}

/// Fold the charges into `amount`, debits first, rounding after every step
///
/// A total past the `Decimal` range stays pinned at its bound.
pub fn compute_running_total(
    amount: Decimal,
    debit_charges: &[Decimal],
    credit_charges: &[Decimal],
) -> RunningTotal {
    let sided = debit_charges
        .iter()
        .map(|c| (LedgerSide::Debit, *c))
        .chain(credit_charges.iter().map(|c| (LedgerSide::Credit, *c)));

    let mut total = amount;
    let mut steps = Vec::with_capacity(debit_charges.len() + credit_charges.len());

    for (side, charge) in sided {
        total = round_cents(saturating_add(total, charge));
        steps.push(LedgerStep {
            side,
            charge,
            running_total: total,
        });
    }

    RunningTotal {
        base: amount,
        total,
        steps,
    }
}

/// Running total of a stored record
pub fn record_total(record: &ExpenseRecord) -> RunningTotal {
    compute_running_total(
        record.amount,
        &record.debit_charges,
        &record.credit_charges,
    )
}

/// Exact sum rounded once at the end, for comparison with the per-step total
pub fn final_rounded_total(
    amount: Decimal,
    debit_charges: &[Decimal],
    credit_charges: &[Decimal],
) -> Decimal {
    let sum = debit_charges
        .iter()
        .chain(credit_charges)
        .fold(Decimal::ZERO, |acc, c| saturating_add(acc, *c));
    round_cents(saturating_add(amount, sum))
}

/// Parse a typed magnitude; anything malformed or negative counts as zero
pub fn parse_magnitude(magnitude: &str) -> Decimal {
    let trimmed = magnitude.trim().trim_end_matches('.');
    match trimmed.parse::<Decimal>() {
        Ok(value) if !value.is_sign_negative() => value,
        _ => Decimal::ZERO,
    }
}

/// Append `operator` applied to `magnitude`, returning the stored value
pub fn append_charge(charges: &mut Vec<Decimal>, operator: Operator, magnitude: &str) -> Decimal {
    let charge = operator.apply(parse_magnitude(magnitude));
    charges.push(charge);
    charge
}

/// Remove the charge at `index`; out-of-range indices leave the list untouched
pub fn remove_charge_at(charges: &mut Vec<Decimal>, index: usize) -> Option<Decimal> {
    if index < charges.len() {
        Some(charges.remove(index))
    } else {
        None
    }
}

/// Same category and amount, no charges
pub fn reset_ledger(record: &ExpenseRecord) -> ExpenseRecord {
    ExpenseRecord::new(record.category.clone(), record.amount)
}

/// Carry `current_total` forward as the new base amount, with no charges
pub fn rollover_ledger(record: &ExpenseRecord, current_total: Decimal) -> ExpenseRecord {
    ExpenseRecord::new(record.category.clone(), current_total)
}

/// A confirmed, whole-record change ready to hand to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    Replace(ExpenseId, ExpenseRecord),
    Delete(ExpenseId),
}

impl LedgerCommand {
    pub fn expense_id(&self) -> ExpenseId {
        match self {
            LedgerCommand::Replace(id, _) | LedgerCommand::Delete(id) => *id,
        }
    }
}

/// Ask for the whole expense to be removed
pub fn delete_ledger(expense: &Expense) -> LedgerCommand {
    LedgerCommand::Delete(expense.id)
}
