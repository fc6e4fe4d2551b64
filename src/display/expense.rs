//! Expense display formatting
//!
//! Formats expenses for terminal output in table and detail views.

use crate::audit::AuditEntry;
use crate::ledger::{EditSession, LedgerSide, RunningTotal};
use crate::models::money::saturating_add;
use crate::models::{format_with_symbol, Expense};
use crate::services::ExpenseSummary;

/// Format a list of expenses with their running totals as a table
pub fn format_expense_list(summaries: &[ExpenseSummary], symbol: &str) -> String {
    if summaries.is_empty() {
        return "No expenses found.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.expense.record.category.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>12}  {:>7}  {:>12}  {}\n",
        "Category",
        "Amount",
        "Charges",
        "Total",
        "ID",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->12}  {:->7}  {:->12}  {:-<12}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for summary in summaries {
        let record = &summary.expense.record;
        output.push_str(&format!(
            "{:<name_width$}  {:>12}  {:>7}  {:>12}  {}\n",
            record.category,
            format_with_symbol(record.amount, symbol),
            record.charge_count(),
            format_with_symbol(summary.total.total, symbol),
            summary.expense.id,
            name_width = name_width,
        ));
    }

    let grand_total = summaries
        .iter()
        .fold(rust_decimal::Decimal::ZERO, |acc, s| saturating_add(acc, s.total.total));
    output.push_str(&format!(
        "{:-<name_width$}  {:->12}  {:->7}  {:->12}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:<name_width$}  {:>12}  {:>7}  {:>12}\n",
        "TOTAL",
        "",
        "",
        format_with_symbol(grand_total, symbol),
        name_width = name_width,
    ));

    output
}

/// Format one expense with both charge ledgers
///
/// Charges are numbered from 1 so the numbers can be passed to `uncharge`.
pub fn format_expense_details(expense: &Expense, total: &RunningTotal, symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Expense: {}\n", expense.record.category));
    output.push_str(&format!("  ID:      {}\n", expense.id));
    output.push_str(&format!(
        "  Amount:  {}\n",
        format_with_symbol(expense.record.amount, symbol)
    ));

    for side in [LedgerSide::Debit, LedgerSide::Credit] {
        output.push('\n');
        output.push_str(&format_side(total, side, symbol));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Total:   {}\n",
        format_with_symbol(total.total, symbol)
    ));
    output.push_str(&format!("  {}\n", total.narrative()));

    output
}

fn format_side(total: &RunningTotal, side: LedgerSide, symbol: &str) -> String {
    let title = match side {
        LedgerSide::Debit => "Debits",
        LedgerSide::Credit => "Credits",
    };

    let steps: Vec<_> = total.steps_for(side).collect();
    if steps.is_empty() {
        return format!("  {}: none\n", title);
    }

    let mut output = format!("  {}:\n", title);
    for (i, step) in steps.iter().enumerate() {
        output.push_str(&format!(
            "    {:>3}. {:>12}  -> {:>12}\n",
            i + 1,
            format_with_symbol(step.charge, symbol),
            format_with_symbol(step.running_total, symbol),
        ));
    }
    output
}

/// One-line view of a keypad session: side, typed entry and pending total
pub fn format_session_status(session: &EditSession, symbol: &str) -> String {
    let total = session.running_total();
    let unsaved = if session.is_dirty() { " (unsaved)" } else { "" };
    format!(
        "{}  total {}{}",
        session.keypad(),
        format_with_symbol(total.total, symbol),
        unsaved
    )
}

/// Compact view used by `watch`, one line per expense
pub fn format_snapshot(expenses: &[Expense], symbol: &str) -> String {
    if expenses.is_empty() {
        return "No expenses found.".to_string();
    }

    expenses
        .iter()
        .map(|e| {
            let total = crate::ledger::record_total(&e.record);
            format!("{}: {}", e.record.category, format_with_symbol(total.total, symbol))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format audit entries, oldest first
pub fn format_audit_entries(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries.".to_string();
    }

    entries
        .iter()
        .map(AuditEntry::format_human_readable)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{record_total, Key};
    use crate::models::{ExpenseId, ExpenseRecord};
    use rust_decimal_macros::dec;

    fn food() -> Expense {
        let mut record = ExpenseRecord::new("Food", dec!(100));
        record.debit_charges = vec![dec!(-5), dec!(-5)];
        record.credit_charges = vec![dec!(20)];
        Expense::new(ExpenseId::new(), record)
    }

    fn summary(expense: Expense) -> ExpenseSummary {
        ExpenseSummary {
            total: record_total(&expense.record),
            expense,
        }
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_expense_list(&[], "$"), "No expenses found.");
    }

    #[test]
    fn test_list_shows_totals() {
        let mut rent = ExpenseRecord::new("Rent", dec!(1200));
        rent.debit_charges = vec![dec!(-0.5)];
        let summaries = vec![
            summary(food()),
            summary(Expense::new(ExpenseId::new(), rent)),
        ];

        let output = format_expense_list(&summaries, "$");
        assert!(output.contains("Food"));
        assert!(output.contains("$110"));
        assert!(output.contains("$1199.5"));
        assert!(output.contains("$1309.5"));
        assert!(output.contains("TOTAL"));
    }

    #[test]
    fn test_list_total_saturates() {
        let huge = || {
            Expense::new(
                ExpenseId::new(),
                ExpenseRecord::new("Huge", rust_decimal::Decimal::MAX),
            )
        };
        let output = format_expense_list(&[summary(huge()), summary(huge())], "$");
        assert!(output.contains(&rust_decimal::Decimal::MAX.to_string()));
    }

    #[test]
    fn test_details_number_charges_per_side() {
        let expense = food();
        let total = record_total(&expense.record);
        let output = format_expense_details(&expense, &total, "$");

        assert!(output.contains("Expense: Food"));
        assert!(output.contains("Debits:"));
        assert!(output.contains("  1. "));
        assert!(output.contains("  2. "));
        assert!(output.contains("Credits:"));
        assert!(output.contains("100 - 5 = 95 - 5 = 90 + 20 = 110"));
    }

    #[test]
    fn test_details_without_charges() {
        let expense = Expense::new(ExpenseId::new(), ExpenseRecord::new("Gym", dec!(30)));
        let total = record_total(&expense.record);
        let output = format_expense_details(&expense, &total, "$");

        assert!(output.contains("Debits: none"));
        assert!(output.contains("Credits: none"));
    }

    #[test]
    fn test_session_status_marks_unsaved() {
        let mut session = EditSession::new(&food(), LedgerSide::Debit);
        assert!(!format_session_status(&session, "$").contains("unsaved"));

        session.press(Key::Digit(4));
        session.press(Key::Equals);
        let status = format_session_status(&session, "$");
        assert!(status.contains("unsaved"));
        assert!(status.contains("$106"));
    }

    #[test]
    fn test_snapshot_lines() {
        let output = format_snapshot(&[food()], "$");
        assert_eq!(output, "Food: $110");
    }
}
