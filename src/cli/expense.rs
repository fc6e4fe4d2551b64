//! Expense CLI commands
//!
//! Implements CLI commands for expenses and their charge ledgers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;

use crate::config::Settings;
use crate::display::expense::{
    format_expense_details, format_expense_list, format_session_status, format_snapshot,
};
use crate::error::{TallyError, TallyResult};
use crate::ledger::{Key, LedgerSide, Operator, SessionEvent};
use crate::models::{format_with_symbol, UserId};
use crate::services::ExpenseService;
use crate::storage::Storage;

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// List all expenses with their running totals
    List,

    /// Add a new expense
    Add {
        /// Category name
        category: String,
        /// Starting amount (e.g., "250", "$1,200.50")
        amount: String,
    },

    /// Show an expense with its charges
    Show {
        /// Category name or ID
        expense: String,
    },

    /// Rename an expense or change its starting amount
    Edit {
        /// Category name or ID
        expense: String,
        /// New category name
        #[arg(short, long)]
        category: Option<String>,
        /// New starting amount
        #[arg(short, long)]
        amount: Option<String>,
    },

    /// Add one charge
    Charge {
        /// Category name or ID
        expense: String,
        /// Charge magnitude (e.g., "5", "12.50")
        magnitude: String,
        /// Operator: + or -
        #[arg(short, long, default_value = "-", allow_hyphen_values = true)]
        op: Operator,
        /// Ledger side: debit or credit
        #[arg(short, long)]
        side: Option<LedgerSide>,
    },

    /// Type keys into the charge keypad
    ///
    /// Digits and `.` build the entry, `<` deletes, `~` flips the operator,
    /// `+`/`-` set it, `s` switches side, `=` commits a charge and `c` cancels
    /// every unsaved charge. Committed charges are saved at the end.
    Keys {
        /// Category name or ID
        expense: String,
        /// Keys to press, e.g. "12.5=" "s~20="
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        keys: Vec<String>,
    },

    /// Remove a charge by its number in `show`
    Uncharge {
        /// Category name or ID
        expense: String,
        /// Ledger side: debit or credit
        side: LedgerSide,
        /// Charge number (starting at 1)
        index: usize,
    },

    /// Clear every charge, keeping the starting amount
    Reset {
        /// Category name or ID
        expense: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Make the current total the new starting amount and clear the charges
    Rollover {
        /// Category name or ID
        expense: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete an expense
    Delete {
        /// Category name or ID
        expense: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the expense list every time it changes
    Watch {
        /// Polling interval in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval: u64,
        /// Stop after this many snapshots
        #[arg(long)]
        max_updates: Option<usize>,
    },
}

/// Handle an expense command for `user`
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    user: UserId,
    cmd: ExpenseCommands,
) -> TallyResult<()> {
    let service = ExpenseService::new(storage, user)?;
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        ExpenseCommands::List => {
            let summaries = service.summaries()?;
            print!("{}", format_expense_list(&summaries, symbol));
            if summaries.is_empty() {
                println!();
            }
        }

        ExpenseCommands::Add { category, amount } => {
            let expense = service.create(&category, &amount)?;
            println!("Created expense: {}", expense.record.category);
            println!(
                "  Amount: {}",
                format_with_symbol(expense.record.amount, symbol)
            );
            println!("  ID: {}", expense.id);
        }

        ExpenseCommands::Show { expense } => {
            let expense = service.resolve(&expense)?;
            let total = service.total(expense.id)?;
            print!("{}", format_expense_details(&expense, &total, symbol));
        }

        ExpenseCommands::Edit {
            expense,
            category,
            amount,
        } => {
            let expense = service.resolve(&expense)?;
            if category.is_none() && amount.is_none() {
                println!("No changes specified. Use --category or --amount.");
                return Ok(());
            }

            let updated =
                service.update_details(expense.id, category.as_deref(), amount.as_deref())?;
            println!("Updated expense: {}", updated.record.category);
            println!(
                "  Amount: {}",
                format_with_symbol(updated.record.amount, symbol)
            );
        }

        ExpenseCommands::Charge {
            expense,
            magnitude,
            op,
            side,
        } => {
            let expense = service.resolve(&expense)?;
            let side = side.unwrap_or(settings.default_side);
            let (updated, charge) = service.add_charge(expense.id, side, op, &magnitude)?;
            let total = service.total(updated.id)?;

            println!(
                "Added {} charge {} to {}",
                side,
                format_with_symbol(charge, symbol),
                updated.record.category
            );
            println!("  Total: {}", format_with_symbol(total.total, symbol));
        }

        ExpenseCommands::Keys { expense, keys } => {
            let expense = service.resolve(&expense)?;
            let mut session = service.start_session(expense.id, settings.default_side)?;

            for c in keys.iter().flat_map(|k| k.chars()) {
                if c.is_whitespace() {
                    continue;
                }
                let key = Key::from_char(c)
                    .ok_or_else(|| TallyError::Validation(format!("Unknown key '{}'", c)))?;

                match session.press(key) {
                    SessionEvent::ChargeAdded { side, charge } => println!(
                        "  {} {}  -> {}",
                        side,
                        format_with_symbol(charge, symbol),
                        format_with_symbol(session.running_total().total, symbol)
                    ),
                    SessionEvent::Cancelled => println!("  cancelled"),
                    SessionEvent::Updated => {}
                }
            }

            if !session.keypad().is_clear() {
                println!(
                    "Discarding uncommitted entry: {}",
                    format_session_status(&session, symbol)
                );
            }

            if service.save_session(&mut session)? {
                println!(
                    "Saved {}. Total: {}",
                    expense.record.category,
                    format_with_symbol(session.running_total().total, symbol)
                );
            } else {
                println!("No changes to save.");
            }
        }

        ExpenseCommands::Uncharge {
            expense,
            side,
            index,
        } => {
            let expense = service.resolve(&expense)?;
            if index == 0 {
                return Err(TallyError::Validation(
                    "Charge numbers start at 1".to_string(),
                ));
            }

            match service.remove_charge(expense.id, side, index - 1)? {
                Some(charge) => {
                    let total = service.total(expense.id)?;
                    println!(
                        "Removed {} charge {} from {}",
                        side,
                        format_with_symbol(charge, symbol),
                        expense.record.category
                    );
                    println!("  Total: {}", format_with_symbol(total.total, symbol));
                }
                None => println!("No {} charge #{} on {}.", side, index, expense.record.category),
            }
        }

        ExpenseCommands::Reset { expense, yes } => {
            let expense = service.resolve(&expense)?;
            if !yes
                && !super::confirm(&format!(
                    "Clear every charge on '{}'?",
                    expense.record.category
                ))?
            {
                println!("Aborted.");
                return Ok(());
            }

            let reset = service.reset(expense.id)?;
            println!(
                "Reset {}. Total: {}",
                reset.record.category,
                format_with_symbol(reset.record.amount, symbol)
            );
        }

        ExpenseCommands::Rollover { expense, yes } => {
            let expense = service.resolve(&expense)?;
            if !yes
                && !super::confirm(&format!(
                    "Roll '{}' over to its current total?",
                    expense.record.category
                ))?
            {
                println!("Aborted.");
                return Ok(());
            }

            let rolled = service.rollover(expense.id)?;
            println!(
                "Rolled over {}. New amount: {}",
                rolled.record.category,
                format_with_symbol(rolled.record.amount, symbol)
            );
        }

        ExpenseCommands::Delete { expense, yes } => {
            let expense = service.resolve(&expense)?;
            if !yes
                && !super::confirm(&format!("Delete expense '{}'?", expense.record.category))?
            {
                println!("Aborted.");
                return Ok(());
            }

            let removed = service.delete(expense.id)?;
            println!("Deleted expense: {}", removed.record.category);
        }

        ExpenseCommands::Watch {
            interval,
            max_updates,
        } => watch(&service, symbol, Duration::from_millis(interval), max_updates)?,
    }

    Ok(())
}

/// Print a snapshot on subscribe and after every change until stopped
fn watch(
    service: &ExpenseService<'_>,
    symbol: &str,
    interval: Duration,
    max_updates: Option<usize>,
) -> TallyResult<()> {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    let symbol = symbol.to_string();

    let _subscription = service.subscribe(move |expenses| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("--- update {} ---", n);
        println!("{}", format_snapshot(expenses, &symbol));
    })?;

    loop {
        if max_updates.is_some_and(|max| delivered.load(Ordering::SeqCst) >= max) {
            return Ok(());
        }
        std::thread::sleep(interval);
        service.refresh()?;
    }
}
