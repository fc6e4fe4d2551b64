//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod expense;

pub use account::{
    handle_account_command, handle_signin, handle_signout, handle_whoami, AccountCommands,
};
pub use expense::{handle_expense_command, ExpenseCommands};

use std::io::{BufRead, Write};

use crate::config::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::UserId;

/// Pick the user the expense commands act on: `--user`/`TALLY_USER` first,
/// then the signed-in user from settings
pub fn resolve_user(explicit: Option<&str>, settings: &Settings) -> TallyResult<UserId> {
    match explicit {
        Some(raw) => UserId::new(raw).map_err(|e| TallyError::Validation(e.to_string())),
        None => settings.active_user.clone().ok_or(TallyError::NotSignedIn),
    }
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` is a no
pub fn confirm(prompt: &str) -> TallyResult<bool> {
    confirm_with(prompt, &mut std::io::stdin().lock(), &mut std::io::stdout())
}

fn confirm_with(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> TallyResult<bool> {
    write!(output, "{} [y/N]: ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
