//! Expense service
//!
//! Validation, ledger operations and persistence for one user's expenses.
//! The user and the storage handle are passed in explicitly; nothing here
//! reads ambient sign-in state.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::ledger::{
    delete_ledger, record_total, reset_ledger, rollover_ledger, EditSession, Key, LedgerCommand,
    LedgerSide, Operator, RunningTotal,
};
use crate::models::expense::{validate_amount, validate_category};
use crate::models::{Expense, ExpenseId, ExpenseRecord, UserId};
use crate::storage::{ExpenseRepository, Storage, Subscription};

/// An expense with its computed running total
#[derive(Debug, Clone)]
pub struct ExpenseSummary {
    pub expense: Expense,
    pub total: RunningTotal,
}

/// Service for expense management
pub struct ExpenseService<'a> {
    storage: &'a Storage,
    user: UserId,
    expenses: Arc<ExpenseRepository>,
}

impl<'a> ExpenseService<'a> {
    /// Open `user`'s expense collection
    ///
    /// Services for the same user on one `Storage` share the collection.
    pub fn new(storage: &'a Storage, user: UserId) -> TallyResult<Self> {
        let expenses = storage.expenses(&user)?;
        Ok(Self {
            storage,
            user,
            expenses,
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Create a new expense from raw user input
    ///
    /// Nothing is written when the category is empty or the amount malformed.
    pub fn create(&self, category: &str, amount: &str) -> TallyResult<Expense> {
        let record = ExpenseRecord::from_input(category, amount)
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let expense = self.expenses.add(record).map_err(|e| {
            tracing::error!(user = %self.user, error = %e, "failed to add expense");
            e
        })?;

        self.storage.log_create(
            &self.user,
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.record.category.clone()),
            &expense.record,
            "add",
        )?;
        tracing::info!(user = %self.user, expense = %expense.id, "expense created");

        Ok(expense)
    }

    /// All expenses
    pub fn list(&self) -> TallyResult<Vec<Expense>> {
        self.expenses.list()
    }

    /// All expenses with their running totals
    pub fn summaries(&self) -> TallyResult<Vec<ExpenseSummary>> {
        Ok(self
            .expenses
            .list()?
            .into_iter()
            .map(|expense| ExpenseSummary {
                total: record_total(&expense.record),
                expense,
            })
            .collect())
    }

    /// Get an expense by ID
    pub fn get(&self, id: ExpenseId) -> TallyResult<Expense> {
        self.expenses
            .get(id)?
            .ok_or_else(|| TallyError::expense_not_found(id.to_string()))
    }

    /// Find an expense by category or ID string
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Expense>> {
        if let Some(expense) = self.expenses.get_by_category(identifier)? {
            return Ok(Some(expense));
        }

        if let Ok(id) = identifier.parse::<ExpenseId>() {
            return self.expenses.get(id);
        }

        // Short display form: "exp-1a2b3c4d"
        let short = identifier.strip_prefix("exp-").unwrap_or(identifier);
        if short.len() >= 4 {
            let matches: Vec<_> = self
                .expenses
                .list()?
                .into_iter()
                .filter(|e| e.id.as_uuid().to_string().starts_with(short))
                .collect();
            if matches.len() == 1 {
                return Ok(matches.into_iter().next());
            }
        }

        Ok(None)
    }

    /// Like `find`, but missing expenses are an error
    pub fn resolve(&self, identifier: &str) -> TallyResult<Expense> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::expense_not_found(identifier))
    }

    /// Running total of an expense
    pub fn total(&self, id: ExpenseId) -> TallyResult<RunningTotal> {
        Ok(record_total(&self.get(id)?.record))
    }

    /// Rename the category and/or change the base amount
    pub fn update_details(
        &self,
        id: ExpenseId,
        category: Option<&str>,
        amount: Option<&str>,
    ) -> TallyResult<Expense> {
        let expense = self.get(id)?;
        let mut record = expense.record.clone();

        if let Some(category) = category {
            record.category =
                validate_category(category).map_err(|e| TallyError::Validation(e.to_string()))?;
        }
        if let Some(amount) = amount {
            record.amount =
                validate_amount(amount).map_err(|e| TallyError::Validation(e.to_string()))?;
        }

        self.replace(&expense, record, "edit")
    }

    /// Append a charge typed as `magnitude` with `operator` to one side
    ///
    /// The magnitude must match the money pattern; it is then typed through
    /// the keypad, so at most two decimal places are kept.
    pub fn add_charge(
        &self,
        id: ExpenseId,
        side: LedgerSide,
        operator: Operator,
        magnitude: &str,
    ) -> TallyResult<(Expense, Decimal)> {
        let value = validate_amount(magnitude).map_err(|e| TallyError::Validation(e.to_string()))?;

        let mut session = self.start_session(id, side)?;
        session.press(Key::SetOperator(operator));
        for key in value.to_string().chars().filter_map(Key::from_char) {
            session.press(key);
        }
        session.press(Key::Equals);

        let charge = session
            .pending()
            .charges(side)
            .last()
            .copied()
            .unwrap_or_default();
        self.save_session(&mut session)?;

        Ok((self.get(id)?, charge))
    }

    /// Remove the charge at `index` on `side`
    ///
    /// An out-of-range index is ignored and reported as `None`.
    pub fn remove_charge(
        &self,
        id: ExpenseId,
        side: LedgerSide,
        index: usize,
    ) -> TallyResult<Option<Decimal>> {
        let mut session = self.start_session(id, side)?;
        let removed = session.remove_charge(side, index);
        if removed.is_none() {
            tracing::warn!(user = %self.user, expense = %id, %side, index, "no charge at index");
            return Ok(None);
        }

        self.save_session(&mut session)?;
        Ok(removed)
    }

    /// Clear both charge lists, keeping category and amount
    pub fn reset(&self, id: ExpenseId) -> TallyResult<Expense> {
        let expense = self.get(id)?;
        let command = LedgerCommand::Replace(id, reset_ledger(&expense.record));
        self.apply(&expense, command, "reset")?
            .ok_or_else(|| TallyError::expense_not_found(id.to_string()))
    }

    /// Carry the current total into the base amount and clear the charges
    pub fn rollover(&self, id: ExpenseId) -> TallyResult<Expense> {
        let expense = self.get(id)?;
        let total = record_total(&expense.record).total;
        let command = LedgerCommand::Replace(id, rollover_ledger(&expense.record, total));
        self.apply(&expense, command, "rollover")?
            .ok_or_else(|| TallyError::expense_not_found(id.to_string()))
    }

    /// Delete the whole expense, returning what was removed
    pub fn delete(&self, id: ExpenseId) -> TallyResult<Expense> {
        let expense = self.get(id)?;
        self.apply(&expense, delete_ledger(&expense), "delete")?;
        Ok(expense)
    }

    /// Begin a keypad session on the persisted state of an expense
    pub fn start_session(&self, id: ExpenseId, side: LedgerSide) -> TallyResult<EditSession> {
        Ok(EditSession::new(&self.get(id)?, side))
    }

    /// Persist a session's pending charges
    ///
    /// Returns `false` if there was nothing to save. When the store write
    /// fails the session is rolled back to its last persisted snapshot.
    pub fn save_session(&self, session: &mut EditSession) -> TallyResult<bool> {
        if !session.is_dirty() {
            return Ok(false);
        }

        let id = session.expense_id();
        let before = self.get(id)?;

        if let Err(e) = self.expenses.set(id, session.pending().clone()) {
            tracing::error!(user = %self.user, expense = %id, error = %e, "failed to save charges, rolling back");
            session.rollback();
            return Err(e);
        }
        session.mark_persisted();

        self.storage.log_update(
            &self.user,
            EntityType::Expense,
            id.to_string(),
            Some(before.record.category.clone()),
            &before.record,
            session.snapshot(),
            "charges",
        )?;
        tracing::info!(user = %self.user, expense = %id, "charges saved");

        Ok(true)
    }

    /// Watch the collection; `observer` gets the full list on every change
    pub fn subscribe<F>(&self, observer: F) -> TallyResult<Subscription>
    where
        F: Fn(&[Expense]) + Send + Sync + 'static,
    {
        self.expenses.subscribe(observer)
    }

    /// Pick up writes made by other processes, notifying subscribers
    pub fn refresh(&self) -> TallyResult<bool> {
        self.expenses.reload()
    }

    fn replace(&self, before: &Expense, record: ExpenseRecord, action: &str) -> TallyResult<Expense> {
        self.apply(before, LedgerCommand::Replace(before.id, record), action)?
            .ok_or_else(|| TallyError::expense_not_found(before.id.to_string()))
    }

    /// Commit a confirmed ledger command and audit it
    fn apply(
        &self,
        before: &Expense,
        command: LedgerCommand,
        action: &str,
    ) -> TallyResult<Option<Expense>> {
        let id = command.expense_id();
        let name = Some(before.record.category.clone());

        match command {
            LedgerCommand::Replace(_, record) => {
                self.expenses.set(id, record.clone()).map_err(|e| {
                    tracing::error!(user = %self.user, expense = %id, action, error = %e, "store write failed");
                    e
                })?;
                self.storage.log_update(
                    &self.user,
                    EntityType::Expense,
                    id.to_string(),
                    name,
                    &before.record,
                    &record,
                    action,
                )?;
                tracing::info!(user = %self.user, expense = %id, action, "expense updated");
                Ok(Some(Expense::new(id, record)))
            }
            LedgerCommand::Delete(_) => {
                self.expenses.delete(id).map_err(|e| {
                    tracing::error!(user = %self.user, expense = %id, error = %e, "store delete failed");
                    e
                })?;
                self.storage.log_delete(
                    &self.user,
                    EntityType::Expense,
                    id.to_string(),
                    name,
                    &before.record,
                    action,
                )?;
                tracing::info!(user = %self.user, expense = %id, "expense deleted");
                Ok(None)
            }
        }
    }
}
