//! Expense edit session
//!
//! Tracks keypad entry against one expense. Committed charges accumulate in a
//! pending copy of the record until the caller persists them; cancelling or a
//! failed save puts the pending copy back to the last persisted snapshot.

use rust_decimal::Decimal;

use super::engine::{append_charge, record_total, remove_charge_at, LedgerSide, RunningTotal};
use super::keypad::{Key, Keypad};
use crate::models::{Expense, ExpenseId, ExpenseRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing typed since the last commit, save or cancel
    Idle,
    /// Keypad has input that has not been committed yet; earlier commits
    /// may still be unsaved
    Editing,
    /// At least one charge was appended or removed and is not yet saved
    Committed,
}

/// What a key press did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Updated,
    ChargeAdded { side: LedgerSide, charge: Decimal },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    expense_id: ExpenseId,
    snapshot: ExpenseRecord,
    pending: ExpenseRecord,
    keypad: Keypad,
    state: SessionState,
}

impl EditSession {
    /// Start editing the persisted state of `expense`
    pub fn new(expense: &Expense, side: LedgerSide) -> Self {
        Self {
            expense_id: expense.id,
            snapshot: expense.record.clone(),
            pending: expense.record.clone(),
            keypad: Keypad::new(side),
            state: SessionState::Idle,
        }
    }

    pub fn expense_id(&self) -> ExpenseId {
        self.expense_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Last record known to be persisted
    pub fn snapshot(&self) -> &ExpenseRecord {
        &self.snapshot
    }

    /// Record including uncommitted-to-store charges
    pub fn pending(&self) -> &ExpenseRecord {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        self.pending != self.snapshot
    }

    pub fn running_total(&self) -> RunningTotal {
        record_total(&self.pending)
    }

    pub fn press(&mut self, key: Key) -> SessionEvent {
        if key == Key::Cancel {
            self.cancel();
            return SessionEvent::Cancelled;
        }

        match self.keypad.press(key) {
            Some(commit) => {
                let charges = self.pending.charges_mut(commit.side);
                let charge = append_charge(charges, commit.operator, &commit.magnitude);
                self.state = SessionState::Committed;
                SessionEvent::ChargeAdded {
                    side: commit.side,
                    charge,
                }
            }
            None => {
                self.state = SessionState::Editing;
                SessionEvent::Updated
            }
        }
    }

    /// Remove a pending charge; returns `None` when `index` is out of range
    pub fn remove_charge(&mut self, side: LedgerSide, index: usize) -> Option<Decimal> {
        let removed = remove_charge_at(self.pending.charges_mut(side), index);
        if removed.is_some() {
            self.state = SessionState::Committed;
        }
        removed
    }

    /// Drop the keypad entry and every unsaved charge
    pub fn cancel(&mut self) {
        self.rollback();
    }

    /// Restore the last persisted snapshot
    pub fn rollback(&mut self) {
        self.pending = self.snapshot.clone();
        self.keypad.clear();
        self.state = SessionState::Idle;
    }

    /// Record that `pending` reached the store
    pub fn mark_persisted(&mut self) {
        self.snapshot = self.pending.clone();
        self.keypad.clear();
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session() -> EditSession {
        let mut record = ExpenseRecord::new("Food", dec!(100));
        record.debit_charges.push(dec!(-5));
        EditSession::new(&Expense::new(ExpenseId::new(), record), LedgerSide::Debit)
    }

    fn press_all(session: &mut EditSession, keys: &str) -> Vec<SessionEvent> {
        keys.chars()
            .filter_map(Key::from_char)
            .map(|k| session.press(k))
            .collect()
    }

    #[test]
    fn test_state_transitions() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);

        press_all(&mut s, "5");
        assert_eq!(s.state(), SessionState::Editing);

        press_all(&mut s, "=");
        assert_eq!(s.state(), SessionState::Committed);
        assert_eq!(s.pending().debit_charges, vec![dec!(-5), dec!(-5)]);

        s.mark_persisted();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_typing_after_commit_returns_to_editing() {
        let mut s = session();
        press_all(&mut s, "5=");
        assert_eq!(s.state(), SessionState::Committed);

        press_all(&mut s, "3");
        assert_eq!(s.state(), SessionState::Editing);
        assert!(s.is_dirty());

        press_all(&mut s, "=");
        assert_eq!(s.state(), SessionState::Committed);
        assert_eq!(s.pending().debit_charges, vec![dec!(-5), dec!(-5), dec!(-3)]);
    }

    #[test]
    fn test_commit_reports_charge() {
        let mut s = session();
        let events = press_all(&mut s, "s+20=");
        assert_eq!(
            events.last(),
            Some(&SessionEvent::ChargeAdded {
                side: LedgerSide::Credit,
                charge: dec!(20),
            })
        );
        assert_eq!(s.running_total().total, dec!(115));
    }

    #[test]
    fn test_cancel_restores_snapshot() {
        let mut s = session();
        press_all(&mut s, "5=3=1.2");
        assert!(s.is_dirty());

        assert_eq!(s.press(Key::Cancel), SessionEvent::Cancelled);
        assert_eq!(s.pending(), s.snapshot());
        assert_eq!(s.keypad().buffer(), "0");
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_rollback_after_partial_save() {
        let mut s = session();
        press_all(&mut s, "1=");
        s.mark_persisted();
        press_all(&mut s, "2=");

        s.rollback();
        assert_eq!(s.pending().debit_charges, vec![dec!(-5), dec!(-1)]);
    }

    #[test]
    fn test_remove_charge_in_session() {
        let mut s = session();
        assert_eq!(s.remove_charge(LedgerSide::Debit, 3), None);
        assert_eq!(s.state(), SessionState::Idle);

        assert_eq!(s.remove_charge(LedgerSide::Debit, 0), Some(dec!(-5)));
        assert_eq!(s.state(), SessionState::Committed);
        assert_eq!(s.running_total().total, dec!(100));
    }
}
