//! Ledger engine
//!
//! Pure computations over an expense's charge lists, the keypad used to
//! enter new charges, and the edit session tying the two together. Nothing
//! here touches storage.

pub mod engine;
pub mod keypad;
pub mod session;

pub use engine::{
    append_charge, compute_running_total, delete_ledger, final_rounded_total, parse_magnitude,
    record_total, remove_charge_at, reset_ledger, rollover_ledger, LedgerCommand, LedgerSide,
    LedgerStep, Operator, RunningTotal,
};
pub use keypad::{Key, Keypad, KeypadCommit};
pub use session::{EditSession, SessionEvent, SessionState};
