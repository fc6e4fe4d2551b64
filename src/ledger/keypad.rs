//! Numeric keypad accumulator
//!
//! Collects an unsigned amount one key at a time. The buffer always holds a
//! displayable number (`"0"` when empty) with at most twelve integer digits
//! and two fractional digits.

use std::fmt;
use std::str::FromStr;

use super::engine::{LedgerSide, Operator};
use crate::models::money::{AMOUNT_INTEGER_DIGITS, CENT_DIGITS};

/// A single keypad press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Decimal,
    Backspace,
    ToggleOperator,
    SetOperator(Operator),
    ToggleSide,
    Equals,
    Cancel,
}

impl Key {
    /// Map a typed character to a key
    ///
    /// Digits, `.`, `<` (backspace), `~` (toggle operator), `+`/`-`,
    /// `s` (toggle side), `=` (commit) and `c` (cancel).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Key::Digit(d as u8)),
            '.' => Some(Key::Decimal),
            '<' => Some(Key::Backspace),
            '~' => Some(Key::ToggleOperator),
            '+' => Some(Key::SetOperator(Operator::Plus)),
            '-' => Some(Key::SetOperator(Operator::Minus)),
            's' | 'S' => Some(Key::ToggleSide),
            '=' => Some(Key::Equals),
            'c' | 'C' => Some(Key::Cancel),
            _ => None,
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::from_char(c).ok_or_else(|| format!("Unknown key '{}'", s)),
            _ => Err(format!("Unknown key '{}'", s)),
        }
    }
}

/// Charge produced by pressing `=`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadCommit {
    pub side: LedgerSide,
    pub operator: Operator,
    pub magnitude: String,
}

/// In-progress amount entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypad {
    buffer: String,
    has_decimal: bool,
    operator: Operator,
    side: LedgerSide,
}

impl Keypad {
    pub fn new(side: LedgerSide) -> Self {
        Self {
            buffer: "0".to_string(),
            has_decimal: false,
            operator: Operator::default(),
            side,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn side(&self) -> LedgerSide {
        self.side
    }

    pub fn has_decimal(&self) -> bool {
        self.has_decimal
    }

    /// True when nothing has been typed since the last reset
    pub fn is_clear(&self) -> bool {
        self.buffer == "0" && !self.has_decimal && self.operator == Operator::default()
    }

    /// Apply a key; returns the charge when the key was `=`
    ///
    /// `Cancel` only clears the entry here; discarding uncommitted charges is
    /// up to the owning session.
    pub fn press(&mut self, key: Key) -> Option<KeypadCommit> {
        match key {
            Key::Digit(d) => self.push_digit(d),
            Key::Decimal => self.push_decimal(),
            Key::Backspace => self.backspace(),
            Key::ToggleOperator => self.operator = self.operator.toggle(),
            Key::SetOperator(op) => self.operator = op,
            Key::ToggleSide => self.side = self.side.toggle(),
            Key::Equals => return Some(self.commit()),
            Key::Cancel => self.clear(),
        }
        None
    }

    fn push_digit(&mut self, digit: u8) {
        if digit > 9 {
            return;
        }
        let c = char::from(b'0' + digit);

        if !self.has_decimal {
            if self.buffer == "0" {
                self.buffer = c.to_string();
            } else if self.buffer.len() < AMOUNT_INTEGER_DIGITS {
                self.buffer.push(c);
            }
            return;
        }

        let fraction_len = self
            .buffer
            .split_once('.')
            .map(|(_, frac)| frac.len())
            .unwrap_or(0);
        if fraction_len < CENT_DIGITS as usize {
            self.buffer.push(c);
        }
    }

    fn push_decimal(&mut self) {
        if !self.has_decimal {
            self.buffer.push('.');
            self.has_decimal = true;
        }
    }

    fn backspace(&mut self) {
        if self.buffer.pop() == Some('.') {
            self.has_decimal = false;
        }
        if self.buffer.is_empty() {
            self.buffer = "0".to_string();
        }
    }

    fn commit(&mut self) -> KeypadCommit {
        let commit = KeypadCommit {
            side: self.side,
            operator: self.operator,
            magnitude: self.buffer.clone(),
        };
        self.clear();
        commit
    }

    /// Reset the buffer and operator; the active side is kept
    pub fn clear(&mut self) {
        self.buffer = "0".to_string();
        self.has_decimal = false;
        self.operator = Operator::default();
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new(LedgerSide::default())
    }
}

impl fmt::Display for Keypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.side, self.operator, self.buffer)
    }
}
