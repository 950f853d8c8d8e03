//! Demo passcode gate
//!
//! Not a security boundary: a fixed code compared case-insensitively so a
//! demo session is not started by accident.

use crate::{Error, Result};

/// Number of characters in a passcode
pub const PASSCODE_LEN: usize = 8;

/// Outcome of a passcode attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// Waiting for a complete entry
    Pending,
    /// Code accepted
    Unlocked,
    /// Last attempt was wrong; entry has been cleared for retry
    Rejected,
}

/// Passcode gate holding the current entry
#[derive(Debug)]
pub struct PasscodeGate {
    expected: String,
    entry: String,
    state: GateState,
}

impl PasscodeGate {
    /// Create a gate for the expected code
    #[must_use]
    pub fn new(expected: &str) -> Self {
        Self {
            expected: expected.to_ascii_uppercase(),
            entry: String::new(),
            state: GateState::Pending,
        }
    }

    /// Replace the current entry, keeping only alphanumeric characters
    ///
    /// Editing the entry clears a previous rejection.
    pub fn set_entry(&mut self, entry: &str) {
        self.entry = entry
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(PASSCODE_LEN)
            .collect();
        if self.state == GateState::Rejected {
            self.state = GateState::Pending;
        }
    }

    /// Current entry
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Whether all characters have been entered
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entry.len() == PASSCODE_LEN
    }

    /// Current gate state
    #[must_use]
    pub const fn state(&self) -> &GateState {
        &self.state
    }

    /// Submit the current entry
    ///
    /// # Errors
    ///
    /// Returns `Error::Passcode` if the entry is incomplete or wrong; a wrong
    /// entry is cleared so the candidate can retry
    pub fn submit(&mut self) -> Result<()> {
        if !self.is_complete() {
            return Err(Error::Passcode(format!(
                "enter all {PASSCODE_LEN} characters"
            )));
        }

        if self.entry.eq_ignore_ascii_case(&self.expected) {
            tracing::info!("passcode accepted");
            self.state = GateState::Unlocked;
            Ok(())
        } else {
            tracing::debug!("passcode rejected");
            self.state = GateState::Rejected;
            self.entry.clear();
            Err(Error::Passcode("incorrect passcode".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_case_insensitive_match() {
        let mut gate = PasscodeGate::new("AIRA2024");
        gate.set_entry("aira2024");
        assert!(gate.submit().is_ok());
        assert_eq!(gate.state(), &GateState::Unlocked);
    }

    #[test]
    fn rejects_and_clears_wrong_code() {
        let mut gate = PasscodeGate::new("AIRA2024");
        gate.set_entry("AIRA2025");
        assert!(matches!(gate.submit(), Err(Error::Passcode(_))));
        assert_eq!(gate.state(), &GateState::Rejected);
        assert!(gate.entry().is_empty());

        gate.set_entry("A");
        assert_eq!(gate.state(), &GateState::Pending);
    }

    #[test]
    fn incomplete_entry_is_not_submitted() {
        let mut gate = PasscodeGate::new("AIRA2024");
        gate.set_entry("AIRA");
        assert!(gate.submit().is_err());
        assert_eq!(gate.state(), &GateState::Pending);
    }

    #[test]
    fn entry_drops_separators_and_overflow() {
        let mut gate = PasscodeGate::new("AIRA2024");
        gate.set_entry("ai-ra 2024 99");
        assert_eq!(gate.entry(), "aira2024");
        assert!(gate.is_complete());
    }
}
