//! Error types shared by the engine and its collaborators.

use thiserror::Error;

use crate::config::ConfigError;
use crate::utility::types::Timeslot;

/// Failure reported by an accounting ledger when posting a charge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The ledger refused the transaction.
    #[error("ledger rejected {kind} transaction for broker {broker}: {reason}")]
    Rejected {
        /// Transaction kind (`"capacity"` or `"distribution"`).
        kind: &'static str,
        /// Broker the charge was addressed to.
        broker: String,
        /// Ledger-supplied reason.
        reason: String,
    },
}

/// Failure of an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration failed validation at initialization.
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ConfigError>),
    /// `activate` was called with a timeslot that does not advance time.
    #[error("timeslot {got} is not after the last activated timeslot {last}")]
    OutOfOrder {
        /// Last timeslot the engine processed.
        last: Timeslot,
        /// Rejected timeslot.
        got: Timeslot,
    },
    /// The ledger refused a charge.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<Vec<ConfigError>> for EngineError {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
