//! Error types shared by the decimal, extractor, and event subsystems.

use thiserror::Error;

/// Convenience alias for fallible operations in this crate.
pub type IonResult<T> = Result<T, IonError>;

/// Error variants surfaced by the core engines.
///
/// Errors propagate immediately to the caller; there is no background
/// recovery and no retry. The decimal engine restores any context status
/// bits it borrowed before returning, on both success and failure paths.
#[derive(Debug, Error)]
pub enum IonError {
    /// A required argument was missing, out of range, or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArg(&'static str),
    /// The operation is not legal in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    /// An allocation or capacity limit was exceeded.
    #[error("Out of capacity: {0}")]
    NoMemory(&'static str),
    /// A decimal lexeme or operation exceeded the representable precision.
    #[error("Numeric overflow")]
    NumericOverflow,
    /// The reader produced a type tag outside the defined set.
    #[error("Unknown type tag")]
    Unknown,
}

impl IonError {
    /// Return `true` if this error signals precision loss.
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::NumericOverflow)
    }
}

impl PartialEq for IonError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidArg(_), Self::InvalidArg(_)) => true,
            (Self::InvalidState(_), Self::InvalidState(_)) => true,
            (Self::NoMemory(_), Self::NoMemory(_)) => true,
            (Self::NumericOverflow, Self::NumericOverflow) => true,
            (Self::Unknown, Self::Unknown) => true,
            _ => false,
        }
    }
}

impl Eq for IonError {}
