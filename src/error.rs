//! Error types for the book engine.
//!
//! Error handling uses `thiserror` for ergonomic error definitions. Every
//! variant except [`BookError::InvariantViolation`] is recoverable: the
//! offending event is rejected, the book keeps its prior state, and the
//! engine stays usable for the next event.

use thiserror::Error;

use crate::types::Side;

/// Result type alias for book engine operations.
pub type Result<T> = std::result::Result<T, BookError>;

/// Main error type for book engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// Add for an order id that is already resting in the book.
    #[error("duplicate order id: {0}")]
    DuplicateOrder(u64),

    /// Cancel/Modify/Fill referencing an order id not present in the book.
    #[error("unknown order id: {0}")]
    UnknownOrder(u64),

    /// Event sequence number at or behind the last applied sequence.
    /// The event is dropped, never applied.
    #[error("stale event: sequence {sequence} at or behind last applied {last_applied}")]
    StaleEvent { sequence: u64, last_applied: u64 },

    /// A hole in the sequence stream. Under the strict gap policy all
    /// further events are rejected with this kind until a Reset arrives.
    #[error("sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    /// An internal cross-index consistency check failed. This indicates a
    /// bug, not a data anomaly: the engine refuses further mutation until
    /// it is explicitly reset.
    #[error("book integrity violated: {0}")]
    InvariantViolation(String),

    /// Invalid order id on a book-mutating event (zero).
    #[error("invalid order id: {0}")]
    InvalidOrderId(u64),

    /// Invalid price (zero or negative) on an event that carries one.
    #[error("invalid price: {0}")]
    InvalidPrice(i64),

    /// Invalid size for the event's action (e.g. zero-size Add or Fill).
    #[error("invalid size: {0}")]
    InvalidSize(u32),

    /// Side not valid for the event's action (e.g. sideless Add).
    #[error("invalid side {side:?} for action")]
    InvalidSide { side: Side },

    /// Instrument not registered with the multi-instrument manager.
    #[error("instrument not found: {0}")]
    InstrumentNotFound(String),

    /// Attempt to register an instrument symbol twice.
    #[error("instrument already registered: {0}")]
    InstrumentExists(String),
}

impl BookError {
    /// Whether the engine remains usable after this error.
    ///
    /// Everything but an invariant violation is a per-event condition; an
    /// invariant violation poisons the book until the next Reset.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookError::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookError::DuplicateOrder(12345);
        assert_eq!(err.to_string(), "duplicate order id: 12345");

        let err = BookError::SequenceGap {
            expected: 10,
            got: 12,
        };
        assert_eq!(err.to_string(), "sequence gap: expected 10, got 12");
    }

    #[test]
    fn test_recoverability() {
        assert!(BookError::UnknownOrder(1).is_recoverable());
        assert!(BookError::StaleEvent {
            sequence: 1,
            last_applied: 2
        }
        .is_recoverable());
        assert!(!BookError::InvariantViolation("level orphan".into()).is_recoverable());
    }

    #[test]
    fn test_result_type() {
        let result: Result<i32> = Err(BookError::InvalidPrice(-100));
        assert!(result.is_err());
    }
}
