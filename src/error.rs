//! Error types for the PDD package.
//!
//! Two failure kinds only (spec §7): an out-of-memory condition raised by
//! node allocation, and invariant violations, which are programmer errors
//! (malformed handles, cross-manager use, precondition violations).
//
// TODO: Implement the `std::error::Error` trait (somehow it is good practice
// to not implement the trait for those kind of 'high-level' errors).
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PddError {
    /// The node pool reached `max_num_nodes` and could not grow further.
    OutOfMemory,
    /// A structural invariant or API precondition was violated.
    InvariantViolation(String),
}

impl fmt::Display for PddError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PddError::OutOfMemory => write!(f, "node pool exhausted (max_num_nodes reached)"),
            PddError::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

/// Raises an [`PddError::InvariantViolation`] carrying a formatted message.
/// Used for programmer-error preconditions (cross-manager handles,
/// `lt_quotient` divisibility, reordering after construction, ...).
macro_rules! invariant {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::error::PddError::InvariantViolation(format!($($msg)*)));
        }
    };
}

pub(crate) use invariant;
