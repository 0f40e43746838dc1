//! Number kernel error types.

use crate::Sign;

/// Errors raised when converting between number representations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    /// The value does not fit in the requested machine integer type.
    #[error("value does not fit in a {sign} integer of {width} bits")]
    OutOfRange {
        /// Requested bit width.
        width: u32,
        /// Requested signedness.
        sign: Sign,
    },
    /// The string is not a valid integer literal.
    #[error("invalid integer literal: {0:?}")]
    InvalidLiteral(String),
}
