//! Formatting errors.
//!
//! Truncation is not an error: it is reported through the returned logical
//! length. Everything here stops the current call, including any `%r`
//! nesting that is active, and leaves the bytes already written in place.

use thiserror::Error;

/// Invalid argument.
pub const EINVAL: i32 = 22;
/// Value too large for defined data type.
pub const EOVERFLOW: i32 = 75;

/// Marker written after the echoed text of an unrecognized directive.
pub const INVALID_MARKER: &[u8] = b"<invalid>";
/// Marker written in place of a directive whose output cannot be produced.
pub const ERROR_MARKER: &[u8] = b"<error>";

/// A fatal condition that ended a formatting call.
///
/// `offset` is the byte index of the offending `%` within the format string
/// being walked when the error occurred (the nested one, inside `%r`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unrecognized conversion in directive at byte {offset}")]
    InvalidConversion { offset: usize },
    #[error("width or precision overflows the length accounting at byte {offset}")]
    NumericOverflow { offset: usize },
    #[error("argument list exhausted by directive at byte {offset}")]
    MissingArgument { offset: usize },
    #[error("logical output length exceeds i32::MAX")]
    LengthOverflow,
}

impl FormatError {
    /// The C error number a libc-style wrapper would store in `errno`.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::InvalidConversion { .. } | Self::MissingArgument { .. } => EINVAL,
            Self::NumericOverflow { .. } | Self::LengthOverflow => EOVERFLOW,
        }
    }

    /// Byte offset of the directive that failed, if the error belongs to one.
    #[must_use]
    pub const fn offset(self) -> Option<usize> {
        match self {
            Self::InvalidConversion { offset }
            | Self::NumericOverflow { offset }
            | Self::MissingArgument { offset } => Some(offset),
            Self::LengthOverflow => None,
        }
    }
}

/// A float field whose length does not fit in `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("formatted field length exceeds i32::MAX")]
pub struct FieldOverflow;
