//! Error implementations

use serde::{de, ser};

/// Result alias used by every fallible operation in this library
pub type ScResult<T> = Result<T, Error>;

/// Custom error object for this library.
///
/// Every variant is a contract violation on malformed input or misuse.
/// Nothing here is retried or coerced; the current encode/decode is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The decoder ran out of bytes.
    Underflow { wanted: usize, remaining: usize },

    /// Bytes were left over after a complete decode.
    TrailingData(usize),

    /// A varint needs more bits than the requested width,
    /// or a decoded value does not fit the target type.
    Overflow { bits: u32 },

    /// A fixed-size type received the wrong number of bytes.
    InvalidLength {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The bytes or text do not describe a valid value of the type.
    InvalidValue(String),

    DivideByZero,

    /// Big integer subtraction would go negative.
    SubtractionUnderflow,

    /// Array access at or beyond the current length.
    Index { index: u32, length: u32 },

    /// The proxy is not attached to a key/value store.
    Disconnected,

    /// The serde shape cannot be carried by the wire format.
    Unsupported(&'static str),

    /// The host refused or failed a call.
    Host(String),

    /// Message raised through [serde::ser::Error] or [serde::de::Error].
    Custom(String),
}

impl std::error::Error for Error {}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Underflow { wanted, remaining } => write!(
                f,
                "insufficient bytes: wanted {}, {} remaining",
                wanted, remaining
            ),
            Error::TrailingData(count) => write!(f, "extra bytes: {} left unconsumed", count),
            Error::Overflow { bits } => {
                write!(f, "integer representation too long for {} bits", bits)
            }
            Error::InvalidLength {
                type_name,
                expected,
                actual,
            } => write!(
                f,
                "invalid {} length: expected {} bytes, got {}",
                type_name, expected, actual
            ),
            Error::InvalidValue(msg) => write!(f, "invalid value: {}", msg),
            Error::DivideByZero => write!(f, "divide by zero"),
            Error::SubtractionUnderflow => write!(f, "subtraction underflow"),
            Error::Index { index, length } if index == length => {
                write!(f, "invalid index {}: use append", index)
            }
            Error::Index { index, length } => {
                write!(f, "invalid index {}: length is {}", index, length)
            }
            Error::Disconnected => write!(f, "proxy is not connected to a store"),
            Error::Unsupported(what) => write!(f, "{} is not supported by the wire format", what),
            Error::Host(msg) => write!(f, "host error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_mentions_append() {
        let at_end = Error::Index {
            index: 3,
            length: 3,
        };
        assert!(at_end.to_string().contains("append"));

        let past_end = Error::Index {
            index: 7,
            length: 3,
        };
        assert!(!past_end.to_string().contains("append"));
    }
}
