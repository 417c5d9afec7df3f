//! Error types for packing and publishing.
//!
//! Every failure in this crate is recoverable at the call boundary. The
//! variants fall into a handful of kinds (see [`ErrorKind`]):
//!
//! - **Format**: the format specification cannot drive the packer (an
//!   unmatched `]`, or a loop body that never consumes a value)
//! - **Transport**: the transport refused a connect, bind or teardown
//! - **State**: connect/bind attempted while a session is already active
//! - **NotReady**: send attempted while neither connected nor bound
//! - **Unsupported**: the serde bridge met a type it cannot flatten
//!
//! ## Examples
//!
//! ```rust
//! use pubpack::{serialize, ErrorKind, Value};
//!
//! let err = serialize(&[Value::from(1)], "c]").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Format);
//! assert!(err.to_string().contains("unmatched"));
//! ```

use crate::transport::Mode;
use std::fmt;
use thiserror::Error;

/// All errors produced by the packer, the transport and the publisher session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A `]` with no `[` anywhere before it
    #[error("malformed format string: unmatched closing bracket at position {position}")]
    UnmatchedBracket { position: usize },

    /// A `[ ... ]` span that replays without consuming any value
    #[error("malformed format string: loop ending at position {position} consumes no values")]
    EmptyLoop { position: usize },

    /// Failure reported by the transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Connect or bind while a session is already active
    #[error("already connected or bound ({mode} {endpoint})")]
    AlreadyActive { mode: Mode, endpoint: String },

    /// Send while neither connected nor bound
    #[error("not bound or connected")]
    NotReady,

    /// Type the serde bridge cannot flatten into values
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("error: {0}")]
    Custom(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Transport,
    State,
    NotReady,
    Unsupported,
}

impl Error {
    /// Creates a transport error from any displayable cause.
    ///
    /// ```rust
    /// use pubpack::{Error, ErrorKind};
    ///
    /// let err = Error::transport("connection refused");
    /// assert_eq!(err.kind(), ErrorKind::Transport);
    /// ```
    pub fn transport<T: fmt::Display>(msg: T) -> Self {
        Error::Transport(msg.to_string())
    }

    /// Creates an unsupported type error for values the serde bridge rejects.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::UnmatchedBracket { .. } | Error::EmptyLoop { .. } => ErrorKind::Format,
            Error::Transport(_) => ErrorKind::Transport,
            Error::AlreadyActive { .. } => ErrorKind::State,
            Error::NotReady => ErrorKind::NotReady,
            Error::UnsupportedType(_) | Error::Custom(_) => ErrorKind::Unsupported,
        }
    }

    /// Returns `true` for errors caused by the format specification.
    #[inline]
    #[must_use]
    pub const fn is_format(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format)
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::UnmatchedBracket { position: 0 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(Error::EmptyLoop { position: 1 }.kind(), ErrorKind::Format);
        assert_eq!(Error::transport("x").kind(), ErrorKind::Transport);
        assert_eq!(Error::NotReady.kind(), ErrorKind::NotReady);
        assert_eq!(
            Error::AlreadyActive {
                mode: Mode::Bind,
                endpoint: "tcp://*:5555".to_string()
            }
            .kind(),
            ErrorKind::State
        );
        assert_eq!(Error::unsupported_type("map").kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_messages() {
        let err = Error::AlreadyActive {
            mode: Mode::Connect,
            endpoint: "tcp://localhost:5555".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "already connected or bound (connect tcp://localhost:5555)"
        );
        assert!(Error::UnmatchedBracket { position: 3 }
            .to_string()
            .contains("position 3"));
        assert!(Error::EmptyLoop { position: 1 }.is_format());
    }

    #[test]
    fn test_serde_custom() {
        let err = <Error as serde::ser::Error>::custom("bad field");
        assert_eq!(err, Error::Custom("bad field".to_string()));
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
