//! Configuration for packing and publishing.
//!
//! - [`PackOptions`]: the format specification plus the output buffer
//!   capacity hint
//! - [`SessionArgs`]: load-time arguments of a publisher (endpoint, format,
//!   connect or bind)
//!
//! ## Examples
//!
//! ```rust
//! use pubpack::{serialize_with_options, values, PackOptions};
//!
//! let options = PackOptions::new().with_format("[C]").with_capacity(16);
//! let packed = serialize_with_options(&values![1, 2, 3], &options).unwrap();
//! assert_eq!(packed.bytes(), &[1, 2, 3]);
//! ```
//!
//! Options also load from any serde format; missing fields take defaults:
//!
//! ```rust
//! use pubpack::PackOptions;
//!
//! let options: PackOptions = serde_json::from_str(r#"{ "format": "[cf]" }"#).unwrap();
//! assert_eq!(options.format.as_str(), "[cf]");
//! assert_eq!(options.capacity, 65536);
//! ```

use crate::format::Format;
use crate::transport::Mode;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Default capacity hint for the output buffer.
pub const DEFAULT_CAPACITY: usize = 65536;

/// Configuration options for the packer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackOptions {
    pub format: Format,
    /// Bytes reserved up front. The buffer still grows past this.
    pub capacity: usize,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            format: Format::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PackOptions {
    /// Creates default options (format `"[t]"`, 65536-byte capacity).
    ///
    /// ```rust
    /// use pubpack::PackOptions;
    ///
    /// let options = PackOptions::new();
    /// assert_eq!(options.format.as_str(), "[t]");
    /// assert_eq!(options.capacity, 65536);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the format specification.
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Format::new(format);
        self
    }

    /// Sets the output buffer capacity hint.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Arguments a publisher receives when it is loaded.
///
/// Positional and symbol-only: the first is the endpoint, the second the
/// format, the third selects the mode (`"connect"` connects, anything else
/// binds). Non-symbol arguments are ignored.
///
/// ```rust
/// use pubpack::{values, Mode, SessionArgs};
///
/// let args = SessionArgs::from_values(&values!["tcp://localhost:5555", "[cf]", "connect"]);
/// assert_eq!(args.endpoint.as_deref(), Some("tcp://localhost:5555"));
/// assert_eq!(args.format.as_deref(), Some("[cf]"));
/// assert_eq!(args.mode, Mode::Connect);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionArgs {
    pub endpoint: Option<String>,
    pub format: Option<String>,
    pub mode: Mode,
}

impl SessionArgs {
    pub fn from_values(args: &[Value]) -> Self {
        let symbol_at = |index: usize| {
            args.get(index)
                .and_then(Value::as_symbol)
                .map(str::to_string)
        };

        let mode = match symbol_at(2).as_deref() {
            Some("connect") => Mode::Connect,
            _ => Mode::Bind,
        };

        SessionArgs {
            endpoint: symbol_at(0),
            format: symbol_at(1),
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    #[test]
    fn test_builder() {
        let options = PackOptions::new().with_format("cft").with_capacity(8);
        assert_eq!(options.format, Format::new("cft"));
        assert_eq!(options.capacity, 8);
    }

    #[test]
    fn test_options_from_json() {
        let options: PackOptions = serde_json::from_str(r#"{ "capacity": 128 }"#).unwrap();
        assert_eq!(options.format.as_str(), "[t]");
        assert_eq!(options.capacity, 128);

        let json = serde_json::to_string(&PackOptions::new()).unwrap();
        assert_eq!(json, r#"{"format":"[t]","capacity":65536}"#);
    }

    #[test]
    fn test_session_args_defaults_to_bind() {
        let args = SessionArgs::from_values(&values!["tcp://*:5555"]);
        assert_eq!(args.endpoint.as_deref(), Some("tcp://*:5555"));
        assert_eq!(args.format, None);
        assert_eq!(args.mode, Mode::Bind);

        let args = SessionArgs::from_values(&values!["tcp://*:5555", "[c]", "bind"]);
        assert_eq!(args.mode, Mode::Bind);
    }

    #[test]
    fn test_session_args_ignore_non_symbols() {
        let args = SessionArgs::from_values(&values![5555, 1.5, "connect"]);
        assert_eq!(args.endpoint, None);
        assert_eq!(args.format, None);
        assert_eq!(args.mode, Mode::Connect);
        assert_eq!(SessionArgs::from_values(&[]), SessionArgs::default());
    }

    #[test]
    fn test_session_args_from_json() {
        let args: SessionArgs =
            serde_json::from_str(r#"{ "endpoint": "inproc://a", "mode": "connect" }"#).unwrap();
        assert_eq!(args.mode, Mode::Connect);
        assert_eq!(args.format, None);
    }
}
