//! # pubpack
//!
//! Format-string driven binary packing of typed value lists, for sending as
//! one opaque message over a publish/subscribe transport.
//!
//! ## What does it do?
//!
//! Given an ordered list of [`Value`]s (integers, floats or symbols) and a
//! compact format specification such as `"[cf]"`, the packer produces one
//! contiguous byte buffer: each format token consumes a value and appends its
//! fixed-width (or NUL-terminated text) encoding. A `[ ... ]` span repeats
//! until the values run out.
//!
//! ## Key Features
//!
//! - **Tiny grammar**: fifteen single-character tokens, see [`format`]
//! - **Native byte order**: numbers are written exactly as the host stores them
//! - **Permissive**: unknown format characters are ignored
//! - **Serde bridge**: pack any `T: Serialize` through [`to_bytes`]
//! - **Publisher sessions**: [`Publisher`] pairs the packer with a transport
//!   and reports status, errors and sent byte counts as events
//!
//! ## Quick Start
//!
//! ```rust
//! use pubpack::{serialize, values};
//!
//! let bytes = serialize(&values![1, 2.5, "hi"], "cft").unwrap();
//!
//! let mut expected = vec![0x01];
//! expected.extend_from_slice(&2.5f32.to_ne_bytes());
//! expected.extend_from_slice(b"hi\0");
//! assert_eq!(bytes, expected);
//! ```
//!
//! ### Repeating Spans
//!
//! ```rust
//! use pubpack::{serialize, values};
//!
//! let bytes = serialize(&values![1, 2, 3, 4], "[c]").unwrap();
//! assert_eq!(bytes, vec![1, 2, 3, 4]);
//! ```
//!
//! ### Publishing
//!
//! ```rust
//! use pubpack::{values, Context, Publisher};
//!
//! let ctx = Context::new();
//! let sub = ctx.subscribe("tcp://localhost:5555").unwrap();
//!
//! let mut publisher = Publisher::with_context(&ctx);
//! publisher.load(&values!["tcp://*:5555", "[S]"]).unwrap();
//! publisher.send(&values![258]).unwrap();
//!
//! assert_eq!(sub.try_recv(), Some(258u16.to_ne_bytes().to_vec()));
//! ```
//!
//! ## Portability
//!
//! Output is in the host's native byte order; a receiver on a machine with
//! different endianness must swap bytes itself.
//!
//! ## Demos
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - packing value lists with a few formats
//! - **`publish.rs`** - a bound publisher feeding a subscriber
//!
//! Run any demo with: `cargo run --example <name>`

pub mod convert;
pub mod error;
pub mod format;
pub mod macros;
pub mod options;
pub mod publisher;
pub mod ser;
pub mod transport;
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use format::{Format, FormatToken};
pub use options::{PackOptions, SessionArgs, DEFAULT_CAPACITY};
pub use publisher::{Connection, Event, EventSink, FnSink, Publisher};
pub use ser::{Packed, Packer, ValueSerializer};
pub use transport::{Context, Mode, PubSocket, Subscriber, Transport};
pub use value::Value;

use serde::Serialize;

/// Packs `values` according to `format`.
///
/// # Examples
///
/// ```rust
/// use pubpack::{serialize, values};
///
/// let bytes = serialize(&values![7, 258], "_S").unwrap();
/// assert_eq!(bytes, 258u16.to_ne_bytes());
/// ```
///
/// # Errors
///
/// Returns a format error if `format` has a `]` with no `[` before it, or a
/// loop that consumes no values. An empty `values` never fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize(values: &[Value], format: &str) -> Result<Vec<u8>> {
    let options = PackOptions::new().with_format(format);
    serialize_with_options(values, &options).map(Packed::into_bytes)
}

/// Packs `values` with custom options.
///
/// The returned [`Packed`] also reports how many values were consumed.
///
/// # Errors
///
/// Same as [`serialize`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize_with_options(values: &[Value], options: &PackOptions) -> Result<Packed> {
    Packer::new(options.clone()).pack(values)
}

/// Flattens any `T: Serialize` into a value list.
///
/// # Examples
///
/// ```rust
/// use pubpack::{to_values, Value};
///
/// let values = to_values(&(1u8, "a", [0.5f64, 1.5])).unwrap();
/// assert_eq!(values.len(), 4);
/// assert_eq!(values[1], Value::from("a"));
/// ```
///
/// # Errors
///
/// Returns an error for maps, which have no flat ordering.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_values<T>(value: &T) -> Result<Vec<Value>>
where
    T: ?Sized + Serialize,
{
    let mut serializer = ValueSerializer::new();
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

/// Flattens `value` and packs it according to `format`.
///
/// # Examples
///
/// ```rust
/// use pubpack::to_bytes;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Level { channel: u8, db: f64 }
///
/// let bytes = to_bytes(&Level { channel: 2, db: -6.0 }, "Cd").unwrap();
/// assert_eq!(bytes.len(), 9);
/// assert_eq!(bytes[0], 2);
/// ```
///
/// # Errors
///
/// Returns an error if `value` cannot be flattened or `format` is malformed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes<T>(value: &T, format: &str) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    serialize(&to_values(value)?, format)
}
