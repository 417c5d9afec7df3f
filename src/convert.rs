//! Per-token conversion of one [`Value`] into bytes.
//!
//! Numeric tokens narrow the value with Rust's `as` casts: integers wrap to
//! the destination width, floats truncate toward zero and saturate at the
//! destination bounds (NaN becomes zero). A symbol fed to a numeric token
//! has no numeric reading and packs as all-zero bytes of the token's width.
//!
//! All numeric output is in native byte order.

use crate::format::FormatToken;
use crate::value::{format_float, Value};

macro_rules! numeric {
    ($buf:expr, $value:expr, $ty:ty) => {{
        let n: $ty = match $value {
            Value::Integer(i) => *i as $ty,
            Value::Float(f) => *f as $ty,
            Value::Symbol(_) => <$ty>::default(),
        };
        $buf.extend_from_slice(&n.to_ne_bytes());
    }};
}

/// Appends the encoding of `value` under the scalar `token` to `buf`.
///
/// Non-scalar tokens append nothing; the packer handles those itself.
///
/// ```rust
/// use pubpack::{convert, FormatToken, Value};
///
/// let mut buf = Vec::new();
/// convert::append(FormatToken::Uint16, &Value::from(258), &mut buf);
/// assert_eq!(buf, 258u16.to_ne_bytes());
///
/// convert::append(FormatToken::Text, &Value::from(2.5), &mut buf);
/// assert_eq!(&buf[2..], b"2.500000\0");
/// ```
pub fn append(token: FormatToken, value: &Value, buf: &mut Vec<u8>) {
    match token {
        FormatToken::Int8 => numeric!(buf, value, i8),
        FormatToken::Uint8 => numeric!(buf, value, u8),
        FormatToken::Int16 => numeric!(buf, value, i16),
        FormatToken::Uint16 => numeric!(buf, value, u16),
        FormatToken::Int32 => numeric!(buf, value, i32),
        FormatToken::Uint32 => numeric!(buf, value, u32),
        FormatToken::Int64 => numeric!(buf, value, i64),
        FormatToken::Uint64 => numeric!(buf, value, u64),
        FormatToken::Float32 => numeric!(buf, value, f32),
        FormatToken::Float64 => numeric!(buf, value, f64),
        FormatToken::Text => append_text(value, buf),
        FormatToken::ArrayBegin
        | FormatToken::ArrayEnd
        | FormatToken::SkipByte
        | FormatToken::ZeroPadding => {}
    }
}

fn append_text(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Integer(i) => buf.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => buf.extend_from_slice(format_float(*f).as_bytes()),
        Value::Symbol(s) => buf.extend_from_slice(s.as_bytes()),
    }
    buf.push(0);
}

/// Encodes a single value into a fresh buffer.
#[must_use]
pub fn to_bytes(token: FormatToken, value: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(token.width().unwrap_or(16));
    append(token, value, &mut buf);
    buf
}
