//! Property-based tests for the packing rules.
//!
//! These check the format-level guarantees across generated value lists:
//! flat formats concatenate per-token encodings, single-token loops scale
//! linearly, and a stray `]` always fails.

use proptest::prelude::*;
use pubpack::{convert, serialize, FormatToken, Value};

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        any::<f64>().prop_map(Value::Float),
        "[a-z]{0,8}".prop_map(Value::Symbol),
    ]
}

fn scalar_token() -> impl Strategy<Value = u8> {
    prop::sample::select(b"cCsSiIlLfdt".to_vec())
}

proptest! {
    #[test]
    fn prop_flat_format_concatenates(
        pairs in prop::collection::vec((value(), scalar_token()), 1..20),
        extra in prop::collection::vec(scalar_token(), 0..4),
    ) {
        let values: Vec<Value> = pairs.iter().map(|(v, _)| v.clone()).collect();
        let mut format: Vec<u8> = pairs.iter().map(|(_, t)| *t).collect();
        format.extend(extra);
        let format = String::from_utf8(format).unwrap();

        let mut expected = Vec::new();
        for (value, token) in &pairs {
            convert::append(FormatToken::from_byte(*token).unwrap(), value, &mut expected);
        }
        prop_assert_eq!(serialize(&values, &format).unwrap(), expected);
    }

    #[test]
    fn prop_repeat_width(
        values in prop::collection::vec(value(), 0..64),
        token in prop::sample::select(b"cCsSiIlLfd".to_vec()),
    ) {
        let token = FormatToken::from_byte(token).unwrap();
        let format = format!("[{}]", token);
        let bytes = serialize(&values, &format).unwrap();
        prop_assert_eq!(bytes.len(), values.len() * token.width().unwrap());
    }

    #[test]
    fn prop_repeat_text_records(values in prop::collection::vec(value(), 0..32)) {
        let bytes = serialize(&values, "[t]").unwrap();
        let records = bytes.iter().filter(|b| **b == 0).count();
        prop_assert_eq!(records, values.len());
    }

    #[test]
    fn prop_unmatched_close_fails(
        values in prop::collection::vec(value(), 1..8),
        prefix in "[cCsSiIlLfdt_0x ]{0,6}",
        suffix in "[cCsSiIlLfdt_0\\[\\]]{0,6}",
    ) {
        let format = format!("{}]{}", prefix.replace('[', ""), suffix);
        prop_assert!(serialize(&values, &format).is_err());
    }

    #[test]
    fn prop_uint16_round_trip(n in any::<u16>()) {
        let bytes = serialize(&[Value::from(n)], "S").unwrap();
        prop_assert_eq!(u16::from_ne_bytes([bytes[0], bytes[1]]), n);
    }

    #[test]
    fn prop_int64_round_trip(n in any::<i64>()) {
        let bytes = serialize(&[Value::Integer(n)], "l").unwrap();
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes);
        prop_assert_eq!(i64::from_ne_bytes(raw), n);
    }
}
