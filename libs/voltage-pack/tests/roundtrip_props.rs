//! Property-based round-trip tests
//!
//! For any sequence of lossless directives and in-range values,
//! `unpack(pack(values, format), format) == values`.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use proptest::prelude::*;
use voltage_pack::{pack, unpack, Value};

/// One directive token with a value it can carry losslessly
fn directive_value() -> impl Strategy<Value = (&'static str, Value)> {
    prop_oneof![
        any::<i8>().prop_map(|v| ("c", Value::from(v))),
        any::<u8>().prop_map(|v| ("C", Value::from(v))),
        any::<i16>().prop_map(|v| ("s", Value::from(v))),
        any::<u16>().prop_map(|v| ("S", Value::from(v))),
        any::<i32>().prop_map(|v| ("l", Value::from(v))),
        any::<u32>().prop_map(|v| ("L", Value::from(v))),
        any::<i64>().prop_map(|v| ("q", Value::from(v))),
        any::<u64>().prop_map(|v| ("Q", Value::from(v))),
        any::<u16>().prop_map(|v| ("n", Value::from(v))),
        any::<u32>().prop_map(|v| ("N", Value::from(v))),
        any::<u16>().prop_map(|v| ("v", Value::from(v))),
        any::<u32>().prop_map(|v| ("V", Value::from(v))),
        (-1e300f64..1e300f64).prop_map(|v| ("d", Value::from(v))),
        (-1e30f32..1e30f32).prop_map(|v| ("f", Value::from(v))),
        proptest::collection::vec(any::<u8>(), 6).prop_map(|v| ("a6", Value::from(v))),
    ]
}

proptest! {
    #[test]
    fn prop_pack_unpack_round_trip(entries in proptest::collection::vec(directive_value(), 0..24)) {
        let format: String = entries.iter().map(|(d, _)| *d).collect();
        let values: Vec<Value> = entries.into_iter().map(|(_, v)| v).collect();

        let packed = pack(&values, &format).unwrap();
        let unpacked = unpack(&packed, &format).unwrap();
        prop_assert_eq!(unpacked, values);
    }

    #[test]
    fn prop_star_matches_repeated_directive(
        values in proptest::collection::vec(any::<u32>(), 0..16)
    ) {
        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        let star = pack(&values, "N*").unwrap();
        let repeated = pack(&values, &"N".repeat(values.len())).unwrap();
        prop_assert_eq!(&star[..], &repeated[..]);
        prop_assert_eq!(unpack(&star, "N*").unwrap(), values);
    }
}
