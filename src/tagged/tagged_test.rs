// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

#[test]
fn finite_float_decodes_as_number() {
    for n in [0.0_f32, 1.0, -1.0, 3.5, 65535.0, -65535.0] {
        let tv = TaggedValue::from_number(n);
        assert!(tv.is_number());
        match tv.decode() {
            Decoded::Number(got) => assert_eq!(got, n),
            Decoded::Boxed(..) => panic!("expected Number"),
        }
    }
}

#[test]
fn encode_decode_round_trip_for_each_tag() {
    let cases = [
        (Tag::Sentinel, 0),
        (Tag::Integer, -32768),
        (Tag::Integer, 32767),
        (Tag::Integer, 0),
        (Tag::Code, 127),
        (Tag::Code, 32767),
        (Tag::String, 65535),
        (Tag::List, 0),
        (Tag::Link, 1),
        (Tag::Ref, 42),
        (Tag::Local, 3),
    ];
    for (tag, payload) in cases {
        let tv = TaggedValue::encode(payload, tag).expect("encode");
        assert!(tv.is_boxed());
        match tv.decode() {
            Decoded::Boxed(got_tag, got_payload) => {
                assert_eq!(got_tag, tag);
                assert_eq!(got_payload, payload);
            }
            Decoded::Number(_) => panic!("expected Boxed"),
        }
    }
}

#[test]
fn encode_rejects_out_of_range_payload() {
    assert!(TaggedValue::encode(32768, Tag::Integer).is_err());
    assert!(TaggedValue::encode(-32769, Tag::Integer).is_err());
    assert!(TaggedValue::encode(65536, Tag::List).is_err());
    assert!(TaggedValue::encode(-1, Tag::List).is_err());
}

#[test]
fn canonical_quiet_nan_is_sentinel_nil() {
    let tv = TaggedValue::from_bits(0x7FC0_0000);
    assert_eq!(tv, TaggedValue::NIL);
    assert_eq!(tv.get_tag(), Some(Tag::Sentinel));
    assert_eq!(tv.get_value(), 0);
}

#[test]
fn is_falsy_matches_spec_cases() {
    assert!(TaggedValue::NIL.is_falsy());
    assert!(TaggedValue::encode(0, Tag::Integer).unwrap().is_falsy());
    assert!(TaggedValue::from_number(0.0).is_falsy());
    assert!(!TaggedValue::from_number(1.0).is_falsy());
    assert!(!TaggedValue::encode(1, Tag::Integer).unwrap().is_falsy());
    assert!(!TaggedValue::encode(0, Tag::List).unwrap().is_falsy());
}

proptest::proptest! {
    #[test]
    fn prop_finite_float_round_trips(n in proptest::num::f32::NORMAL) {
        let tv = TaggedValue::from_number(n);
        proptest::prop_assert!(tv.is_number());
        proptest::prop_assert_eq!(tv.as_number(), Some(n));
    }

    #[test]
    fn prop_integer_round_trips(payload in -32768_i32..=32767) {
        let tv = TaggedValue::encode(payload, Tag::Integer).unwrap();
        match tv.decode() {
            Decoded::Boxed(Tag::Integer, got) => proptest::prop_assert_eq!(got, payload),
            other => proptest::prop_assert!(false, "unexpected decode: {:?}", other),
        }
    }
}
