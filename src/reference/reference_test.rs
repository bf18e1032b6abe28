// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::memory::{CODE_BASE, GLOBAL_HEAP_END};

#[test]
fn classifies_each_segment() {
    assert_eq!(Area::classify(CODE_BASE), Area::Code);
    assert_eq!(Area::classify(DATA_STACK_BASE), Area::Data);
    assert_eq!(
        Area::classify(Cell::new(DATA_STACK_BASE.index() + 1)),
        Area::Data
    );
    assert_eq!(Area::classify(RETURN_STACK_BASE), Area::Return);
    assert_eq!(Area::classify(GLOBAL_HEAP_BASE), Area::Global);
    assert_eq!(Area::classify(Cell::new(GLOBAL_HEAP_END.index() - 1)), Area::Global);
}

#[test]
fn tagged_round_trip() {
    let r = Reference::new(DATA_STACK_BASE.offset(3));
    let tv = r.to_tagged();
    assert!(tv.is_tag(Tag::Ref));
    assert_eq!(Reference::from_tagged(tv), Some(r));
}

#[test]
fn from_tagged_rejects_non_ref() {
    let tv = TaggedValue::encode(3, Tag::Integer).unwrap();
    assert_eq!(Reference::from_tagged(tv), None);
}
