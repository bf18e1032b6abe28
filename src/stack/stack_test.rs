// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;
use crate::tagged::{Tag, TaggedValue};

fn int(n: i32) -> TaggedValue {
    TaggedValue::encode(n, Tag::Integer).unwrap()
}

#[test]
fn push_pop_round_trips_on_each_region() {
    for region in [Region::Data, Region::Return, Region::Global] {
        let mut stacks = Stacks::new();
        stacks.push(region, int(42)).unwrap();
        assert_eq!(stacks.depth(region), 1);
        assert_eq!(stacks.pop(region).unwrap(), int(42));
        assert_eq!(stacks.depth(region), 0);
    }
}

#[test]
fn pop_on_empty_region_underflows() {
    let mut stacks = Stacks::new();
    assert!(matches!(
        stacks.pop(Region::Data),
        Err(VmError::StackUnderflow { .. })
    ));
    assert!(matches!(
        stacks.pop(Region::Return),
        Err(VmError::RStackUnderflow { .. })
    ));
}

#[test]
fn peek_is_non_destructive() {
    let mut stacks = Stacks::new();
    stacks.push(Region::Data, int(1)).unwrap();
    stacks.push(Region::Data, int(2)).unwrap();
    assert_eq!(stacks.peek(Region::Data, 0).unwrap(), int(2));
    assert_eq!(stacks.peek(Region::Data, 1).unwrap(), int(1));
    assert_eq!(stacks.depth(Region::Data), 2);
}

#[test]
fn frame_floor_blocks_popping_below_bp() {
    let mut stacks = Stacks::new();
    stacks.push(Region::Return, int(1)).unwrap();
    let bp = stacks.top_cell(Region::Return);
    let previous = stacks.enter_frame(bp);
    assert!(matches!(
        stacks.pop(Region::Return),
        Err(VmError::RStackUnderflow { .. })
    ));
    stacks.leave_frame(previous);
    assert_eq!(stacks.pop(Region::Return).unwrap(), int(1));
}

#[test]
fn overflow_at_region_capacity() {
    let mut stacks = Stacks::new();
    let capacity = crate::memory::DATA_STACK_CELLS;
    for _ in 0..capacity {
        stacks.push(Region::Data, int(0)).unwrap();
    }
    assert!(matches!(
        stacks.push(Region::Data, int(0)),
        Err(VmError::StackOverflow { .. })
    ));
}

#[test]
fn global_head_tracks_commits_independent_of_top() {
    let mut stacks = Stacks::new();
    stacks.push(Region::Global, int(1)).unwrap();
    stacks.commit_global_head();
    let head_after_first = stacks.global_head();
    stacks.push(Region::Global, int(2)).unwrap();
    assert_eq!(stacks.global_head(), head_after_first);
    stacks.rewind_global(head_after_first);
    assert_eq!(stacks.top_cell(Region::Global), head_after_first);
}
