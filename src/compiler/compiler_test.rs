// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for bytecode emission and branch patching.

use super::*;
use crate::memory::Memory;

#[test]
fn emit_literal_chooses_the_compact_form_per_tag() {
    let mut memory = Memory::new();
    let mut compiler = Compiler::new(&mut memory);

    compiler
        .emit_literal(TaggedValue::from_number(5.0))
        .unwrap();
    assert_eq!(compiler.ip(), 5); // opcode + 4-byte f32

    let start = compiler.ip();
    compiler
        .emit_literal(TaggedValue::encode(42, Tag::Integer).unwrap())
        .unwrap();
    assert_eq!(compiler.ip() - start, 3); // opcode + 2-byte i16
}

#[test]
fn emitted_literal_number_round_trips_through_memory() {
    let mut memory = Memory::new();
    {
        let mut compiler = Compiler::new(&mut memory);
        compiler
            .emit_literal(TaggedValue::from_number(2.5))
            .unwrap();
    }
    assert_eq!(memory.read_u8(0).unwrap(), op::LITERAL_NUMBER);
    assert_eq!(memory.read_f32(1).unwrap(), 2.5);
}

#[test]
fn emit_call_always_uses_the_extended_form() {
    let mut memory = Memory::new();
    let mut compiler = Compiler::new(&mut memory);
    compiler.emit_call(23).unwrap();
    assert_eq!(compiler.ip(), 2);
    let first = memory.read_u8(0).unwrap();
    let second = memory.read_u8(1).unwrap();
    assert!(bytecode::is_extended(first));
    assert_eq!(bytecode::decode_call(first, second), 23);
}

#[test]
fn emit_call_round_trips_an_address_at_and_above_128() {
    let mut memory = Memory::new();
    let mut compiler = Compiler::new(&mut memory);
    compiler.emit_call(200).unwrap();
    assert_eq!(compiler.ip(), 2);
    let first = memory.read_u8(0).unwrap();
    let second = memory.read_u8(1).unwrap();
    assert!(bytecode::is_extended(first));
    assert_eq!(bytecode::decode_call(first, second), 200);
}

#[test]
fn forward_branch_patches_to_the_current_compile_pointer() {
    let mut memory = Memory::new();
    let mut compiler = Compiler::new(&mut memory);
    let site = compiler.emit_branch(op::BRANCH_IF_ZERO).unwrap();
    compiler.emit_opcode(op::DUP).unwrap();
    compiler.patch_here(site).unwrap();

    let offset = memory.read_i16(1).unwrap();
    assert_eq!(i64::from(offset), i64::from(compiler.ip()) - 3);
}

#[test]
fn backward_branch_patches_to_an_earlier_known_address() {
    let mut memory = Memory::new();
    let mut compiler = Compiler::new(&mut memory);
    let loop_start = compiler.ip();
    compiler.emit_opcode(op::DUP).unwrap();
    let site = compiler.emit_branch(op::BRANCH).unwrap();
    compiler.patch_to(site, loop_start).unwrap();

    let offset = memory.read_i16(site.0 as usize).unwrap();
    assert_eq!(i64::from(offset), i64::from(loop_start) - i64::from(site.0 + 2));
}

#[test]
fn local_scope_assigns_increasing_slot_indices() {
    let mut scope = LocalScope::new();
    assert_eq!(scope.declare("x"), 0);
    assert_eq!(scope.declare("y"), 1);
    assert_eq!(scope.lookup("x"), Some(0));
    assert_eq!(scope.lookup("y"), Some(1));
    assert_eq!(scope.lookup("z"), None);
}
