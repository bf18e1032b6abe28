// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Black-box end-to-end scenarios (spec.md §8), driven only through the
//! crate's public API: source text in, data-stack contents out. Mirrors
//! the teacher's `tests/integration_test.rs` convention of exercising
//! the whole stack rather than one module at a time.

use catvm::interpreter::Interpreter;
use catvm::reader::{bootstrap_dictionary, read};
use catvm::stack::Region;
use catvm::tagged::{Decoded, Tag};

fn run(source: &str) -> Interpreter {
    let mut vm = Interpreter::new();
    let mut dict = bootstrap_dictionary();
    let entry = read(source, vm.stacks.memory_mut(), &mut dict)
        .unwrap_or_else(|e| panic!("compiling {source:?} failed: {e:?}"));
    vm.run_from(entry)
        .unwrap_or_else(|e| panic!("running {source:?} failed: {e:?}"));
    vm
}

#[test]
fn arithmetic_and_literal() {
    // `2 3 +` yields data stack `[5]` (as NUMBER).
    let mut vm = run("2 3 +");
    assert_eq!(vm.stacks.depth(Region::Data), 1);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Number(5.0)
    );
}

#[test]
fn list_construction_and_length() {
    // `( 10 20 30 ) length` yields `[3]` (a boxed INTEGER count).
    let mut vm = run("( 10 20 30 ) length");
    assert_eq!(vm.stacks.depth(Region::Data), 1);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 3)
    );
}

#[test]
fn nested_list_drop() {
    // `( 1 ( 2 3 ) 4 ) drop` leaves the data stack empty.
    let vm = run("( 1 ( 2 3 ) 4 ) drop");
    assert_eq!(vm.stacks.depth(Region::Data), 0);
}

#[test]
fn swap_of_unequal_blocks() {
    // `( 1 2 ) ( 3 4 5 ) swap` yields top = `( 1 2 )`, deeper = `( 3 4 5 )`,
    // verified by `drop length` = 2 then `length` = 3.
    let mut top = run("( 1 2 ) ( 3 4 5 ) swap drop length");
    assert_eq!(
        top.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 3)
    );

    let mut deeper = run("( 1 2 ) ( 3 4 5 ) swap length");
    assert_eq!(
        deeper.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 2)
    );
}

#[test]
fn local_variable_round_trip() {
    // `: f ( locals: x ) 7 x store x fetch ;` invoked with no arguments
    // yields `[7]`.
    let mut vm = run(": f ( locals: x ) 7 x store x fetch ; f");
    assert_eq!(vm.stacks.depth(Region::Data), 1);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 7)
    );
}

#[test]
fn global_transfer_and_load() {
    // Constructing `( 1 2 3 )`, transferring to global, and `load`ing
    // the returned reference reproduces `( 1 2 3 )` on the data stack,
    // with length 3.
    let mut vm = run("( 1 2 3 ) transfer>global load length");
    assert_eq!(vm.stacks.depth(Region::Data), 1);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 3)
    );
}

#[test]
fn pack_and_unpack_round_trip_through_source() {
    // Literal integers keep their INTEGER tag through `pack`/`unpack`,
    // which only reposition slots and never touch value tags.
    let mut vm = run("10 20 30 3 pack unpack");
    assert_eq!(vm.stacks.depth(Region::Data), 3);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 30)
    );
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 20)
    );
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Boxed(Tag::Integer, 10)
    );
}

#[test]
fn a_definition_can_call_another_definition_compiled_before_it() {
    let mut vm = run(
        ": double ( locals: x ) x store x fetch x fetch + ; \
         : quadruple ( locals: x ) x store x fetch double x fetch double + ; \
         5 quadruple",
    );
    assert_eq!(vm.stacks.depth(Region::Data), 1);
    assert_eq!(
        vm.stacks.pop(Region::Data).unwrap().decode(),
        Decoded::Number(20.0)
    );
}

#[test]
fn undefined_word_fails_at_compile_time_without_entering_the_interpreter() {
    let mut vm = Interpreter::new();
    let mut dict = bootstrap_dictionary();
    let err = read("1 bogus +", vm.stacks.memory_mut(), &mut dict).unwrap_err();
    assert_eq!(
        err,
        catvm::reader::ReadError::Compile(catvm::error::CompileError::UndefinedWord)
    );
}
