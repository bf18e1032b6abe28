// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The dictionary-bound builtin words: arithmetic, comparison, and the
//! stack/list/binding primitives that live at opcode IDs 16 and up
//! (spec.md §6.1, §4.6). [`BUILTINS`] is the name-to-opcode table the
//! bootstrap dictionary is seeded from; [`dispatch`] is the single
//! entry point the interpreter calls for any opcode in that range,
//! including ones reached indirectly through `eval`.


use crate::binding;
use crate::bytecode::op;
use crate::error::VmError;
use crate::list;
use crate::reference::Reference;
use crate::stack::{Region, Stacks};
use crate::tagged::{Decoded, Tag, TaggedValue};
use crate::types::Cell;

/// Name -> opcode table for the words bound into the bootstrap
/// dictionary. Structural/control opcodes (below 16) are never bound by
/// name - they are emitted directly by the compiler.
pub const BUILTINS: &[(&str, u8)] = &[
    ("+", op::ADD),
    ("-", op::SUB),
    ("*", op::MUL),
    ("/", op::DIV),
    ("<", op::LT),
    (">", op::GT),
    ("=", op::EQ),
    ("dup", op::DUP),
    ("drop", op::DROP),
    ("swap", op::SWAP),
    ("length", op::LENGTH),
    ("slot", op::SLOT),
    ("elem", op::ELEM),
    ("head", op::HEAD),
    ("tail", op::TAIL),
    ("reverse", op::REVERSE),
    ("concat", op::CONCAT),
    ("pack", op::PACK),
    ("unpack", op::UNPACK),
    ("transfer>data", op::TRANSFER_DATA),
    ("transfer>return", op::TRANSFER_RETURN),
    ("transfer>global", op::TRANSFER_GLOBAL),
    ("global_ref", op::GLOBAL_REF),
    ("fetch", op::FETCH),
    ("store", op::STORE),
    ("load", op::LOAD),
];

/// Looks up a builtin's opcode by name, for seeding the bootstrap
/// dictionary.
#[must_use]
pub fn lookup(name: &str) -> Option<u8> {
    BUILTINS
        .iter()
        .find(|(builtin_name, _)| *builtin_name == name)
        .map(|(_, opcode)| *opcode)
}

/// Reads a scalar operand as an `f32`, for the arithmetic/comparison
/// words - `NUMBER` is used as-is, `INTEGER` is widened.
fn as_number(value: TaggedValue, op: &'static str) -> Result<f32, VmError> {
    match value.decode() {
        Decoded::Number(n) => Ok(n),
        Decoded::Boxed(Tag::Integer, payload) => Ok(payload as f32),
        Decoded::Boxed(..) => Err(VmError::TypeError { op }),
    }
}

/// Reads a scalar operand as an index/count, for `slot`/`elem`/`pack`.
fn as_index(value: TaggedValue, op: &'static str) -> Result<i32, VmError> {
    match value.decode() {
        Decoded::Number(n) => Ok(n as i32),
        Decoded::Boxed(Tag::Integer, payload) => Ok(payload),
        Decoded::Boxed(..) => Err(VmError::TypeError { op }),
    }
}

fn boolean(flag: bool) -> Result<TaggedValue, VmError> {
    TaggedValue::encode(i32::from(flag), Tag::Integer)
}

fn binary_arith(
    stacks: &mut Stacks,
    name: &'static str,
    f: fn(f32, f32) -> Result<f32, VmError>,
) -> Result<(), VmError> {
    let b = as_number(stacks.pop(Region::Data)?, name)?;
    let a = as_number(stacks.pop(Region::Data)?, name)?;
    stacks.push(Region::Data, TaggedValue::from_number(f(a, b)?))
}

fn binary_compare(
    stacks: &mut Stacks,
    name: &'static str,
    f: fn(f32, f32) -> bool,
) -> Result<(), VmError> {
    let b = as_number(stacks.pop(Region::Data)?, name)?;
    let a = as_number(stacks.pop(Region::Data)?, name)?;
    stacks.push(Region::Data, boolean(f(a, b))?)
}

fn pop_reference(stacks: &mut Stacks, op: &'static str) -> Result<Reference, VmError> {
    let value = stacks.pop(Region::Data)?;
    Reference::from_tagged(value).ok_or(VmError::TypeError { op })
}

fn transfer_to(stacks: &mut Stacks, target: Region) -> Result<(), VmError> {
    let reference = list::transfer(stacks, target)?;
    stacks.push(Region::Data, reference.to_tagged())
}

/// Executes a builtin opcode (spec.md §4.4, §4.7, §4.8).
///
/// # Errors
///
/// Returns [`VmError::InvalidOpcode`] for any byte outside the builtin
/// range, and the operation's own error (underflow, type mismatch, ...)
/// otherwise.
pub fn dispatch(opcode: u8, stacks: &mut Stacks) -> Result<(), VmError> {
    match opcode {
        op::ADD => binary_arith(stacks, "+", |a, b| Ok(a + b)),
        op::SUB => binary_arith(stacks, "-", |a, b| Ok(a - b)),
        op::MUL => binary_arith(stacks, "*", |a, b| Ok(a * b)),
        op::DIV => binary_arith(stacks, "/", |a, b| {
            if b == 0.0 {
                Err(VmError::TypeError { op: "/" })
            } else {
                Ok(a / b)
            }
        }),
        op::LT => binary_compare(stacks, "<", |a, b| a < b),
        op::GT => binary_compare(stacks, ">", |a, b| a > b),
        op::EQ => binary_compare(stacks, "=", |a, b| a == b),
        op::DUP => list::dup(stacks),
        op::DROP => list::drop(stacks),
        op::SWAP => list::swap(stacks),
        op::LENGTH => list::length(stacks),
        op::SLOT => {
            let index = as_index(stacks.pop(Region::Data)?, "slot")?;
            list::slot(stacks, index)
        }
        op::ELEM => {
            let index = as_index(stacks.pop(Region::Data)?, "elem")?;
            list::elem(stacks, index)
        }
        op::HEAD => list::head(stacks),
        op::TAIL => list::tail(stacks),
        op::REVERSE => list::reverse(stacks),
        op::CONCAT => list::concat(stacks),
        op::PACK => {
            let n = as_index(stacks.pop(Region::Data)?, "pack")?;
            if n < 0 {
                return Err(VmError::TypeError { op: "pack" });
            }
            list::pack(stacks, n as u32)
        }
        op::UNPACK => list::unpack(stacks),
        op::TRANSFER_DATA => transfer_to(stacks, Region::Data),
        op::TRANSFER_RETURN => transfer_to(stacks, Region::Return),
        op::TRANSFER_GLOBAL => transfer_to(stacks, Region::Global),
        op::GLOBAL_REF => {
            let cell = as_index(stacks.pop(Region::Data)?, "global_ref")?;
            if cell < 0 {
                return Err(VmError::TypeError { op: "global_ref" });
            }
            let reference = binding::global_ref(Cell::new(cell as u32));
            stacks.push(Region::Data, reference.to_tagged())
        }
        op::FETCH => {
            let reference = pop_reference(stacks, "fetch")?;
            let value = binding::fetch(stacks, reference)?;
            stacks.push(Region::Data, value)
        }
        op::STORE => {
            let reference = pop_reference(stacks, "store")?;
            let value = stacks.pop(Region::Data)?;
            binding::store(stacks, reference, value)
        }
        op::LOAD => {
            let reference = pop_reference(stacks, "load")?;
            binding::load(stacks, reference)
        }
        _ => Err(VmError::InvalidOpcode { opcode }),
    }
}
