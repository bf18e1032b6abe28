// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Bytecode compiler: emits bytes into the code segment and tracks a
//! compile pointer (spec.md §4.5).
//!
//! `Compiler` only knows how to emit instructions and patch branches; it
//! has no notion of surface syntax. [`crate::reader`] drives it token by
//! token, resolving names through [`crate::dictionary`] and declaring
//! per-definition locals through [`LocalScope`].

#[cfg(test)]
mod compiler_test;

#[cfg(any(test, feature = "std"))]
pub mod disassemble;

#[cfg(any(test, feature = "std"))]
use std::{string::String, vec::Vec};

#[cfg(not(any(test, feature = "std")))]
use alloc::{string::String, vec::Vec};

use crate::bytecode::{self, op};
use crate::error::CompileError;
use crate::memory::{CODE_CELLS, Memory};
use crate::tagged::{Decoded, Tag, TaggedValue};
use crate::types::CELL_BYTES;

/// Byte offset, one past the last addressable code-segment byte
/// (spec.md §6.1: a user call address is 15 bits, 0-32767).
const CODE_END: u32 = CODE_CELLS * CELL_BYTES;

/// Lowest byte offset a user definition may start at. Reserved so that
/// every compiled entry point satisfies spec.md §3.1's disambiguation
/// rule for a `CODE` value's payload (0-127 is always a builtin opcode,
/// 128-32767 is always a user bytecode address) - without this floor, a
/// definition compiled to address 0-127 would be indistinguishable from
/// a builtin opcode once captured in a `CODE` tagged value.
pub const FIRST_USER_ADDR: u32 = 128;

/// A deferred branch target: the byte offset of a branch's 2-byte
/// placeholder, recorded by [`Compiler::emit_branch`] and resolved by
/// [`Compiler::patch_here`] or [`Compiler::patch_to`] once the
/// destination is known. Forward and backward branches share this one
/// mechanism (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite(u32);

/// Per-definition local-name -> slot-index table (spec.md §4.5).
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
    names: Vec<String>,
}

impl LocalScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Declares a new local, returning its slot index.
    pub fn declare(&mut self, name: &str) -> u32 {
        self.names.push(String::from(name));
        (self.names.len() - 1) as u32
    }

    /// Returns the slot index of a previously declared local.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32)
    }

    /// Number of locals declared in this scope.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.names.len() as u32
    }

    /// True if no locals have been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Emits bytecode into a [`Memory`]'s code segment, tracking a compile
/// pointer independent of any runtime stack cursor.
pub struct Compiler<'a> {
    memory: &'a mut Memory,
    ip: u32,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler that appends to `memory`'s code segment
    /// starting at byte offset 0.
    #[must_use]
    pub fn new(memory: &'a mut Memory) -> Self {
        Self { memory, ip: 0 }
    }

    /// Resumes compiling at a given byte offset, e.g. to compile a new
    /// definition after earlier ones.
    #[must_use]
    pub fn at(memory: &'a mut Memory, ip: u32) -> Self {
        Self { memory, ip }
    }

    /// The current compile pointer (byte offset of the next emission).
    #[must_use]
    pub const fn ip(&self) -> u32 {
        self.ip
    }

    fn check_room(&self, additional: u32) -> Result<(), CompileError> {
        if self.ip + additional > CODE_END {
            return Err(CompileError::CodeSegmentFull);
        }
        Ok(())
    }

    /// Emits a single raw opcode byte (structural or builtin).
    pub fn emit_opcode(&mut self, opcode: u8) -> Result<(), CompileError> {
        self.emit_u8(opcode)
    }

    /// Emits one raw byte.
    pub fn emit_u8(&mut self, value: u8) -> Result<(), CompileError> {
        self.check_room(1)?;
        self.memory
            .write_u8(self.ip as usize, value)
            .map_err(|_| CompileError::CodeSegmentFull)?;
        self.ip += 1;
        Ok(())
    }

    /// Emits a little-endian `i16`.
    pub fn emit_i16(&mut self, value: i16) -> Result<(), CompileError> {
        self.check_room(2)?;
        self.memory
            .write_i16(self.ip as usize, value)
            .map_err(|_| CompileError::CodeSegmentFull)?;
        self.ip += 2;
        Ok(())
    }

    /// Emits a little-endian `u16`.
    pub fn emit_u16(&mut self, value: u16) -> Result<(), CompileError> {
        self.check_room(2)?;
        self.memory
            .write_u16(self.ip as usize, value)
            .map_err(|_| CompileError::CodeSegmentFull)?;
        self.ip += 2;
        Ok(())
    }

    /// Emits a little-endian `f32`.
    pub fn emit_f32(&mut self, value: f32) -> Result<(), CompileError> {
        self.check_room(4)?;
        self.memory
            .write_f32(self.ip as usize, value)
            .map_err(|_| CompileError::CodeSegmentFull)?;
        self.ip += 4;
        Ok(())
    }

    /// Emits a call to `addr`, always in the two-byte extended form
    /// (spec.md §4.5), regardless of `addr`'s magnitude. Calling a
    /// builtin directly is a separate, single-byte emission - see
    /// [`Compiler::emit_opcode`].
    pub fn emit_call(&mut self, addr: u16) -> Result<(), CompileError> {
        let [first, second] = bytecode::encode_call(addr);
        self.emit_u8(first)?;
        self.emit_u8(second)
    }

    /// Emits a literal-push instruction for `value`, choosing the
    /// compact form matching its tag (spec.md §4.5, §6.1).
    pub fn emit_literal(&mut self, value: TaggedValue) -> Result<(), CompileError> {
        match value.decode() {
            Decoded::Number(n) => {
                self.emit_opcode(op::LITERAL_NUMBER)?;
                self.emit_f32(n)
            }
            Decoded::Boxed(Tag::Integer, payload) => {
                self.emit_opcode(op::LITERAL_I16)?;
                self.emit_i16(payload as i16)
            }
            Decoded::Boxed(Tag::Code, payload) => {
                self.emit_opcode(op::LITERAL_CODE)?;
                self.emit_u16(payload as u16)
            }
            Decoded::Boxed(Tag::String, payload) => {
                self.emit_opcode(op::LITERAL_STRING)?;
                self.emit_u16(payload as u16)
            }
            Decoded::Boxed(..) => Err(CompileError::UnexpectedToken),
        }
    }

    /// Emits `RESERVE_LOCALS count` - a definition's prologue.
    pub fn emit_reserve_locals(&mut self, count: u32) -> Result<(), CompileError> {
        if count > u32::from(u8::MAX) {
            return Err(CompileError::TooManyLocals);
        }
        self.emit_opcode(op::RESERVE_LOCALS)?;
        self.emit_u8(count as u8)
    }

    /// Emits `VAR_REF slot`: pushes a reference to a local slot.
    pub fn emit_var_ref(&mut self, slot: u32) -> Result<(), CompileError> {
        self.emit_opcode(op::VAR_REF)?;
        self.emit_u8(slot as u8)
    }

    /// Emits `SLOT_LOAD slot`: pushes the value of a local slot.
    pub fn emit_slot_load(&mut self, slot: u32) -> Result<(), CompileError> {
        self.emit_opcode(op::SLOT_LOAD)?;
        self.emit_u8(slot as u8)
    }

    /// Emits `SLOT_STORE slot`: pops a value into a local slot.
    pub fn emit_slot_store(&mut self, slot: u32) -> Result<(), CompileError> {
        self.emit_opcode(op::SLOT_STORE)?;
        self.emit_u8(slot as u8)
    }

    /// Emits a definition's epilogue: tear down locals and return.
    pub fn emit_ret(&mut self) -> Result<(), CompileError> {
        self.emit_opcode(op::RET)
    }

    /// Emits `open_list`.
    pub fn emit_open_list(&mut self) -> Result<(), CompileError> {
        self.emit_opcode(op::OPEN_LIST)
    }

    /// Emits `close_list`.
    pub fn emit_close_list(&mut self) -> Result<(), CompileError> {
        self.emit_opcode(op::CLOSE_LIST)
    }

    /// Emits a branch opcode (`BRANCH` or `BRANCH_IF_ZERO`) with a
    /// placeholder offset, returning a [`PatchSite`] to resolve once the
    /// destination is known.
    pub fn emit_branch(&mut self, opcode: u8) -> Result<PatchSite, CompileError> {
        self.emit_opcode(opcode)?;
        let site = PatchSite(self.ip);
        self.emit_i16(0)?;
        Ok(site)
    }

    /// Resolves `site`'s placeholder to jump to the current compile
    /// pointer (a forward branch, e.g. `if ... then`).
    pub fn patch_here(&mut self, site: PatchSite) -> Result<(), CompileError> {
        self.patch_to(site, self.ip)
    }

    /// Resolves `site`'s placeholder to jump to `target`, an already-
    /// known byte offset (a backward branch, e.g. `while ... repeat`).
    pub fn patch_to(&mut self, site: PatchSite, target: u32) -> Result<(), CompileError> {
        let relative = target as i64 - (site.0 as i64 + 2);
        if relative < i64::from(i16::MIN) || relative > i64::from(i16::MAX) {
            return Err(CompileError::UnresolvedBranch);
        }
        self.memory
            .write_i16(site.0 as usize, relative as i16)
            .map_err(|_| CompileError::UnresolvedBranch)
    }
}
