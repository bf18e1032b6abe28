// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The fetch-decode-dispatch loop, call/return protocol, and control-flow
//! primitives (spec.md §4.4, §4.9).
//!
//! `Interpreter` owns the three stacks plus the state a fetch-decode-
//! dispatch loop needs on top of them: `IP`, `BP`, and the `list_depth`
//! counter used only during list construction. Every opcode is atomic
//! with respect to program state (spec.md §5) - there is no suspension
//! point inside [`Interpreter::run`].


use crate::builtins;
use crate::bytecode::{self, op};
use crate::error::VmError;
use crate::list;
use crate::memory::RETURN_STACK_BASE;
use crate::reference::Reference;
use crate::stack::{Region, Stacks};
use crate::tagged::{Decoded, Tag, TaggedValue};
use crate::types::Cell;

/// An observable step of execution, delivered to an optional trace
/// callback installed by the host (SPEC_FULL.md §A.2). Tracing has no
/// effect on program state - it is purely a read-only hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// About to execute the instruction at `ip`, whose opcode byte is
    /// `opcode` (the raw first byte, before extended-call decoding).
    Step {
        /// Instruction pointer before this step.
        ip: u32,
        /// The raw first byte at that address.
        opcode: u8,
    },
    /// A `call` (direct or extended) is about to transfer control.
    Call {
        /// Destination bytecode address.
        target: u32,
        /// Return address that will be restored on the matching `ret`.
        return_ip: u32,
    },
    /// A `ret` is about to resume the caller at `ip`, or halt if this
    /// was the outermost frame (`ip` is then the halted IP).
    Return {
        /// Resumed (or final) instruction pointer.
        ip: u32,
    },
}

fn no_trace(_: TraceEvent) {}

/// The bytecode interpreter: three stacks plus `IP`/`BP`/`list_depth`.
pub struct Interpreter {
    /// The three co-resident stack regions and their shared memory.
    pub stacks: Stacks,
    ip: u32,
    bp: Cell,
    list_depth: u32,
}

impl Interpreter {
    /// Creates an interpreter over a fresh, zeroed memory buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stacks: Stacks::new(),
            ip: 0,
            bp: RETURN_STACK_BASE,
            list_depth: 0,
        }
    }

    /// The current instruction pointer (a code-segment byte offset).
    #[must_use]
    pub const fn ip(&self) -> u32 {
        self.ip
    }

    /// The current base pointer (first local slot of the active frame).
    #[must_use]
    pub const fn bp(&self) -> Cell {
        self.bp
    }

    fn do_call(&mut self, target: u32) -> Result<(), VmError> {
        self.stacks.push(
            Region::Return,
            TaggedValue::encode(self.ip as i32, Tag::Code)?,
        )?;
        self.stacks
            .push(Region::Return, Reference::new(self.bp).to_tagged())?;
        let new_bp = self.stacks.top_cell(Region::Return);
        self.stacks.enter_frame(new_bp);
        self.bp = new_bp;
        self.ip = target;
        Ok(())
    }

    /// Performs `ret`. Returns `true` if this was the outermost frame
    /// (nothing left to resume - the caller should stop running).
    fn do_return(&mut self) -> Result<bool, VmError> {
        if self.bp.index() == RETURN_STACK_BASE.index() {
            return Ok(true);
        }
        self.stacks.set_top_cell(Region::Return, self.bp);
        let saved_bp_value = self.stacks.pop(Region::Return)?;
        let saved_ip_value = self.stacks.pop(Region::Return)?;
        let saved_bp = Reference::from_tagged(saved_bp_value)
            .ok_or(VmError::TypeError { op: "ret" })?
            .cell();
        let saved_ip = match saved_ip_value.decode() {
            Decoded::Boxed(Tag::Code, addr) => addr as u32,
            _ => return Err(VmError::TypeError { op: "ret" }),
        };
        self.stacks.leave_frame(saved_bp);
        self.bp = saved_bp;
        self.ip = saved_ip;
        Ok(false)
    }

    /// `eval`: pops a `CODE` value and dispatches it directly (builtin
    /// if its payload is below 128, otherwise a user call).
    fn eval(&mut self) -> Result<(), VmError> {
        let value = self.stacks.pop(Region::Data)?;
        match value.decode() {
            Decoded::Boxed(Tag::Code, payload) if (0..128).contains(&payload) => {
                builtins::dispatch(payload as u8, &mut self.stacks)
            }
            Decoded::Boxed(Tag::Code, payload) => self.do_call(payload as u32),
            _ => Err(VmError::TypeError { op: "eval" }),
        }
    }

    /// Runs from the current `IP` until the outermost frame returns.
    /// Equivalent to `run_traced` with a no-op trace sink.
    ///
    /// # Errors
    ///
    /// Returns the first [`VmError`] raised by any opcode.
    pub fn run(&mut self) -> Result<(), VmError> {
        let mut sink = no_trace;
        self.run_traced(&mut sink)
    }

    /// Sets `IP` to `addr` and `BP` to the top-level (no-frame) value,
    /// then runs to completion.
    ///
    /// # Errors
    ///
    /// Returns the first [`VmError`] raised by any opcode.
    pub fn run_from(&mut self, addr: u32) -> Result<(), VmError> {
        self.ip = addr;
        self.bp = RETURN_STACK_BASE;
        self.run()
    }

    /// Runs from the current `IP`, invoking `trace` before each step.
    ///
    /// # Errors
    ///
    /// Returns the first [`VmError`] raised by any opcode.
    pub fn run_traced(&mut self, trace: &mut dyn FnMut(TraceEvent)) -> Result<(), VmError> {
        loop {
            let first = self.stacks.memory().read_u8(self.ip as usize)?;
            trace(TraceEvent::Step {
                ip: self.ip,
                opcode: first,
            });

            if bytecode::is_extended(first) {
                let second = self.stacks.memory().read_u8(self.ip as usize + 1)?;
                let target = u32::from(bytecode::decode_call(first, second));
                self.ip += 2;
                trace(TraceEvent::Call {
                    target,
                    return_ip: self.ip,
                });
                self.do_call(target)?;
                continue;
            }

            self.ip += 1;
            match first {
                op::LITERAL_NUMBER => {
                    let value = self.stacks.memory().read_f32(self.ip as usize)?;
                    self.ip += 4;
                    self.stacks
                        .push(Region::Data, TaggedValue::from_number(value))?;
                }
                op::LITERAL_I16 => {
                    let value = self.stacks.memory().read_i16(self.ip as usize)?;
                    self.ip += 2;
                    self.stacks.push(
                        Region::Data,
                        TaggedValue::encode(i32::from(value), Tag::Integer)?,
                    )?;
                }
                op::LITERAL_CODE => {
                    let value = self.stacks.memory().read_u16(self.ip as usize)?;
                    self.ip += 2;
                    self.stacks.push(
                        Region::Data,
                        TaggedValue::encode(i32::from(value), Tag::Code)?,
                    )?;
                }
                op::LITERAL_STRING => {
                    let value = self.stacks.memory().read_u16(self.ip as usize)?;
                    self.ip += 2;
                    self.stacks.push(
                        Region::Data,
                        TaggedValue::encode(i32::from(value), Tag::String)?,
                    )?;
                }
                op::BRANCH => {
                    let offset = self.stacks.memory().read_i16(self.ip as usize)?;
                    self.ip += 2;
                    self.ip = (self.ip as i32 + i32::from(offset)) as u32;
                }
                op::BRANCH_IF_ZERO => {
                    let offset = self.stacks.memory().read_i16(self.ip as usize)?;
                    self.ip += 2;
                    let value = self.stacks.pop(Region::Data)?;
                    if value.is_falsy() {
                        self.ip = (self.ip as i32 + i32::from(offset)) as u32;
                    }
                }
                op::RESERVE_LOCALS => {
                    let count = self.stacks.memory().read_u8(self.ip as usize)?;
                    self.ip += 1;
                    let base = self
                        .stacks
                        .advance(Region::Return, u32::from(count), "reserve_locals")?;
                    for i in 0..u32::from(count) {
                        self.stacks
                            .memory_mut()
                            .write_cell(base.offset(i), TaggedValue::NIL)?;
                    }
                }
                op::SLOT_LOAD => {
                    let slot = self.stacks.memory().read_u8(self.ip as usize)?;
                    self.ip += 1;
                    let value = self.stacks.memory().read_cell(self.bp.offset(u32::from(slot)))?;
                    self.stacks.push(Region::Data, value)?;
                }
                op::SLOT_STORE => {
                    let slot = self.stacks.memory().read_u8(self.ip as usize)?;
                    self.ip += 1;
                    let value = self.stacks.pop(Region::Data)?;
                    self.stacks
                        .memory_mut()
                        .write_cell(self.bp.offset(u32::from(slot)), value)?;
                }
                op::VAR_REF => {
                    let slot = self.stacks.memory().read_u8(self.ip as usize)?;
                    self.ip += 1;
                    let reference = Reference::new(self.bp.offset(u32::from(slot)));
                    self.stacks.push(Region::Data, reference.to_tagged())?;
                }
                op::RET => {
                    let halted = self.do_return()?;
                    trace(TraceEvent::Return { ip: self.ip });
                    if halted {
                        return Ok(());
                    }
                }
                op::EVAL => self.eval()?,
                op::OPEN_LIST => list::open_list(&mut self.stacks, &mut self.list_depth)?,
                op::CLOSE_LIST => list::close_list(&mut self.stacks, &mut self.list_depth)?,
                other => builtins::dispatch(other, &mut self.stacks)?,
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
