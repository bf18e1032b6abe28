// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Local variables, globals, and reference-mediated access (spec.md §4.8).
//!
//! A reference is just a cell index (see [`crate::reference`]); this
//! module provides the operations that create and dereference them:
//! `var_ref`, `global_ref`, `fetch`, `store`, `load`.


use crate::error::VmError;
use crate::list;
use crate::reference::Reference;
use crate::stack::{Region, Stacks};
use crate::tagged::{Decoded, Tag, TaggedValue};
use crate::types::Cell;

/// `var_ref(slot) -> REF`: a reference into the current call frame's
/// local slots, `BP + slot`.
#[must_use]
pub fn var_ref(bp: Cell, slot: u32) -> Reference {
    Reference::new(bp.offset(slot))
}

/// `global_ref(cell) -> REF`: a reference into the global region.
#[must_use]
pub fn global_ref(cell: Cell) -> Reference {
    Reference::new(cell)
}

/// `fetch(ref) -> value`: reads the cell the reference addresses.
pub fn fetch(stacks: &Stacks, reference: Reference) -> Result<TaggedValue, VmError> {
    stacks.memory().read_cell(reference.cell())
}

/// `store(ref, value)`: writes the cell, enforcing slot compatibility.
/// A scalar occupant may be overwritten by any scalar. A list-header
/// occupant may only be overwritten by another list of identical slot
/// count (`INCOMPATIBLE_STORE` otherwise).
pub fn store(stacks: &mut Stacks, reference: Reference, value: TaggedValue) -> Result<(), VmError> {
    let current = stacks.memory().read_cell(reference.cell())?;
    if let Decoded::Boxed(Tag::List, current_n) = current.decode() {
        match value.decode() {
            Decoded::Boxed(Tag::List, new_n) if new_n == current_n => {}
            _ => return Err(VmError::IncompatibleStore),
        }
    }
    stacks.memory_mut().write_cell(reference.cell(), value)
}

/// `load(ref) -> value`: like `fetch`, but a list-header reference
/// materializes the full list onto the data stack (header, elements,
/// and a fresh `LINK` footer).
pub fn load(stacks: &mut Stacks, reference: Reference) -> Result<(), VmError> {
    let header_value = stacks.memory().read_cell(reference.cell())?;
    let Decoded::Boxed(Tag::List, slot_count) = header_value.decode() else {
        return stacks.push(Region::Data, header_value);
    };
    let slot_count = slot_count as u32;
    stacks.push(Region::Data, header_value)?;
    for i in 0..slot_count {
        let value = stacks.memory().read_cell(reference.cell().offset(1 + i))?;
        stacks.push(Region::Data, value)?;
    }
    stacks.push(
        Region::Data,
        TaggedValue::encode(slot_count as i32 + 1, Tag::Link)?,
    )?;
    Ok(())
}
