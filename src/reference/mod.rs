// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! References: a tagged `REF` value is just a cell index, and its area
//! is derived from which segment that index falls in (spec.md §3.3).
//!
//! This mirrors §6.2's persisted layout order (code, data stack, return
//! stack, global heap, ascending) rather than §3.3's prose, which lists
//! global first; see `DESIGN.md` Open Question 1.

#[cfg(test)]
mod reference_test;

use crate::memory::{DATA_STACK_BASE, GLOBAL_HEAP_BASE, RETURN_STACK_BASE};
use crate::tagged::{Tag, TaggedValue};
use crate::types::Cell;

/// Which stack region a [`Reference`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// The code segment - not a normally addressable region, but a
    /// reference can land here if it points at a bytecode address.
    Code,
    /// The data stack.
    Data,
    /// The return stack.
    Return,
    /// The global heap.
    Global,
}

impl Area {
    /// Classifies a cell index by the ascending segment boundaries
    /// recorded in `crate::memory` (spec.md §6.2).
    #[must_use]
    pub fn classify(cell: Cell) -> Self {
        if cell.index() >= GLOBAL_HEAP_BASE.index() {
            Self::Global
        } else if cell.index() >= RETURN_STACK_BASE.index() {
            Self::Return
        } else if cell.index() >= DATA_STACK_BASE.index() {
            Self::Data
        } else {
            Self::Code
        }
    }
}

/// A reference to a mutable cell: a cell index plus its derived area.
/// References are borrowed, not owning - their validity depends on the
/// liveness discipline of the region they point into (spec.md §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    cell: Cell,
}

impl Reference {
    /// Wraps a cell index as a reference.
    #[inline]
    #[must_use]
    pub const fn new(cell: Cell) -> Self {
        Self { cell }
    }

    /// The cell this reference addresses.
    #[inline]
    #[must_use]
    pub const fn cell(self) -> Cell {
        self.cell
    }

    /// The region this reference's cell index falls in.
    #[must_use]
    pub fn area(self) -> Area {
        Area::classify(self.cell)
    }

    /// Encodes this reference as a tagged `REF` value.
    #[must_use]
    pub fn to_tagged(self) -> TaggedValue {
        TaggedValue::encode(self.cell.index() as i32, Tag::Ref)
            .expect("cell indices fit in a REF payload")
    }

    /// Decodes a tagged `REF` value back into a reference, if it is one.
    #[must_use]
    pub fn from_tagged(value: TaggedValue) -> Option<Self> {
        match value.decode() {
            crate::tagged::Decoded::Boxed(Tag::Ref, payload) => {
                Some(Self::new(Cell::new(payload as u32)))
            }
            _ => None,
        }
    }
}
