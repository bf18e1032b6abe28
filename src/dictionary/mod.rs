// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Name -> binding table with LIFO shadowing (spec.md §4.6).
//!
//! `define` always appends; `lookup`/`find_entry` walk from the most
//! recent entry backwards, so a later `define` of the same name shadows
//! an earlier one without removing it. `mark`/`forget` bracket a scope
//! by truncating the spine back to a saved length - the dictionary owns
//! nothing but its own entries and the names it interns.


#[cfg(any(test, feature = "std"))]
use std::{string::String, vec::Vec};

#[cfg(not(any(test, feature = "std")))]
use alloc::{string::String, vec::Vec};

use crate::tagged::TaggedValue;

/// What a dictionary name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// A `CODE` value: builtin opcode (0..127) or user bytecode address
    /// (128..32767).
    Code(TaggedValue),
    /// A local variable's slot index within the current definition's
    /// frame. Dictionary-only - never appears as a runtime tagged value
    /// (spec.md §3.1 `LOCAL`).
    Local(u32),
}

struct Entry {
    name: String,
    binding: Binding,
    immediate: bool,
}

/// A checkpoint into the dictionary spine, returned by [`Dictionary::mark`]
/// and consumed by [`Dictionary::forget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Name -> binding table with LIFO shadowing (spec.md §4.6).
#[derive(Default)]
pub struct Dictionary {
    entries: Vec<Entry>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Pushes a new entry. Shadows any existing entry of the same name
    /// without removing it.
    pub fn define(&mut self, name: &str, binding: Binding, immediate: bool) {
        self.entries.push(Entry {
            name: String::from(name),
            binding,
            immediate,
        });
    }

    /// Returns the most recent binding for `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.find_entry(name).map(|(binding, _)| binding)
    }

    /// Returns the most recent binding for `name` along with its
    /// immediate flag.
    #[must_use]
    pub fn find_entry(&self, name: &str) -> Option<(Binding, bool)> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .map(|entry| (entry.binding, entry.immediate))
    }

    /// Snapshots the current spine length.
    #[must_use]
    pub fn mark(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    /// Discards every entry defined since `checkpoint`.
    pub fn forget(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(checkpoint.0);
    }

    /// Number of live entries, for diagnostics and tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the dictionary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
