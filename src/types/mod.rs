// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Core address types.
//!
//! `Cell` and `ByteAddr` are newtypes over `u32` that keep cell-granular
//! and byte-granular addressing from being mixed up at call sites.


mod cell;

pub use cell::{ByteAddr, Cell, CELL_BYTES};
