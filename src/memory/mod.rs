// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The VM's single linear memory buffer.
//!
//! One 65,536-byte buffer backs the whole VM for its entire lifetime:
//! no heap allocation, no growth, no garbage collection. It is divided
//! into four fixed segments (code, data stack, return stack, global
//! heap); [`crate::stack`] and [`crate::reference`] layer structure on
//! top, but every access ultimately goes through the bounds-checked
//! accessors here.


use crate::error::VmError;
use crate::tagged::TaggedValue;
use crate::types::{Cell, CELL_BYTES};

/// Total size of the backing buffer, in bytes.
pub const TOTAL_BYTES: usize = 65_536;

/// Total size of the backing buffer, in cells.
pub const TOTAL_CELLS: u32 = TOTAL_BYTES as u32 / CELL_BYTES;

/// Size of the code segment, in cells.
pub const CODE_CELLS: u32 = 8_192;
/// Size of the data stack segment, in cells.
pub const DATA_STACK_CELLS: u32 = 2_048;
/// Size of the return stack segment, in cells.
pub const RETURN_STACK_CELLS: u32 = 2_048;
/// Size of the global heap segment, in cells.
pub const GLOBAL_HEAP_CELLS: u32 =
    TOTAL_CELLS - CODE_CELLS - DATA_STACK_CELLS - RETURN_STACK_CELLS;

/// First cell of the code segment.
pub const CODE_BASE: Cell = Cell::new(0);
/// First cell of the data stack segment.
pub const DATA_STACK_BASE: Cell = Cell::new(CODE_CELLS);
/// First cell of the return stack segment.
pub const RETURN_STACK_BASE: Cell = Cell::new(CODE_CELLS + DATA_STACK_CELLS);
/// First cell of the global heap segment.
pub const GLOBAL_HEAP_BASE: Cell = Cell::new(CODE_CELLS + DATA_STACK_CELLS + RETURN_STACK_CELLS);
/// One past the last cell of the global heap segment (== `TOTAL_CELLS`).
pub const GLOBAL_HEAP_END: Cell = Cell::new(TOTAL_CELLS);

/// The VM's backing store: one fixed-size byte buffer, addressed either
/// as 4-byte cells or as raw bytes for the code segment's inline
/// immediates.
pub struct Memory {
    buf: [u8; TOTAL_BYTES],
}

impl Memory {
    /// Creates a zero-initialized memory buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; TOTAL_BYTES],
        }
    }

    fn check(offset: usize, width: usize) -> Result<(), VmError> {
        if offset + width > TOTAL_BYTES {
            return Err(VmError::MemoryBounds { offset });
        }
        Ok(())
    }

    /// Reads the tagged value at the given cell.
    pub fn read_cell(&self, cell: Cell) -> Result<TaggedValue, VmError> {
        let bits = self.read_u32(cell.to_byte_addr().as_usize())?;
        Ok(TaggedValue::from_bits(bits))
    }

    /// Writes a tagged value at the given cell.
    pub fn write_cell(&mut self, cell: Cell, value: TaggedValue) -> Result<(), VmError> {
        self.write_u32(cell.to_byte_addr().as_usize(), value.to_bits())
    }

    /// Reads one byte at `offset`.
    pub fn read_u8(&self, offset: usize) -> Result<u8, VmError> {
        Self::check(offset, 1)?;
        Ok(self.buf[offset])
    }

    /// Writes one byte at `offset`.
    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), VmError> {
        Self::check(offset, 1)?;
        self.buf[offset] = value;
        Ok(())
    }

    /// Reads a little-endian `i16` at `offset`.
    pub fn read_i16(&self, offset: usize) -> Result<i16, VmError> {
        Self::check(offset, 2)?;
        Ok(i16::from_le_bytes([self.buf[offset], self.buf[offset + 1]]))
    }

    /// Writes a little-endian `i16` at `offset`.
    pub fn write_i16(&mut self, offset: usize, value: i16) -> Result<(), VmError> {
        Self::check(offset, 2)?;
        let bytes = value.to_le_bytes();
        self.buf[offset..offset + 2].copy_from_slice(&bytes);
        Ok(())
    }

    /// Reads a little-endian `u16` at `offset`.
    pub fn read_u16(&self, offset: usize) -> Result<u16, VmError> {
        Self::check(offset, 2)?;
        Ok(u16::from_le_bytes([self.buf[offset], self.buf[offset + 1]]))
    }

    /// Writes a little-endian `u16` at `offset`.
    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), VmError> {
        Self::check(offset, 2)?;
        let bytes = value.to_le_bytes();
        self.buf[offset..offset + 2].copy_from_slice(&bytes);
        Ok(())
    }

    /// Reads a little-endian `u32` at `offset`.
    pub fn read_u32(&self, offset: usize) -> Result<u32, VmError> {
        Self::check(offset, 4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[offset..offset + 4]);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Writes a little-endian `u32` at `offset`.
    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), VmError> {
        Self::check(offset, 4)?;
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Reads a little-endian `f32` at `offset`.
    pub fn read_f32(&self, offset: usize) -> Result<f32, VmError> {
        Ok(f32::from_bits(self.read_u32(offset)?))
    }

    /// Writes a little-endian `f32` at `offset`.
    pub fn write_f32(&mut self, offset: usize, value: f32) -> Result<(), VmError> {
        self.write_u32(offset, value.to_bits())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
