// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! NaN-boxed tagged value codec.
//!
//! A [`TaggedValue`] is a 32-bit word. A finite, non-NaN bit pattern is
//! itself a number (full `f32` precision, never boxed). Any other bit
//! pattern is a *boxed* value: a quiet NaN whose mantissa carries a 6-bit
//! [`Tag`] and a 16-bit payload.
//!
//! Layout of a boxed word, MSB to LSB:
//!
//! ```text
//! [ sign:1=0 ][ exponent:8=0xFF ][ quiet:1=1 ][ tag:6 ][ payload:16 ]
//! ```
//!
//! The canonical quiet NaN (`0x7FC0_0000`, tag bits and payload both zero)
//! decodes to `Tag::Sentinel` payload `0` - i.e. `SENTINEL_NIL` - so no bit
//! pattern is left undecodable.

#[cfg(test)]
mod tagged_test;

use crate::error::VmError;

/// Bits that are fixed for every boxed value: sign clear, exponent all
/// ones, quiet-NaN bit set.
const BOXED_BASE: u32 = 0x7FC0_0000;

/// Bits of `BOXED_BASE` that must be present for a word to be boxed at
/// all - distinguishes a boxed tagged value from an ordinary signaling or
/// non-canonical NaN a host might otherwise construct.
const BOXED_MASK: u32 = 0xFFC0_0000;

const TAG_SHIFT: u32 = 16;
const TAG_MASK: u32 = 0x3F;
const PAYLOAD_MASK: u32 = 0xFFFF;

/// The closed set of boxed tags. `NUMBER` is not a member: it is the
/// absence of a box, represented instead by [`Decoded::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// End-of-stream / nil marker. `Sentinel(0)` is `SENTINEL_NIL`.
    Sentinel = 0,
    /// Signed 16-bit integer, sign-extended on decode.
    Integer = 1,
    /// Executable reference: opcode 0-127 for builtins, 128-32767 for
    /// user bytecode addresses.
    Code = 2,
    /// Interned string table id.
    String = 3,
    /// List header; payload is the slot count.
    List = 4,
    /// List footer; payload is the cell distance back to its header.
    Link = 5,
    /// Reference to a mutable cell; payload is a cell index.
    Ref = 6,
    /// Dictionary-only local slot designator.
    Local = 7,
}

impl Tag {
    const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::Sentinel),
            1 => Some(Self::Integer),
            2 => Some(Self::Code),
            3 => Some(Self::String),
            4 => Some(Self::List),
            5 => Some(Self::Link),
            6 => Some(Self::Ref),
            7 => Some(Self::Local),
            _ => None,
        }
    }

    /// Legal payload range for this tag, as used by [`TaggedValue::encode`].
    const fn payload_range(self) -> (i32, i32) {
        match self {
            Self::Integer => (-32768, 32767),
            _ => (0, 65535),
        }
    }
}

/// A decoded tagged value: either a raw number or a boxed `(tag, payload)`
/// pair, with `Integer` payloads already sign-extended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// A raw, unboxed IEEE-754 single.
    Number(f32),
    /// A boxed value and its payload (sign-extended for `Tag::Integer`,
    /// zero-extended otherwise).
    Boxed(Tag, i32),
}

/// A 32-bit tagged value: either a raw `f32` or a boxed `(tag, payload)`.
#[derive(Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct TaggedValue(u32);

impl core::fmt::Debug for TaggedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.decode() {
            Decoded::Number(n) => write!(f, "TaggedValue(Number({n}))"),
            Decoded::Boxed(tag, payload) => {
                write!(f, "TaggedValue({tag:?}({payload}))")
            }
        }
    }
}

impl TaggedValue {
    /// `SENTINEL_NIL`: the canonical quiet NaN, `Tag::Sentinel` payload 0.
    pub const NIL: Self = Self(BOXED_BASE);

    /// Wraps a raw 32-bit pattern without interpreting it.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw 32-bit pattern.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Wraps a finite `f32` as an unboxed `NUMBER`.
    #[inline]
    #[must_use]
    pub fn from_number(value: f32) -> Self {
        Self(value.to_bits())
    }

    /// True if this word is a boxed value rather than a raw number.
    #[inline]
    #[must_use]
    pub const fn is_boxed(self) -> bool {
        self.0 & BOXED_MASK == BOXED_BASE
    }

    /// Constructs a boxed value. Fails if `payload` does not fit the
    /// tag's width (`Integer` in `-32768..=32767`, others in `0..=65535`).
    #[must_use]
    pub fn encode(payload: i32, tag: Tag) -> Result<Self, VmError> {
        let (lo, hi) = tag.payload_range();
        if payload < lo || payload > hi {
            return Err(VmError::TypeError { op: "encode" });
        }
        let bits = BOXED_BASE | ((tag as u32) << TAG_SHIFT) | (payload as u32 & PAYLOAD_MASK);
        Ok(Self(bits))
    }

    /// Decodes this word into a raw number or a boxed `(tag, payload)`.
    #[must_use]
    pub fn decode(self) -> Decoded {
        if !self.is_boxed() {
            return Decoded::Number(f32::from_bits(self.0));
        }
        let tag_bits = (self.0 >> TAG_SHIFT) & TAG_MASK;
        let payload_bits = self.0 & PAYLOAD_MASK;
        let tag = Tag::from_bits(tag_bits).unwrap_or(Tag::Sentinel);
        let payload = if matches!(tag, Tag::Integer) {
            i32::from(payload_bits as i16)
        } else {
            payload_bits as i32
        };
        Decoded::Boxed(tag, payload)
    }

    /// Returns the boxed tag, or `None` if this word is a raw `NUMBER`.
    #[must_use]
    pub fn get_tag(self) -> Option<Tag> {
        match self.decode() {
            Decoded::Number(_) => None,
            Decoded::Boxed(tag, _) => Some(tag),
        }
    }

    /// Returns the decoded payload (sign-extended for `Integer`), or the
    /// bit-reinterpreted number if this word is a raw `NUMBER`.
    #[must_use]
    pub fn get_value(self) -> i32 {
        match self.decode() {
            Decoded::Number(n) => n.to_bits() as i32,
            Decoded::Boxed(_, payload) => payload,
        }
    }

    /// True if this word is boxed with exactly the given tag.
    #[must_use]
    pub fn is_tag(self, t: Tag) -> bool {
        self.get_tag() == Some(t)
    }

    /// True if this word is an unboxed `NUMBER`.
    #[must_use]
    pub fn is_number(self) -> bool {
        !self.is_boxed()
    }

    /// Reads this word as a raw number, if it is one.
    #[must_use]
    pub fn as_number(self) -> Option<f32> {
        match self.decode() {
            Decoded::Number(n) => Some(n),
            Decoded::Boxed(..) => None,
        }
    }

    /// True per spec.md §4.9 `branch_if_zero`: `SENTINEL_NIL`,
    /// `INTEGER(0)`, or the number 0.
    #[must_use]
    pub fn is_falsy(self) -> bool {
        match self.decode() {
            Decoded::Number(n) => n == 0.0,
            Decoded::Boxed(Tag::Integer, 0) => true,
            Decoded::Boxed(Tag::Sentinel, 0) => true,
            Decoded::Boxed(..) => false,
        }
    }
}

impl From<f32> for TaggedValue {
    #[inline]
    fn from(value: f32) -> Self {
        Self::from_number(value)
    }
}
