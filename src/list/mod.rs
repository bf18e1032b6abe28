// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! First-class lists and the `LIST`/`LINK` stack convention (spec.md §4.7).
//!
//! A list of `N` slots occupies `N + 2` contiguous cells when it sits at
//! the top of a stack region: a `LIST(N)` header, `N` element slots, and
//! a `LINK(N+1)` footer. The footer is a runtime-only marker - it lets
//! whole-list `dup`/`drop`/`swap` find the header without scanning, and
//! it is never present on a nested list (nested lists are not at a
//! stack top). All operations here work directly on the data stack
//! region of a [`Stacks`]; the side marker used by `open_list`/
//! `close_list` lives on the return stack, per spec.md §4.7.


use crate::error::VmError;
use crate::memory::DATA_STACK_BASE;
use crate::reference::Reference;
use crate::stack::{Region, Stacks};
use crate::tagged::{Decoded, Tag, TaggedValue};
use crate::types::Cell;

/// Upper bound on the number of elements a single list op will buffer on
/// the Rust call stack, set to the data stack's own cell capacity - a
/// list can never exceed the region it lives in, so this never clips a
/// legal program.
const MAX_LIST_ELEMENTS: usize = crate::memory::DATA_STACK_CELLS as usize;

/// Position of a list block currently at the top of the data stack.
struct TopBlock {
    header: Cell,
    footer: Cell,
    slot_count: u32,
}

fn reverse_cells(stacks: &mut Stacks, start: Cell, end: Cell) -> Result<(), VmError> {
    if start.index() >= end.index() {
        return Ok(());
    }
    let mut lo = start;
    let mut hi = end - 1;
    while lo.index() < hi.index() {
        let a = stacks.memory().read_cell(lo)?;
        let b = stacks.memory().read_cell(hi)?;
        stacks.memory_mut().write_cell(lo, b)?;
        stacks.memory_mut().write_cell(hi, a)?;
        lo = lo.offset(1);
        hi = hi - 1;
    }
    Ok(())
}

/// Length, in cells, of the item whose last cell sits directly below
/// `end` - one cell for a scalar, or `k + 1` (header through footer) for
/// a list block whose `LINK` payload is `k`.
fn item_len_before(stacks: &Stacks, end: Cell) -> Result<u32, VmError> {
    if end.index() <= DATA_STACK_BASE.index() {
        return Err(VmError::StackUnderflow { op: "swap" });
    }
    let last = end - 1;
    let value = stacks.memory().read_cell(last)?;
    match value.decode() {
        Decoded::Boxed(Tag::Link, k) => Ok(k as u32 + 1),
        _ => Ok(1),
    }
}

/// Reads the `LIST`/`LINK` block currently at the top of the data stack.
fn top_list_block(stacks: &Stacks) -> Result<TopBlock, VmError> {
    stacks.ensure(Region::Data, 1, "list")?;
    let footer = stacks.top_cell(Region::Data) - 1;
    let footer_value = stacks.memory().read_cell(footer)?;
    let Decoded::Boxed(Tag::Link, k) = footer_value.decode() else {
        return Err(VmError::TypeError { op: "list" });
    };
    let k = k as u32;
    let header = footer - k;
    let header_value = stacks.memory().read_cell(header)?;
    let Decoded::Boxed(Tag::List, slot_count) = header_value.decode() else {
        return Err(VmError::MalformedList);
    };
    let slot_count = slot_count as u32;
    if k != slot_count + 1 {
        return Err(VmError::MalformedList);
    }
    Ok(TopBlock {
        header,
        footer,
        slot_count,
    })
}

fn push_list(stacks: &mut Stacks, elems: &[TaggedValue]) -> Result<(), VmError> {
    let n = elems.len() as i32;
    stacks.push(Region::Data, TaggedValue::encode(n, Tag::List)?)?;
    for value in elems {
        stacks.push(Region::Data, *value)?;
    }
    stacks.push(Region::Data, TaggedValue::encode(n + 1, Tag::Link)?)?;
    Ok(())
}

/// `open_list`: begin a new list. Pushes a placeholder `LIST(0)` header
/// and records its cell index on the return-stack side marker.
pub fn open_list(stacks: &mut Stacks, list_depth: &mut u32) -> Result<(), VmError> {
    let header = stacks.top_cell(Region::Data);
    stacks.push(Region::Data, TaggedValue::encode(0, Tag::List)?)?;
    stacks.push(Region::Return, Reference::new(header).to_tagged())?;
    *list_depth += 1;
    Ok(())
}

/// `close_list`: finish the innermost open list. Only the outermost
/// close emits a `LINK` footer (spec.md §4.7).
pub fn close_list(stacks: &mut Stacks, list_depth: &mut u32) -> Result<(), VmError> {
    if *list_depth == 0 {
        return Err(VmError::MalformedList);
    }
    let marker = stacks.pop(Region::Return)?;
    let header = Reference::from_tagged(marker)
        .ok_or(VmError::MalformedList)?
        .cell();
    let top = stacks.top_cell(Region::Data);
    if top.index() <= header.index() {
        return Err(VmError::MalformedList);
    }
    let slot_count = (top - header) - 1;
    stacks
        .memory_mut()
        .write_cell(header, TaggedValue::encode(slot_count as i32, Tag::List)?)?;
    *list_depth -= 1;
    if *list_depth == 0 {
        stacks.push(
            Region::Data,
            TaggedValue::encode(slot_count as i32 + 1, Tag::Link)?,
        )?;
    }
    Ok(())
}

/// `dup`: duplicates the stack top, treating a list block as a single
/// unit (spec.md §4.7).
pub fn dup(stacks: &mut Stacks) -> Result<(), VmError> {
    match top_list_block(stacks) {
        Ok(block) => {
            let span = block.footer - block.header;
            for i in 0..span {
                let value = stacks.memory().read_cell(block.header.offset(i))?;
                stacks.push(Region::Data, value)?;
            }
            stacks.push(Region::Data, TaggedValue::encode(span as i32, Tag::Link)?)
        }
        Err(VmError::TypeError { .. }) => {
            let value = stacks.peek(Region::Data, 0)?;
            stacks.push(Region::Data, value)
        }
        Err(e) => Err(e),
    }
}

/// `drop`: pops the stack top, treating a list block as a single unit.
pub fn drop(stacks: &mut Stacks) -> Result<(), VmError> {
    match top_list_block(stacks) {
        Ok(block) => {
            stacks.set_top_cell(Region::Data, block.header);
            Ok(())
        }
        Err(VmError::TypeError { .. }) => stacks.pop(Region::Data).map(|_| ()),
        Err(e) => Err(e),
    }
}

/// `swap`: exchanges the top two stack items, each either a single cell
/// or a whole list block, via three in-place block reversals (DESIGN.md
/// Open Question 2).
pub fn swap(stacks: &mut Stacks) -> Result<(), VmError> {
    let top = stacks.top_cell(Region::Data);
    let len_top = item_len_before(stacks, top)?;
    let mid = top - len_top;
    let len_second = item_len_before(stacks, mid)?;
    let start = mid - len_second;
    reverse_cells(stacks, start, mid)?;
    reverse_cells(stacks, mid, top)?;
    reverse_cells(stacks, start, top)
}

/// `length(list) -> integer`: slot count of the list on top of the data
/// stack, which is popped as a whole block.
pub fn length(stacks: &mut Stacks) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    let result = TaggedValue::encode(block.slot_count as i32, Tag::Integer)?;
    stacks.set_top_cell(Region::Data, block.header);
    stacks.push(Region::Data, result)
}

fn slot_value(stacks: &Stacks, block: &TopBlock, index: i32) -> Result<TaggedValue, VmError> {
    if index < 0 || index as u32 >= block.slot_count {
        return Err(VmError::IndexOutOfRange {
            index,
            len: block.slot_count as i32,
        });
    }
    stacks.memory().read_cell(block.header.offset(1 + index as u32))
}

/// `slot(list, i) -> value`: the raw cell at slot `i`, popping the list
/// as a whole block.
pub fn slot(stacks: &mut Stacks, index: i32) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    let value = slot_value(stacks, &block, index)?;
    stacks.set_top_cell(Region::Data, block.header);
    stacks.push(Region::Data, value)
}

/// `elem(list, i) -> value`: like `slot`, but a nested `LIST` slot
/// yields a reference to the sublist's header rather than the header
/// value itself.
pub fn elem(stacks: &mut Stacks, index: i32) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    if index < 0 || index as u32 >= block.slot_count {
        return Err(VmError::IndexOutOfRange {
            index,
            len: block.slot_count as i32,
        });
    }
    let cell = block.header.offset(1 + index as u32);
    let raw = stacks.memory().read_cell(cell)?;
    let result = if raw.is_tag(Tag::List) {
        Reference::new(cell).to_tagged()
    } else {
        raw
    };
    stacks.set_top_cell(Region::Data, block.header);
    stacks.push(Region::Data, result)
}

/// `head(list) -> value`: the first element, or a reference if it is a
/// nested list (same convention as `elem`).
pub fn head(stacks: &mut Stacks) -> Result<(), VmError> {
    elem(stacks, 0)
}

/// `tail(list) -> list'`: a new list containing slots `1..N`, built by
/// copy.
pub fn tail(stacks: &mut Stacks) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    if block.slot_count == 0 {
        return Err(VmError::IndexOutOfRange { index: 0, len: 0 });
    }
    let new_len = (block.slot_count - 1) as usize;
    let mut buf = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..new_len {
        buf[i] = stacks
            .memory()
            .read_cell(block.header.offset(2 + i as u32))?;
    }
    stacks.set_top_cell(Region::Data, block.header);
    push_list(stacks, &buf[..new_len])
}

/// `reverse(list) -> list'`: reverses the element range in place; the
/// header and footer positions are unchanged.
pub fn reverse(stacks: &mut Stacks) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    reverse_cells(stacks, block.header.offset(1), block.footer)
}

/// `concat(a, b) -> c`: a new list of size `Na + Nb`, with `a`'s slots
/// followed by `b`'s.
pub fn concat(stacks: &mut Stacks) -> Result<(), VmError> {
    let top = top_list_block(stacks)?;
    let mut buf_top = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..top.slot_count as usize {
        buf_top[i] = stacks.memory().read_cell(top.header.offset(1 + i as u32))?;
    }
    stacks.set_top_cell(Region::Data, top.header);

    let bottom = top_list_block(stacks)?;
    let mut buf_bottom = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..bottom.slot_count as usize {
        buf_bottom[i] = stacks
            .memory()
            .read_cell(bottom.header.offset(1 + i as u32))?;
    }
    stacks.set_top_cell(Region::Data, bottom.header);

    let total = bottom.slot_count as usize + top.slot_count as usize;
    if total > MAX_LIST_ELEMENTS {
        return Err(VmError::StackOverflow { op: "concat" });
    }
    let mut combined = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    combined[..bottom.slot_count as usize].copy_from_slice(&buf_bottom[..bottom.slot_count as usize]);
    combined[bottom.slot_count as usize..total].copy_from_slice(&buf_top[..top.slot_count as usize]);
    push_list(stacks, &combined[..total])
}

/// `pack(n) -> list`: wraps the top `n` scalars into a list, oldest
/// pushed becoming slot 1.
pub fn pack(stacks: &mut Stacks, n: u32) -> Result<(), VmError> {
    if n as usize > MAX_LIST_ELEMENTS {
        return Err(VmError::StackOverflow { op: "pack" });
    }
    stacks.ensure(Region::Data, n, "pack")?;
    let top = stacks.top_cell(Region::Data);
    let start = top - n;
    let mut buf = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..n as usize {
        buf[i] = stacks.memory().read_cell(start.offset(i as u32))?;
    }
    stacks.set_top_cell(Region::Data, start);
    push_list(stacks, &buf[..n as usize])
}

/// `unpack(list) -> values...`: pushes each slot in order, dropping the
/// header and footer.
pub fn unpack(stacks: &mut Stacks) -> Result<(), VmError> {
    let block = top_list_block(stacks)?;
    let mut buf = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..block.slot_count as usize {
        buf[i] = stacks
            .memory()
            .read_cell(block.header.offset(1 + i as u32))?;
    }
    stacks.set_top_cell(Region::Data, block.header);
    for value in &buf[..block.slot_count as usize] {
        stacks.push(Region::Data, *value)?;
    }
    Ok(())
}

/// `transfer(list, target)`: moves the list on top of the data stack
/// into `target`, omitting the `LINK` footer when `target` is
/// [`Region::Global`] (globals are not stack-top structures). Returns a
/// reference to the destination header.
pub fn transfer(stacks: &mut Stacks, target: Region) -> Result<Reference, VmError> {
    let block = top_list_block(stacks)?;
    let n = block.slot_count;
    let header_value = stacks.memory().read_cell(block.header)?;
    let mut buf = [TaggedValue::NIL; MAX_LIST_ELEMENTS];
    for i in 0..n as usize {
        buf[i] = stacks
            .memory()
            .read_cell(block.header.offset(1 + i as u32))?;
    }
    stacks.set_top_cell(Region::Data, block.header);

    let needed = if matches!(target, Region::Global) { n + 1 } else { n + 2 };
    let dest_header = stacks.advance(target, needed, "transfer")?;
    stacks.memory_mut().write_cell(dest_header, header_value)?;
    for i in 0..n as usize {
        stacks
            .memory_mut()
            .write_cell(dest_header.offset(1 + i as u32), buf[i])?;
    }
    if !matches!(target, Region::Global) {
        stacks.memory_mut().write_cell(
            dest_header.offset(1 + n),
            TaggedValue::encode(n as i32 + 1, Tag::Link)?,
        )?;
    }
    Ok(Reference::new(dest_header))
}
