// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Single-pass compile driver: walks a token stream, resolving names
//! through [`Dictionary`] and emitting bytecode through [`Compiler`]
//! (SPEC_FULL.md §B.1).
//!
//! There is no intermediate AST. A `(` either opens a `locals:` clause
//! (only recognized directly after a definition's name) or a list
//! literal; both are resolved as they are seen, the same way the
//! compiler resolves a word the moment its token is read.

#[cfg(any(test, feature = "std"))]
use std::vec::Vec;

#[cfg(not(any(test, feature = "std")))]
use alloc::vec::Vec;

use crate::bytecode::op;
use crate::compiler::{Compiler, FIRST_USER_ADDR, LocalScope};
use crate::dictionary::{Binding, Dictionary};
use crate::error::{CompileError, VmError};
use crate::memory::Memory;
use crate::reader::lexer::{LexError, Lexer, Token};
use crate::tagged::{Decoded, Tag, TaggedValue};

/// Either half of reading a program can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// A lexical error.
    Lex(LexError),
    /// A compile-time error (undefined word, malformed definition, ...).
    Compile(CompileError),
}

impl From<LexError> for ReadError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<CompileError> for ReadError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

impl From<VmError> for ReadError {
    fn from(_: VmError) -> Self {
        Self::Compile(CompileError::UnexpectedToken)
    }
}

/// Seeds a fresh [`Dictionary`] with every builtin word (SPEC_FULL.md
/// §B.3), so a program can call `+`, `dup`, `fetch`, and so on without
/// the host wiring each one up by hand.
#[must_use]
pub fn bootstrap_dictionary() -> Dictionary {
    let mut dict = Dictionary::new();
    for &(name, opcode) in crate::builtins::BUILTINS {
        let code = TaggedValue::encode(i32::from(opcode), Tag::Code)
            .expect("builtin opcode always fits CODE's payload");
        dict.define(name, Binding::Code(code), false);
    }
    dict
}

/// Tokenizes `source` in full, for lookahead-free recursive descent.
fn tokenize(source: &str) -> Result<Vec<Token>, ReadError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

/// Compiles a call to a dictionary word already resolved to a binding.
fn emit_binding(compiler: &mut Compiler<'_>, binding: Binding) -> Result<(), CompileError> {
    match binding {
        Binding::Local(slot) => compiler.emit_var_ref(slot),
        Binding::Code(value) => match value.decode() {
            Decoded::Boxed(Tag::Code, payload) if (0..128).contains(&payload) => {
                compiler.emit_opcode(payload as u8)
            }
            Decoded::Boxed(Tag::Code, payload) => compiler.emit_call(payload as u16),
            _ => Err(CompileError::UnexpectedToken),
        },
    }
}

/// Compiles one word reference, consulting `dict`.
fn compile_word(
    compiler: &mut Compiler<'_>,
    dict: &Dictionary,
    name: &str,
) -> Result<(), ReadError> {
    let binding = dict.lookup(name).ok_or(CompileError::UndefinedWord)?;
    emit_binding(compiler, binding)?;
    Ok(())
}

/// Compiles a sequence of tokens up to (but not including) a terminator
/// predicate, returning the index just past the terminator.
fn compile_body(
    compiler: &mut Compiler<'_>,
    dict: &mut Dictionary,
    tokens: &[Token],
    mut i: usize,
    stop_at_semicolon: bool,
) -> Result<usize, ReadError> {
    while i < tokens.len() {
        match &tokens[i] {
            Token::Semicolon if stop_at_semicolon => return Ok(i + 1),
            Token::Int(n) => {
                let value = TaggedValue::encode(*n, Tag::Integer)?;
                compiler.emit_literal(value)?;
                i += 1;
            }
            Token::LParen => {
                compiler.emit_open_list()?;
                i = compile_list_body(compiler, dict, tokens, i + 1)?;
                compiler.emit_close_list()?;
            }
            Token::RParen => return Err(ReadError::Compile(CompileError::UnexpectedToken)),
            Token::Colon => {
                i = compile_definition(compiler, dict, tokens, i + 1)?;
            }
            Token::Semicolon => return Err(ReadError::Compile(CompileError::UnexpectedToken)),
            Token::Word(name) => {
                compile_word(compiler, dict, name)?;
                i += 1;
            }
        }
    }
    if stop_at_semicolon {
        Err(ReadError::Compile(CompileError::UnexpectedEnd))
    } else {
        Ok(i)
    }
}

/// Compiles the elements of a list literal up to its matching `)`.
fn compile_list_body(
    compiler: &mut Compiler<'_>,
    dict: &mut Dictionary,
    tokens: &[Token],
    mut i: usize,
) -> Result<usize, ReadError> {
    loop {
        let Some(tok) = tokens.get(i) else {
            return Err(ReadError::Compile(CompileError::UnexpectedEnd));
        };
        match tok {
            Token::RParen => return Ok(i + 1),
            Token::Int(n) => {
                let value = TaggedValue::encode(*n, Tag::Integer)?;
                compiler.emit_literal(value)?;
                i += 1;
            }
            Token::LParen => {
                compiler.emit_open_list()?;
                i = compile_list_body(compiler, dict, tokens, i + 1)?;
                compiler.emit_close_list()?;
            }
            Token::Word(name) => {
                compile_word(compiler, dict, name)?;
                i += 1;
            }
            Token::Colon | Token::Semicolon => {
                return Err(ReadError::Compile(CompileError::UnexpectedToken));
            }
        }
    }
}

/// Reads a `( locals: a b c )` clause, if one appears at `i`. Returns
/// the declared names and the index just past the clause (or `i`
/// itself, unchanged, if no such clause is present).
fn read_locals_clause<'t>(
    tokens: &'t [Token],
    i: usize,
) -> Result<(Vec<&'t str>, usize), ReadError> {
    let is_locals_clause = matches!(tokens.get(i), Some(Token::LParen))
        && matches!(tokens.get(i + 1), Some(Token::Word(w)) if w == "locals:");
    if !is_locals_clause {
        return Ok((Vec::new(), i));
    }
    let mut names = Vec::new();
    let mut j = i + 2;
    loop {
        match tokens.get(j) {
            Some(Token::Word(name)) => {
                names.push(name.as_str());
                j += 1;
            }
            Some(Token::RParen) => return Ok((names, j + 1)),
            _ => return Err(ReadError::Compile(CompileError::UnexpectedToken)),
        }
    }
}

/// Compiles a `: name ( locals: ... ) body ;` definition starting just
/// after the `:`, defining `name` in `dict` before compiling the body
/// so self-recursive calls resolve. Returns the index just past `;`.
///
/// A definition is compiled inline, wherever its `:` appears among
/// other tokens, so it always leads with a `BRANCH` over its own body
/// (SPEC_FULL.md §B.1) - otherwise sequential execution reaching that
/// address from the top level, or from an enclosing definition, would
/// fall straight into the body instead of calling it.
fn compile_definition(
    compiler: &mut Compiler<'_>,
    dict: &mut Dictionary,
    tokens: &[Token],
    i: usize,
) -> Result<usize, ReadError> {
    let Some(Token::Word(name)) = tokens.get(i) else {
        return Err(ReadError::Compile(CompileError::UnexpectedToken));
    };
    let (locals, mut i) = read_locals_clause(tokens, i + 1)?;

    let skip = compiler.emit_branch(op::BRANCH)?;

    let entry = compiler.ip();
    let code = TaggedValue::encode(entry as i32, Tag::Code)?;
    dict.define(name, Binding::Code(code), false);

    let checkpoint = dict.mark();
    let mut scope = LocalScope::new();
    for local_name in &locals {
        let slot = scope.declare(local_name);
        dict.define(local_name, Binding::Local(slot), false);
    }
    if !locals.is_empty() {
        compiler.emit_reserve_locals(scope.len())?;
    }

    i = compile_body(compiler, dict, tokens, i, true)?;
    compiler.emit_ret()?;
    dict.forget(checkpoint);
    compiler.patch_here(skip)?;
    Ok(i)
}

/// Compiles an entire program's top-level token stream into `memory`,
/// starting definitions at [`FIRST_USER_ADDR`] and emitting a final
/// `ret` so the interpreter halts cleanly when it reaches the end
/// (SPEC_FULL.md §B.1). Returns the byte address execution should
/// start from.
///
/// # Errors
///
/// Returns a [`ReadError`] on any lexical or compile-time failure.
pub fn read(source: &str, memory: &mut Memory, dict: &mut Dictionary) -> Result<u32, ReadError> {
    let tokens = tokenize(source)?;
    let mut compiler = Compiler::at(memory, FIRST_USER_ADDR);
    let entry = compiler.ip();
    compile_body(&mut compiler, dict, &tokens, 0, false)?;
    compiler.emit_ret()?;
    Ok(entry)
}
