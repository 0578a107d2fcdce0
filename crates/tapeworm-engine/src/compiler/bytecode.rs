// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bytecode definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value pushed by [`OpCode::Read`] when input is cancelled.
pub const CANCELLED: i64 = -1;

/// A compiled bytecode chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bytecode {
    /// The instructions
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    /// Creates a new empty bytecode chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Tape size requested by the entry `NewTape`, if present.
    pub fn tape_size(&self) -> Option<usize> {
        match self.instructions.first() {
            Some(Instruction {
                opcode: OpCode::NewTape,
                operand: Some(Operand::Size(size)),
            }) => Some(*size),
            _ => None,
        }
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{index:05}  {instruction}")?;
        }
        Ok(())
    }
}

/// A single bytecode instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation code
    pub opcode: OpCode,
    /// Optional operand
    pub operand: Option<Operand>,
}

impl Instruction {
    /// Creates a new instruction with no operand.
    pub fn simple(opcode: OpCode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    /// Creates a new instruction with an operand.
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    /// Push an integer constant.
    pub fn constant(value: i64) -> Self {
        Self::with_operand(OpCode::Const, Operand::Int(value))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            None => write!(f, "{:?}", self.opcode),
            Some(operand) => write!(f, "{:<11} {}", format!("{:?}", self.opcode), operand),
        }
    }
}

/// Instruction operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Integer constant
    Int(i64),
    /// Cell count for `NewTape`
    Size(usize),
    /// Symbolic branch target, only present before linking
    Label(usize),
    /// Resolved branch target (absolute instruction index)
    Jump(usize),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{n}"),
            Operand::Size(n) => write!(f, "{n}"),
            Operand::Label(l) => write!(f, "L{l}"),
            Operand::Jump(t) => write!(f, "@{t:05}"),
        }
    }
}

/// Operation codes for the VM.
///
/// The machine has a value stack of integers, one tape and one memory
/// pointer. Stores wrap: cells modulo 256, the pointer modulo capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// Allocate a zeroed tape of `Size` cells and reset the pointer
    NewTape,

    // Pointer and cell access
    /// Push the memory pointer
    LoadPtr,
    /// Pop into the memory pointer
    StorePtr,
    /// Push the current cell
    LoadCell,
    /// Pop into the current cell
    StoreCell,

    // Stack operations
    /// Push an `Int` constant
    Const,
    /// Duplicate the top value
    Dup,

    // Arithmetic
    /// Add top two values
    Add,
    /// Subtract top from second
    Sub,
    /// Push 1 if top two values are equal, else 0
    Eq,

    // I/O
    /// Pop a value and write it as one byte
    Write,
    /// Block for input; push the byte or [`CANCELLED`]
    Read,

    // Control flow
    /// Unconditional jump
    Jump,
    /// Pop; jump if non-zero
    JumpIfTrue,
    /// Stop execution
    Return,
}

impl OpCode {
    /// Returns true for branch instructions.
    pub fn is_branch(self) -> bool {
        matches!(self, OpCode::Jump | OpCode::JumpIfTrue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_returns_index() {
        let mut bytecode = Bytecode::new();
        assert_eq!(bytecode.emit(Instruction::simple(OpCode::LoadCell)), 0);
        assert_eq!(bytecode.emit(Instruction::constant(1)), 1);
        assert_eq!(bytecode.len(), 2);
    }

    #[test]
    fn test_tape_size() {
        let mut bytecode = Bytecode::new();
        assert_eq!(bytecode.tape_size(), None);
        bytecode.emit(Instruction::with_operand(OpCode::NewTape, Operand::Size(64)));
        assert_eq!(bytecode.tape_size(), Some(64));
    }

    #[test]
    fn test_listing() {
        let mut bytecode = Bytecode::new();
        bytecode.emit(Instruction::constant(-1));
        bytecode.emit(Instruction::with_operand(OpCode::JumpIfTrue, Operand::Jump(2)));
        bytecode.emit(Instruction::simple(OpCode::Return));
        let listing = bytecode.to_string();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "00000  Const       -1");
        assert_eq!(lines[1], "00001  JumpIfTrue  @00002");
        assert_eq!(lines[2], "00002  Return");
    }
}
