// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Code generation from source operators to bytecode.
//!
//! This module contains the `Compiler` which makes one forward pass over a
//! [`Program`], emitting a fixed instruction sequence per operator. Loop
//! brackets become labels and branches placed with the precomputed
//! [`JumpTable`]; labels are resolved to instruction indices at the end.

mod labels;


pub use labels::{Label, Labels};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::Error;
use crate::compiler::bytecode::{Bytecode, CANCELLED, Instruction, OpCode, Operand};
use crate::config::DEFAULT_TAPE_SIZE;
use crate::jump_table::JumpTable;
use crate::program::{Op, Program};

/// A bracket's own label and the source position of its match.
#[derive(Debug, Clone, Copy)]
pub struct JumpMarker {
    /// Marked at this bracket's position in the output
    pub label: Label,
    /// Source position of the matching bracket
    pub target: usize,
}

/// Compiles source programs to bytecode.
pub struct Compiler {
    /// The bytecode being generated
    pub bytecode: Bytecode,
    /// Branch targets defined so far
    labels: Labels,
    /// Cells allocated by the entry code
    tape_size: usize,
}

impl Compiler {
    /// Creates a compiler whose output allocates `tape_size` cells.
    pub fn new(tape_size: usize) -> Self {
        Self {
            bytecode: Bytecode::new(),
            labels: Labels::new(),
            tape_size,
        }
    }

    // ========================================================================
    // Main Compilation Entry Point
    // ========================================================================

    /// Compiles a program to linked bytecode.
    ///
    /// Bracket matching runs before anything is emitted, so a malformed
    /// program leaves the compiler empty.
    pub fn compile(&mut self, program: &Program) -> Result<Bytecode, Error> {
        let jump_table = JumpTable::build(program)?;

        self.bytecode = Bytecode::new();
        self.labels = Labels::new();

        let markers = self.define_markers(&jump_table);
        let exit = self.labels.define();

        // Entry: allocate the tape
        self.emit(Instruction::with_operand(
            OpCode::NewTape,
            Operand::Size(self.tape_size),
        ));

        for (pos, op) in program.ops() {
            self.compile_op(pos, op, &markers, exit)?;
        }

        // Shared exit
        self.mark(exit);
        self.emit(Instruction::simple(OpCode::Return));

        self.link()?;

        debug!(
            source_chars = program.len(),
            instructions = self.bytecode.len(),
            labels = self.labels.len(),
            "compiled program"
        );

        Ok(std::mem::take(&mut self.bytecode))
    }

    /// One label per bracket, keyed by source position.
    fn define_markers(&mut self, jump_table: &JumpTable) -> FxHashMap<usize, JumpMarker> {
        let mut positions: Vec<_> = jump_table.iter().collect();
        positions.sort_unstable();

        positions
            .into_iter()
            .map(|(pos, target)| {
                let label = self.labels.define();
                (pos, JumpMarker { label, target })
            })
            .collect()
    }

    // ========================================================================
    // Instruction Selection
    // ========================================================================

    fn compile_op(
        &mut self,
        pos: usize,
        op: Op,
        markers: &FxHashMap<usize, JumpMarker>,
        exit: Label,
    ) -> Result<(), Error> {
        match op {
            Op::Right => self.compile_pointer_step(OpCode::Add),
            Op::Left => self.compile_pointer_step(OpCode::Sub),
            Op::Increment => self.compile_cell_step(OpCode::Add),
            Op::Decrement => self.compile_cell_step(OpCode::Sub),

            Op::Output => {
                self.emit(Instruction::simple(OpCode::LoadCell));
                self.emit(Instruction::simple(OpCode::Write));
            }

            Op::Input => {
                // Read, bail out to the exit on cancellation, else store
                self.emit(Instruction::simple(OpCode::Read));
                self.emit(Instruction::simple(OpCode::Dup));
                self.emit(Instruction::constant(CANCELLED));
                self.emit(Instruction::simple(OpCode::Eq));
                self.emit_branch(OpCode::JumpIfTrue, exit);
                self.emit(Instruction::simple(OpCode::StoreCell));
            }

            Op::LoopOpen => {
                let marker = Self::marker(markers, pos)?;
                let close = Self::marker(markers, marker.target)?;

                self.mark(marker.label);
                self.emit(Instruction::simple(OpCode::LoadCell));
                self.emit(Instruction::constant(0));
                self.emit(Instruction::simple(OpCode::Eq));
                self.emit_branch(OpCode::JumpIfTrue, close.label);
            }

            Op::LoopClose => {
                let marker = Self::marker(markers, pos)?;
                let open = Self::marker(markers, marker.target)?;

                self.emit_branch(OpCode::Jump, open.label);
                self.mark(marker.label);
            }
        }

        Ok(())
    }

    /// `ptr = ptr <op> 1`
    fn compile_pointer_step(&mut self, op: OpCode) {
        self.emit(Instruction::simple(OpCode::LoadPtr));
        self.emit(Instruction::constant(1));
        self.emit(Instruction::simple(op));
        self.emit(Instruction::simple(OpCode::StorePtr));
    }

    /// `tape[ptr] = tape[ptr] <op> 1`
    fn compile_cell_step(&mut self, op: OpCode) {
        self.emit(Instruction::simple(OpCode::LoadCell));
        self.emit(Instruction::constant(1));
        self.emit(Instruction::simple(op));
        self.emit(Instruction::simple(OpCode::StoreCell));
    }

    fn marker(markers: &FxHashMap<usize, JumpMarker>, pos: usize) -> Result<JumpMarker, Error> {
        markers
            .get(&pos)
            .copied()
            .ok_or_else(|| Error::Internal(format!("no jump marker at position {pos}")))
    }

    // ========================================================================
    // Emission and Linking
    // ========================================================================

    /// Emit an instruction and return its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        self.bytecode.emit(instruction)
    }

    /// Emit a branch to a label that may be marked later.
    pub fn emit_branch(&mut self, opcode: OpCode, label: Label) -> usize {
        self.emit(Instruction::with_operand(opcode, Operand::Label(label.0)))
    }

    /// Bind `label` to the next instruction to be emitted.
    pub fn mark(&mut self, label: Label) {
        self.labels.mark(label, self.bytecode.len());
    }

    /// Replace every symbolic target with its instruction index.
    fn link(&mut self) -> Result<(), Error> {
        for instruction in &mut self.bytecode.instructions {
            if let Some(Operand::Label(l)) = instruction.operand {
                let target = self.labels.resolve(Label(l))?;
                instruction.operand = Some(Operand::Jump(target));
            }
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_SIZE)
    }
}
