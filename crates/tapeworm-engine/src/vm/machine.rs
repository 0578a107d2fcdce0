// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The bytecode machine.

use std::io::Write;

use crate::Outcome;
use crate::compiler::{Bytecode, CANCELLED, Instruction, OpCode, Operand};
use crate::config::MAX_TAPE_SIZE;
use crate::error::{Error, Result};
use crate::io::{InputEvent, InputSource};
use crate::tape::{Tape, wrap_cell};

/// Deepest the value stack may grow. Compiled code never holds more than a
/// few values at once.
pub const MAX_STACK_DEPTH: usize = 1024;

/// The virtual machine that executes bytecode.
#[derive(Debug, Clone, Default)]
pub struct VM {
    /// The value stack
    stack: Vec<i64>,
    /// Allocated by the entry `NewTape`
    tape: Option<Tape>,
    /// Instruction pointer
    ip: usize,
    /// Set when a `Read` observed cancellation
    cancelled: bool,
}

impl VM {
    /// Creates a new VM with no tape.
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(8),
            tape: None,
            ip: 0,
            cancelled: false,
        }
    }

    /// Executes bytecode from the first instruction.
    ///
    /// Every run starts with an empty stack and no tape; the unit's own entry
    /// code allocates one.
    pub fn execute<I, W>(&mut self, bytecode: &Bytecode, mut input: I, mut output: W) -> Result<Outcome>
    where
        I: InputSource,
        W: Write,
    {
        self.ip = 0;
        self.stack.clear();
        self.tape = None;
        self.cancelled = false;

        while let Some(instruction) = bytecode.instructions.get(self.ip) {
            self.ip += 1;

            match instruction.opcode {
                OpCode::NewTape => {
                    let size = match instruction.operand {
                        Some(Operand::Size(size)) if size > 0 && size <= MAX_TAPE_SIZE => size,
                        other => return Err(bad_operand(instruction, other)),
                    };
                    self.tape = Some(Tape::new(size));
                }

                OpCode::LoadPtr => {
                    let ptr = self.tape()?.pointer() as i64;
                    self.push(ptr)?;
                }
                OpCode::StorePtr => {
                    let value = self.pop()?;
                    self.tape_mut()?.set_pointer(value);
                }
                OpCode::LoadCell => {
                    let cell = i64::from(self.tape()?.get());
                    self.push(cell)?;
                }
                OpCode::StoreCell => {
                    let value = self.pop()?;
                    self.tape_mut()?.store(value);
                }

                OpCode::Const => match instruction.operand {
                    Some(Operand::Int(n)) => self.push(n)?,
                    other => return Err(bad_operand(instruction, other)),
                },
                OpCode::Dup => {
                    let top = *self
                        .stack
                        .last()
                        .ok_or_else(|| Error::Internal("Stack underflow".into()))?;
                    self.push(top)?;
                }

                OpCode::Add => self.binary_op(i64::wrapping_add)?,
                OpCode::Sub => self.binary_op(i64::wrapping_sub)?,
                OpCode::Eq => self.binary_op(|a, b| i64::from(a == b))?,

                OpCode::Write => {
                    let value = self.pop()?;
                    output.write_all(&[wrap_cell(value)])?;
                }
                OpCode::Read => {
                    output.flush()?;
                    let value = match input.next_event()? {
                        InputEvent::Byte(b) => i64::from(b),
                        InputEvent::Cancel => {
                            self.cancelled = true;
                            CANCELLED
                        }
                    };
                    self.push(value)?;
                }

                OpCode::Jump => {
                    self.ip = jump_target(instruction, bytecode.len())?;
                }
                OpCode::JumpIfTrue => {
                    let target = jump_target(instruction, bytecode.len())?;
                    if self.pop()? != 0 {
                        self.ip = target;
                    }
                }

                OpCode::Return => break,
            }
        }

        output.flush()?;
        Ok(if self.cancelled {
            Outcome::Cancelled
        } else {
            Outcome::Halted
        })
    }

    /// The tape left by the last run, if one was allocated.
    pub fn last_tape(&self) -> Option<&Tape> {
        self.tape.as_ref()
    }

    fn tape(&self) -> Result<&Tape> {
        self.tape
            .as_ref()
            .ok_or_else(|| Error::Internal("tape accessed before NewTape".into()))
    }

    fn tape_mut(&mut self) -> Result<&mut Tape> {
        self.tape
            .as_mut()
            .ok_or_else(|| Error::Internal("tape accessed before NewTape".into()))
    }

    fn push(&mut self, value: i64) -> Result<()> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(Error::Internal("Stack overflow".into()));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<i64> {
        self.stack
            .pop()
            .ok_or_else(|| Error::Internal("Stack underflow".into()))
    }

    fn binary_op<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(i64, i64) -> i64,
    {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b))
    }
}

fn jump_target(instruction: &Instruction, len: usize) -> Result<usize> {
    match instruction.operand {
        Some(Operand::Jump(target)) if target < len => Ok(target),
        other => Err(bad_operand(instruction, other)),
    }
}

fn bad_operand(instruction: &Instruction, operand: Option<Operand>) -> Error {
    Error::Internal(format!(
        "invalid operand {:?} for {:?}",
        operand, instruction.opcode
    ))
}
