// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The direct interpreter.
//!
//! Walks the instruction pointer over the source characters and acts on the
//! tape. Loops are resolved by scanning for the matching bracket every time
//! one is taken; nothing is precomputed.

use std::io::Write;

use tracing::debug;

use crate::Outcome;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::io::{InputEvent, InputSource};
use crate::program::{Op, Program};
use crate::tape::Tape;

/// Lifecycle of an [`Interpreter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing loaded
    Idle,
    /// Program loaded, tape blank
    Loaded,
    /// Inside `execute`
    Running,
    /// Ran off the end of the program
    Halted,
    /// Stopped by a cancellation event at `,`
    Cancelled,
}

/// Direct-execution engine holding one tape and one program.
#[derive(Debug, Clone)]
pub struct Interpreter {
    config: EngineConfig,
    tape: Tape,
    program: Vec<char>,
    ip: usize,
    state: State,
}

impl Interpreter {
    /// Creates an interpreter with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tape: Tape::new(config.tape_size),
            program: Vec::with_capacity(config.program_buffer_size),
            ip: 0,
            state: State::Idle,
        })
    }

    /// The configuration this interpreter was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Zero the tape, drop the program and return to `Idle`.
    pub fn reset(&mut self) {
        self.tape.clear();
        self.program.clear();
        self.ip = 0;
        self.state = State::Idle;
    }

    /// Reset, then store `source` for execution.
    ///
    /// Fails without touching the current state if the program does not fit
    /// the source buffer or has an unmatched bracket.
    pub fn load(&mut self, source: &str) -> Result<()> {
        let program = Program::from_source(source);

        if program.len() > self.config.program_buffer_size {
            return Err(Error::ProgramTooLarge {
                len: program.len(),
                capacity: self.config.program_buffer_size,
            });
        }
        check_balance(&program)?;

        self.reset();
        self.program.extend_from_slice(program.chars());
        self.state = State::Loaded;

        debug!(chars = self.program.len(), "interpreter loaded program");
        Ok(())
    }

    /// Run from the current instruction until the program ends or input
    /// cancels.
    pub fn execute<I, W>(&mut self, mut input: I, mut output: W) -> Result<Outcome>
    where
        I: InputSource,
        W: Write,
    {
        if self.state == State::Idle {
            return Err(Error::NotLoaded);
        }

        self.state = State::Running;
        match self.run(&mut input, &mut output) {
            Ok(outcome) => {
                self.state = match outcome {
                    Outcome::Halted => State::Halted,
                    Outcome::Cancelled => State::Cancelled,
                };
                Ok(outcome)
            }
            Err(e) => {
                self.state = State::Loaded;
                Err(e)
            }
        }
    }

    fn run<I: InputSource, W: Write>(&mut self, input: &mut I, output: &mut W) -> Result<Outcome> {
        while self.ip < self.program.len() {
            match Op::decode(self.program[self.ip]) {
                Some(Op::Right) => self.tape.right(),
                Some(Op::Left) => self.tape.left(),
                Some(Op::Increment) => self.tape.increment(),
                Some(Op::Decrement) => self.tape.decrement(),
                Some(Op::Output) => output.write_all(&[self.tape.get()])?,
                Some(Op::Input) => {
                    output.flush()?;
                    match input.next_event()? {
                        InputEvent::Cancel => return Ok(Outcome::Cancelled),
                        InputEvent::Byte(b) => self.tape.set(b),
                    }
                }
                Some(Op::LoopOpen) => {
                    if self.tape.get() == 0 {
                        self.ip = self.find_close()?;
                    }
                }
                Some(Op::LoopClose) => {
                    if self.tape.get() != 0 {
                        self.ip = self.find_open()?;
                    }
                }
                None => {}
            }

            self.ip += 1;
        }

        output.flush()?;
        Ok(Outcome::Halted)
    }

    /// Scan forward from the `[` at `ip` to its `]`.
    fn find_close(&self) -> Result<usize> {
        let mut depth = 1u32;
        let mut pos = self.ip;

        while depth > 0 {
            pos += 1;
            match self.program.get(pos).copied() {
                Some('[') => depth += 1,
                Some(']') => depth -= 1,
                Some(_) => {}
                None => return Err(Error::malformed(self.ip, '[')),
            }
        }

        Ok(pos)
    }

    /// Scan backward from the `]` at `ip` to its `[`.
    fn find_open(&self) -> Result<usize> {
        let mut depth = 1u32;
        let mut pos = self.ip;

        while depth > 0 {
            if pos == 0 {
                return Err(Error::malformed(self.ip, ']'));
            }
            pos -= 1;
            match self.program[pos] {
                ']' => depth += 1,
                '[' => depth -= 1,
                _ => {}
            }
        }

        Ok(pos)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The tape, for inspection.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Current instruction pointer.
    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    /// Length of the loaded program in characters.
    pub fn program_len(&self) -> usize {
        self.program.len()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            config,
            tape: Tape::new(config.tape_size),
            program: Vec::with_capacity(config.program_buffer_size),
            ip: 0,
            state: State::Idle,
        }
    }
}

/// Depth count over the whole program, reporting the first unmatched bracket.
fn check_balance(program: &Program) -> Result<()> {
    let mut open = Vec::new();

    for (pos, op) in program.ops() {
        match op {
            Op::LoopOpen => open.push(pos),
            Op::LoopClose => {
                if open.pop().is_none() {
                    return Err(Error::malformed(pos, ']'));
                }
            }
            _ => {}
        }
    }

    match open.first() {
        Some(&pos) => Err(Error::malformed(pos, '[')),
        None => Ok(()),
    }
}
