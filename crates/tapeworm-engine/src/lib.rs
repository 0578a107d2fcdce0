// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # tapeworm-engine
//!
//! Two execution engines for the eight-instruction tape language.
//!
//! ## Overview
//!
//! - [`Interpreter`]: walks the source directly, scanning for the matching
//!   bracket every time a loop is entered or repeated
//! - [`Translator`]: builds a [`JumpTable`] once, emits bytecode with
//!   labels and branches, and packages it as a [`CompiledUnit`] that runs on
//!   the [`vm::VM`] or is persisted as a stand-alone artifact
//!
//! Both engines share one memory model ([`tape`]): 8-bit wrapping cells and
//! a memory pointer that wraps around the tape.
//!
//! ## Quick Start
//!
//! ```rust
//! use tapeworm_engine::{Engine, Mode, Outcome, ScriptedInput};
//!
//! let mut engine = Engine::new(Mode::Translate);
//! let mut out = Vec::new();
//! let outcome = engine.run("++++++++[>++++++++<-]>+.", ScriptedInput::empty(), &mut out)?;
//! assert_eq!(outcome, Outcome::Halted);
//! assert_eq!(out, b"A");
//! # Ok::<(), tapeworm_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod jump_table;
pub mod package;
pub mod program;
pub mod tape;
pub mod translator;
pub mod vm;

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Re-exports for convenience
#[cfg(feature = "parallel")]
pub use concurrent::ParallelTranslator;
pub use concurrent::SharedInterpreter;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use interpreter::{Interpreter, State};
pub use io::{InputEvent, InputSource, ReaderInput, ScriptedInput};
pub use jump_table::JumpTable;
pub use package::CompiledUnit;
pub use program::{Op, Program};
pub use translator::{Translator, TranslatorBuilder};

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Execution ran past the last instruction
    Halted,
    /// A cancellation event arrived at `,`
    Cancelled,
}

/// Which engine runs a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Direct interpretation
    Interpret,
    /// Translate to bytecode, then execute the unit
    #[default]
    Translate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Interpret => write!(f, "interpret"),
            Mode::Translate => write!(f, "translate"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "i" | "interpret" | "interpreter" => Ok(Mode::Interpret),
            "1" | "t" | "translate" | "translator" => Ok(Mode::Translate),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Both engines behind one entry point.
///
/// Encapsulates an interpreter and a translator built from the same
/// configuration and dispatches each program to the selected one.
#[derive(Debug, Clone)]
pub struct Engine {
    mode: Mode,
    interpreter: Interpreter,
    translator: Translator,
}

impl Engine {
    /// Creates an engine with default configuration.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            interpreter: Interpreter::default(),
            translator: Translator::default(),
        }
    }

    /// Creates an engine whose interpreter and translator share `config`.
    ///
    /// `output_directory` resolves relative artifact names; `None` keeps the
    /// current directory.
    pub fn with_config(
        mode: Mode,
        config: EngineConfig,
        output_directory: Option<PathBuf>,
    ) -> Result<Self> {
        let mut builder = Translator::builder().with_tape_size(config.tape_size);
        if let Some(dir) = output_directory {
            builder = builder.output_directory(dir);
        }

        Ok(Self {
            mode,
            interpreter: Interpreter::new(config)?,
            translator: builder.build()?,
        })
    }

    /// The active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch engines.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// The translator, for persisting artifacts.
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// The interpreter, for inspection.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Runs `source` with the active engine.
    ///
    /// # Arguments
    ///
    /// * `source` - Program text; non-operator characters are comments
    /// * `input` - Events consumed by `,`
    /// * `output` - Receives one byte per `.`
    pub fn run<I, W>(&mut self, source: &str, input: I, output: W) -> Result<Outcome>
    where
        I: InputSource,
        W: Write,
    {
        match self.mode {
            Mode::Interpret => {
                self.interpreter.load(source)?;
                self.interpreter.execute(input, output)
            }
            Mode::Translate => self.translator.translate(source)?.execute(input, output),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}
