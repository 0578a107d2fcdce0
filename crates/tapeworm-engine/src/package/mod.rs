// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Packaging of emitted bytecode.
//!
//! A [`CompiledUnit`] is the in-process form: linked bytecode behind a single
//! `execute` entry point. The [`artifact`] module persists the same bytecode
//! as a stand-alone file and loads it back.

pub mod artifact;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Outcome;
use crate::compiler::Bytecode;
use crate::error::Result;
use crate::io::InputSource;
use crate::vm::VM;

pub use artifact::ARTIFACT_EXTENSION;

/// Compiled program, ready to run any number of times.
///
/// Cloning is cheap; clones share the bytecode.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    bytecode: Arc<Bytecode>,
}

impl CompiledUnit {
    /// Wrap linked bytecode.
    pub fn new(bytecode: Bytecode) -> Self {
        Self {
            bytecode: Arc::new(bytecode),
        }
    }

    /// Load a persisted artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        artifact::read(path.as_ref()).map(Self::new)
    }

    /// Run the unit on a fresh tape.
    pub fn execute<I, W>(&self, input: I, output: W) -> Result<Outcome>
    where
        I: InputSource,
        W: Write,
    {
        VM::new().execute(&self.bytecode, input, output)
    }

    /// Persist to exactly `destination`, returning the absolute path.
    pub fn save(&self, destination: impl AsRef<Path>) -> Result<PathBuf> {
        artifact::write(&self.bytecode, destination.as_ref())
    }

    /// The linked bytecode.
    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    /// Cells allocated per run.
    pub fn tape_size(&self) -> usize {
        self.bytecode.tape_size().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::io::ScriptedInput;
    use crate::program::Program;

    #[test]
    fn test_execute_repeatedly() {
        let bytecode = Compiler::new(10)
            .compile(&Program::from_source(",+."))
            .unwrap();
        let unit = CompiledUnit::new(bytecode);
        assert_eq!(unit.tape_size(), 10);

        for byte in [b'a', b'x'] {
            let mut out = Vec::new();
            let outcome = unit
                .execute(ScriptedInput::from_bytes(&[byte]), &mut out)
                .unwrap();
            assert_eq!(outcome, Outcome::Halted);
            assert_eq!(out, vec![byte + 1]);
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let bytecode = Compiler::new(10)
            .compile(&Program::from_source("+++."))
            .unwrap();
        let unit = CompiledUnit::new(bytecode);

        let path = unit.save(dir.path().join("three.twx")).unwrap();
        assert!(path.is_absolute());

        let loaded = CompiledUnit::load(&path).unwrap();
        assert_eq!(loaded.bytecode(), unit.bytecode());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let unit = CompiledUnit::new(Compiler::new(1).compile(&Program::default()).unwrap());
        let err = unit.save(dir.path().join("nope").join("x.twx")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
