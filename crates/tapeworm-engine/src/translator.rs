// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Ahead-of-time translation: source to packaged bytecode.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::compiler::{Bytecode, Compiler};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::package::{CompiledUnit, artifact};
use crate::program::Program;

/// Translates programs into [`CompiledUnit`]s or persisted artifacts.
#[derive(Debug, Clone)]
pub struct Translator {
    tape_size: usize,
    output_directory: PathBuf,
}

impl Translator {
    /// Translator with `config`'s tape size, writing into the current
    /// directory.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::builder().with_tape_size(config.tape_size).build()
    }

    /// Start configuring a translator.
    pub fn builder() -> TranslatorBuilder {
        TranslatorBuilder::default()
    }

    /// Cells allocated by every unit this translator produces.
    pub fn tape_size(&self) -> usize {
        self.tape_size
    }

    /// Where relative artifact destinations are resolved.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Emit linked bytecode without packaging it.
    pub fn emit(&self, source: &str) -> Result<Bytecode> {
        let program = Program::from_source(source);
        Compiler::new(self.tape_size).compile(&program)
    }

    /// Translate into an in-process unit.
    pub fn translate(&self, source: &str) -> Result<CompiledUnit> {
        self.emit(source).map(CompiledUnit::new)
    }

    /// Translate and persist to `destination`, returning the absolute path.
    ///
    /// Relative destinations resolve against the output directory; the
    /// artifact extension is added when the name has none.
    pub fn translate_to(&self, source: &str, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let bytecode = self.emit(source)?;
        let path = self.resolve_destination(destination.as_ref());
        debug!(path = %path.display(), "persisting translated program");
        artifact::write(&bytecode, &path)
    }

    /// Final location for an artifact named `destination`.
    pub fn resolve_destination(&self, destination: &Path) -> PathBuf {
        let path = if destination.is_absolute() {
            destination.to_path_buf()
        } else {
            self.output_directory.join(destination)
        };
        artifact::with_default_extension(&path)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            tape_size: EngineConfig::default().tape_size,
            output_directory: PathBuf::from("."),
        }
    }
}

/// Builder for [`Translator`].
#[derive(Debug, Clone, Default)]
pub struct TranslatorBuilder {
    tape_size: Option<usize>,
    output_directory: Option<PathBuf>,
}

impl TranslatorBuilder {
    /// Cells allocated by each unit's entry code.
    pub fn with_tape_size(mut self, size: usize) -> Self {
        self.tape_size = Some(size);
        self
    }

    /// Directory for relative artifact destinations.
    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(path.into());
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Translator> {
        let defaults = EngineConfig::default();
        let config = defaults.with_tape_size(self.tape_size.unwrap_or(defaults.tape_size));
        config.validate()?;

        Ok(Translator {
            tape_size: config.tape_size,
            output_directory: self.output_directory.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_builder_defaults() {
        let translator = Translator::builder().build().unwrap();
        assert_eq!(translator.tape_size(), 30_000);
        assert_eq!(translator.output_directory(), Path::new("."));
    }

    #[test]
    fn test_builder_rejects_zero_tape() {
        let err = Translator::builder().with_tape_size(0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_resolve_destination() {
        let translator = Translator::builder()
            .output_directory("/tmp/out")
            .build()
            .unwrap();
        assert_eq!(
            translator.resolve_destination(Path::new("hello")),
            PathBuf::from("/tmp/out/hello.twx")
        );
        assert_eq!(
            translator.resolve_destination(Path::new("/abs/x.bin")),
            PathBuf::from("/abs/x.bin")
        );
    }

    #[test]
    fn test_translate_malformed() {
        let translator = Translator::default();
        assert!(translator.translate("[[]").unwrap_err().is_malformed());
    }

    #[test]
    fn test_translate_to_writes_nothing_when_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let translator = Translator::builder()
            .output_directory(dir.path())
            .build()
            .unwrap();
        assert!(translator.translate_to("]", "bad").is_err());
        assert!(!dir.path().join("bad.twx").exists());
    }
}
