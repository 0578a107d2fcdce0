// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Using the engines from more than one thread.
//!
//! Engines hold no global state, so separate instances never interfere.
//! Sharing one [`Interpreter`] needs a lock held from `load` through
//! `execute`, which [`SharedInterpreter`] provides. Translation shares
//! nothing at all, so [`ParallelTranslator`] can fan sources out over a
//! thread pool.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Outcome;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::io::InputSource;

/// An interpreter behind a lock, cloneable across threads.
#[derive(Debug, Clone)]
pub struct SharedInterpreter {
    inner: Arc<Mutex<Interpreter>>,
}

impl SharedInterpreter {
    /// Wrap a new interpreter.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::from_interpreter(Interpreter::new(config)?))
    }

    /// Wrap an existing interpreter.
    pub fn from_interpreter(interpreter: Interpreter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(interpreter)),
        }
    }

    /// Load and execute `source` while holding the lock for both steps.
    pub fn run<I, W>(&self, source: &str, input: I, output: W) -> Result<Outcome>
    where
        I: InputSource,
        W: Write,
    {
        let mut interpreter = self.inner.lock();
        interpreter.load(source)?;
        interpreter.execute(input, output)
    }

    /// Run `f` with exclusive access to the interpreter.
    pub fn with<R>(&self, f: impl FnOnce(&mut Interpreter) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}

#[cfg(feature = "parallel")]
pub use parallel::ParallelTranslator;

#[cfg(feature = "parallel")]
mod parallel {
    use std::path::{Path, PathBuf};

    use rayon::prelude::*;
    use tracing::debug;

    use crate::error::{Error, Result};
    use crate::package::CompiledUnit;
    use crate::translator::Translator;

    /// Translates many independent sources on a thread pool.
    pub struct ParallelTranslator {
        /// Thread pool for CPU-bound work
        pool: rayon::ThreadPool,
        translator: Translator,
    }

    impl ParallelTranslator {
        /// Pool with the default number of threads.
        pub fn new(translator: Translator) -> Result<Self> {
            Self::build(translator, rayon::ThreadPoolBuilder::new())
        }

        /// Pool with exactly `num_threads` threads.
        pub fn with_threads(translator: Translator, num_threads: usize) -> Result<Self> {
            Self::build(
                translator,
                rayon::ThreadPoolBuilder::new().num_threads(num_threads),
            )
        }

        fn build(translator: Translator, builder: rayon::ThreadPoolBuilder) -> Result<Self> {
            let pool = builder
                .build()
                .map_err(|e| Error::Internal(format!("Failed to create thread pool: {e}")))?;
            Ok(Self { pool, translator })
        }

        /// The translator every job uses.
        pub fn translator(&self) -> &Translator {
            &self.translator
        }

        /// Translate every source; results keep the input order.
        pub fn translate_all(&self, sources: &[&str]) -> Vec<Result<CompiledUnit>> {
            debug!(jobs = sources.len(), "parallel translate");
            self.pool.install(|| {
                sources
                    .par_iter()
                    .map(|source| self.translator.translate(source))
                    .collect()
            })
        }

        /// Translate and persist `(source, destination)` pairs; results keep
        /// the input order.
        pub fn translate_all_to<P>(&self, jobs: &[(String, P)]) -> Vec<Result<PathBuf>>
        where
            P: AsRef<Path> + Sync,
        {
            debug!(jobs = jobs.len(), "parallel persist");
            self.pool.install(|| {
                jobs.par_iter()
                    .map(|(source, destination)| self.translator.translate_to(source, destination))
                    .collect()
            })
        }
    }
}
