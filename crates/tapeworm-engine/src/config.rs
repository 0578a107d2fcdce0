// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of cells on the tape.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Default interpreter source-buffer capacity, in characters.
pub const DEFAULT_PROGRAM_BUFFER_SIZE: usize = 50_000;

/// Largest tape a configuration or artifact may request.
pub const MAX_TAPE_SIZE: usize = 1 << 24;

/// Largest interpreter source buffer a configuration may request.
pub const MAX_PROGRAM_BUFFER_SIZE: usize = 1 << 24;

/// Sizes shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of cells on the tape
    pub tape_size: usize,

    /// Longest program the interpreter accepts. The translator has no cap.
    pub program_buffer_size: usize,
}

impl EngineConfig {
    /// Set the tape size.
    pub fn with_tape_size(mut self, size: usize) -> Self {
        self.tape_size = size;
        self
    }

    /// Set the interpreter buffer capacity.
    pub fn with_program_buffer_size(mut self, size: usize) -> Self {
        self.program_buffer_size = size;
        self
    }

    /// Check that both sizes are usable.
    pub fn validate(&self) -> Result<()> {
        if self.tape_size == 0 {
            return Err(Error::InvalidConfig("tape size must be at least 1".into()));
        }
        if self.tape_size > MAX_TAPE_SIZE {
            return Err(Error::InvalidConfig(format!(
                "tape size {} exceeds the limit of {MAX_TAPE_SIZE}",
                self.tape_size
            )));
        }
        if self.program_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "program buffer size must be at least 1".into(),
            ));
        }
        if self.program_buffer_size > MAX_PROGRAM_BUFFER_SIZE {
            return Err(Error::InvalidConfig(format!(
                "program buffer size {} exceeds the limit of {MAX_PROGRAM_BUFFER_SIZE}",
                self.program_buffer_size
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            program_buffer_size: DEFAULT_PROGRAM_BUFFER_SIZE,
        }
    }
}
