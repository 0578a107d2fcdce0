// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the tape engines

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, translating or running a program.
///
/// Input cancellation is not an error; runs report it as
/// [`crate::Outcome::Cancelled`].
#[derive(Debug, Error)]
pub enum Error {
    /// A bracket without a structural match
    #[error("MalformedProgram: unmatched '{bracket}' at position {position}")]
    MalformedProgram {
        /// Source position of the offending bracket
        position: usize,
        /// The bracket character
        bracket: char,
    },

    /// The interpreter's source buffer is too small for the program
    #[error("ProgramTooLarge: program has {len} characters, buffer holds {capacity}")]
    ProgramTooLarge {
        /// Program length in characters
        len: usize,
        /// Configured buffer capacity
        capacity: usize,
    },

    /// `execute` was called before any program was loaded
    #[error("NotLoaded: no program loaded")]
    NotLoaded,

    /// Rejected configuration value
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),

    /// A branch references a label that was never marked
    #[error("UnresolvedLabel: label {0} was never marked")]
    UnresolvedLabel(usize),

    /// The artifact at `path` is not a loadable image
    #[error("InvalidArtifact: {}: {reason}", path.display())]
    InvalidArtifact {
        /// Artifact path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Broken invariant inside the engine or a corrupt unit
    #[error("InternalError: {0}")]
    Internal(String),

    /// Output sink or artifact store failure
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed-program error for a bracket at `position`
    pub fn malformed(position: usize, bracket: char) -> Self {
        Self::MalformedProgram { position, bracket }
    }

    /// Create an invalid-artifact error
    pub fn invalid_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for unmatched-bracket errors
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedProgram { .. })
    }
}
