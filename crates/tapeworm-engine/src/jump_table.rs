// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Precomputed bracket matching for the translator.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::program::{Op, Program};

/// Bidirectional map from every bracket position to its structural match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpTable {
    matches: FxHashMap<usize, usize>,
}

impl JumpTable {
    /// Build the table with a depth-counting scan from every bracket.
    ///
    /// Loop-opens scan forward, loop-closes scan backward. A scan that runs
    /// off either end of the program fails with `MalformedProgram`.
    pub fn build(program: &Program) -> Result<Self> {
        let mut matches = FxHashMap::default();

        for (pos, op) in program.ops() {
            let target = match op {
                Op::LoopOpen => scan_forward(program, pos)?,
                Op::LoopClose => scan_backward(program, pos)?,
                _ => continue,
            };
            matches.insert(pos, target);
        }

        Ok(Self { matches })
    }

    /// The match of the bracket at `position`.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.matches.get(&position).copied()
    }

    /// Number of brackets in the table.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if the program had no loops.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Iterate over `(position, match)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.matches.iter().map(|(&from, &to)| (from, to))
    }
}

fn scan_forward(program: &Program, start: usize) -> Result<usize> {
    let mut depth = 1usize;
    let mut pos = start;

    while depth > 0 {
        pos += 1;
        match program.op_at(pos) {
            Some(Op::LoopOpen) => depth += 1,
            Some(Op::LoopClose) => depth -= 1,
            _ if pos >= program.len() => return Err(Error::malformed(start, '[')),
            _ => {}
        }
    }

    Ok(pos)
}

fn scan_backward(program: &Program, start: usize) -> Result<usize> {
    let mut depth = 1usize;
    let mut pos = start;

    while depth > 0 {
        pos = pos
            .checked_sub(1)
            .ok_or_else(|| Error::malformed(start, ']'))?;
        match program.op_at(pos) {
            Some(Op::LoopClose) => depth += 1,
            Some(Op::LoopOpen) => depth -= 1,
            _ => {}
        }
    }

    Ok(pos)
}
