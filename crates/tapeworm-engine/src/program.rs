// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source programs and the eight operators.

use std::fmt;

/// One of the eight source operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `>`
    Right,
    /// `<`
    Left,
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `.`
    Output,
    /// `,`
    Input,
    /// `[`
    LoopOpen,
    /// `]`
    LoopClose,
}

impl Op {
    /// Decode a source character. Anything else is a comment.
    pub fn decode(c: char) -> Option<Self> {
        match c {
            '>' => Some(Op::Right),
            '<' => Some(Op::Left),
            '+' => Some(Op::Increment),
            '-' => Some(Op::Decrement),
            '.' => Some(Op::Output),
            ',' => Some(Op::Input),
            '[' => Some(Op::LoopOpen),
            ']' => Some(Op::LoopClose),
            _ => None,
        }
    }

    /// The source character for this operator.
    pub fn symbol(self) -> char {
        match self {
            Op::Right => '>',
            Op::Left => '<',
            Op::Increment => '+',
            Op::Decrement => '-',
            Op::Output => '.',
            Op::Input => ',',
            Op::LoopOpen => '[',
            Op::LoopClose => ']',
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A program as an ordered character sequence.
///
/// Positions are character indices, comments included, so error positions
/// point back into the text the user wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    chars: Vec<char>,
}

impl Program {
    /// Parse source text.
    pub fn from_source(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
        }
    }

    /// Number of characters, comments included.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns true if the program has no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The operator at `position`, if that character is one.
    pub fn op_at(&self, position: usize) -> Option<Op> {
        self.chars.get(position).copied().and_then(Op::decode)
    }

    /// Iterate over `(position, op)` pairs, skipping comments.
    pub fn ops(&self) -> impl Iterator<Item = (usize, Op)> + '_ {
        self.chars
            .iter()
            .enumerate()
            .filter_map(|(pos, &c)| Op::decode(c).map(|op| (pos, op)))
    }

    /// The raw characters.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Self::from_source(source)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in self.ops().map(|(_, op)| op) {
            write!(f, "{op}")?;
        }
        Ok(())
    }
}
