// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The tape memory model shared by both engines.
//!
//! Cells are 8-bit and wrap modulo 256. The memory pointer wraps modulo the
//! tape capacity, so moving left from cell 0 lands on the last cell and
//! moving right from the last cell lands on cell 0. No access can ever be
//! out of range.

/// Wrap an arbitrary integer into a cell value.
pub fn wrap_cell(value: i64) -> u8 {
    value.rem_euclid(256) as u8
}

/// Wrap an arbitrary integer into a pointer for a tape of `capacity` cells.
pub fn wrap_pointer(value: i64, capacity: usize) -> usize {
    value.rem_euclid(capacity as i64) as usize
}

/// A fixed-capacity, zero-initialized cell array with its memory pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
}

impl Tape {
    /// Allocate a zeroed tape. `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "tape capacity must be non-zero");
        Self {
            cells: vec![0; capacity.max(1)],
            pointer: 0,
        }
    }

    /// Number of cells.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Current memory pointer.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Move the pointer, wrapping into range.
    pub fn set_pointer(&mut self, value: i64) {
        self.pointer = wrap_pointer(value, self.cells.len());
    }

    /// Move one cell right.
    pub fn right(&mut self) {
        self.pointer = if self.pointer + 1 == self.cells.len() {
            0
        } else {
            self.pointer + 1
        };
    }

    /// Move one cell left.
    pub fn left(&mut self) {
        self.pointer = if self.pointer == 0 {
            self.cells.len() - 1
        } else {
            self.pointer - 1
        };
    }

    /// Value of the current cell.
    pub fn get(&self) -> u8 {
        self.cells[self.pointer]
    }

    /// Overwrite the current cell.
    pub fn set(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    /// Store an arbitrary integer into the current cell, wrapping it.
    pub fn store(&mut self, value: i64) {
        self.set(wrap_cell(value));
    }

    /// Add one to the current cell.
    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
    }

    /// Subtract one from the current cell.
    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
    }

    /// Zero every cell and return the pointer to 0.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.pointer = 0;
    }

    /// All cells, for inspection.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Returns true if every cell is zero.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }
}
