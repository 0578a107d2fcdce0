// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Input sources for the `,` instruction.
//!
//! Output needs no abstraction of its own: both engines write to any
//! [`std::io::Write`].

use std::collections::VecDeque;
use std::io::{self, Read};

/// Byte that [`ReaderInput`] turns into a cancellation.
pub const ESCAPE: u8 = 0x1b;

/// One result of a blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A data byte for the current cell
    Byte(u8),
    /// The reserved cancellation signal; stops the program
    Cancel,
}

/// Supplies one [`InputEvent`] per `,` instruction, blocking until one exists.
pub trait InputSource {
    /// Wait for the next event.
    fn next_event(&mut self) -> io::Result<InputEvent>;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn next_event(&mut self) -> io::Result<InputEvent> {
        (**self).next_event()
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn next_event(&mut self) -> io::Result<InputEvent> {
        (**self).next_event()
    }
}

/// Byte-stream input. ESC and end-of-stream both cancel.
#[derive(Debug)]
pub struct ReaderInput<R> {
    reader: R,
}

impl<R: Read> ReaderInput<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ReaderInput<io::Stdin> {
    /// Input from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> InputSource for ReaderInput<R> {
    fn next_event(&mut self) -> io::Result<InputEvent> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(InputEvent::Cancel),
                Ok(_) if buf[0] == ESCAPE => return Ok(InputEvent::Cancel),
                Ok(_) => return Ok(InputEvent::Byte(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// A fixed queue of events. Cancels once the queue runs dry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    /// Events delivered in order.
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Every byte of `bytes` as a data event.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().map(|&b| InputEvent::Byte(b)))
    }

    /// No input at all; the first `,` cancels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_event(&mut self) -> io::Result<InputEvent> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::Cancel))
    }
}
