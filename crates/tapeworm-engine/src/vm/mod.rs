// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The bytecode virtual machine.
//!
//! Executes the output of [`crate::compiler::Compiler`]. The machine is a
//! small stack machine over one tape; see [`crate::compiler::OpCode`] for
//! the instruction set.

mod machine;

// Re-export public API
pub use machine::VM;
