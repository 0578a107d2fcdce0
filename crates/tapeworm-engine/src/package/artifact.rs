// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Persisted artifacts.
//!
//! An artifact is a text file:
//!
//! ```text
//! #!/usr/bin/env -S tapeworm exec
//! tapeworm-image v1
//! {"instructions":[...]}
//! ```
//!
//! The first line lets a Unix shell run the file directly through the
//! `tapeworm` binary. The body is the linked bytecode as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compiler::{Bytecode, OpCode, Operand};
use crate::config::MAX_TAPE_SIZE;
use crate::error::{Error, Result};

/// Extension appended to destinations that have none.
pub const ARTIFACT_EXTENSION: &str = "twx";

/// First line of every artifact.
pub const RUN_DIRECTIVE: &str = "#!/usr/bin/env -S tapeworm exec";

/// Second line of every artifact.
pub const MAGIC: &str = "tapeworm-image v1";

/// Render bytecode as artifact text.
pub fn encode(bytecode: &Bytecode) -> Result<String> {
    let body = serde_json::to_string(bytecode)
        .map_err(|e| Error::Internal(format!("failed to encode bytecode: {e}")))?;
    Ok(format!("{RUN_DIRECTIVE}\n{MAGIC}\n{body}\n"))
}

/// Parse and validate artifact text. `path` is only used in errors.
pub fn decode(text: &str, path: &Path) -> Result<Bytecode> {
    let mut lines = text.splitn(3, '\n');

    match lines.next() {
        Some(line) if line.trim_end() == RUN_DIRECTIVE => {}
        _ => return Err(Error::invalid_artifact(path, "missing run directive")),
    }
    match lines.next() {
        Some(line) if line.trim_end() == MAGIC => {}
        _ => return Err(Error::invalid_artifact(path, "unrecognized image format")),
    }

    let body = lines.next().unwrap_or_default();
    let bytecode: Bytecode = serde_json::from_str(body)
        .map_err(|e| Error::invalid_artifact(path, format!("corrupt image: {e}")))?;

    validate(&bytecode).map_err(|reason| Error::invalid_artifact(path, reason))?;
    Ok(bytecode)
}

/// Write `bytecode` to `destination` and return the absolute path.
///
/// Parent directories are not created; an unwritable destination is an
/// I/O error for the caller.
pub fn write(bytecode: &Bytecode, destination: &Path) -> Result<PathBuf> {
    let text = encode(bytecode)?;
    fs::write(destination, text)?;
    mark_executable(destination)?;

    let path = fs::canonicalize(destination)?;
    info!(path = %path.display(), instructions = bytecode.len(), "wrote artifact");
    Ok(path)
}

/// Read and validate the artifact at `path`.
pub fn read(path: &Path) -> Result<Bytecode> {
    let text = fs::read_to_string(path)?;
    let bytecode = decode(&text, path)?;
    debug!(path = %path.display(), instructions = bytecode.len(), "read artifact");
    Ok(bytecode)
}

/// Append the artifact extension when `path` has none.
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(ARTIFACT_EXTENSION)
    }
}

/// Structural checks for bytecode from outside the compiler.
fn validate(bytecode: &Bytecode) -> std::result::Result<(), String> {
    match bytecode.tape_size() {
        Some(size) if size > MAX_TAPE_SIZE => {
            return Err(format!("tape size {size} exceeds the limit of {MAX_TAPE_SIZE}"));
        }
        Some(size) if size > 0 => {}
        _ => return Err("entry code does not allocate a tape".into()),
    }

    let len = bytecode.len();
    for (index, instruction) in bytecode.instructions.iter().enumerate() {
        let ok = match (instruction.opcode, instruction.operand) {
            (op, operand) if op.is_branch() => {
                matches!(operand, Some(Operand::Jump(target)) if target < len)
            }
            (OpCode::Const, operand) => matches!(operand, Some(Operand::Int(_))),
            (OpCode::NewTape, operand) => {
                matches!(operand, Some(Operand::Size(n)) if n > 0 && n <= MAX_TAPE_SIZE)
            }
            (_, operand) => operand.is_none(),
        };
        if !ok {
            return Err(format!("bad instruction at {index}: {instruction}"));
        }
    }

    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Compiler, Instruction};
    use crate::program::Program;

    fn sample() -> Bytecode {
        Compiler::new(8)
            .compile(&Program::from_source("+[-],."))
            .unwrap()
    }

    #[test]
    fn test_encode_header() {
        let text = encode(&sample()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(RUN_DIRECTIVE));
        assert_eq!(lines.next(), Some(MAGIC));
    }

    #[test]
    fn test_decode_round_trip() {
        let bytecode = sample();
        let text = encode(&bytecode).unwrap();
        assert_eq!(decode(&text, Path::new("x")).unwrap(), bytecode);
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        let text = encode(&sample()).unwrap().replacen("tapeworm exec", "python", 1);
        let err = decode(&text, Path::new("x")).unwrap_err();
        assert!(matches!(err, Error::InvalidArtifact { .. }));
    }

    #[test]
    fn test_decode_rejects_bad_jump() {
        let mut bytecode = sample();
        bytecode.emit(Instruction::with_operand(OpCode::Jump, Operand::Jump(10_000)));
        let text = encode(&bytecode).unwrap();
        let err = decode(&text, Path::new("x")).unwrap_err();
        assert!(err.to_string().contains("bad instruction"));
    }

    #[test]
    fn test_decode_rejects_unlinked_label() {
        let mut bytecode = sample();
        bytecode.emit(Instruction::with_operand(OpCode::Jump, Operand::Label(0)));
        let text = encode(&bytecode).unwrap();
        assert!(decode(&text, Path::new("x")).is_err());
    }

    #[test]
    fn test_decode_rejects_huge_tape() {
        let mut bytecode = Bytecode::new();
        bytecode.emit(Instruction::with_operand(
            OpCode::NewTape,
            Operand::Size(usize::MAX),
        ));
        bytecode.emit(Instruction::simple(OpCode::Return));
        let text = encode(&bytecode).unwrap();
        let err = decode(&text, Path::new("x")).unwrap_err();
        assert!(matches!(err, Error::InvalidArtifact { .. }));
        assert!(err.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(
            with_default_extension(Path::new("out/hello")),
            PathBuf::from("out/hello.twx")
        );
        assert_eq!(
            with_default_extension(Path::new("hello.img")),
            PathBuf::from("hello.img")
        );
    }
}
