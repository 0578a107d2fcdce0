//! Persisted artifact tests

use std::fs;

use tapeworm_engine::package::artifact::{MAGIC, RUN_DIRECTIVE};
use tapeworm_engine::{CompiledUnit, Error, Outcome, ScriptedInput, Translator};

fn translator_in(dir: &tempfile::TempDir) -> Translator {
    Translator::builder()
        .output_directory(dir.path())
        .build()
        .unwrap()
}

#[test]
fn test_persisted_matches_in_process() {
    let dir = tempfile::tempdir().unwrap();
    let translator = translator_in(&dir);
    let source = ",[>+<-]>++.";

    let path = translator.translate_to(source, "double").unwrap();
    assert!(path.is_absolute());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("twx"));

    let persisted = CompiledUnit::load(&path).unwrap();
    let in_process = translator.translate(source).unwrap();
    assert_eq!(persisted.bytecode(), in_process.bytecode());

    let mut a = Vec::new();
    let mut b = Vec::new();
    persisted.execute(ScriptedInput::from_bytes(&[40]), &mut a).unwrap();
    in_process.execute(ScriptedInput::from_bytes(&[40]), &mut b).unwrap();
    assert_eq!(a, vec![42]);
    assert_eq!(a, b);
}

#[test]
fn test_artifact_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = translator_in(&dir).translate_to("+.", "one").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(RUN_DIRECTIVE));
    assert_eq!(lines.next(), Some(MAGIC));
}

#[cfg(unix)]
#[test]
fn test_artifact_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = translator_in(&dir).translate_to("+.", "exe").unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0);
}

#[test]
fn test_explicit_extension_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = translator_in(&dir).translate_to("+.", "prog.bin").unwrap();
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("prog.bin"));
}

#[test]
fn test_corrupted_header_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = translator_in(&dir).translate_to("+.", "good").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen(MAGIC, "tapeworm-image v9", 1)).unwrap();

    let err = CompiledUnit::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidArtifact { .. }));
}

#[test]
fn test_corrupted_body_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.twx");
    fs::write(&path, format!("{RUN_DIRECTIVE}\n{MAGIC}\nnot json\n")).unwrap();

    let err = CompiledUnit::load(&path).unwrap_err();
    assert!(err.to_string().contains("corrupt image"));
}

#[test]
fn test_missing_artifact_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CompiledUnit::load(dir.path().join("absent.twx")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_cancel_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = translator_in(&dir).translate_to(",[.,]", "echo").unwrap();

    let unit = CompiledUnit::load(&path).unwrap();
    let mut out = Vec::new();
    let outcome = unit.execute(ScriptedInput::from_bytes(b"xy"), &mut out).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(out, b"xy");
}

#[test]
fn test_oversized_tape_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.twx");
    let body = format!(
        r#"{{"instructions":[{{"opcode":"NewTape","operand":{{"Size":{}}}}},{{"opcode":"Return","operand":null}}]}}"#,
        usize::MAX
    );
    fs::write(&path, format!("{RUN_DIRECTIVE}\n{MAGIC}\n{body}\n")).unwrap();

    let err = CompiledUnit::load(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidArtifact { .. }));
}
