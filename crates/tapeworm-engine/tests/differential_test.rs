//! Interpreter/translator agreement tests
//!
//! Every program here runs through both engines with identical input; the
//! output bytes and the outcome must match exactly.

use tapeworm_engine::{
    EngineConfig, InputEvent, Interpreter, JumpTable, Outcome, Program, ReaderInput,
    ScriptedInput, State, Translator,
};

const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

/// Run `source` through the interpreter
fn interpret(source: &str, input: ScriptedInput) -> (Vec<u8>, Outcome) {
    let mut interp = Interpreter::default();
    interp.load(source).expect("load");
    let mut out = Vec::new();
    let outcome = interp.execute(input, &mut out).expect("execute");
    (out, outcome)
}

/// Run `source` through the translator and the resulting unit
fn translate(source: &str, input: ScriptedInput) -> (Vec<u8>, Outcome) {
    let unit = Translator::default().translate(source).expect("translate");
    let mut out = Vec::new();
    let outcome = unit.execute(input, &mut out).expect("execute");
    (out, outcome)
}

fn assert_agree(source: &str, input: ScriptedInput) -> (Vec<u8>, Outcome) {
    let interpreted = interpret(source, input.clone());
    let translated = translate(source, input);
    assert_eq!(interpreted, translated, "engines disagree on {source:?}");
    interpreted
}

#[test]
fn test_hello_world() {
    let (out, outcome) = assert_agree(HELLO_WORLD, ScriptedInput::empty());
    assert_eq!(out, b"Hello World!\n");
    assert_eq!(outcome, Outcome::Halted);
}

#[test]
fn test_letter_a() {
    let (out, _) = assert_agree("++++++++[>++++++++<-]>+.", ScriptedInput::empty());
    assert_eq!(out, b"A");
}

#[test]
fn test_echo_until_zero() {
    let (out, outcome) = assert_agree(",[.,]", ScriptedInput::from_bytes(b"hey\0"));
    assert_eq!(out, b"hey");
    assert_eq!(outcome, Outcome::Halted);
}

#[test]
fn test_echo_until_cancel() {
    let (out, outcome) = assert_agree(",[.,]", ScriptedInput::from_bytes(b"ab"));
    assert_eq!(out, b"ab");
    assert_eq!(outcome, Outcome::Cancelled);
}

#[test]
fn test_cancel_skips_rest_of_program() {
    let input = ScriptedInput::new([InputEvent::Cancel]);
    let (out, outcome) = assert_agree("+.,+++.", input);
    assert_eq!(out, vec![1]);
    assert_eq!(outcome, Outcome::Cancelled);
}

#[test]
fn test_reverse_input() {
    let (out, _) = assert_agree(">,[>,]<[.<]", ScriptedInput::from_bytes(b"abc\0"));
    assert_eq!(out, b"cba");
}

#[test]
fn test_cell_wraps_both_ways() {
    let (out, _) = assert_agree("-.+.", ScriptedInput::empty());
    assert_eq!(out, vec![255, 0]);

    let plus_256 = "+".repeat(256) + ".";
    let (out, _) = assert_agree(&plus_256, ScriptedInput::empty());
    assert_eq!(out, vec![0]);
}

#[test]
fn test_pointer_wraps_on_small_tape() {
    let config = EngineConfig::default().with_tape_size(3);
    let source = "<+++.>>>.";

    let mut interp = Interpreter::new(config).unwrap();
    interp.load(source).unwrap();
    let mut interpreted = Vec::new();
    interp.execute(ScriptedInput::empty(), &mut interpreted).unwrap();
    assert_eq!(interp.tape().cells(), &[0, 0, 3]);

    let unit = Translator::new(config).unwrap().translate(source).unwrap();
    let mut translated = Vec::new();
    unit.execute(ScriptedInput::empty(), &mut translated).unwrap();

    assert_eq!(interpreted, vec![3, 3]);
    assert_eq!(interpreted, translated);
}

#[test]
fn test_comments_are_ignored() {
    let (out, _) = assert_agree(
        "add two: ++ then print it. Done!",
        ScriptedInput::empty(),
    );
    // the full stop in the prose is an operator
    assert_eq!(out, vec![2]);
}

#[test]
fn test_loop_skipped_when_cell_zero() {
    let (out, _) = assert_agree("[.+++.]+.", ScriptedInput::empty());
    assert_eq!(out, vec![1]);
}

#[test]
fn test_nested_loops() {
    // 3 * 4 * 5
    let (out, _) = assert_agree("+++[>++++[>+++++<-]<-]>>.", ScriptedInput::empty());
    assert_eq!(out, vec![60]);
}

#[test]
fn test_unmatched_open_rejected_by_both() {
    let mut interp = Interpreter::default();
    assert!(interp.load("+[").unwrap_err().is_malformed());
    assert_eq!(interp.state(), State::Idle);
    assert!(Translator::default().translate("+[").unwrap_err().is_malformed());
}

#[test]
fn test_unmatched_close_rejected_by_both() {
    let mut interp = Interpreter::default();
    assert!(interp.load("+]").unwrap_err().is_malformed());
    assert!(Translator::default().translate("+]").unwrap_err().is_malformed());
}

#[test]
fn test_reload_is_idempotent() {
    let mut interp = Interpreter::default();
    for _ in 0..3 {
        interp.load("+++.>+.").unwrap();
        let mut out = Vec::new();
        interp.execute(ScriptedInput::empty(), &mut out).unwrap();
        assert_eq!(out, vec![3, 1]);
    }
}

#[test]
fn test_unit_runs_are_independent() {
    let unit = Translator::default().translate("+++.").unwrap();
    for _ in 0..3 {
        let mut out = Vec::new();
        unit.execute(ScriptedInput::empty(), &mut out).unwrap();
        assert_eq!(out, vec![3]);
    }
}

#[test]
fn test_jump_table_is_symmetric() {
    let program = Program::from_source(HELLO_WORLD);
    let table = JumpTable::build(&program).unwrap();
    assert!(!table.is_empty());
    for (from, to) in table.iter() {
        assert_eq!(table.get(to), Some(from));
        assert_ne!(program.chars()[from], program.chars()[to]);
    }
}

#[test]
fn test_reader_input_escape_cancels() {
    let source = ",[.,]";
    let bytes: &[u8] = b"hi\x1bzz";

    let mut interp = Interpreter::default();
    interp.load(source).unwrap();
    let mut interpreted = Vec::new();
    let outcome = interp
        .execute(ReaderInput::new(bytes), &mut interpreted)
        .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(interp.state(), State::Cancelled);

    let unit = Translator::default().translate(source).unwrap();
    let mut translated = Vec::new();
    let outcome = unit.execute(ReaderInput::new(bytes), &mut translated).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    assert_eq!(interpreted, b"hi");
    assert_eq!(interpreted, translated);
}
