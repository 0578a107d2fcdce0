// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive shell for tapeworm.
//!
//! Lines starting with `!` are shell commands; anything else is program
//! text, run with the current engine.

use std::borrow::Cow;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Instant;

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use tapeworm_engine::io::ESCAPE;
use tapeworm_engine::{Engine, InputEvent, InputSource, Mode, Outcome};
use tracing::debug;

use crate::config::Settings;
use crate::locate;

/// Shell configuration constants
const HISTORY_FILE: &str = "history";
const MAX_HISTORY_SIZE: usize = 1000;

/// Shell commands, written with a `!` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Quit,
    Clear,
    Mode,
    Load,
    Compile,
    Listing,
    Time,
}

impl ReplCommand {
    /// Parse a shell command from an input line
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('!')?;

        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "quit" | "exit" | "q" => Some((ReplCommand::Quit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "mode" | "m" => Some((ReplCommand::Mode, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "compile" | "c" => Some((ReplCommand::Compile, arg)),
            "listing" | "list" => Some((ReplCommand::Listing, arg)),
            "time" | "t" => Some((ReplCommand::Time, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            ("!help", "Show this help message"),
            ("!quit", "Leave the shell"),
            ("!clear", "Clear the screen"),
            ("!mode [0|1]", "Show or set the engine (0 interpret, 1 translate)"),
            ("!load <file>", "Run a program file"),
            ("!compile <file> <name>", "Write a runnable artifact (translate mode)"),
            ("!listing", "Show the bytecode of the last program"),
            ("!time", "Toggle the elapsed time report"),
        ]
    }

    fn names() -> impl Iterator<Item = &'static str> {
        Self::all_commands()
            .iter()
            .filter_map(|&(usage, _)| usage.split_whitespace().next())
    }
}

/// Rustyline helper: command completion, operator highlighting and
/// multi-line loops.
#[derive(Default)]
struct TapewormHelper;

impl Completer for TapewormHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[..pos];
        if !word.starts_with('!') || word.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }

        let matches = ReplCommand::names()
            .filter(|name| name.starts_with(word))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for TapewormHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() || line.len() < 2 || !line.starts_with('!') {
            return None;
        }

        ReplCommand::names()
            .find(|name| name.starts_with(line) && name.len() > line.len())
            .map(|name| (&name[line.len()..]).dimmed().to_string())
    }
}

impl Highlighter for TapewormHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('!') {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut result = String::with_capacity(line.len() * 4);
        for c in line.chars() {
            let colored = match c {
                '>' | '<' => c.cyan().to_string(),
                '+' | '-' => c.green().to_string(),
                '.' | ',' => c.yellow().bold().to_string(),
                '[' | ']' => c.magenta().bold().to_string(),
                _ => c.dimmed().to_string(),
            };
            result.push_str(&colored);
        }

        Cow::Owned(result)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(hint)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for TapewormHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if input.trim_start().starts_with('!') || is_balanced(input) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

impl Helper for TapewormHelper {}

/// Whether every `[` has been closed.
///
/// A stray `]` counts as balanced so the engine reports the error instead of
/// the editor waiting for more input.
fn is_balanced(input: &str) -> bool {
    let mut depth = 0usize;

    for c in input.chars() {
        match c {
            '[' => depth += 1,
            ']' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            _ => {}
        }
    }

    depth == 0
}

/// The interactive shell
pub struct Repl {
    engine: Engine,
    editor: Editor<TapewormHelper, DefaultHistory>,
    history_path: PathBuf,
    show_time: bool,
    last_source: Option<String>,
}

impl Repl {
    /// Create a shell using `settings` for both engines
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(TapewormHelper));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tapeworm")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        Ok(Self {
            engine: Engine::with_config(
                settings.mode,
                settings.engine,
                settings.output_dir.clone(),
            )?,
            editor,
            history_path,
            show_time: true,
            last_source: None,
        })
    }

    /// Run the shell main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = self.format_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if trimmed.starts_with('!') {
                        match ReplCommand::parse(trimmed) {
                            Some((cmd, arg)) => match self.execute_command(cmd, arg) {
                                CommandResult::Continue => continue,
                                CommandResult::Exit => break,
                            },
                            None => {
                                eprintln!(
                                    "{}: unknown command '{}', try {}",
                                    "Error".red().bold(),
                                    trimmed,
                                    "!help".cyan()
                                );
                                continue;
                            }
                        }
                    }

                    self.run_program(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);

        println!();
        println!("{}", "Goodbye!".bright_cyan());
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "tapeworm".bright_cyan().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        println!(
            "  {}",
            "Eight instructions, two engines. Program input ends with ESC or EOF.".dimmed()
        );
        println!(
            "  {} {} {} {}",
            "Mode:".dimmed(),
            self.engine.mode().to_string().green(),
            "Type".dimmed(),
            "!help".cyan()
        );
        println!();
    }

    fn format_prompt(&self) -> String {
        let tag = match self.engine.mode() {
            Mode::Interpret => "tw:i>",
            Mode::Translate => "tw:t>",
        };
        format!("{} ", tag.bright_green().bold())
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Quit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Mode => self.set_mode(arg),
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(path),
                None => missing_argument("!load", "a file path"),
            },
            ReplCommand::Compile => self.compile(arg),
            ReplCommand::Listing => self.print_listing(),
            ReplCommand::Time => {
                self.show_time = !self.show_time;
                let state = if self.show_time { "on" } else { "off" };
                println!("{} {}", "timing".dimmed(), state.yellow());
            }
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Shell Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:24} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Program Text:".white().bold());
        println!();
        println!(
            "  {}",
            "Any other line runs with the current engine; unclosed loops continue on the next line."
                .dimmed()
        );
        println!(
            "  {}",
            "Characters other than > < + - . , [ ] are comments.".dimmed()
        );
        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:24} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:24} {}", "Ctrl+D".yellow(), "Leave the shell".dimmed());
        println!("  {:24} {}", "Tab".yellow(), "Complete a command".dimmed());
        println!("  {:24} {}", "ESC, Enter".yellow(), "Cancel program input".dimmed());
        println!();
    }

    fn set_mode(&mut self, arg: Option<&str>) {
        match arg.map(str::parse::<Mode>) {
            None => println!("{} {}", "mode".dimmed(), self.engine.mode().green()),
            Some(Ok(mode)) => {
                self.engine.set_mode(mode);
                println!("{} {}", "mode".dimmed(), mode.green());
            }
            Some(Err(e)) => eprintln!("{}: {}", "Error".red().bold(), e),
        }
    }

    fn load_file(&mut self, path: &str) {
        let path = locate(Path::new(path));

        match std::fs::read_to_string(&path) {
            Ok(source) => self.run_program(&source),
            Err(e) => eprintln!(
                "{}: failed to read '{}': {}",
                "Error".red().bold(),
                path.display(),
                e
            ),
        }
    }

    fn compile(&mut self, arg: Option<&str>) {
        if self.engine.mode() != Mode::Translate {
            eprintln!(
                "{}: {} needs translate mode ({})",
                "Error".red().bold(),
                "!compile".cyan(),
                "!mode 1".cyan()
            );
            return;
        }

        let Some((file, name)) = arg.and_then(|a| a.split_once(char::is_whitespace)) else {
            return missing_argument("!compile", "a file and an artifact name");
        };

        let file = locate(Path::new(file.trim()));
        let source = match std::fs::read_to_string(&file) {
            Ok(source) => source,
            Err(e) => {
                eprintln!(
                    "{}: failed to read '{}': {}",
                    "Error".red().bold(),
                    file.display(),
                    e
                );
                return;
            }
        };

        match self.engine.translator().translate_to(&source, name.trim()) {
            Ok(path) => println!("{} {}", "Wrote".green().bold(), path.display().cyan()),
            Err(e) => print_error(&e),
        }
    }

    fn print_listing(&self) {
        let Some(source) = &self.last_source else {
            println!("{}", "no program has run yet".dimmed());
            return;
        };

        match self.engine.translator().emit(source) {
            Ok(bytecode) => print!("{bytecode}"),
            Err(e) => print_error(&e),
        }
    }

    fn run_program(&mut self, source: &str) {
        let mut input = ShellInput::new(io::stdin().lock());
        let start = Instant::now();
        let result = self.engine.run(source, &mut input, io::stdout());
        let elapsed = start.elapsed();

        if let Err(e) = input.finish() {
            debug!(error = %e, "failed to discard pending input");
        }

        println!();
        match result {
            Ok(Outcome::Halted) => {}
            Ok(Outcome::Cancelled) => println!("{}", "input cancelled".dimmed()),
            Err(e) => print_error(&e),
        }
        if self.show_time {
            println!("{} {:.3?}", "elapsed".dimmed(), elapsed);
        }

        self.last_source = Some(source.to_string());
    }
}

/// `,` input for one shell run.
///
/// The terminal hands over whole lines, so a program that stops reading
/// mid-line leaves the rest buffered in stdin. [`ShellInput::finish`]
/// discards it, keeping the next run's first `,` waiting for fresh input.
struct ShellInput<R> {
    reader: R,
    mid_line: bool,
}

impl<R: BufRead> ShellInput<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            mid_line: false,
        }
    }

    /// Drop whatever is left of a partly consumed line.
    fn finish(mut self) -> io::Result<()> {
        if self.mid_line {
            let mut rest = Vec::new();
            self.reader.read_until(b'\n', &mut rest)?;
        }
        Ok(())
    }
}

impl<R: BufRead> InputSource for ShellInput<R> {
    fn next_event(&mut self) -> io::Result<InputEvent> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.mid_line = false;
                    return Ok(InputEvent::Cancel);
                }
                Ok(_) => {
                    self.mid_line = buf[0] != b'\n';
                    return Ok(if buf[0] == ESCAPE {
                        InputEvent::Cancel
                    } else {
                        InputEvent::Byte(buf[0])
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Result of executing a shell command
enum CommandResult {
    Continue,
    Exit,
}

fn missing_argument(command: &str, what: &str) {
    eprintln!(
        "{}: {} {}",
        "Error".red().bold(),
        command.cyan(),
        format!("requires {what}").dimmed()
    );
}

/// Print a formatted engine error
fn print_error(error: &tapeworm_engine::Error) {
    let error_str = error.to_string();

    // Split error kind from message
    if let Some(colon_pos) = error_str.find(':') {
        let (kind, message) = error_str.split_at(colon_pos);
        eprintln!("{}{}", kind.red().bold(), message);
    } else {
        eprintln!("{}", error_str.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(
            ReplCommand::parse("!help"),
            Some((ReplCommand::Help, None))
        ));
        assert!(matches!(
            ReplCommand::parse("!quit"),
            Some((ReplCommand::Quit, None))
        ));
        assert!(matches!(
            ReplCommand::parse("!mode 0"),
            Some((ReplCommand::Mode, Some("0")))
        ));
        assert!(matches!(
            ReplCommand::parse("  !load hello.tw  "),
            Some((ReplCommand::Load, Some("hello.tw")))
        ));
        assert!(matches!(
            ReplCommand::parse("!compile a.tw out"),
            Some((ReplCommand::Compile, Some("a.tw out")))
        ));
        assert!(ReplCommand::parse("!bogus").is_none());
        assert!(ReplCommand::parse("+++.").is_none());
    }

    #[test]
    fn test_command_names() {
        let names: Vec<_> = ReplCommand::names().collect();
        assert!(names.contains(&"!mode"));
        assert!(names.contains(&"!compile"));
        for name in names {
            assert!(ReplCommand::parse(name).is_some(), "{name} does not parse");
        }
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("+++."));
        assert!(is_balanced("[->+<]"));
        assert!(is_balanced("[[]]comment"));
        assert!(!is_balanced("+[->"));
        assert!(!is_balanced("[[]"));
        assert!(is_balanced("]"));
    }

    #[test]
    fn test_shell_input_discards_rest_of_line() {
        let mut terminal = io::Cursor::new(b"ab\nc\n".to_vec());
        let mut engine = Engine::new(Mode::Interpret);

        let mut out = Vec::new();
        let mut input = ShellInput::new(&mut terminal);
        engine.run(",.", &mut input, &mut out).unwrap();
        input.finish().unwrap();
        assert_eq!(out, b"a");

        let mut out = Vec::new();
        let mut input = ShellInput::new(&mut terminal);
        engine.run(",.", &mut input, &mut out).unwrap();
        input.finish().unwrap();
        assert_eq!(out, b"c");
    }

    #[test]
    fn test_shell_input_keeps_next_line_after_newline() {
        let mut terminal = io::Cursor::new(b"a\nb\n".to_vec());
        let mut engine = Engine::new(Mode::Translate);

        let mut out = Vec::new();
        let mut input = ShellInput::new(&mut terminal);
        engine.run(",.,.", &mut input, &mut out).unwrap();
        input.finish().unwrap();
        assert_eq!(out, b"a\n");

        let mut out = Vec::new();
        let mut input = ShellInput::new(&mut terminal);
        engine.run(",.", &mut input, &mut out).unwrap();
        input.finish().unwrap();
        assert_eq!(out, b"b");
    }

    #[test]
    fn test_shell_input_escape_and_eof_cancel() {
        let mut input = ShellInput::new(&[ESCAPE, b'\n'][..]);
        assert_eq!(input.next_event().unwrap(), InputEvent::Cancel);
        input.finish().unwrap();

        let mut input = ShellInput::new(&b""[..]);
        assert_eq!(input.next_event().unwrap(), InputEvent::Cancel);
    }
}
