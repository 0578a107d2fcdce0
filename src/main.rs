// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! tapeworm - interpreter and bytecode translator for the tape language
//!
//! This is the main entry point for the tapeworm CLI and shell.
//!
//! ## Features
//!
//! - Interactive shell with highlighting, history and multi-line loops
//! - Direct interpretation or translation to bytecode
//! - Persisted, directly runnable artifacts
//! - Parallel compilation of several source files

mod config;
mod repl;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tapeworm_engine::package::artifact;
use tapeworm_engine::{
    CompiledUnit, Engine, Mode, Outcome, ParallelTranslator, ReaderInput,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(
    name = "tapeworm",
    about = "Interpreter and bytecode translator for the eight-instruction tape language",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Print the elapsed time after each run
    #[arg(long, global = true)]
    time: bool,

    /// Number of tape cells
    #[arg(long, global = true, value_name = "CELLS")]
    tape_size: Option<usize>,

    /// Largest program the interpreter accepts, in characters
    #[arg(long, global = true, value_name = "CHARS")]
    buffer_size: Option<usize>,

    /// Directory for artifacts with relative names
    #[arg(long, global = true, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a source file
    Run {
        /// Program file
        file: PathBuf,

        /// Engine to use (interpret or translate)
        #[arg(short, long)]
        mode: Option<Mode>,
    },

    /// Run program text given on the command line
    Eval {
        /// Program text
        code: String,

        /// Engine to use (interpret or translate)
        #[arg(short, long)]
        mode: Option<Mode>,
    },

    /// Translate source files into runnable artifacts
    Compile {
        /// Program files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Artifact name (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute a persisted artifact
    Exec {
        /// Artifact file
        artifact: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "tapeworm=debug,tapeworm_engine=debug"
    } else {
        "tapeworm=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut settings = Settings::load()?;
    let mode = match &cli.command {
        Some(Command::Run { mode, .. } | Command::Eval { mode, .. }) => *mode,
        _ => None,
    };
    settings.apply_overrides(mode, cli.tape_size, cli.buffer_size, cli.out_dir);
    settings.engine.validate()?;
    debug!(?settings, "effective settings");

    match cli.command {
        None => {
            repl::Repl::new(&settings)?.run()?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Run { file, .. }) => {
            let path = locate(&file);
            let source = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            run_source(&settings, source, cli.time).await
        }
        Some(Command::Eval { code, .. }) => run_source(&settings, code, cli.time).await,
        Some(Command::Compile { files, output }) => compile(&settings, files, output).await,
        Some(Command::Exec { artifact }) => exec(artifact, cli.time).await,
    }
}

/// Execute `source` with the configured engine, reading `,` input from stdin.
async fn run_source(settings: &Settings, source: String, time: bool) -> anyhow::Result<ExitCode> {
    let mut engine =
        Engine::with_config(settings.mode, settings.engine, settings.output_dir.clone())?;

    let (outcome, elapsed) = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let outcome = engine.run(&source, ReaderInput::stdin(), io::stdout());
        (outcome, start.elapsed())
    })
    .await?;

    report(outcome?, elapsed, time);
    Ok(ExitCode::SUCCESS)
}

async fn compile(
    settings: &Settings,
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    if output.is_some() && files.len() > 1 {
        bail!("--output names a single artifact; pass one input file or omit it");
    }

    let mut jobs = Vec::with_capacity(files.len());
    for file in &files {
        let path = locate(file);
        let source = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let name = match &output {
            Some(name) => name.clone(),
            None => artifact_name(file)?,
        };
        jobs.push((source, name));
    }

    let translator = settings.translator()?;
    let results = if jobs.len() == 1 {
        let (source, name) = &jobs[0];
        vec![translator.translate_to(source, name)]
    } else {
        let parallel = ParallelTranslator::new(translator)?;
        tokio::task::spawn_blocking(move || parallel.translate_all_to(&jobs)).await?
    };

    let mut failed = false;
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(path) => println!(
                "{} {} {} {}",
                "Compiled".green().bold(),
                file.display(),
                "->".dimmed(),
                path.display().cyan()
            ),
            Err(e) => {
                failed = true;
                eprintln!("{}: {}: {}", "Error".red().bold(), file.display(), e);
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn exec(path: PathBuf, time: bool) -> anyhow::Result<ExitCode> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let unit = CompiledUnit::new(artifact::decode(&text, &path)?);

    let (outcome, elapsed) = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let outcome = unit.execute(ReaderInput::stdin(), io::stdout());
        (outcome, start.elapsed())
    })
    .await?;

    report(outcome?, elapsed, time);
    Ok(ExitCode::SUCCESS)
}

fn report(outcome: Outcome, elapsed: Duration, time: bool) {
    if outcome == Outcome::Cancelled {
        eprintln!("{}", "input cancelled".dimmed());
    }
    if time {
        eprintln!("{} {:.3?}", "elapsed".dimmed(), elapsed);
    }
}

/// Artifact name for a source file: its stem.
fn artifact_name(file: &Path) -> anyhow::Result<PathBuf> {
    file.file_stem()
        .map(PathBuf::from)
        .with_context(|| format!("cannot derive an artifact name from '{}'", file.display()))
}

/// Resolve a user-supplied path, falling back to the executable's
/// directory for relative paths missing from the working directory.
pub(crate) fn locate(path: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_mode_flag() {
        let cli = Cli::try_parse_from(["tapeworm", "run", "hello.tw", "--mode", "interpret"]).unwrap();
        match cli.command {
            Some(Command::Run { file, mode }) => {
                assert_eq!(file, PathBuf::from("hello.tw"));
                assert_eq!(mode, Some(Mode::Interpret));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_compile_many() {
        let cli = Cli::try_parse_from(["tapeworm", "compile", "a.tw", "b.tw", "--tape-size", "8"])
            .unwrap();
        assert_eq!(cli.tape_size, Some(8));
        match cli.command {
            Some(Command::Compile { files, output }) => {
                assert_eq!(files.len(), 2);
                assert!(output.is_none());
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(
            artifact_name(Path::new("dir/hello.tw")).unwrap(),
            PathBuf::from("hello")
        );
    }

    #[test]
    fn test_locate_existing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.tw");
        std::fs::write(&file, "+").unwrap();
        assert_eq!(locate(&file), file);
    }
}
