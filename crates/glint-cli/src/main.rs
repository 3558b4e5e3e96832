// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Glint compiler command-line interface.
//!
//! `glint [path]` loads the file (or a built-in demo program when no
//! path is given), tokenizes and parses it, prints the AST, and
//! renders any diagnostics with source context. Exit code 0 on
//! success, 1 on any error.

use camino::Utf8PathBuf;
use clap::Parser as ClapParser;
use miette::{miette, Result};
use tracing::debug;

use glint_core::arena::Arena;
use glint_core::diagnostics::{DiagnosticEngine, DiagnosticFormatter, FormatterOptions};
use glint_core::lex::{Lexer, LexerOptions};
use glint_core::parse::{Parser, ParserOptions};
use glint_core::source::SourceManager;

/// Glint: a statically-typed, Rust-flavored language
#[derive(Debug, ClapParser)]
#[command(name = "glint")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file to compile (runs a built-in demo program if omitted)
    path: Option<Utf8PathBuf>,

    /// Render diagnostics in compact one-line form
    #[arg(long)]
    compact: bool,

    /// Print the token stream before parsing
    #[arg(long)]
    tokens: bool,
}

/// Built-in program used when no path is given.
const DEMO_PROGRAM: &str = "\
fn square(x: i32) -> i32 {
    x * x
}

fn main() {
    let mut total = 0
    let limit = 10
    total = total + square(limit)
    print(total)
}
";

fn main() -> Result<()> {
    // Initialize tracing only when RUST_LOG is explicitly set, so
    // normal output stays clean.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{error:?}");
            std::process::exit(1);
        }
    }
}

/// Runs the front-end pipeline; returns `true` when the run produced
/// no errors.
fn run(cli: &Cli) -> Result<bool> {
    let arena = Arena::new();
    let mut sources = SourceManager::with_defaults();

    let file_id = match &cli.path {
        Some(path) => sources
            .load_file(path.as_str())
            .map_err(|error| miette!("cannot load {path}: {error}"))?,
        None => sources
            .load_from_string("demo.gl", DEMO_PROGRAM.to_owned())
            .map_err(|error| miette!("cannot register demo program: {error}"))?,
    };
    debug!(?file_id, "source loaded");

    let formatter = DiagnosticFormatter::new(FormatterOptions {
        compact_mode: cli.compact,
        ..FormatterOptions::default()
    })
    .with_source_manager(&sources);

    let mut engine = DiagnosticEngine::new(&arena, 0);
    let mut lexer = Lexer::new(&sources, &arena, LexerOptions::default());

    let stream = match lexer.tokenize(file_id) {
        Ok(stream) => stream,
        Err(error) => {
            engine.error(
                error.kind.diagnostic_code(),
                error.kind.to_string(),
                error.location,
            );
            report(&formatter, &engine);
            return Ok(false);
        }
    };
    debug!(tokens = stream.len(), "tokenized");

    if cli.tokens {
        for token in stream.iter() {
            println!("{token}");
        }
        println!();
    }

    let mut parser = Parser::new(stream, ParserOptions::default()).with_diagnostics(&mut engine);
    let program = parser.parse_program();
    drop(parser);

    // With recovery on, a program comes back even after errors; print
    // what parsed and let the diagnostics explain the rest.
    if let Ok(program) = &program {
        println!("{program}");
    }

    report(&formatter, &engine);
    Ok(!engine.has_errors())
}

fn report(formatter: &DiagnosticFormatter<'_>, engine: &DiagnosticEngine<'_>) {
    if engine.total_count() > 0 {
        eprintln!("{}", formatter.format_all(engine.diagnostics()));
    }
    eprintln!(
        "{}",
        formatter.format_summary(
            engine.error_count(),
            engine.warning_count(),
            engine.note_count()
        )
    );
}
