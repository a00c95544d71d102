//! Command-line front-end: evaluate a Datalog program file against queries.
//!
//! ```text
//! datalog program.dl 'tc(a, Y)?' --engine magic
//! ```
//!
//! Queries may also be embedded in the program file (`tc(X, Y)?`); command
//! line queries take precedence when given. Results are printed one ground
//! atom per line, sorted for stable output.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use datalog_ast::{Atom, Clause};
use datalog_eval::{BottomUpEngine, DatalogEngine, DEFAULT_CHUNK_SIZE};
use datalog_magic::MagicSetEngine;
use datalog_parser::{parse_program, parse_query, ParseError};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "datalog", about = "Bottom-up Datalog evaluation engine")]
struct Cli {
    /// Program file: clauses, optionally followed by queries
    program: PathBuf,

    /// Queries to evaluate, e.g. 'tc(a, Y)?'; defaults to the queries
    /// embedded in the program file
    queries: Vec<String>,

    /// Evaluation engine
    #[arg(long, value_enum, default_value = "chunked")]
    engine: EngineKind,

    /// Facts per work item for the chunked engine
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Serial semi-naive evaluation
    Serial,
    /// Concurrent semi-naive evaluation
    Concurrent,
    /// Concurrent evaluation with chunked work items
    Chunked,
    /// Magic-set rewriting over the concurrent engine
    Magic,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.program)
        .with_context(|| format!("reading {}", cli.program.display()))?;
    let program = parse_program(&source)
        .map_err(|errors| anyhow::anyhow!(render_errors(&errors)))
        .with_context(|| format!("parsing {}", cli.program.display()))?;

    let clauses: Vec<Clause> = program.clauses().cloned().collect();
    let queries: Vec<Atom> = if cli.queries.is_empty() {
        program.queries().cloned().collect()
    } else {
        cli.queries
            .iter()
            .map(|q| {
                parse_query(q).map_err(|errors| {
                    anyhow::anyhow!("in query '{}': {}", q, render_errors(&errors))
                })
            })
            .collect::<Result<_>>()?
    };
    if queries.is_empty() {
        bail!("no queries: pass one on the command line or end one with '?' in the file");
    }

    let mut engine: Box<dyn DatalogEngine> = match cli.engine {
        EngineKind::Serial => Box::new(BottomUpEngine::semi_naive_serial()),
        EngineKind::Concurrent => Box::new(BottomUpEngine::semi_naive_concurrent()),
        EngineKind::Chunked => Box::new(BottomUpEngine::chunked_concurrent(cli.chunk_size)),
        EngineKind::Magic => Box::new(MagicSetEngine::new()),
    };

    engine
        .init(&clauses)
        .with_context(|| format!("validating {}", cli.program.display()))?;

    for query in &queries {
        let results = engine
            .query(query)
            .with_context(|| format!("evaluating {}?", query))?;
        let mut lines: Vec<String> = results.iter().map(|atom| atom.to_string()).collect();
        lines.sort();
        for line in lines {
            println!("{}", line);
        }
    }

    Ok(())
}

fn render_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
