use crate::output;

use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::debug;

use lae_engine::{
    progress_channel, EngineConfig, EngineEvent, FatiguePolicy, LinearAlgebraEngine,
    ResultDocument, TreeParser,
};

/// Resolve an operation tree document
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the operation tree document (.json, .yaml or .yml)
    pub input: PathBuf,

    /// Write the result document to a file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of worker threads (default: 4, or one per --factors entry)
    #[arg(long, short = 't', value_name = "N")]
    pub threads: Option<usize>,

    /// Fatigue factor of each worker, comma separated
    #[arg(long, value_delimiter = ',', value_name = "F1,F2,...")]
    pub factors: Vec<f64>,

    /// Print per-worker statistics after the run
    #[arg(long)]
    pub report: bool,
}

impl RunArgs {
    fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::default();
        if self.factors.is_empty() {
            match self.threads {
                Some(threads) => config.with_threads(threads),
                None => config,
            }
        } else {
            config
                .with_threads(self.threads.unwrap_or(self.factors.len()))
                .with_fatigue(FatiguePolicy::Explicit(self.factors.clone()))
        }
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    if !resolve(&args)? {
        std::process::exit(1);
    }
    Ok(())
}

/// Parse, resolve and write exactly one result document. Returns whether the
/// run succeeded; `Err` is reserved for failures to write the document.
fn resolve(args: &RunArgs) -> Result<bool> {
    let input_path = &args.input;

    // Parse the document
    output::status("Parsing", &format!("{}", input_path.display()));
    let tree = match TreeParser::parse_file(input_path) {
        Ok(tree) => tree,
        Err(e) => {
            output::error(&e.to_string());
            let document = ResultDocument::Error(format!("Error parsing input: {}", e.message));
            write_document(&document, args.output.as_deref())?;
            return Ok(false);
        }
    };

    let engine = match LinearAlgebraEngine::with_config(args.engine_config()) {
        Ok(engine) => engine,
        Err(e) => {
            output::error(&format!("Failed to start engine: {}", e));
            write_document(&ResultDocument::Error(e.to_string()), args.output.as_deref())?;
            return Ok(false);
        }
    };
    debug!(config = ?engine.config(), "engine configuration");
    output::info(&format!(
        "{} operators, {} worker threads",
        tree.count_operators(),
        engine.config().thread_count
    ));

    // Resolve in the background; the engine and its sender drop when the thread ends
    let (tx, rx) = progress_channel();
    let engine = engine.with_progress(tx);
    let handle = thread::Builder::new()
        .name("lae-engine".to_string())
        .spawn(move || {
            let outcome = engine.run(tree);
            (outcome, engine.report())
        })?;

    // Process events in the foreground
    for event in rx.iter() {
        render_event(&event);
    }

    let (outcome, report) = handle
        .join()
        .map_err(|_| eyre!("engine thread panicked"))?;

    let outcome = outcome.map(|root| root.into_matrix().unwrap_or_default());
    let succeeded = outcome.is_ok();
    if let Err(e) = &outcome {
        output::error(&e.to_string());
    }

    let document = ResultDocument::from_outcome(outcome);
    write_document(&document, args.output.as_deref())?;

    if args.report {
        eprintln!();
        output::header("Worker report");
        for line in report.to_string().lines() {
            output::dim(&format!("  {}", line));
        }
    }

    Ok(succeeded)
}

fn render_event(event: &EngineEvent) {
    match event {
        EngineEvent::RunStarted { operators } => {
            eprintln!();
            output::header(&format!("Resolving tree ({} operators)", operators));
        }

        EngineEvent::StepStarted { step, kind, tasks } => {
            output::step_started(*step, *kind, *tasks);
        }

        EngineEvent::StepCompleted {
            rows,
            columns,
            duration,
            ..
        } => {
            output::step_completed(*rows, *columns, *duration);
        }

        EngineEvent::RunCompleted {
            success,
            steps,
            duration,
        } => {
            eprintln!();
            if *success {
                output::success(&format!(
                    "Resolved in {} steps ({:.2}s)",
                    steps,
                    duration.as_secs_f64()
                ));
            } else {
                output::failure(&format!(
                    "Failed after {} steps ({:.2}s)",
                    steps,
                    duration.as_secs_f64()
                ));
            }
        }
    }
}

fn write_document(document: &ResultDocument, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            document.write_file(path)?;
            output::status("Wrote", &format!("{}", path.display()));
        }
        None => document.write_to(io::stdout().lock())?,
    }
    Ok(())
}
