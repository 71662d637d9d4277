mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::run::RunArgs;
use commands::validate::ValidateArgs;

/// Resolve matrix operation trees on a pool of fatigue-weighted workers
#[derive(Parser, Debug)]
#[command(name = "lae", version, about)]
struct Cli {
    /// Log filter, overriding RUST_LOG (e.g. "debug" or "lae_engine=trace")
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an operation tree document and write the result document
    Run(RunArgs),

    /// Check an operation tree document without running it
    Validate(ValidateArgs),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Command::Run(args) => commands::run::execute(args),
        Command::Validate(args) => commands::validate::execute(args),
    }
}

/// Logs go to stderr; stdout is reserved for the result document
fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(directives) => EnvFilter::try_new(directives)
            .wrap_err_with(|| format!("invalid log filter '{}'", directives))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("failed to install log subscriber: {}", e))
}
