use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rill::{CompileFailure, CompileOptions, Emit, compile, run_main};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rill", about = "Rill compiler: parse, check and lower `.rl` programs")]
struct Cli {
    /// Source file
    file: PathBuf,
    /// Print an intermediate form and stop after that stage
    #[arg(long, value_enum)]
    emit: Option<EmitArg>,
    /// Run `main` after lowering
    #[arg(long)]
    run: bool,
    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,
    /// Log pipeline stages (overridden by RILL_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmitArg {
    Tokens,
    Ast,
    Typed,
    Ir,
    Lowered,
}

impl From<EmitArg> for Emit {
    fn from(arg: EmitArg) -> Emit {
        match arg {
            EmitArg::Tokens => Emit::Tokens,
            EmitArg::Ast => Emit::Ast,
            EmitArg::Typed => Emit::Typed,
            EmitArg::Ir => Emit::Ir,
            EmitArg::Lowered => Emit::Lowered,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("RILL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let filename = cli.file.display().to_string();
    let options = CompileOptions {
        emit: cli.emit.map(Emit::from),
        color: !cli.no_color,
    };

    let compiled = match compile(&filename, &source, &options) {
        Ok(compiled) => compiled,
        Err(CompileFailure::Diagnostics(diagnostics)) => {
            diagnostics::report_diagnostics(&filename, &source, &diagnostics, options.color)
                .context("failed to write diagnostics")?;
            eprintln!("{} error(s) in {}", diagnostics.len(), filename);
            return Ok(ExitCode::FAILURE);
        }
        Err(failure @ CompileFailure::Internal(_)) => {
            return Err(failure).context("internal compiler error");
        }
    };

    if let Some(text) = &compiled.emitted {
        print!("{}", text);
    }

    if cli.run {
        let module = compiled
            .module
            .as_ref()
            .context("--run needs the full pipeline; drop --emit or use --emit lowered")?;
        let output = run_main(module).context("runtime error")?;
        print!("{}", output);
    }

    Ok(ExitCode::SUCCESS)
}
