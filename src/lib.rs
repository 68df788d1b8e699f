// Rill compiler driver
//
// One unit goes through: lex, parse, validate, translate to IR,
// re-validate, annotate maps with escape facts, lower, place allocations.
// Front-end diagnostics stop the unit before translation; re-validation
// diagnostics stop it before lowering.

use diagnostics::Diagnostic;
use ir::{EvalError, Interpreter, InternalError, IrModule, Placements};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

pub use ir::Value;

/// Intermediate form to print instead of running the whole pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Tokens,
    Ast,
    Typed,
    Ir,
    Lowered,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Stop after this stage and return its text form
    pub emit: Option<Emit>,
    /// Colored diagnostic reports
    pub color: bool,
}

#[derive(Debug)]
pub struct Compiled {
    /// Lowered module; absent when an earlier `emit` stage stopped the unit
    pub module: Option<IrModule>,
    /// Allocation placement per function
    pub placements: BTreeMap<String, Placements>,
    pub emitted: Option<String>,
}

impl Compiled {
    fn emitted(text: String) -> Self {
        Compiled {
            module: None,
            placements: BTreeMap::new(),
            emitted: Some(text),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileFailure {
    #[error("compilation failed with {} error(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CompileFailure {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileFailure::Diagnostics(diagnostics) => diagnostics,
            CompileFailure::Internal(_) => &[],
        }
    }
}

fn stop_on(diagnostics: Vec<Diagnostic>, stage: &str) -> Result<(), CompileFailure> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    info!(stage, errors = diagnostics.len(), "stopping after diagnostics");
    Err(CompileFailure::Diagnostics(diagnostics))
}

/// Compile one unit
pub fn compile(
    filename: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<Compiled, CompileFailure> {
    info!(file = filename, bytes = source.len(), "compiling");

    if options.emit == Some(Emit::Tokens) {
        let lexed = lexer::lex(source);
        stop_on(lexed.diagnostics, "lex")?;
        let text = lexed
            .tokens
            .iter()
            .map(|(token, span)| format!("{:?} @ {}..{}\n", token, span.start, span.end))
            .collect();
        return Ok(Compiled::emitted(text));
    }

    let parsed = parser::parse_source(source);
    debug!(
        functions = parsed.program.functions.len(),
        errors = parsed.diagnostics.len(),
        "parsed"
    );
    stop_on(parsed.diagnostics, "parse")?;
    if options.emit == Some(Emit::Ast) {
        return Ok(Compiled::emitted(format!("{:#?}\n", parsed.program)));
    }

    let checked = sema::check_program(&parsed.program);
    stop_on(checked.diagnostics, "check")?;
    if options.emit == Some(Emit::Typed) {
        return Ok(Compiled::emitted(format!("{:#?}\n", checked.program)));
    }

    let mut module = ir::translate_program(&checked.program)?;
    stop_on(ir::verify_module(&mut module), "verify")?;
    if options.emit == Some(Emit::Ir) {
        return Ok(Compiled::emitted(ir::print_module(&module)));
    }

    ir::annotate_module(&mut module);
    let lowered = ir::lower_module(&mut module)?;
    let placements: BTreeMap<String, Placements> = module
        .functions
        .iter()
        .map(|f| (f.name.clone(), ir::place_allocations(f)))
        .collect();
    info!(
        functions = module.functions.len(),
        maps = lowered,
        "compiled"
    );

    let emitted = (options.emit == Some(Emit::Lowered)).then(|| ir::print_module(&module));
    Ok(Compiled {
        module: Some(module),
        placements,
        emitted,
    })
}

/// Run `main` of a lowered module, returning everything it printed
pub fn run_main(module: &IrModule) -> Result<String, EvalError> {
    let mut interpreter = Interpreter::new(module);
    interpreter.call("main", Vec::new())?;
    Ok(interpreter.output().to_string())
}
