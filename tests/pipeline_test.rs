// End-to-end tests for the Rill pipeline
//
// Each program under tests/programs/ is compiled through the library API,
// lowered and run with the reference evaluator. A few cases drive the
// `rill` binary itself.

use diagnostics::DiagCode;
use ir::{IrModule, count_maps};
use rill::{CompileFailure, CompileOptions, Emit, compile, run_main};
use std::path::PathBuf;
use std::process::Command;

fn program_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("programs")
        .join(name)
}

fn source(name: &str) -> String {
    std::fs::read_to_string(program_path(name)).expect("test program")
}

fn lowered(name: &str) -> IrModule {
    let compiled = compile(name, &source(name), &CompileOptions::default())
        .unwrap_or_else(|e| panic!("{} failed to compile: {:?}", name, e));
    compiled.module.expect("lowered module")
}

/// Compile, lower and run `main`, returning its output
fn run(name: &str) -> String {
    run_main(&lowered(name)).expect("evaluation")
}

fn failure_codes(name: &str) -> Vec<DiagCode> {
    match compile(name, &source(name), &CompileOptions::default()) {
        Err(CompileFailure::Diagnostics(diagnostics)) => {
            diagnostics.iter().map(|d| d.code).collect()
        }
        Err(other) => panic!("{}: unexpected failure {}", name, other),
        Ok(_) => panic!("{}: expected diagnostics", name),
    }
}

// ==================== RESULTS ====================

#[test]
fn test_map_closure() {
    assert_eq!(run("map_closure.rl"), "[2, 4, 6, 8, 10]\n");
}

#[test]
fn test_map_chain() {
    assert_eq!(run("map_chain.rl"), "[3, 5, 7, 9, 11]\n");
}

#[test]
fn test_map_str() {
    assert_eq!(
        run("map_str.rl"),
        "[\"1\", \"2\", \"3\", \"4\", \"5\"]\n5!\n"
    );
}

#[test]
fn test_map_named_function() {
    assert_eq!(run("map_named.rl"), "[84]\n[4, 8, 12]\n");
}

#[test]
fn test_map_block_closure() {
    assert_eq!(run("map_block_closure.rl"), "[3, 6, 9, 12, 15]\n");
}

#[test]
fn test_map_side_effects_run_once_in_order() {
    assert_eq!(
        run("map_side_effects.rl"),
        "source\nchoose\n10\n20\n30\n[1, 2, 3]\n"
    );
}

#[test]
fn test_map_empty_never_calls() {
    assert_eq!(run("map_empty.rl"), "[]\n0\n");
}

#[test]
fn test_map_captures() {
    assert_eq!(run("map_captures.rl"), "[3, 7, 12]\n12\n[7, 14]\n");
}

#[test]
fn test_no_map_left_after_lowering() {
    for name in [
        "map_closure.rl",
        "map_chain.rl",
        "map_named.rl",
        "map_side_effects.rl",
        "map_captures.rl",
    ] {
        let module = lowered(name);
        for function in &module.functions {
            assert_eq!(count_maps(function), 0, "{} in {}", function.name, name);
        }
    }
}

#[test]
fn test_placements_cover_every_function() {
    let compiled = compile(
        "map_captures.rl",
        &source("map_captures.rl"),
        &CompileOptions::default(),
    )
    .expect("compile");
    let scale = &compiled.placements["scale"];
    // The returned result container must outlive the call
    assert_eq!(scale.heap_sites().count(), 1);
    assert!(compiled.placements.contains_key("main"));
}

// ==================== DIAGNOSTICS ====================

#[test]
fn test_map_errors_are_all_reported() {
    assert_eq!(
        failure_codes("map_errors.rl"),
        vec![
            DiagCode::MapWrongLeftRole,
            DiagCode::MapWrongRightRole,
            DiagCode::MapArityMismatch,
            DiagCode::MapElementTypeMismatch,
        ]
    );
}

#[test]
fn test_map_binds_loosest() {
    assert_eq!(
        failure_codes("map_precedence_error.rl"),
        vec![DiagCode::MapWrongLeftRole]
    );
}

#[test]
fn test_missing_map_operand_is_a_syntax_error() {
    let codes = failure_codes("map_syntax_error.rl");
    assert!(!codes.is_empty());
    assert!(codes.iter().all(|c| *c == DiagCode::Syntax), "{:?}", codes);
}

#[test]
fn test_rendered_report_names_code() {
    let name = "map_errors.rl";
    let text = source(name);
    let failure = compile(name, &text, &CompileOptions::default()).expect_err("diagnostics");
    let rendered =
        diagnostics::render(name, &text, failure.diagnostics(), false).expect("render");
    assert!(rendered.contains("E201"), "{}", rendered);
    assert!(rendered.contains("must be a sequence"), "{}", rendered);
}

// ==================== EMIT ====================

#[test]
fn test_emit_lowered_shows_loop() {
    let options = CompileOptions {
        emit: Some(Emit::Lowered),
        ..CompileOptions::default()
    };
    let compiled = compile("map_named.rl", &source("map_named.rl"), &options).expect("compile");
    let text = compiled.emitted.expect("emitted text");
    assert!(text.contains("alloc [i64;"), "{}", text);
    assert!(text.contains("for $i"), "{}", text);
    assert!(!text.contains("|>"), "{}", text);
}

#[test]
fn test_emit_ir_keeps_map() {
    let options = CompileOptions {
        emit: Some(Emit::Ir),
        ..CompileOptions::default()
    };
    let compiled = compile("map_named.rl", &source("map_named.rl"), &options).expect("compile");
    assert!(compiled.module.is_none());
    assert!(compiled.emitted.expect("emitted text").contains("|>"));
}

#[test]
fn test_emit_tokens() {
    let options = CompileOptions {
        emit: Some(Emit::Tokens),
        ..CompileOptions::default()
    };
    let compiled =
        compile("map_closure.rl", &source("map_closure.rl"), &options).expect("compile");
    assert!(compiled.emitted.expect("emitted text").contains("PipeMap"));
}

// ==================== BINARY ====================

fn rill(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_rill"))
        .args(args)
        .env_remove("RILL_LOG")
        .output()
        .expect("failed to execute rill");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_cli_run() {
    let path = program_path("map_chain.rl");
    let (stdout, _, code) = rill(&[path.to_str().expect("utf-8 path"), "--run"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "[3, 5, 7, 9, 11]\n");
}

#[test]
fn test_cli_reports_diagnostics() {
    let path = program_path("map_errors.rl");
    let (_, stderr, code) = rill(&[path.to_str().expect("utf-8 path"), "--no-color"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("E202"), "{}", stderr);
    assert!(stderr.contains("4 error(s)"), "{}", stderr);
}

#[test]
fn test_cli_missing_file() {
    let (_, stderr, code) = rill(&["tests/programs/does_not_exist.rl"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("failed to read"), "{}", stderr);
}
