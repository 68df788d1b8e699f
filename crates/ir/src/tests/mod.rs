
use crate::escape::annotate_module;
use crate::eval::{Interpreter, Value};
use crate::lower::lower_module;
use crate::nodes::{IrFunction, IrModule};
use crate::translate::translate_program;
use crate::verify::verify_module;

pub(crate) const PRELUDE: &str = "\
function double(x: int) -> int { return x * 2 }
function add(a: int, b: int) -> int { return a + b }
";

/// Parse, validate and translate a program that must be error free
pub(crate) fn translate(source: &str) -> IrModule {
    let parsed = parser::parse_source(source);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let checked = sema::check_program(&parsed.program);
    assert!(checked.diagnostics.is_empty(), "{:?}", checked.diagnostics);
    translate_program(&checked.program).expect("translation")
}

pub(crate) fn translate_body(body: &str) -> IrModule {
    translate(&format!("{}function main() {{\n{}\n}}", PRELUDE, body))
}

/// Translate, re-validate, annotate and lower
pub(crate) fn lowered(source: &str) -> IrModule {
    let mut module = translate(source);
    let diagnostics = verify_module(&mut module);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    annotate_module(&mut module);
    lower_module(&mut module).expect("lowering");
    module
}

pub(crate) fn lowered_body(body: &str) -> IrModule {
    lowered(&format!("{}function main() {{\n{}\n}}", PRELUDE, body))
}

/// Lower and run `main`, returning what it printed
pub(crate) fn run_body(body: &str) -> String {
    let module = lowered_body(body);
    let mut interpreter = Interpreter::new(&module);
    let result = interpreter.call("main", Vec::new()).expect("evaluation");
    assert_eq!(result, Value::Unit);
    interpreter.output().to_string()
}

pub(crate) fn main_of(module: &IrModule) -> &IrFunction {
    module.function("main").expect("main")
}
