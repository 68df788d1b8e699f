// Reference evaluator for lowered IR
//
// Runs a module directly so lowering can be checked end to end. Sequences
// are shared mutable buffers; closures hold their captured locals by
// reference. `|>` nodes are rejected: only lowered code runs here.

use crate::nodes::{
    BoundsCheck, Const, IrClosure, IrExpr, IrExprKind, IrFunction, IrModule, IrStmt, LocalId,
};
use crate::types::IrType;
use diagnostics::Span;
use parser::ast::{BinaryOp, UnaryOp};
use sema::Builtin;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("'|>' at {}..{} was not lowered", .span.start, .span.end)]
    Unlowered { span: Span },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("unchecked index {index} out of bounds for length {len}")]
    ElidedBoundsViolated { index: i64, len: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("no function named '{0}'")]
    NoSuchFunction(String),

    #[error("local {0:?} read before it was bound")]
    UnboundLocal(LocalId),

    #[error("cannot allocate {0} elements")]
    InvalidLength(i64),

    #[error("type error during evaluation: {0}")]
    Type(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone)]
pub enum Callable {
    Function(String),
    Builtin(Builtin),
    Closure(Rc<ClosureValue>),
}

#[derive(Debug)]
pub struct ClosureValue {
    closure: IrClosure,
    env: Vec<(LocalId, Rc<RefCell<Value>>)>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Int(i64),
    Bool(bool),
    Str(String),
    Slice(Rc<RefCell<Vec<Value>>>),
    Func(Callable),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn slice(values: Vec<Value>) -> Value {
        Value::Slice(Rc::new(RefCell::new(values)))
    }

    /// Zero value of a type, used to fill fresh allocations
    fn zero(ty: &IrType) -> Value {
        match ty {
            IrType::I64 => Value::Int(0),
            IrType::Bool => Value::Bool(false),
            IrType::Str => Value::Str(String::new()),
            IrType::Slice(_) => Value::slice(Vec::new()),
            IrType::Tuple(types) => Value::Tuple(types.iter().map(Value::zero).collect()),
            IrType::Func(_) | IrType::Unit | IrType::Invalid => Value::Unit,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

// Functions compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Slice(a), Value::Slice(b)) => *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => match (a, b) {
                (Callable::Function(a), Callable::Function(b)) => a == b,
                (Callable::Builtin(a), Callable::Builtin(b)) => a == b,
                (Callable::Closure(a), Callable::Closure(b)) => Rc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Slice(values) => {
                write!(f, "[")?;
                for (i, value) in values.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    value.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Value::Func(Callable::Function(name)) => write!(f, "<fn {}>", name),
            Value::Func(Callable::Builtin(builtin)) => write!(f, "<builtin {}>", builtin.name()),
            Value::Func(Callable::Closure(_)) => write!(f, "<closure>"),
            Value::Tuple(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    value.fmt_nested(f)?;
                }
                write!(f, ")")
            }
        }
    }
}

type Cell = Rc<RefCell<Value>>;

#[derive(Default)]
struct Frame {
    locals: HashMap<LocalId, Cell>,
}

impl Frame {
    fn bind(&mut self, local: LocalId, value: Value) {
        self.locals.insert(local, Rc::new(RefCell::new(value)));
    }

    fn cell(&self, local: LocalId) -> EvalResult<&Cell> {
        self.locals.get(&local).ok_or(EvalError::UnboundLocal(local))
    }

    fn read(&self, local: LocalId) -> EvalResult<Value> {
        Ok(self.cell(local)?.borrow().clone())
    }

    fn write(&self, local: LocalId, value: Value) -> EvalResult<()> {
        *self.cell(local)?.borrow_mut() = value;
        Ok(())
    }
}

enum Flow {
    Next,
    Break,
    Return(Value),
}

pub struct Interpreter<'m> {
    functions: HashMap<&'m str, &'m IrFunction>,
    output: String,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m IrModule) -> Self {
        Interpreter {
            functions: module
                .functions
                .iter()
                .map(|f| (f.name.as_str(), f))
                .collect(),
            output: String::new(),
        }
    }

    /// Everything printed so far, one line per `println`
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn call(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let function = *self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::NoSuchFunction(name.to_string()))?;

        let mut frame = Frame::default();
        bind_params(&mut frame, &function.params, args)?;
        match self.block(&function.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Next | Flow::Break => Ok(Value::Unit),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Func(Callable::Function(name)) => self.call(&name, args),
            Value::Func(Callable::Builtin(builtin)) => self.builtin(builtin, args),
            Value::Func(Callable::Closure(closure)) => {
                let mut frame = Frame::default();
                for (local, cell) in &closure.env {
                    frame.locals.insert(*local, Rc::clone(cell));
                }
                bind_params(&mut frame, &closure.closure.params, args)?;
                match self.block(&closure.closure.body, &mut frame)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Next | Flow::Break => Ok(Value::Unit),
                }
            }
            other => Err(EvalError::Type(format!("cannot call {}", other))),
        }
    }

    fn builtin(&mut self, builtin: Builtin, args: Vec<Value>) -> EvalResult<Value> {
        match (builtin, args.as_slice()) {
            (Builtin::Println, [value]) => {
                self.output.push_str(&value.to_string());
                self.output.push('\n');
                Ok(Value::Unit)
            }
            (Builtin::Str, [Value::Int(n)]) => Ok(Value::Str(n.to_string())),
            (Builtin::Len, [Value::Slice(values)]) => Ok(Value::Int(values.borrow().len() as i64)),
            (Builtin::Len, [Value::Str(s)]) => Ok(Value::Int(s.len() as i64)),
            (builtin, args) => Err(EvalError::Type(format!(
                "'{}' applied to {} argument(s)",
                builtin.name(),
                args.len()
            ))),
        }
    }

    fn block(&mut self, stmts: &[IrStmt], frame: &mut Frame) -> EvalResult<Flow> {
        for stmt in stmts {
            match self.stmt(stmt, frame)? {
                Flow::Next => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    fn stmt(&mut self, stmt: &IrStmt, frame: &mut Frame) -> EvalResult<Flow> {
        match stmt {
            IrStmt::Let { local, value } => {
                let value = self.eval(value, frame)?;
                frame.bind(*local, value);
            }
            IrStmt::Assign { local, value } => {
                let value = self.eval(value, frame)?;
                frame.write(*local, value)?;
            }
            IrStmt::Store {
                seq,
                index,
                value,
                bounds,
            } => {
                let seq = self.eval(seq, frame)?;
                let index = self.eval(index, frame)?;
                let value = self.eval(value, frame)?;
                let values = expect_slice(&seq)?;
                let mut values = values.borrow_mut();
                let slot = position(expect_int(&index)?, values.len(), *bounds)?;
                values[slot] = value;
            }
            IrStmt::Expr(expr) => {
                self.eval(expr, frame)?;
            }
            IrStmt::Return(values) => {
                let mut results = Vec::with_capacity(values.len());
                for value in values {
                    results.push(self.eval(value, frame)?);
                }
                let value = match results.len() {
                    0 => Value::Unit,
                    1 => results.remove(0),
                    _ => Value::Tuple(results),
                };
                return Ok(Flow::Return(value));
            }
            IrStmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.eval(cond, frame)?;
                let branch = if expect_bool(&cond)? {
                    then_block
                } else {
                    else_block
                };
                return self.block(branch, frame);
            }
            IrStmt::While { cond, body } => loop {
                let cond = self.eval(cond, frame)?;
                if !expect_bool(&cond)? {
                    break;
                }
                match self.block(body, frame)? {
                    Flow::Next => {}
                    Flow::Break => break,
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            },
            IrStmt::Break => return Ok(Flow::Break),
            IrStmt::ForRange {
                var,
                start,
                end,
                body,
            } => {
                let start = expect_int(&self.eval(start, frame)?)?;
                let end = expect_int(&self.eval(end, frame)?)?;
                for i in start..end {
                    frame.bind(*var, Value::Int(i));
                    match self.block(body, frame)? {
                        Flow::Next => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
        }
        Ok(Flow::Next)
    }

    fn eval(&mut self, expr: &IrExpr, frame: &mut Frame) -> EvalResult<Value> {
        match &expr.kind {
            IrExprKind::Const(Const::Int(n)) => Ok(Value::Int(*n)),
            IrExprKind::Const(Const::Bool(b)) => Ok(Value::Bool(*b)),
            IrExprKind::Const(Const::Str(s)) => Ok(Value::Str(s.clone())),
            IrExprKind::Local(local) => frame.read(*local),
            IrExprKind::FuncRef(name) => Ok(Value::Func(Callable::Function(name.clone()))),
            IrExprKind::Builtin(builtin) => Ok(Value::Func(Callable::Builtin(*builtin))),

            IrExprKind::Unary { op, expr } => match (op, self.eval(expr, frame)?) {
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                (_, other) => Err(EvalError::Type(format!("bad unary operand {}", other))),
            },

            IrExprKind::Binary { op, lhs, rhs, .. } => match op {
                BinaryOp::Map => Err(EvalError::Unlowered {
                    span: expr.span.clone(),
                }),
                BinaryOp::LogicalAnd => {
                    if !expect_bool(&self.eval(lhs, frame)?)? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(expect_bool(&self.eval(rhs, frame)?)?))
                }
                BinaryOp::LogicalOr => {
                    if expect_bool(&self.eval(lhs, frame)?)? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(expect_bool(&self.eval(rhs, frame)?)?))
                }
                op => {
                    let lhs = self.eval(lhs, frame)?;
                    let rhs = self.eval(rhs, frame)?;
                    binary(*op, lhs, rhs)
                }
            },

            IrExprKind::Call { callee, args } => {
                let callee = self.eval(callee, frame)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, frame)?);
                }
                self.call_value(callee, values)
            }

            IrExprKind::Index { seq, index, bounds } => {
                let seq = self.eval(seq, frame)?;
                let index = expect_int(&self.eval(index, frame)?)?;
                let values = expect_slice(&seq)?.borrow();
                let slot = position(index, values.len(), *bounds)?;
                Ok(values[slot].clone())
            }

            IrExprKind::Len(operand) => {
                let value = self.eval(operand, frame)?;
                self.builtin(Builtin::Len, vec![value])
            }

            IrExprKind::Alloc { elem, len, .. } => {
                let len = expect_int(&self.eval(len, frame)?)?;
                let count = usize::try_from(len).map_err(|_| EvalError::InvalidLength(len))?;
                Ok(Value::slice((0..count).map(|_| Value::zero(elem)).collect()))
            }

            IrExprKind::SliceLit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, frame)?);
                }
                Ok(Value::slice(values))
            }

            IrExprKind::Closure(closure) => {
                let mut env = Vec::with_capacity(closure.captures.len());
                for local in &closure.captures {
                    env.push((*local, Rc::clone(frame.cell(*local)?)));
                }
                Ok(Value::Func(Callable::Closure(Rc::new(ClosureValue {
                    closure: closure.clone(),
                    env,
                }))))
            }
        }
    }
}

fn bind_params(frame: &mut Frame, params: &[LocalId], args: Vec<Value>) -> EvalResult<()> {
    if params.len() != args.len() {
        return Err(EvalError::Type(format!(
            "expected {} argument(s), got {}",
            params.len(),
            args.len()
        )));
    }
    for (param, arg) in params.iter().zip(args) {
        frame.bind(*param, arg);
    }
    Ok(())
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    let value = match (op, &lhs, &rhs) {
        (BinaryOp::Eq, _, _) => Value::Bool(lhs == rhs),
        (BinaryOp::NotEq, _, _) => Value::Bool(lhs != rhs),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Value::Str(format!("{}{}", a, b)),
        (BinaryOp::Lt, Value::Str(a), Value::Str(b)) => Value::Bool(a < b),
        (BinaryOp::Gt, Value::Str(a), Value::Str(b)) => Value::Bool(a > b),
        (BinaryOp::LtEq, Value::Str(a), Value::Str(b)) => Value::Bool(a <= b),
        (BinaryOp::GtEq, Value::Str(a), Value::Str(b)) => Value::Bool(a >= b),
        (op, Value::Int(a), Value::Int(b)) => integer(op, *a, *b)?,
        (op, _, _) => {
            return Err(EvalError::Type(format!(
                "'{}' applied to {} and {}",
                op.symbol(),
                lhs,
                rhs
            )));
        }
    };
    Ok(value)
}

// Arithmetic wraps on overflow
fn integer(op: BinaryOp, a: i64, b: i64) -> EvalResult<Value> {
    let value = match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => Value::Int(a.wrapping_div(b)),
        BinaryOp::Mod => Value::Int(a.wrapping_rem(b)),
        // A negative exponent yields 0
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exp) => Value::Int(a.wrapping_pow(exp)),
            Err(_) => Value::Int(0),
        },
        BinaryOp::BitAnd => Value::Int(a & b),
        BinaryOp::BitOr => Value::Int(a | b),
        BinaryOp::BitXor => Value::Int(a ^ b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        op => {
            return Err(EvalError::Type(format!(
                "'{}' is not an integer operator",
                op.symbol()
            )));
        }
    };
    Ok(value)
}

fn position(index: i64, len: usize, bounds: BoundsCheck) -> EvalResult<usize> {
    match usize::try_from(index) {
        Ok(slot) if slot < len => Ok(slot),
        _ => Err(match bounds {
            BoundsCheck::Checked => EvalError::IndexOutOfBounds { index, len },
            BoundsCheck::Elided => EvalError::ElidedBoundsViolated { index, len },
        }),
    }
}

fn expect_int(value: &Value) -> EvalResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::Type(format!("expected an integer, got {}", other))),
    }
}

fn expect_bool(value: &Value) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::Type(format!("expected a boolean, got {}", other))),
    }
}

fn expect_slice(value: &Value) -> EvalResult<&Rc<RefCell<Vec<Value>>>> {
    match value {
        Value::Slice(values) => Ok(values),
        other => Err(EvalError::Type(format!("expected a sequence, got {}", other))),
    }
}
