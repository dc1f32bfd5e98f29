use crate::{
    ast::{BinaryOp, Node, Number, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticKind, Result, VesperError},
    environment::Environment,
    extension::ExtensionLoader,
    value::Value,
};

/// Receives every value a `print` statement produces.
pub trait OutputSink {
    fn emit(&mut self, value: &Value);
}

/// Writes each printed value on its own line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl OutputSink for Stdout {
    fn emit(&mut self, value: &Value) {
        println!("{value}");
    }
}

impl OutputSink for Vec<Value> {
    fn emit(&mut self, value: &Value) {
        self.push(value.clone());
    }
}

impl OutputSink for Vec<String> {
    fn emit(&mut self, value: &Value) {
        self.push(value.to_string());
    }
}

/// Adapts a closure into an [`OutputSink`].
pub struct FnSink<F>(pub F);

impl<F> OutputSink for FnSink<F>
where
    F: FnMut(&Value),
{
    fn emit(&mut self, value: &Value) {
        (self.0)(value)
    }
}

/// Tree-walking evaluator. The environment is passed to every call; the
/// interpreter itself only holds the extension loader and the output sink.
pub struct Interpreter<'a> {
    loader: &'a ExtensionLoader,
    sink: &'a mut dyn OutputSink,
}

impl<'a> Interpreter<'a> {
    pub fn new(loader: &'a ExtensionLoader, sink: &'a mut dyn OutputSink) -> Self {
        Self { loader, sink }
    }

    pub fn evaluate(&mut self, node: &Node, env: &mut Environment) -> Result<Value> {
        match node {
            Node::Block(statements) => {
                let mut last = Value::Nothing;
                for stmt in statements {
                    last = self.evaluate(stmt, env)?;
                }
                Ok(last)
            }
            Node::Let { name, value } => {
                let value = self.evaluate(value, env)?;
                env.define(name.clone(), value.clone());
                Ok(value)
            }
            Node::Print(value) => {
                let value = self.evaluate(value, env)?;
                self.sink.emit(&value);
                Ok(Value::Nothing)
            }
            Node::Use(name) => {
                tracing::debug!(extension = %name, "activating extension");
                self.loader.load(name, env)?;
                Ok(Value::Nothing)
            }
            Node::Expression(value) => self.evaluate(value, env),
            Node::Number(Number::Int(n)) => Ok(Value::Int(*n)),
            Node::Number(Number::Float(n)) => Ok(Value::Float(*n)),
            Node::Text(text) => Ok(Value::Text(text.clone())),
            Node::Variable(name) => env.lookup(name),
            Node::Unary { op, operand } => {
                let value = self.evaluate(operand, env)?;
                unary(*op, value)
            }
            Node::Binary { op, left, right } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary(*op, left, right)
            }
            Node::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg, env)?);
                }
                env.invoke(name, &values)
            }
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Minus, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| arithmetic_error("integer overflow in negation")),
        (UnaryOp::Minus, Value::Float(n)) => Ok(Value::Float(-n)),
        (op, value @ (Value::Text(_) | Value::Nothing)) => {
            Err(VesperError::from(Diagnostic::new(
                DiagnosticKind::Type,
                format!("unary `{}` expects a number, found {}", op.symbol(), value.type_name()),
            )))
        }
    }
}

/// Operator semantics over every pair of value tags:
/// - int with int stays integral for `+ - *` (overflow is an error)
/// - any other pair of numbers uses float arithmetic
/// - `/` always divides as floats and rejects a zero divisor
/// - text `+` text concatenates, text `*` int repeats
/// - everything else is a type error
fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    use BinaryOp::*;
    match (op, &left, &right) {
        (Add, Value::Int(a), Value::Int(b)) => checked(a.checked_add(*b), "addition"),
        (Sub, Value::Int(a), Value::Int(b)) => checked(a.checked_sub(*b), "subtraction"),
        (Mul, Value::Int(a), Value::Int(b)) => checked(a.checked_mul(*b), "multiplication"),
        (
            _,
            Value::Int(_) | Value::Float(_),
            Value::Int(_) | Value::Float(_),
        ) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(operand_error(op, &left, &right));
            };
            match op {
                Add => Ok(Value::Float(a + b)),
                Sub => Ok(Value::Float(a - b)),
                Mul => Ok(Value::Float(a * b)),
                Div if b == 0.0 => Err(arithmetic_error("division by zero")),
                Div => Ok(Value::Float(a / b)),
            }
        }
        (Add, Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
        (Mul, Value::Text(text), Value::Int(count))
        | (Mul, Value::Int(count), Value::Text(text)) => repeat(text, *count),
        _ => Err(operand_error(op, &left, &right)),
    }
}

/// Largest text, in bytes, that repetition may produce.
pub const MAX_REPEAT_LEN: usize = 1 << 30;

fn repeat(text: &str, count: i64) -> Result<Value> {
    let count = usize::try_from(count).unwrap_or(0);
    if text.len().checked_mul(count).is_none_or(|len| len > MAX_REPEAT_LEN) {
        return Err(arithmetic_error(&format!(
            "text repetition would exceed {MAX_REPEAT_LEN} bytes"
        )));
    }
    Ok(Value::Text(text.repeat(count)))
}

fn checked(result: Option<i64>, what: &str) -> Result<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| arithmetic_error(&format!("integer overflow in {what}")))
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value) -> VesperError {
    VesperError::from(Diagnostic::new(
        DiagnosticKind::Type,
        format!(
            "unsupported operand types for `{}`: {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
    ))
}

fn arithmetic_error(message: &str) -> VesperError {
    VesperError::from(Diagnostic::new(DiagnosticKind::Arithmetic, message))
}
