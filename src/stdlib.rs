//! Built-in capabilities: the `type` function every environment starts with,
//! and the native catalog extensions draw on (`math` and `text`).

use std::f64::consts;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, VesperError},
    environment::{Arity, Capability, Environment},
    value::Value,
};

pub const TYPE_FUNCTION: &str = "type";

pub fn install(env: &mut Environment) {
    env.insert_builtin(TYPE_FUNCTION, native(1, type_of));
}

pub fn math_functions() -> Vec<(&'static str, Capability)> {
    vec![
        ("sqrt", native(1, math_sqrt)),
        ("abs", native(1, math_abs)),
        ("floor", native(1, math_floor)),
        ("ceil", native(1, math_ceil)),
        ("round", native(1, math_round)),
        ("pow", native(2, math_pow)),
        ("min", variadic(math_min)),
        ("max", variadic(math_max)),
    ]
}

pub fn math_constants() -> Vec<(&'static str, Value)> {
    vec![("pi", Value::Float(consts::PI)), ("e", Value::Float(consts::E))]
}

pub fn text_functions() -> Vec<(&'static str, Capability)> {
    vec![
        ("upper", native(1, text_upper)),
        ("lower", native(1, text_lower)),
        ("len", native(1, text_len)),
        ("trim", native(1, text_trim)),
        ("str", native(1, text_str)),
        ("concat", variadic(text_concat)),
    ]
}

/// Entry point behind the `math` extension.
pub fn register_math(env: &mut Environment) -> Result<()> {
    for (name, capability) in math_functions() {
        env.register_function(name, capability)?;
    }
    for (name, value) in math_constants() {
        env.register_constant(name, value)?;
    }
    Ok(())
}

/// Entry point behind the `text` extension.
pub fn register_text(env: &mut Environment) -> Result<()> {
    for (name, capability) in text_functions() {
        env.register_function(name, capability)?;
    }
    Ok(())
}

fn native(arity: usize, callback: fn(&[Value]) -> Result<Value>) -> Capability {
    Capability::native(Arity::Exact(arity), callback)
}

fn variadic(callback: fn(&[Value]) -> Result<Value>) -> Capability {
    Capability::native(Arity::Variadic, callback)
}

fn type_error(message: impl Into<String>) -> VesperError {
    VesperError::from(Diagnostic::new(DiagnosticKind::Type, message))
}

fn arithmetic_error(message: impl Into<String>) -> VesperError {
    VesperError::from(Diagnostic::new(DiagnosticKind::Arithmetic, message))
}

fn expect_number(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| type_error(format!("expected a number but found {}", value.type_name())))
}

fn expect_text(value: &Value) -> Result<&str> {
    value
        .as_text()
        .ok_or_else(|| type_error(format!("expected text but found {}", value.type_name())))
}

fn to_int(value: f64) -> Result<Value> {
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(Value::Int(value as i64))
    } else {
        Err(arithmetic_error(format!("{value} does not fit in an integer")))
    }
}

fn type_of(args: &[Value]) -> Result<Value> {
    Ok(Value::text(args[0].type_name()))
}

fn math_sqrt(args: &[Value]) -> Result<Value> {
    let n = expect_number(&args[0])?;
    if n < 0.0 {
        return Err(arithmetic_error("square root of a negative number"));
    }
    Ok(Value::Float(n.sqrt()))
}

fn math_abs(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| arithmetic_error("integer overflow in abs")),
        other => Ok(Value::Float(expect_number(other)?.abs())),
    }
}

fn math_floor(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => to_int(expect_number(other)?.floor()),
    }
}

fn math_ceil(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => to_int(expect_number(other)?.ceil()),
    }
}

fn math_round(args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => to_int(expect_number(other)?.round()),
    }
}

fn math_pow(args: &[Value]) -> Result<Value> {
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => {
            let exp = u32::try_from(*exp)
                .map_err(|_| arithmetic_error("exponent is too large"))?;
            base.checked_pow(exp)
                .map(Value::Int)
                .ok_or_else(|| arithmetic_error("integer overflow in pow"))
        }
        (base, exp) => Ok(Value::Float(expect_number(base)?.powf(expect_number(exp)?))),
    }
}

fn extreme(args: &[Value], prefer: fn(f64, f64) -> bool) -> Result<Value> {
    let Some(first) = args.first() else {
        return Err(VesperError::from(Diagnostic::new(
            DiagnosticKind::Argument,
            "expected at least 1 argument",
        )));
    };
    let mut best = first;
    let mut best_num = expect_number(first)?;
    for value in &args[1..] {
        let n = expect_number(value)?;
        if prefer(n, best_num) {
            best = value;
            best_num = n;
        }
    }
    Ok(best.clone())
}

fn math_min(args: &[Value]) -> Result<Value> {
    extreme(args, |candidate, best| candidate < best)
}

fn math_max(args: &[Value]) -> Result<Value> {
    extreme(args, |candidate, best| candidate > best)
}

fn text_upper(args: &[Value]) -> Result<Value> {
    Ok(Value::text(expect_text(&args[0])?.to_uppercase()))
}

fn text_lower(args: &[Value]) -> Result<Value> {
    Ok(Value::text(expect_text(&args[0])?.to_lowercase()))
}

fn text_len(args: &[Value]) -> Result<Value> {
    let count = expect_text(&args[0])?.chars().count();
    Ok(Value::Int(count as i64))
}

fn text_trim(args: &[Value]) -> Result<Value> {
    Ok(Value::text(expect_text(&args[0])?.trim()))
}

fn text_str(args: &[Value]) -> Result<Value> {
    Ok(Value::text(args[0].to_string()))
}

fn text_concat(args: &[Value]) -> Result<Value> {
    Ok(Value::text(
        args.iter().map(ToString::to_string).collect::<String>(),
    ))
}
