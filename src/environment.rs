use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, VesperError},
    lexer, stdlib,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

pub type Callback = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A host-provided callable registered into an [`Environment`].
#[derive(Clone)]
pub struct Capability {
    pub arity: Arity,
    callback: Callback,
}

impl Capability {
    pub fn native<F>(arity: Arity, callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self {
            arity,
            callback: Rc::new(callback),
        }
    }

    /// Wraps a plain value as a zero-argument capability.
    pub fn constant(value: Value) -> Self {
        Self::native(Arity::Exact(0), move |_| Ok(value.clone()))
    }

    /// Checks the argument count, then runs the callback.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if let Arity::Exact(expected) = self.arity {
            if args.len() != expected {
                return Err(VesperError::from(Diagnostic::new(
                    DiagnosticKind::Argument,
                    format!(
                        "expected {expected} argument{} but received {}",
                        if expected == 1 { "" } else { "s" },
                        args.len()
                    ),
                )));
            }
        }
        (self.callback)(args)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Variable bindings and registered capabilities for one execution.
///
/// One flat namespace per table: `let` overwrites, registration overwrites.
/// Capabilities are reference counted with `Rc`, so an environment never
/// crosses threads.
#[derive(Debug)]
pub struct Environment {
    variables: IndexMap<String, Value>,
    functions: IndexMap<String, Capability>,
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Self {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
        };
        stdlib::install(&mut env);
        env
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Result<Value> {
        self.variables.get(name).cloned().ok_or_else(|| {
            VesperError::from(Diagnostic::new(
                DiagnosticKind::UndefinedName,
                format!("undefined variable `{name}`"),
            ))
        })
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        capability: Capability,
    ) -> Result<()> {
        let name = name.into();
        if !is_callable_name(&name) {
            return Err(VesperError::from(Diagnostic::new(
                DiagnosticKind::Type,
                format!("`{name}` cannot be registered: scripts could never call it"),
            )));
        }
        tracing::trace!(function = %name, arity = ?capability.arity, "registering capability");
        self.functions.insert(name, capability);
        Ok(())
    }

    /// Installs a built-in under a fixed name known to be callable.
    pub(crate) fn insert_builtin(&mut self, name: &'static str, capability: Capability) {
        debug_assert!(is_callable_name(name));
        self.functions.insert(name.to_string(), capability);
    }

    pub fn register_constant(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        self.register_function(name, Capability::constant(value))
    }

    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        let capability = self.functions.get(name).ok_or_else(|| {
            VesperError::from(Diagnostic::new(
                DiagnosticKind::UndefinedName,
                format!("function not found: `{name}`"),
            ))
        })?;
        capability.call(args).map_err(|err| match err {
            VesperError::Diagnostic(diag)
                if matches!(diag.kind, DiagnosticKind::Argument | DiagnosticKind::Type) =>
            {
                let mut wrapped = Diagnostic::new(
                    DiagnosticKind::Argument,
                    format!("bad arguments for `{name}`: {}", diag.message),
                );
                wrapped.notes = diag.notes;
                VesperError::from(wrapped)
            }
            other => other,
        })
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn is_callable_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    starts_well
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && lexer::keyword_for(name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_overwrites_previous_binding() {
        let mut env = Environment::new();
        env.define("x", Value::Int(10));
        env.define("x", Value::Int(20));
        assert_eq!(env.lookup("x").unwrap(), Value::Int(20));
        assert_eq!(env.variables().count(), 1);
    }

    #[test]
    fn lookup_of_unbound_name_fails() {
        let env = Environment::new();
        let err = env.lookup("missing").unwrap_err();
        assert_eq!(err.kind(), Some(DiagnosticKind::UndefinedName));
    }

    #[test]
    fn fresh_environment_only_knows_type() {
        let env = Environment::new();
        assert_eq!(env.function_names().collect::<Vec<_>>(), vec!["type"]);
    }

    #[test]
    fn reserved_and_malformed_names_are_rejected() {
        let mut env = Environment::new();
        for name in ["let", "print", "use", "", "9lives", "has space"] {
            let err = env
                .register_constant(name, Value::Int(1))
                .expect_err("name should be rejected");
            assert_eq!(err.kind(), Some(DiagnosticKind::Type), "{name}");
        }
    }

    #[test]
    fn constants_take_no_arguments() {
        let mut env = Environment::new();
        env.register_constant("answer", Value::Int(42)).unwrap();
        assert_eq!(env.invoke("answer", &[]).unwrap(), Value::Int(42));
        let err = env.invoke("answer", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), Some(DiagnosticKind::Argument));
    }

    #[test]
    fn capability_type_errors_become_argument_errors() {
        let mut env = Environment::new();
        env.register_function(
            "picky",
            Capability::native(Arity::Variadic, |_| {
                Err(Diagnostic::new(DiagnosticKind::Type, "wanted text").into())
            }),
        )
        .unwrap();
        let err = env.invoke("picky", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(DiagnosticKind::Argument));
        assert!(err.to_string().contains("bad arguments for `picky`"));
    }

    #[test]
    fn unknown_function_is_undefined_name() {
        let env = Environment::new();
        let err = env.invoke("nope", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(DiagnosticKind::UndefinedName));
    }
}
