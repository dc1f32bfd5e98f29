//! Core library for the Vesper scripting language: lexing, parsing,
//! evaluation and extension loading.
//!
//! An [`Environment`] is single-threaded state. Evaluating one environment
//! from several threads is not supported; callers that share one must
//! serialize access themselves.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod extension;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod session;
pub mod stdlib;
pub mod value;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Result, SourceSpan, VesperError};
pub use environment::{Arity, Capability, Environment};
pub use extension::{
    EntryPoint, ExportTable, ExtensionLoader, ExtensionProvider, ExtensionRegistry,
};
pub use repl::Repl;
pub use runtime::{FnSink, Interpreter, OutputSink, Stdout};
pub use session::Session;
pub use value::Value;

/// Runs `source` against a fresh environment, using the extensions root from
/// the user's configuration. Returns the value of the last statement.
pub fn run(source: &str, sink: &mut dyn OutputSink) -> Result<Value> {
    let config = Config::load()?;
    run_with(source, sink, &ExtensionLoader::from_config(&config))
}

/// Runs `source` against a fresh environment with an explicit loader.
pub fn run_with(
    source: &str,
    sink: &mut dyn OutputSink,
    loader: &ExtensionLoader,
) -> Result<Value> {
    let program = parser::parse_source(source)?;
    let mut env = Environment::new();
    Interpreter::new(loader, sink).evaluate(&program, &mut env)
}
