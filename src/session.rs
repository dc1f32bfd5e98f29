use crate::{
    diagnostics::Result,
    environment::Environment,
    extension::ExtensionLoader,
    parser,
    runtime::{Interpreter, OutputSink},
    value::Value,
};

/// An environment kept alive across many inputs, together with the loader
/// its `use` statements go through. The REPL drives one of these.
#[derive(Debug)]
pub struct Session {
    env: Environment,
    loader: ExtensionLoader,
}

impl Session {
    pub fn new(loader: ExtensionLoader) -> Self {
        Self::with_environment(Environment::new(), loader)
    }

    pub fn with_environment(env: Environment, loader: ExtensionLoader) -> Self {
        Self { env, loader }
    }

    /// Lexes, parses and evaluates `source`. On error, bindings made by
    /// statements that already ran are kept.
    pub fn eval_source(&mut self, source: &str, sink: &mut dyn OutputSink) -> Result<Value> {
        let program = parser::parse_source(source)?;
        Interpreter::new(&self.loader, sink).evaluate(&program, &mut self.env)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn loader(&self) -> &ExtensionLoader {
        &self.loader
    }

    /// Ends the session, handing back its environment.
    pub fn into_environment(self) -> Environment {
        self.env
    }
}
