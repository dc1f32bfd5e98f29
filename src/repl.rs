use std::path::{Path, PathBuf};

use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    config::Config,
    diagnostics::{Result, VesperError},
    extension::ExtensionLoader,
    runtime::{OutputSink, Stdout},
    session::Session,
    value::Value,
};

pub struct Repl {
    session: Session,
    prompt: String,
    history_file: Option<PathBuf>,
}

impl Repl {
    pub fn new(config: &Config) -> Self {
        Self::with_session(Session::new(ExtensionLoader::from_config(config)), config)
    }

    pub fn with_session(session: Session, config: &Config) -> Self {
        Self {
            session,
            prompt: config.prompt.clone(),
            history_file: config.history_file.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Evaluates one submitted line in the persistent session.
    pub fn eval_line(&mut self, line: &str, sink: &mut dyn OutputSink) -> Result<Value> {
        let mut source = line.to_string();
        source.push('\n');
        self.session.eval_source(&source, sink)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor =
            DefaultEditor::new().map_err(|err| VesperError::from(std::io::Error::other(err)))?;
        if let Some(path) = &self.history_file {
            load_history(&mut editor, path);
        }
        println!("vesper {} (:quit to exit)", env!("CARGO_PKG_VERSION"));
        loop {
            match editor.readline(&self.prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == ":quit" || trimmed == ":exit" {
                        break;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Err(err) = editor.add_history_entry(trimmed) {
                        tracing::warn!("failed to add history entry: {err}");
                    }
                    if trimmed == ":functions" {
                        for name in self.session.environment().function_names() {
                            println!("{name}");
                        }
                        continue;
                    }
                    match self.eval_line(&line, &mut Stdout) {
                        Ok(value) if value.is_nothing() => {}
                        Ok(value) => println!("{value}"),
                        Err(VesperError::Diagnostic(diag)) => {
                            eprintln!("error: {:?}: {}", diag.kind, diag.message);
                        }
                        Err(other) => eprintln!("error: {other}"),
                    }
                }
                // Ctrl-C only abandons the line being typed.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    self.save_history(&mut editor);
                    return Err(VesperError::from(std::io::Error::other(err)));
                }
            }
        }
        self.save_history(&mut editor);
        Ok(())
    }

    fn save_history(&self, editor: &mut DefaultEditor) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create history directory: {err}");
                return;
            }
        }
        if let Err(err) = editor.save_history(path) {
            tracing::warn!("failed to save history: {err}");
        }
    }
}

fn load_history(editor: &mut DefaultEditor, path: &Path) {
    if let Err(err) = editor.load_history(path) {
        let is_not_found = matches!(
            &err,
            ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        );
        if !is_not_found {
            tracing::warn!("failed to load history: {err}");
        }
    }
}
