//! Extension discovery and registration.
//!
//! An extension named `foo` lives at `<root>/foo/extension.toml`. The manifest
//! exposes its surface in one of two shapes:
//!
//! ```toml
//! # imperative: hand the environment to an entry point linked into the host
//! entry = "math"
//!
//! # declarative: a table of callables and plain values
//! [exports]
//! shout = { function = "upper" }
//! answer = 42
//! ```
//!
//! Both shapes become an [`ExtensionProvider`]. When a manifest carries both,
//! the entry point wins and the export table is ignored. Manifests are read
//! again on every `use`; nothing is cached between activations.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    rc::Rc,
};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    config::Config,
    diagnostics::{Diagnostic, DiagnosticKind, Result, VesperError},
    environment::{Capability, Environment},
    stdlib,
    value::Value,
};

pub const MANIFEST_FILE: &str = "extension.toml";

/// Something that can register capabilities into an environment.
pub trait ExtensionProvider {
    fn register(&self, env: &mut Environment) -> Result<()>;
}

pub type EntryFn = Rc<dyn Fn(&mut Environment) -> Result<()>>;

/// Imperative registration: a host function that receives the environment
/// and calls its registration operations itself.
#[derive(Clone)]
pub struct EntryPoint {
    callback: EntryFn,
}

impl EntryPoint {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Environment) -> Result<()> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EntryPoint")
    }
}

impl ExtensionProvider for EntryPoint {
    fn register(&self, env: &mut Environment) -> Result<()> {
        (self.callback)(env)
    }
}

#[derive(Debug, Clone)]
pub enum Export {
    Function(Capability),
    Constant(Value),
}

/// Declarative registration: every callable entry becomes a function, every
/// plain value a zero-argument constant.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    entries: IndexMap<String, Export>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, export: Export) {
        self.entries.insert(name.into(), export);
    }

    pub fn with_function(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.insert(name, Export::Function(capability));
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, Export::Constant(value));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExtensionProvider for ExportTable {
    fn register(&self, env: &mut Environment) -> Result<()> {
        for (name, export) in &self.entries {
            match export {
                Export::Function(capability) => {
                    env.register_function(name.as_str(), capability.clone())?
                }
                Export::Constant(value) => env.register_constant(name.as_str(), value.clone())?,
            }
        }
        Ok(())
    }
}

/// Host code an extension manifest may refer to: named entry points for the
/// imperative shape and named native functions for export tables.
#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    entry_points: IndexMap<String, EntryPoint>,
    natives: IndexMap<String, Capability>,
}

impl ExtensionRegistry {
    pub fn empty() -> Self {
        Self {
            entry_points: IndexMap::new(),
            natives: IndexMap::new(),
        }
    }

    /// Registry with the `math` and `text` entry points and their functions.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.add_entry_point("math", EntryPoint::new(stdlib::register_math));
        registry.add_entry_point("text", EntryPoint::new(stdlib::register_text));
        for (name, capability) in stdlib::math_functions()
            .into_iter()
            .chain(stdlib::text_functions())
        {
            registry.add_native(name, capability);
        }
        registry
    }

    pub fn add_entry_point(&mut self, name: impl Into<String>, entry: EntryPoint) {
        self.entry_points.insert(name.into(), entry);
    }

    pub fn add_native(&mut self, name: impl Into<String>, capability: Capability) {
        self.natives.insert(name.into(), capability);
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.get(name)
    }

    pub fn native(&self, name: &str) -> Option<&Capability> {
        self.natives.get(name)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    entry: Option<String>,
    exports: Option<IndexMap<String, ExportSpec>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportSpec {
    Function { function: String },
    Int(i64),
    Float(f64),
    Text(String),
}

/// Resolves extension names to manifests under one root directory.
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    root: PathBuf,
    registry: ExtensionRegistry,
}

impl ExtensionLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, ExtensionRegistry::builtin())
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: ExtensionRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.extensions_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.registry
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(MANIFEST_FILE)
    }

    /// Reads the manifest for `name` and turns it into a provider.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn ExtensionProvider>> {
        let path = self.manifest_path(name);
        let is_plain_name =
            !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !is_plain_name || !path.is_file() {
            return Err(not_found(name, &path));
        }
        tracing::debug!(extension = name, path = %path.display(), "reading extension manifest");

        let source = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                not_found(name, &path)
            } else {
                VesperError::from(err)
            }
        })?;
        let manifest: Manifest = toml::from_str(&source).map_err(|err| {
            contract_error(name, format!("manifest is malformed: {}", err.message()))
                .with_note(format!("manifest: {}", path.display()))
        })?;

        match (manifest.entry, manifest.exports) {
            (Some(entry), exports) => {
                if exports.is_some() {
                    tracing::debug!(
                        extension = name,
                        "manifest has both `entry` and `exports`; using `entry`"
                    );
                }
                let provider = self.registry.entry_point(&entry).cloned().ok_or_else(|| {
                    contract_error(
                        name,
                        format!("entry point `{entry}` is not linked into this build"),
                    )
                })?;
                Ok(Box::new(provider))
            }
            (None, Some(exports)) => Ok(Box::new(self.export_table(name, exports)?)),
            (None, None) => Err(VesperError::from(contract_error(
                name,
                "manifest defines neither `entry` nor an `[exports]` table",
            ))),
        }
    }

    /// Resolves and registers extension `name` into `env`.
    pub fn load(&self, name: &str, env: &mut Environment) -> Result<()> {
        let provider = self.resolve(name)?;
        provider.register(env)?;
        tracing::debug!(extension = name, "extension registered");
        Ok(())
    }

    fn export_table(
        &self,
        name: &str,
        exports: IndexMap<String, ExportSpec>,
    ) -> Result<ExportTable> {
        let mut table = ExportTable::new();
        for (export, spec) in exports {
            let entry = match spec {
                ExportSpec::Function { function } => {
                    let capability = self.registry.native(&function).cloned().ok_or_else(|| {
                        Diagnostic::new(
                            DiagnosticKind::Type,
                            format!(
                                "export `{export}` of extension `{name}` refers to `{function}`, \
                                 which is not a callable native function"
                            ),
                        )
                    })?;
                    Export::Function(capability)
                }
                ExportSpec::Int(n) => Export::Constant(Value::Int(n)),
                ExportSpec::Float(n) => Export::Constant(Value::Float(n)),
                ExportSpec::Text(text) => Export::Constant(Value::Text(text)),
            };
            table.insert(export, entry);
        }
        Ok(table)
    }
}

impl Default for ExtensionLoader {
    fn default() -> Self {
        Self::new(crate::config::default_extensions_dir())
    }
}

fn not_found(name: &str, path: &Path) -> VesperError {
    VesperError::from(
        Diagnostic::new(
            DiagnosticKind::ExtensionNotFound,
            format!("extension `{name}` not found"),
        )
        .with_note(format!("looked for {}", path.display())),
    )
}

fn contract_error(name: &str, message: impl fmt::Display) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::ExtensionContract,
        format!("extension `{name}`: {message}"),
    )
}
