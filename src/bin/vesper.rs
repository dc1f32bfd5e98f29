use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vesper::{Config, ExtensionLoader, Repl, Stdout, VesperError};

#[derive(Parser)]
#[command(author, version, about = "Vesper language interpreter")]
struct Args {
    /// Script to run; starts an interactive session when omitted
    script: Option<PathBuf>,

    /// Directory holding one subdirectory per extension
    #[arg(long, value_name = "DIR")]
    extensions_dir: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Respects RUST_LOG; stderr keeps program output on stdout clean.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), VesperError> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?
            .with_extensions_override(std::env::var_os(vesper::config::EXTENSIONS_DIR_ENV)),
        None => Config::load()?,
    };
    if let Some(dir) = args.extensions_dir {
        config.extensions_dir = dir;
    }

    match args.script {
        Some(script) => {
            let source = fs::read_to_string(&script)?;
            let loader = ExtensionLoader::from_config(&config);
            vesper::run_with(&source, &mut Stdout, &loader)?;
            Ok(())
        }
        None => Repl::new(&config).run(),
    }
}
