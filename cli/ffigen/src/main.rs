//! ffigen CLI: generate host-language FFI bindings from a C declaration model.

mod commands;
mod logging;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use manifest::FfigenManifest;

#[derive(Parser)]
#[command(name = "ffigen", version, about = "Generate FFI bindings from a C declaration model")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render bindings for one or more backends
    Generate {
        /// Model file (.json or .toml); default: [input] model in ffigen.toml
        #[arg(long)]
        model: Option<String>,
        /// Backend id (fiddle, jna, ruby-ffi); repeatable, default: all
        #[arg(long = "backend")]
        backends: Vec<String>,
        /// Output directory; default: [output] directory in ffigen.toml
        #[arg(long)]
        out: Option<String>,
        /// Host module name; default: [module] name in ffigen.toml
        #[arg(long)]
        module: Option<String>,
    },
    /// Summarize a model and check its references
    Inspect {
        /// Model file (.json or .toml); default: [input] model in ffigen.toml
        #[arg(long)]
        model: Option<String>,
    },
    /// List available backends
    Backends,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Generate {
            model,
            backends,
            out,
            module,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or_else(|| cwd.clone());
            let args = commands::generate::GenerateArgs {
                model: model.as_deref(),
                backends: &backends,
                out: out.as_deref(),
                module: module.as_deref(),
            };
            commands::generate::run(&cwd, &project_dir, manifest.as_ref(), &args)?;
            Ok(())
        }

        Commands::Inspect { model } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or_else(|| cwd.clone());
            let path =
                commands::model_path(&cwd, &project_dir, manifest.as_ref(), model.as_deref())?;
            commands::inspect::run(&path)
        }

        Commands::Backends => commands::backends::run(),
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<FfigenManifest>, Option<PathBuf>)> {
    match FfigenManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}
