//! `ffigen inspect` summarizes a model file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ffigen_core::{load_model, DeclKind, Model};

/// Declaration counts for one model.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub enumerations: usize,
    pub aggregates: usize,
    pub opaque_handles: usize,
    pub callbacks: usize,
    pub functions: usize,
    pub defines: usize,
    pub anonymous: usize,
}

impl ModelStats {
    pub fn collect(model: &Model) -> Self {
        let mut stats = Self::default();
        for decl in model.declarations() {
            match decl.kind() {
                DeclKind::Enumeration => stats.enumerations += 1,
                DeclKind::Aggregate => stats.aggregates += 1,
                DeclKind::Callback => stats.callbacks += 1,
                DeclKind::Function => stats.functions += 1,
                DeclKind::Define => stats.defines += 1,
            }
            if decl.name().is_none() {
                stats.anonymous += 1;
            }
        }
        stats.opaque_handles = model.aggregates().filter(|a| a.is_opaque_handle()).count();
        stats
    }
}

/// Print declaration counts, the fingerprint and whether every reference
/// resolves. A model that fails validation is an error.
pub fn run(model_path: &Path) -> Result<()> {
    let model =
        load_model(model_path).with_context(|| format!("loading {}", model_path.display()))?;
    let stats = ModelStats::collect(&model);

    println!("--- Model ({}) ---", model_path.display());
    println!("  Enumerations: {}", stats.enumerations);
    println!(
        "  Aggregates:   {} ({} opaque)",
        stats.aggregates, stats.opaque_handles
    );
    println!("  Callbacks:    {}", stats.callbacks);
    println!("  Functions:    {}", stats.functions);
    println!("  Defines:      {}", stats.defines);
    if stats.anonymous > 0 {
        println!("  Anonymous:    {} (skipped when emitting)", stats.anonymous);
    }
    println!(
        "  Fingerprint:  {}",
        model.fingerprint().context("fingerprinting model")?
    );

    match model.validate() {
        Ok(()) => {
            println!("  References:   all resolved");
            Ok(())
        }
        Err(e) => {
            println!("  References:   {e}");
            bail!("{} is malformed", model_path.display())
        }
    }
}
