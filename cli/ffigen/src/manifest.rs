//! `ffigen.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ffigen_emit::{BackendKind, EmitOptions};
use serde::{Deserialize, Serialize};

/// File name searched for by [`FfigenManifest::find_and_load`].
pub const MANIFEST_FILE: &str = "ffigen.toml";

/// The top-level manifest structure for a binding project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfigenManifest {
    /// Host module settings (required).
    pub module: ModuleConfig,
    /// Where the declaration model comes from.
    #[serde(default)]
    pub input: InputConfig,
    /// Where and what to generate.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Host module section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module / interface name in the generated source.
    pub name: String,
    /// Native library to load; defaults to the lower-cased module name.
    #[serde(default)]
    pub library: Option<String>,
    /// Library prefixes stripped from declaration names.
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// Input section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Model file, relative to the manifest directory.
    #[serde(default)]
    pub model: Option<String>,
}

/// Output section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the manifest directory.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Backend ids; empty means every backend.
    #[serde(default)]
    pub backends: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            backends: Vec::new(),
        }
    }
}

fn default_directory() -> String {
    "generated".to_string()
}

impl FfigenManifest {
    /// Search upward from `start_dir` for an `ffigen.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: FfigenManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing ffigen.toml")
    }

    /// Emission options described by the `[module]` section.
    pub fn emit_options(&self) -> EmitOptions {
        let options =
            EmitOptions::new(self.module.name.clone()).with_prefixes(self.module.prefixes.clone());
        match &self.module.library {
            Some(library) => options.with_library(library.clone()),
            None => options,
        }
    }

    /// Backends listed under `[output]`, in manifest order.
    pub fn backends(&self) -> Result<Vec<BackendKind>> {
        self.output
            .backends
            .iter()
            .map(|id| BackendKind::parse(id).with_context(|| format!("in {MANIFEST_FILE}")))
            .collect()
    }
}
