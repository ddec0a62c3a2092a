//! CLI command implementations.

pub mod backends;
pub mod generate;
pub mod inspect;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::manifest::FfigenManifest;

/// Resolve the model file: `--model` is relative to the working directory,
/// the manifest's `[input] model` to the manifest directory.
pub fn model_path(
    cwd: &Path,
    project_dir: &Path,
    manifest: Option<&FfigenManifest>,
    model: Option<&str>,
) -> Result<PathBuf> {
    if let Some(model) = model {
        return Ok(cwd.join(model));
    }
    match manifest.and_then(|m| m.input.model.as_deref()) {
        Some(model) => Ok(project_dir.join(model)),
        None => bail!("no model file given (pass --model or set [input] model in ffigen.toml)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_manifest() {
        let manifest =
            FfigenManifest::from_str("[module]\nname = \"M\"\n[input]\nmodel = \"m.json\"\n")
                .unwrap();
        let cwd = Path::new("/work/sub");
        let project = Path::new("/work");

        let from_flag = model_path(cwd, project, Some(&manifest), Some("x.json")).unwrap();
        assert_eq!(from_flag, Path::new("/work/sub/x.json"));

        let from_manifest = model_path(cwd, project, Some(&manifest), None).unwrap();
        assert_eq!(from_manifest, Path::new("/work/m.json"));
    }

    #[test]
    fn missing_model_is_an_error() {
        let cwd = Path::new("/work");
        assert!(model_path(cwd, cwd, None, None).is_err());
    }
}
