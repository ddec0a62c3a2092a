//! `ffigen generate` renders bindings for each selected backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ffigen_core::{load_model, resolve, Convention};
use ffigen_emit::{available_backends, emit_kind, BackendKind, EmitOptions, SourceUnit};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::manifest::FfigenManifest;

/// Command-line overrides for `generate`.
#[derive(Debug, Default)]
pub struct GenerateArgs<'a> {
    pub model: Option<&'a str>,
    pub backends: &'a [String],
    pub out: Option<&'a str>,
    pub module: Option<&'a str>,
}

/// Render the model with every selected backend and write one file each.
///
/// Returns the paths written, in backend order.
pub fn run(
    cwd: &Path,
    project_dir: &Path,
    manifest: Option<&FfigenManifest>,
    args: &GenerateArgs<'_>,
) -> Result<Vec<PathBuf>> {
    let model_path = super::model_path(cwd, project_dir, manifest, args.model)?;
    let model =
        load_model(&model_path).with_context(|| format!("loading {}", model_path.display()))?;

    let options = emit_options(manifest, args.module, &model_path);
    let kinds = select_backends(manifest, args.backends)?;
    let out_dir = match (args.out, manifest) {
        (Some(out), _) => cwd.join(out),
        (None, Some(m)) => project_dir.join(&m.output.directory),
        (None, None) => cwd.to_path_buf(),
    };

    info!(
        model = %model_path.display(),
        declarations = model.len(),
        backends = kinds.len(),
        "generating bindings"
    );

    let units = kinds
        .par_iter()
        .map(|&kind| emit_kind(kind, &model, &options))
        .collect::<std::result::Result<Vec<SourceUnit>, _>>()
        .with_context(|| format!("rendering {}", model_path.display()))?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(units.len());
    for unit in &units {
        let path = out_dir.join(&unit.file_name);
        std::fs::write(&path, &unit.text)
            .with_context(|| format!("writing {}", path.display()))?;
        for warning in &unit.warnings {
            warn!(backend = %unit.backend, "{warning}");
        }
        println!(
            "Generated {} bindings → {} ({} warnings)",
            unit.backend,
            path.display(),
            unit.warnings.len()
        );
        written.push(path);
    }

    Ok(written)
}

/// `--module` overrides the manifest; without either, the model file stem
/// names the module.
fn emit_options(
    manifest: Option<&FfigenManifest>,
    module: Option<&str>,
    model_path: &Path,
) -> EmitOptions {
    let options = manifest
        .map(FfigenManifest::emit_options)
        .unwrap_or_else(|| EmitOptions::new(model_stem(model_path)));
    match module {
        Some(name) => EmitOptions {
            module_name: name.to_string(),
            ..options
        },
        None => options,
    }
}

/// Module name from the file name up to the first dot:
/// `clang.model.json` gives `Clang`.
fn model_stem(path: &Path) -> String {
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|n| !n.is_empty())
        .unwrap_or("bindings");
    resolve(stem, Convention::UpperCamel, &[])
}

/// `--backend` flags win, then the manifest list, then every backend.
/// Duplicates are dropped, first occurrence kept.
fn select_backends(
    manifest: Option<&FfigenManifest>,
    flags: &[String],
) -> Result<Vec<BackendKind>> {
    let requested = if !flags.is_empty() {
        flags
            .iter()
            .map(|id| BackendKind::parse(id))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        match manifest.map(FfigenManifest::backends).transpose()? {
            Some(kinds) if !kinds.is_empty() => kinds,
            _ => available_backends().to_vec(),
        }
    };

    let mut kinds = Vec::with_capacity(requested.len());
    for kind in requested {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{"declarations": [
        {"kind": "enumeration", "name": "color", "constants": [
            {"name": "COLOR_RED", "value": 0},
            {"name": "COLOR_GREEN", "value": 1}
        ]},
        {"kind": "callable", "name": "demo_add", "return_type": {"primitive": "int"},
         "parameters": [
            {"name": "x", "type": {"primitive": "int"}},
            {"name": "y", "type": {"primitive": "int"}}
         ]}
    ]}"#;

    #[test]
    fn writes_one_file_per_backend() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.model.json"), MODEL).unwrap();

        let args = GenerateArgs {
            model: Some("demo.model.json"),
            out: Some("out"),
            ..GenerateArgs::default()
        };
        let written = run(dir.path(), dir.path(), None, &args).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["demo_fiddle.rb", "Demo.java", "demo.rb"]);

        let ruby = std::fs::read_to_string(dir.path().join("out/demo.rb")).unwrap();
        assert!(ruby.contains("module Demo"));
        assert!(ruby.contains("enum :color, ["));
        assert!(ruby.contains("attach_function :demo_add, :demo_add, [:int, :int], :int"));
    }

    #[test]
    fn manifest_drives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.json"), MODEL).unwrap();
        let manifest = FfigenManifest::from_str(
            r#"
[module]
name = "Demo"
library = "demo-1"
prefixes = ["demo_"]

[input]
model = "api.json"

[output]
directory = "gen"
backends = ["ruby-ffi"]
"#,
        )
        .unwrap();

        let nested = dir.path().join("src");
        std::fs::create_dir_all(&nested).unwrap();
        let written = run(&nested, dir.path(), Some(&manifest), &GenerateArgs::default()).unwrap();
        assert_eq!(written, vec![dir.path().join("gen").join("demo.rb")]);

        let ruby = std::fs::read_to_string(&written[0]).unwrap();
        assert!(ruby.contains("ffi_lib 'demo-1'"));
        assert!(ruby.contains("attach_function :add, :demo_add, [:int, :int], :int"));
    }

    #[test]
    fn backend_flags_are_parsed_and_deduplicated() {
        let flags = vec!["jna".to_string(), "ruby".to_string(), "java".to_string()];
        assert_eq!(
            select_backends(None, &flags).unwrap(),
            vec![BackendKind::Jna, BackendKind::RubyFfi]
        );
        assert!(select_backends(None, &["perl".to_string()]).is_err());
        assert_eq!(select_backends(None, &[]).unwrap(), available_backends());
    }

    #[test]
    fn module_name_falls_back_to_model_stem() {
        let options = emit_options(None, None, Path::new("/tmp/lib_git.model.json"));
        assert_eq!(options.module_name, "LibGit");
        assert_eq!(options.library_name(), "libgit");
        let options = emit_options(None, Some("Git"), Path::new("/tmp/lib_git.model.json"));
        assert_eq!(options.module_name, "Git");
    }

    #[test]
    fn malformed_model_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let model = r#"{"declarations": [
            {"kind": "callable", "name": "use_widget", "return_type": {"primitive": "void"},
             "parameters": [{"type": {"pointer": {"pointee": {"aggregate_ref": "Widget"}}}}]}
        ]}"#;
        std::fs::write(dir.path().join("bad.json"), model).unwrap();

        let args = GenerateArgs {
            model: Some("bad.json"),
            out: Some("out"),
            ..GenerateArgs::default()
        };
        let err = run(dir.path(), dir.path(), None, &args).unwrap_err();
        assert!(format!("{err:#}").contains("Widget"));
        assert!(!dir.path().join("out").exists());
    }
}
