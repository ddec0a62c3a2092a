//! Loading a serialized model.
//!
//! The header parser runs out of process and writes the model as JSON (or
//! TOML for small hand-written models).

use std::path::Path;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::model::Model;

/// On-disk model encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Toml,
}

impl ModelFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ModelError::UnsupportedFormat {
                detail: format!(
                    "'{}' (extension {:?}); expected .json or .toml",
                    path.display(),
                    other.unwrap_or("")
                ),
            }),
        }
    }
}

/// Parse a model from text.
pub fn parse_model(input: &str, format: ModelFormat) -> Result<Model> {
    let model: Model = match format {
        ModelFormat::Json => serde_json::from_str(input)?,
        ModelFormat::Toml => toml::from_str(input)?,
    };
    Ok(model)
}

/// Load a model from a file, choosing the format by extension.
pub fn load_model(path: &Path) -> Result<Model> {
    let format = ModelFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let model = parse_model(&content, format)?;
    debug!(path = %path.display(), declarations = model.len(), "loaded model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_toml_model() {
        let toml = r#"
[[declarations]]
kind = "aggregate"
name = "Point"

[[declarations.fields]]
name = "x"
type = { primitive = "int" }

[[declarations.fields]]
name = "y"
type = { primitive = "int" }

[[declarations]]
kind = "callable"
name = "point_len"
return_type = { primitive = "double" }
parameters = [{ name = "p", type = { by_value = { aggregate_ref = "Point" } } }]
"#;
        let model = parse_model(toml, ModelFormat::Toml).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.aggregate("Point").map(|a| a.fields.len()), Some(2));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn string_type_in_json() {
        let json = r#"{"declarations": [
            {"kind": "callable", "name": "puts", "return_type": {"primitive": "int"},
             "parameters": [{"name": "s", "type": "string"}]}
        ]}"#;
        let model = parse_model(json, ModelFormat::Json).unwrap();
        let puts = model.callables().next().unwrap();
        assert_eq!(puts.parameters[0].ty, crate::types::Type::String);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, r#"{"declarations": []}"#).unwrap();
        let model = load_model(&path).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn unknown_extension() {
        let err = load_model(Path::new("model.yaml")).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat { .. }));
    }

    #[test]
    fn malformed_json() {
        assert!(parse_model("{not json", ModelFormat::Json).is_err());
    }
}
