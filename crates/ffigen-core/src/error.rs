//! Model error types.

use crate::decl::DeclKind;
use crate::types::RefKind;

/// Errors raised while loading or validating a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A type refers by name to a declaration that is not in the model.
    #[error("unresolved {kind} reference '{target}' in '{referrer}'")]
    UnresolvedReference {
        referrer: String,
        target: String,
        kind: RefKind,
    },

    /// Two declarations of the same kind share a native name.
    #[error("duplicate {kind} declaration '{name}'")]
    DuplicateDeclaration { kind: DeclKind, name: String },

    /// The model file extension is not one we can read.
    #[error("unsupported model format: {detail}")]
    UnsupportedFormat { detail: String },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
