//! Emission error types.

use ffigen_core::{ModelError, RefKind};

/// Errors that abort a backend run.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The model failed validation.
    #[error("malformed model: {0}")]
    Model(#[from] ModelError),

    /// A type names a declaration the model does not contain.
    #[error("unresolved {kind} reference '{target}'")]
    UnresolvedReference { target: String, kind: RefKind },

    /// The driver asked for a second full definition of an aggregate.
    #[error("aggregate '{name}' was already emitted in this run")]
    DuplicateEmission { name: String },

    /// No backend with this id.
    #[error("unknown backend: '{name}'. Available backends: fiddle, jna, ruby-ffi")]
    UnknownBackend { name: String },
}

/// Result type alias for emission.
pub type Result<T> = std::result::Result<T, EmitError>;
