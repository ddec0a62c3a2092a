//! Language-neutral model of a native C API surface.
//!
//! The model is produced once by a header parser (an external collaborator)
//! and then rendered, read-only, by any number of binding backends.
//!
//! ## Modules
//!
//! - [`name`]: identifier segmentation and per-convention resolution
//! - [`types`]: the closed set of native type shapes
//! - [`decl`]: enumerations, aggregates, callables and defines
//! - [`hash`]: content fingerprints of models
//! - [`model`]: the declaration list with by-name lookup and validation
//! - [`source`]: loading a serialized model from JSON or TOML

pub mod decl;
pub mod error;
pub mod hash;
pub mod model;
pub mod name;
pub mod source;
pub mod types;

pub use decl::{
    Aggregate, Callable, DeclKind, Declaration, Define, DefinePart, EnumConstant, Enumeration,
    Field, Parameter,
};
pub use error::{ModelError, Result};
pub use hash::Fingerprint;
pub use model::Model;
pub use name::{resolve, Convention, Name, NameRole, NamingProfile};
pub use source::{load_model, parse_model, ModelFormat};
pub use types::{ArrayLength, Primitive, RefKind, Type};
