//! Multi-backend emission for ffigen models.
//!
//! A [`Backend`] knows how to spell every [`ffigen_core::Type`] variant in
//! one host language and how to lay out each rendered declaration. The
//! backend-neutral renderers ([`enumeration`], [`aggregate`], [`callable`],
//! [`define`]) decide *what* is emitted; the [`driver`] decides in which
//! order and owns the per-run [`EmissionState`].

pub mod aggregate;
pub mod backend;
pub mod backends;
pub mod callable;
pub mod define;
pub mod driver;
pub mod enumeration;
pub mod error;
pub mod state;
pub mod writer;

pub use backend::{available_backends, Backend, BackendKind, EmitOptions, TypeContext};
pub use backends::{FiddleBackend, JnaBackend, RubyFfiBackend};
pub use driver::{emit, emit_kind, SourceUnit};
pub use error::{EmitError, Result};
pub use state::{AggregateState, EmissionState};
pub use writer::Writer;
