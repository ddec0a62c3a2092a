//! The `Backend` trait and the context backends render types in.

use std::fmt;

use ffigen_core::{Model, Name, NameRole, NamingProfile, RefKind, Type};
use serde::{Deserialize, Serialize};

use crate::aggregate::RenderedAggregate;
use crate::callable::RenderedCallable;
use crate::define::RenderedDefine;
use crate::enumeration::RenderedEnumeration;
use crate::error::{EmitError, Result};
use crate::state::EmissionState;
use crate::writer::Writer;

/// The target languages ffigen can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Ruby `fiddle` via the fiddler importer DSL.
    Fiddle,
    /// Java Native Access.
    Jna,
    /// The Ruby `ffi` gem.
    RubyFfi,
}

impl BackendKind {
    /// Parse a backend id.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "fiddle" => Ok(BackendKind::Fiddle),
            "jna" | "java" => Ok(BackendKind::Jna),
            "ruby-ffi" | "ruby_ffi" | "ruby" => Ok(BackendKind::RubyFfi),
            _ => Err(EmitError::UnknownBackend {
                name: s.to_string(),
            }),
        }
    }

    /// Canonical backend id.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Fiddle => "fiddle",
            BackendKind::Jna => "jna",
            BackendKind::RubyFfi => "ruby-ffi",
        }
    }

    /// Extension of the generated source file.
    pub fn file_extension(&self) -> &'static str {
        match self {
            BackendKind::Fiddle | BackendKind::RubyFfi => "rb",
            BackendKind::Jna => "java",
        }
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            BackendKind::Fiddle => "Ruby fiddle importer (struct strings, cdef)",
            BackendKind::Jna => "Java JNA interface (Structure, NativeEnum, Callback)",
            BackendKind::RubyFfi => "Ruby ffi gem (enum, FFI::Struct layout, attach_function)",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// List all available backends.
pub fn available_backends() -> &'static [BackendKind] {
    &[BackendKind::Fiddle, BackendKind::Jna, BackendKind::RubyFfi]
}

/// Per-run settings shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmitOptions {
    /// Host module / interface name.
    pub module_name: String,
    /// Native library to load; defaults to the lower-cased module name.
    pub library: Option<String>,
    /// Library prefixes stripped from declaration names, first match wins.
    pub prefixes: Vec<String>,
}

impl EmitOptions {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            library: None,
            prefixes: Vec::new(),
        }
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// The library name written into the generated loader.
    pub fn library_name(&self) -> String {
        self.library
            .clone()
            .unwrap_or_else(|| self.module_name.to_lowercase())
    }
}

/// Everything a backend needs to spell a type: model lookups, a read-only
/// view of the emission state and the backend's naming rules.
pub struct TypeContext<'a> {
    pub model: &'a Model,
    pub state: &'a EmissionState,
    pub options: &'a EmitOptions,
    pub naming: NamingProfile,
}

impl<'a> TypeContext<'a> {
    pub fn new(
        model: &'a Model,
        state: &'a EmissionState,
        options: &'a EmitOptions,
        naming: NamingProfile,
    ) -> Self {
        Self {
            model,
            state,
            options,
            naming,
        }
    }

    /// Host name of a top-level declaration: library prefix stripped, then
    /// resolved for `role`.
    pub fn declaration_name(&self, name: &Name, role: NameRole) -> String {
        self.naming
            .resolve(&name.without_prefixes(&self.options.prefixes), role)
    }

    /// Host name of a member (field, parameter, constant). No prefix
    /// stripping.
    pub fn member_name(&self, name: &Name, role: NameRole) -> String {
        self.naming.resolve(name, role)
    }

    pub fn aggregate_name(&self, name: &Name) -> Result<String> {
        self.require(RefKind::Aggregate, name)?;
        Ok(self.declaration_name(name, NameRole::Type))
    }

    pub fn enumeration_name(&self, name: &Name) -> Result<String> {
        self.require(RefKind::Enumeration, name)?;
        Ok(self.declaration_name(name, NameRole::Enumeration))
    }

    pub fn callback_name(&self, name: &Name) -> Result<String> {
        self.require(RefKind::Callback, name)?;
        Ok(self.declaration_name(name, NameRole::Callback))
    }

    /// Fail if any by-name reference inside `ty` does not resolve.
    pub fn check(&self, ty: &Type) -> Result<()> {
        for (kind, name) in ty.references() {
            self.require(kind, name)?;
        }
        Ok(())
    }

    /// Whether the aggregate's definition has already been written.
    pub fn is_emitted(&self, name: &Name) -> bool {
        self.state.is_emitted(name.raw())
    }

    fn require(&self, kind: RefKind, name: &Name) -> Result<()> {
        if self.model.contains(kind, name.raw()) {
            Ok(())
        } else {
            Err(EmitError::UnresolvedReference {
                target: name.raw().to_string(),
                kind,
            })
        }
    }
}

/// A target language.
///
/// The three type queries must handle every [`Type`] variant; the `write_*`
/// methods lay out already-rendered declarations.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Conventions and reserved words of the host language.
    fn naming(&self) -> NamingProfile;

    /// A fresh writer with the host's indentation and comment syntax.
    fn writer(&self) -> Writer;

    /// Suggested file name for the generated source.
    fn file_name(&self, options: &EmitOptions) -> String;

    /// Whether an aggregate field can embed another aggregate by value.
    fn embeds_aggregates(&self) -> bool {
        true
    }

    /// Spelling in value/field position.
    fn canonical_name(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String>;

    /// Spelling at the native call boundary.
    fn transport_descriptor(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String>;

    /// Spelling of an aggregate field whose layout is opaque.
    fn opaque_field_type(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        self.transport_descriptor(ty, cx)
    }

    /// Human-readable description for documentation comments.
    fn doc_description(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String>;

    fn write_header(&self, w: &mut Writer, options: &EmitOptions, fingerprint: &str);
    fn write_footer(&self, w: &mut Writer, options: &EmitOptions);
    fn write_enumeration(&self, w: &mut Writer, enumeration: &RenderedEnumeration);
    fn write_define(&self, w: &mut Writer, define: &RenderedDefine);
    fn write_aggregate(&self, w: &mut Writer, aggregate: &RenderedAggregate);
    fn write_callable(&self, w: &mut Writer, callable: &RenderedCallable);
}
