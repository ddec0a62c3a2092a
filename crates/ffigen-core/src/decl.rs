//! Top-level declarations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::Name;
use crate::types::Type;

/// One member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: Name,
    pub value: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// A C `enum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    /// `None` for an anonymous enumeration.
    #[serde(default)]
    pub name: Option<Name>,
    /// Constants in declaration order.
    pub constants: Vec<EnumConstant>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One field of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: Name,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub description: Option<String>,
}

/// A C `struct` or `union`.
///
/// Field order is native memory order. An aggregate without fields is an
/// opaque handle type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    #[serde(default)]
    pub name: Option<Name>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub is_union: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Aggregate {
    /// Whether this aggregate only exists as a handle.
    pub fn is_opaque_handle(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// `None` when the prototype leaves the parameter unnamed.
    #[serde(default)]
    pub name: Option<Name>,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub description: Option<String>,
}

/// A native function or callback signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callable {
    pub name: Name,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    #[serde(default)]
    pub return_description: Option<String>,
    /// An invocable type rather than a bound native symbol.
    #[serde(default)]
    pub is_callback: bool,
    /// Calling it may block the caller.
    #[serde(default)]
    pub is_blocking: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// One piece of a `#define` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinePart {
    /// Copied verbatim.
    Literal(String),
    /// Another constant, renamed like one.
    Constant(Name),
    /// A function, renamed like one.
    Method(Name),
}

/// A preprocessor constant or function-like macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub name: Name,
    pub value: Vec<DefinePart>,
    /// Macro parameters; `None` for an object-like define.
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Declaration kind, used in diagnostics and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Enumeration,
    Aggregate,
    Callback,
    Function,
    Define,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enumeration => write!(f, "enumeration"),
            Self::Aggregate => write!(f, "aggregate"),
            Self::Callback => write!(f, "callback"),
            Self::Function => write!(f, "function"),
            Self::Define => write!(f, "define"),
        }
    }
}

/// A named, emittable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Enumeration(Enumeration),
    Aggregate(Aggregate),
    Callable(Callable),
    Define(Define),
}

impl Declaration {
    /// The declaration's native name, `None` when anonymous.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Declaration::Enumeration(e) => e.name.as_ref(),
            Declaration::Aggregate(a) => a.name.as_ref(),
            Declaration::Callable(c) => Some(&c.name),
            Declaration::Define(d) => Some(&d.name),
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Enumeration(_) => DeclKind::Enumeration,
            Declaration::Aggregate(_) => DeclKind::Aggregate,
            Declaration::Callable(c) if c.is_callback => DeclKind::Callback,
            Declaration::Callable(_) => DeclKind::Function,
            Declaration::Define(_) => DeclKind::Define,
        }
    }

    /// Raw name for diagnostics.
    pub fn display_name(&self) -> &str {
        self.name().map(Name::raw).unwrap_or("<anonymous>")
    }

    /// Every type this declaration mentions, in declaration order.
    pub fn types(&self) -> Vec<&Type> {
        match self {
            Declaration::Enumeration(_) | Declaration::Define(_) => Vec::new(),
            Declaration::Aggregate(a) => a.fields.iter().map(|f| &f.ty).collect(),
            Declaration::Callable(c) => c
                .parameters
                .iter()
                .map(|p| &p.ty)
                .chain(std::iter::once(&c.return_type))
                .collect(),
        }
    }
}
