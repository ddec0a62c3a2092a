//! Native type shapes.
//!
//! [`Type`] is a closed tagged union covering every shape a C declaration can
//! give a value. Values are owned trees, so direct containment can never form
//! a cycle; self- and mutually-referential aggregates point back at each other
//! through the by-name reference variants instead.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::Name;

/// Native scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
    // stdint types
    Int8,
    Int16,
    Int32,
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    SizeT,
}

impl Primitive {
    /// Whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Whether this is a floating-point kind.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::LongDouble)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            Self::Void => "void",
            Self::Bool => "_Bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
            Self::Int8 => "int8_t",
            Self::Int16 => "int16_t",
            Self::Int32 => "int32_t",
            Self::Int64 => "int64_t",
            Self::UInt8 => "uint8_t",
            Self::UInt16 => "uint16_t",
            Self::UInt32 => "uint32_t",
            Self::UInt64 => "uint64_t",
            Self::SizeT => "size_t",
        };
        f.write_str(spelling)
    }
}

/// Length of an array type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLength {
    /// `T[n]`
    Fixed(u64),
    /// `T[]` or a length only known at run time.
    #[default]
    Unknown,
}

/// Which declaration kind a by-name reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Enumeration,
    Aggregate,
    Callback,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enumeration => write!(f, "enumeration"),
            Self::Aggregate => write!(f, "aggregate"),
            Self::Callback => write!(f, "callback"),
        }
    }
}

fn one() -> u32 {
    1
}

fn default_nullable() -> bool {
    true
}

/// A native type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// A scalar.
    Primitive(Primitive),
    /// A type the parser could not expose; only its size may be known.
    Opaque {
        #[serde(default)]
        size_hint: Option<u64>,
    },
    /// Null-terminated `char *` text.
    String,
    /// The inner type passed or returned by value.
    ByValue(Box<Type>),
    /// A typedef.
    Alias { name: Name, target: Box<Type> },
    /// `depth` levels of indirection to `pointee`.
    Pointer {
        pointee: Box<Type>,
        #[serde(default = "one")]
        depth: u32,
        #[serde(default = "default_nullable")]
        nullable: bool,
    },
    /// An array of `element`.
    Array {
        element: Box<Type>,
        #[serde(default)]
        length: ArrayLength,
    },
    /// Reference to an enumeration by native name.
    EnumRef(Name),
    /// Reference to a struct or union by native name.
    AggregateRef(Name),
    /// Reference to a callback declaration by native name.
    CallbackRef(Name),
}

impl Type {
    pub fn void() -> Self {
        Type::Primitive(Primitive::Void)
    }

    pub fn int() -> Self {
        Type::Primitive(Primitive::Int)
    }

    pub fn opaque() -> Self {
        Type::Opaque { size_hint: None }
    }

    /// Single-level nullable pointer to `pointee`.
    pub fn pointer_to(pointee: Type) -> Self {
        Type::pointer(pointee, 1)
    }

    /// `depth`-level nullable pointer. A pointer pointee is folded into the
    /// depth so `pointer(pointer(T, 1), 1)` equals `pointer(T, 2)`.
    pub fn pointer(pointee: Type, depth: u32) -> Self {
        match pointee {
            Type::Pointer {
                pointee: inner,
                depth: inner_depth,
                nullable,
            } => Type::Pointer {
                pointee: inner,
                depth: inner_depth + depth,
                nullable,
            },
            other => Type::Pointer {
                pointee: Box::new(other),
                depth: depth.max(1),
                nullable: true,
            },
        }
    }

    pub fn array(element: Type, length: ArrayLength) -> Self {
        Type::Array {
            element: Box::new(element),
            length,
        }
    }

    pub fn by_value(inner: Type) -> Self {
        Type::ByValue(Box::new(inner))
    }

    pub fn alias(name: impl Into<Name>, target: Type) -> Self {
        Type::Alias {
            name: name.into(),
            target: Box::new(target),
        }
    }

    pub fn enum_ref(name: impl Into<Name>) -> Self {
        Type::EnumRef(name.into())
    }

    pub fn aggregate_ref(name: impl Into<Name>) -> Self {
        Type::AggregateRef(name.into())
    }

    pub fn callback_ref(name: impl Into<Name>) -> Self {
        Type::CallbackRef(name.into())
    }

    /// Whether this is `void` (through aliases).
    pub fn is_void(&self) -> bool {
        matches!(self.strip_alias(), Type::Primitive(p) if p.is_void())
    }

    /// Strip typedef layers.
    pub fn strip_alias(&self) -> &Type {
        match self {
            Type::Alias { target, .. } => target.strip_alias(),
            other => other,
        }
    }

    /// Whether the value layout is unknown (an opaque type, possibly aliased
    /// or passed by value).
    pub fn is_opaque_layout(&self) -> bool {
        match self.strip_alias() {
            Type::Opaque { .. } => true,
            Type::ByValue(inner) => inner.is_opaque_layout(),
            _ => false,
        }
    }

    /// Declared byte size of an opaque layout, seen through aliases and
    /// by-value wrappers.
    pub fn opaque_size_hint(&self) -> Option<u64> {
        match self.strip_alias() {
            Type::Opaque { size_hint } => *size_hint,
            Type::ByValue(inner) => inner.opaque_size_hint(),
            _ => None,
        }
    }

    /// The aggregate embedded by value in this type, if any: a direct
    /// aggregate reference or an array of them, seen through aliases.
    pub fn embedded_aggregate(&self) -> Option<&Name> {
        match self.strip_alias() {
            Type::AggregateRef(name) => Some(name),
            Type::ByValue(inner) => inner.embedded_aggregate(),
            Type::Array {
                element,
                length: ArrayLength::Fixed(_),
            } => element.embedded_aggregate(),
            _ => None,
        }
    }

    /// Every by-name reference reachable from this type, in depth-first
    /// order.
    pub fn references(&self) -> Vec<(RefKind, &Name)> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<(RefKind, &'a Name)>) {
        match self {
            Type::Primitive(_) | Type::Opaque { .. } | Type::String => {}
            Type::ByValue(inner) => inner.collect_references(out),
            Type::Alias { target, .. } => target.collect_references(out),
            Type::Pointer { pointee, .. } => pointee.collect_references(out),
            Type::Array { element, .. } => element.collect_references(out),
            Type::EnumRef(name) => out.push((RefKind::Enumeration, name)),
            Type::AggregateRef(name) => out.push((RefKind::Aggregate, name)),
            Type::CallbackRef(name) => out.push((RefKind::Callback, name)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Opaque { .. } => write!(f, "<opaque>"),
            Type::String => write!(f, "char*"),
            Type::ByValue(inner) => write!(f, "{inner}"),
            Type::Alias { name, .. } => write!(f, "{name}"),
            Type::Pointer { pointee, depth, .. } => {
                write!(f, "{pointee}{}", "*".repeat(*depth as usize))
            }
            Type::Array { element, length } => match length {
                ArrayLength::Fixed(n) => write!(f, "{element}[{n}]"),
                ArrayLength::Unknown => write!(f, "{element}[]"),
            },
            Type::EnumRef(name) => write!(f, "enum {name}"),
            Type::AggregateRef(name) => write!(f, "struct {name}"),
            Type::CallbackRef(name) => write!(f, "{name}"),
        }
    }
}
