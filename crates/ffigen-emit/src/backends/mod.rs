//! Concrete backends and the helpers the two Ruby backends share.

mod fiddle;
mod jna;
mod ruby_ffi;

pub use fiddle::FiddleBackend;
pub use jna::JnaBackend;
pub use ruby_ffi::RubyFfiBackend;

use ffigen_core::{resolve, Convention, Primitive, Type};

use crate::aggregate::RenderedAggregate;
use crate::backend::TypeContext;
use crate::callable::RenderedCallable;
use crate::define::RenderedDefine;
use crate::error::Result;
use crate::writer::Writer;

pub(crate) const RUBY_KEYWORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or", "redo",
    "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield", "BEGIN", "END",
];

pub(crate) const JAVA_RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
    // java.lang and JNA types a generated class must not shadow
    "Object", "String", "Integer", "Class", "Pointer", "Structure", "Union", "Callback",
    "Library", "Native", "NativeLong",
];

/// Header line carrying the model fingerprint.
pub(crate) fn generated_notice(fingerprint: &str) -> String {
    format!("Generated by ffigen from model {fingerprint}. Do not edit by hand.")
}

/// Ruby class a primitive value shows up as.
pub(crate) fn ruby_primitive_doc(p: Primitive) -> &'static str {
    if p.is_void() {
        "nil"
    } else if p == Primitive::Bool {
        "Boolean"
    } else if p.is_float() {
        "Float"
    } else {
        "Integer"
    }
}

/// Short label for what a pointer points at (`Void`, `UnsignedInt`,
/// `Cursor`), used inside `Pointer(*...)` descriptions.
pub(crate) fn pointee_label(ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
    let label = match ty.strip_alias() {
        Type::Primitive(p) => resolve(&p.to_string(), Convention::UpperCamel, &[]),
        Type::Opaque { .. } => "Void".to_string(),
        Type::String => "String".to_string(),
        Type::ByValue(inner) => pointee_label(inner, cx)?,
        Type::Pointer { pointee, .. } => pointee_label(pointee, cx)?,
        Type::Array { element, .. } => pointee_label(element, cx)?,
        Type::EnumRef(name) => cx.enumeration_name(name)?,
        Type::AggregateRef(name) => cx.aggregate_name(name)?,
        Type::CallbackRef(name) => cx.callback_name(name)?,
        Type::Alias { target, .. } => pointee_label(target, cx)?,
    };
    Ok(label)
}

/// A C integer literal without its `u`/`l` suffixes, with its value.
pub(crate) fn integer_literal(value: &str) -> Option<(&str, i64)> {
    let digits = value.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    let (negative, magnitude) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits),
    };
    let parsed = match magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => magnitude.parse::<i64>().ok(),
    }?;
    Some((digits, if negative { -parsed } else { parsed }))
}

/// Suffix marking a pointer the native side never accepts as null.
pub(crate) fn null_note(nullable: bool) -> &'static str {
    if nullable {
        ""
    } else {
        ", non-null"
    }
}

/// Pointer depth of `ty` seen through aliases, 0 for non-pointers.
pub(crate) fn pointer_depth(ty: &Type) -> u32 {
    match ty.strip_alias() {
        Type::Pointer { depth, .. } => *depth,
        _ => 0,
    }
}

/// `## Fields:` block shared by both Ruby backends.
pub(crate) fn write_ruby_aggregate_docs(w: &mut Writer, aggregate: &RenderedAggregate) {
    w.comment(|w| {
        w.write_documentation(aggregate.description.as_deref());
        if !aggregate.fields.is_empty() {
            w.blank();
            w.puts("## Fields:");
            for field in &aggregate.fields {
                w.puts(format!(":{} ::", field.name));
                w.write_description(
                    field.description.as_deref(),
                    &format!("  ({}) ", field.doc),
                    "  ",
                );
                if let Some(warning) = &field.warning {
                    w.puts(format!("  WARNING: {warning}"));
                }
            }
        }
    });
}

/// YARD-style method documentation shared by both Ruby backends.
pub(crate) fn write_ruby_callable_docs(w: &mut Writer, callable: &RenderedCallable) {
    let params: Vec<&str> = callable.parameters.iter().map(|p| p.name.as_str()).collect();
    w.comment(|w| {
        w.write_documentation(callable.description.as_deref());
        if callable.is_callback {
            w.blank();
            w.puts("_This entry is only for documentation and no real method._");
        }
        w.blank();
        if callable.is_callback {
            w.puts(format!(
                "@method `callback_{}`({})",
                callable.name,
                params.join(", ")
            ));
        } else {
            w.puts(format!("@method {}({})", callable.name, params.join(", ")));
        }
        for param in &callable.parameters {
            w.write_description(
                param.description.as_deref(),
                &format!("@param [{}] {} ", param.doc, param.name),
                "  ",
            );
        }
        w.write_description(
            callable.return_description.as_deref(),
            &format!("@return [{}] ", callable.return_doc),
            "  ",
        );
        w.puts("@scope class");
        w.blank();
    });
}

/// Object-like defines become constants, function-like ones methods.
pub(crate) fn write_ruby_define(w: &mut Writer, define: &RenderedDefine) {
    if let Some(description) = define.description.as_deref() {
        w.comment(|w| w.write_description(Some(description), "", ""));
    }
    match &define.parameters {
        Some(parameters) => {
            w.puts(format!("def {}({})", define.name, parameters.join(", ")));
            w.indent(|w| w.puts(&define.value));
            w.puts("end");
        }
        None => {
            let value = match integer_literal(define.value.trim()) {
                Some((digits, _)) => digits,
                None => define.value.as_str(),
            };
            w.puts(format!("{} = {value}", define.name));
        }
    }
    w.blank();
}
