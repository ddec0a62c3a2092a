//! Ruby `fiddle` backend using the fiddler importer DSL.
//!
//! Fiddle struct layouts are C declaration strings and every pointer-like
//! value crosses the call boundary as `VOIDP`, so aggregates are never
//! embedded by value. Functions are bound by their exact native symbol.
//! Fiddle has no callback type declaration; callbacks are documented only
//! and passed as `VOIDP`.

use ffigen_core::{resolve, ArrayLength, Convention, NamingProfile, Primitive, Type};

use super::{
    generated_notice, null_note, pointee_label, ruby_primitive_doc, write_ruby_aggregate_docs,
    write_ruby_callable_docs, write_ruby_define, RUBY_KEYWORDS,
};
use crate::aggregate::RenderedAggregate;
use crate::backend::{Backend, BackendKind, EmitOptions, TypeContext};
use crate::callable::RenderedCallable;
use crate::define::RenderedDefine;
use crate::enumeration::RenderedEnumeration;
use crate::error::Result;
use crate::writer::Writer;

#[derive(Debug, Clone, Copy, Default)]
pub struct FiddleBackend;

fn fiddle_type(p: Primitive) -> &'static str {
    match p {
        Primitive::Void => "VOID",
        Primitive::Bool => "BOOL",
        Primitive::Char | Primitive::SignedChar | Primitive::Int8 => "CHAR",
        Primitive::UnsignedChar | Primitive::UInt8 => "UCHAR",
        Primitive::Short | Primitive::Int16 => "SHORT",
        Primitive::UnsignedShort | Primitive::UInt16 => "USHORT",
        Primitive::Int | Primitive::Int32 => "INT",
        Primitive::UnsignedInt | Primitive::UInt32 => "UINT",
        Primitive::Long => "LONG",
        Primitive::UnsignedLong => "ULONG",
        Primitive::LongLong | Primitive::Int64 => "LLONG",
        Primitive::UnsignedLongLong | Primitive::UInt64 => "ULLONG",
        Primitive::Float => "FLOAT",
        Primitive::Double | Primitive::LongDouble => "DOUBLE",
        Primitive::SizeT => "SIZE_T",
    }
}

/// Spelling understood by fiddle's struct parser.
fn c_spelling(p: Primitive) -> String {
    match p {
        Primitive::Bool => "bool".to_string(),
        Primitive::LongDouble => "double".to_string(),
        other => other.to_string(),
    }
}

/// `int data[4]` from `int[4]`, `void* next` otherwise.
fn field_declaration(type_name: &str, name: &str) -> String {
    match type_name.split_once('[') {
        Some((base, dims)) => format!("{base} {name}[{dims}"),
        None => format!("{type_name} {name}"),
    }
}

impl Backend for FiddleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fiddle
    }

    fn naming(&self) -> NamingProfile {
        NamingProfile {
            type_names: Convention::UpperCamel,
            enumerations: Convention::UpperCamel,
            callbacks: Convention::LowerSnake,
            functions: Convention::LowerSnake,
            constants: Convention::UpperSnake,
            enum_constants: Convention::LowerSnake,
            fields: Convention::LowerSnake,
            parameters: Convention::LowerSnake,
            reserved: RUBY_KEYWORDS,
        }
    }

    fn writer(&self) -> Writer {
        Writer::new("  ", "# ")
    }

    fn file_name(&self, options: &EmitOptions) -> String {
        format!(
            "{}_fiddle.rb",
            resolve(&options.module_name, Convention::LowerSnake, &[])
        )
    }

    fn embeds_aggregates(&self) -> bool {
        false
    }

    fn canonical_name(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let name = match ty {
            Type::Primitive(p) => c_spelling(*p),
            Type::Opaque { .. } => "void*".to_string(),
            Type::String => "char*".to_string(),
            Type::ByValue(inner) => self.canonical_name(inner, cx)?,
            Type::Alias { target, .. } => self.canonical_name(target, cx)?,
            Type::Pointer { pointee, depth, .. } => {
                cx.check(ty)?;
                let base = match pointee.strip_alias() {
                    Type::Primitive(p) => c_spelling(*p),
                    Type::String => "char*".to_string(),
                    Type::EnumRef(_) => "int".to_string(),
                    _ => "void".to_string(),
                };
                format!("{base}{}", "*".repeat(*depth as usize))
            }
            Type::Array {
                element,
                length: ArrayLength::Fixed(n),
            } => {
                let inner = self.canonical_name(element, cx)?;
                match inner.split_once('[') {
                    Some((base, dims)) => format!("{base}[{n}][{dims}"),
                    None => format!("{inner}[{n}]"),
                }
            }
            Type::Array { element, .. } => {
                let inner = self.canonical_name(element, cx)?;
                if inner.contains('[') {
                    // pointer to an array has no spelling in fiddle's parser
                    "void*".to_string()
                } else {
                    format!("{inner}*")
                }
            }
            Type::EnumRef(name) => {
                cx.enumeration_name(name)?;
                "int".to_string()
            }
            Type::AggregateRef(name) => {
                cx.aggregate_name(name)?;
                "void*".to_string()
            }
            Type::CallbackRef(name) => {
                cx.callback_name(name)?;
                "void*".to_string()
            }
        };
        Ok(name)
    }

    fn transport_descriptor(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let descriptor = match ty {
            Type::Primitive(p) => fiddle_type(*p),
            Type::ByValue(inner) => return self.transport_descriptor(inner, cx),
            Type::Alias { target, .. } => return self.transport_descriptor(target, cx),
            Type::EnumRef(_) => {
                cx.check(ty)?;
                "INT"
            }
            Type::Opaque { .. }
            | Type::String
            | Type::Pointer { .. }
            | Type::Array { .. }
            | Type::AggregateRef(_)
            | Type::CallbackRef(_) => {
                cx.check(ty)?;
                "VOIDP"
            }
        };
        Ok(descriptor.to_string())
    }

    fn opaque_field_type(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        self.canonical_name(ty, cx)
    }

    fn doc_description(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let doc = match ty {
            Type::Primitive(p) => ruby_primitive_doc(*p).to_string(),
            Type::Opaque { .. } => "Fiddle::Pointer".to_string(),
            Type::String => "String".to_string(),
            Type::ByValue(inner) => match inner.strip_alias() {
                Type::AggregateRef(name) => cx.aggregate_name(name)?,
                _ => self.doc_description(inner, cx)?,
            },
            Type::Alias { name, target } => {
                format!("{} ({})", self.doc_description(target, cx)?, name.raw())
            }
            Type::Pointer {
                pointee,
                depth,
                nullable,
            } => format!(
                "Fiddle::Pointer({}{}{})",
                "*".repeat(*depth as usize),
                pointee_label(pointee, cx)?,
                null_note(*nullable)
            ),
            Type::Array { element, .. } => {
                format!("Array<{}>", self.doc_description(element, cx)?)
            }
            Type::EnumRef(name) => format!("Integer from `{}`", cx.enumeration_name(name)?),
            Type::AggregateRef(name) => format!("Fiddle::Pointer(*{})", cx.aggregate_name(name)?),
            Type::CallbackRef(name) => format!("Proc(callback_{})", cx.callback_name(name)?),
        };
        Ok(doc)
    }

    fn write_header(&self, w: &mut Writer, options: &EmitOptions, fingerprint: &str) {
        w.comment(|w| w.puts(generated_notice(fingerprint)));
        w.puts("require 'fiddler'");
        w.blank();
        w.puts(format!("module {}", options.module_name));
        w.push_indent();
        w.puts("module C");
        w.push_indent();
        w.puts("include Fiddler");
        w.blank();
        w.puts(format!("dlload '{}'", options.library_name()));
        w.blank();
    }

    fn write_footer(&self, w: &mut Writer, _options: &EmitOptions) {
        w.dedent();
        w.puts("end");
        w.dedent();
        w.puts("end");
    }

    fn write_enumeration(&self, w: &mut Writer, enumeration: &RenderedEnumeration) {
        w.comment(|w| {
            w.write_documentation(enumeration.description.as_deref());
            w.blank();
            w.puts("## Options:");
            for constant in &enumeration.constants {
                w.puts(format!(":{} ::", constant.name));
                w.write_description(constant.description.as_deref(), "  ", "  ");
            }
        });
        w.puts(format!("{} = Hash[", enumeration.name));
        w.indent(|w| {
            w.write_array(&enumeration.constants, ",", "", "", |c| {
                format!(":{}, {}", c.name, c.value)
            })
        });
        w.puts("]");
        w.blank();
    }

    fn write_define(&self, w: &mut Writer, define: &RenderedDefine) {
        write_ruby_define(w, define);
    }

    fn write_aggregate(&self, w: &mut Writer, aggregate: &RenderedAggregate) {
        write_ruby_aggregate_docs(w, aggregate);
        let keyword = if aggregate.is_union { "union" } else { "struct" };
        let fields: Vec<String> = if aggregate.is_opaque_handle() {
            vec!["'char dummy'".to_string()]
        } else {
            aggregate
                .fields
                .iter()
                .map(|f| format!("'{}'", field_declaration(&f.type_name, &f.name)))
                .collect()
        };
        w.puts(format!(
            "{} = {keyword} [{}]",
            aggregate.name,
            fields.join(", ")
        ));
        w.blank();
    }

    fn write_callable(&self, w: &mut Writer, callable: &RenderedCallable) {
        let signature: String = callable
            .parameters
            .iter()
            .map(|p| format!(", {}: {}", p.name, p.transport))
            .collect();
        if callable.is_callback {
            write_ruby_callable_docs(w, callable);
            w.comment(|w| {
                w.puts(format!(
                    "callback :{}, {}{signature}",
                    callable.name, callable.return_transport
                ))
            });
        } else {
            // The method is defined under the native symbol, so document it
            // under that name too.
            let documented = RenderedCallable {
                name: callable.symbol.clone(),
                ..callable.clone()
            };
            write_ruby_callable_docs(w, &documented);
            let blocking = if callable.is_blocking {
                ", blocking: true"
            } else {
                ""
            };
            w.puts(format!(
                "cdef :{}, {}{signature}{blocking}",
                callable.symbol, callable.return_transport
            ));
        }
        w.blank();
    }
}
