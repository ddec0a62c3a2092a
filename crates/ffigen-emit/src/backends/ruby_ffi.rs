//! Ruby `ffi` gem backend: `enum`, `FFI::Struct#layout`, `callback`,
//! `attach_function`.

use ffigen_core::{resolve, ArrayLength, Convention, Name, NamingProfile, Primitive, Type};

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
pub struct RubyFfiBackend;

fn ffi_symbol(p: Primitive) -> &'static str {
    match p {
        Primitive::Void => ":void",
        Primitive::Bool => ":bool",
        Primitive::Char | Primitive::SignedChar => ":char",
        Primitive::UnsignedChar => ":uchar",
        Primitive::Short => ":short",
        Primitive::UnsignedShort => ":ushort",
        Primitive::Int => ":int",
        Primitive::UnsignedInt => ":uint",
        Primitive::Long => ":long",
        Primitive::UnsignedLong => ":ulong",
        Primitive::LongLong => ":long_long",
        Primitive::UnsignedLongLong => ":ulong_long",
        Primitive::Float => ":float",
        Primitive::Double => ":double",
        Primitive::LongDouble => ":long_double",
        Primitive::Int8 => ":int8",
        Primitive::Int16 => ":int16",
        Primitive::Int32 => ":int32",
        Primitive::Int64 => ":int64",
        Primitive::UInt8 => ":uint8",
        Primitive::UInt16 => ":uint16",
        Primitive::UInt32 => ":uint32",
        Primitive::UInt64 => ":uint64",
        Primitive::SizeT => ":size_t",
    }
}

/// `Class` + `suffix` once the class exists, `:pointer` before that.
fn struct_or_pointer(name: &Name, suffix: &str, cx: &TypeContext<'_>) -> Result<String> {
    let class = cx.aggregate_name(name)?;
    if cx.is_emitted(name) {
        Ok(format!("{class}{suffix}"))
    } else {
        Ok(":pointer".to_string())
    }
}

impl Backend for RubyFfiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RubyFfi
    }

    fn naming(&self) -> NamingProfile {
        NamingProfile {
            type_names: Convention::UpperCamel,
            enumerations: Convention::LowerSnake,
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
            "{}.rb",
            resolve(&options.module_name, Convention::LowerSnake, &[])
        )
    }

    fn canonical_name(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let name = match ty {
            Type::Primitive(p) => ffi_symbol(*p).to_string(),
            Type::Opaque { .. } => ":pointer".to_string(),
            Type::String => ":string".to_string(),
            Type::ByValue(inner) => match inner.strip_alias() {
                Type::AggregateRef(name) => struct_or_pointer(name, "", cx)?,
                _ => self.canonical_name(inner, cx)?,
            },
            Type::Alias { target, .. } => self.canonical_name(target, cx)?,
            Type::Pointer { .. } => {
                cx.check(ty)?;
                ":pointer".to_string()
            }
            Type::Array {
                element,
                length: ArrayLength::Fixed(n),
            } => format!("[{}, {n}]", self.canonical_name(element, cx)?),
            Type::Array { .. } => {
                cx.check(ty)?;
                ":pointer".to_string()
            }
            Type::EnumRef(name) => format!(":{}", cx.enumeration_name(name)?),
            Type::AggregateRef(name) => struct_or_pointer(name, "", cx)?,
            Type::CallbackRef(name) => {
                cx.callback_name(name)?;
                ":pointer".to_string()
            }
        };
        Ok(name)
    }

    fn transport_descriptor(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let descriptor = match ty {
            Type::Primitive(p) => ffi_symbol(*p).to_string(),
            Type::Opaque { .. } => ":pointer".to_string(),
            Type::String => ":string".to_string(),
            Type::ByValue(inner) => match inner.strip_alias() {
                Type::AggregateRef(name) => struct_or_pointer(name, ".by_value", cx)?,
                _ => self.transport_descriptor(inner, cx)?,
            },
            Type::Alias { target, .. } => self.transport_descriptor(target, cx)?,
            Type::Pointer {
                pointee, depth: 1, ..
            } => match pointee.strip_alias() {
                Type::AggregateRef(name) => struct_or_pointer(name, ".by_ref", cx)?,
                _ => {
                    cx.check(ty)?;
                    ":pointer".to_string()
                }
            },
            Type::Pointer { .. } | Type::Array { .. } => {
                cx.check(ty)?;
                ":pointer".to_string()
            }
            Type::EnumRef(name) => format!(":{}", cx.enumeration_name(name)?),
            Type::AggregateRef(name) => struct_or_pointer(name, ".by_value", cx)?,
            Type::CallbackRef(name) => format!(":{}", cx.callback_name(name)?),
        };
        Ok(descriptor)
    }

    fn doc_description(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let doc = match ty {
            Type::Primitive(p) => ruby_primitive_doc(*p).to_string(),
            Type::Opaque { .. } => "FFI::Pointer(*Void)".to_string(),
            Type::String => "String".to_string(),
            Type::ByValue(inner) => self.doc_description(inner, cx)?,
            Type::Alias { name, target } => {
                format!("{} ({})", self.doc_description(target, cx)?, name.raw())
            }
            Type::Pointer {
                pointee,
                depth,
                nullable,
            } => format!(
                "FFI::Pointer({}{}{})",
                "*".repeat(*depth as usize),
                pointee_label(pointee, cx)?,
                null_note(*nullable)
            ),
            Type::Array { element, .. } => {
                format!("Array<{}>", self.doc_description(element, cx)?)
            }
            Type::EnumRef(name) => {
                format!("Symbol from `enum_{}`", cx.enumeration_name(name)?)
            }
            Type::AggregateRef(name) => cx.aggregate_name(name)?,
            Type::CallbackRef(name) => format!("Proc(callback_{})", cx.callback_name(name)?),
        };
        Ok(doc)
    }

    fn write_header(&self, w: &mut Writer, options: &EmitOptions, fingerprint: &str) {
        w.comment(|w| w.puts(generated_notice(fingerprint)));
        w.puts("require 'ffi'");
        w.blank();
        w.puts(format!("module {}", options.module_name));
        w.push_indent();
        w.puts("extend FFI::Library");
        w.puts(format!("ffi_lib '{}'", options.library_name()));
        w.blank();
    }

    fn write_footer(&self, w: &mut Writer, _options: &EmitOptions) {
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
            w.blank();
            w.puts(format!("@method `enum_{}`", enumeration.name));
            w.puts("@return [Symbol]");
            w.puts("@scope class");
            w.blank();
        });
        w.puts(format!("enum :{}, [", enumeration.name));
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
        let base = if aggregate.is_union {
            "FFI::Union"
        } else {
            "FFI::Struct"
        };
        w.puts(format!("class {} < {base}", aggregate.name));
        w.indent(|w| {
            if aggregate.is_opaque_handle() {
                w.puts("layout :dummy, :char");
            } else {
                w.write_array(&aggregate.fields, ",", "layout ", "       ", |f| {
                    format!(":{}, {}", f.name, f.type_name)
                });
            }
        });
        w.puts("end");
        w.blank();
    }

    fn write_callable(&self, w: &mut Writer, callable: &RenderedCallable) {
        write_ruby_callable_docs(w, callable);
        let params: Vec<&str> = callable
            .parameters
            .iter()
            .map(|p| p.transport.as_str())
            .collect();
        let params = params.join(", ");
        if callable.is_callback {
            w.puts(format!(
                "callback :{}, [{params}], {}",
                callable.name, callable.return_transport
            ));
        } else {
            let blocking = if callable.is_blocking {
                ", blocking: true"
            } else {
                ""
            };
            w.puts(format!(
                "attach_function :{}, :{}, [{params}], {}{blocking}",
                callable.name, callable.symbol, callable.return_transport
            ));
        }
        w.blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EmissionState;
    use ffigen_core::{Aggregate, Callable, Declaration, Enumeration, Model};

    fn model() -> Model {
        Model::new(vec![
            Declaration::Aggregate(Aggregate {
                name: Some(Name::new("CXCursor")),
                fields: Vec::new(),
                is_union: false,
                description: None,
            }),
            Declaration::Enumeration(Enumeration {
                name: Some(Name::new("CXCursorKind")),
                constants: Vec::new(),
                description: None,
            }),
            Declaration::Callable(Callable {
                name: Name::new("CXCursorVisitor"),
                parameters: Vec::new(),
                return_type: Type::void(),
                return_description: None,
                is_callback: true,
                is_blocking: false,
                description: None,
            }),
        ])
    }

    #[test]
    fn primitives_and_strings() {
        let model = model();
        let state = EmissionState::new();
        let options = EmitOptions::new("Clang");
        let cx = TypeContext::new(&model, &state, &options, RubyFfiBackend.naming());
        let b = RubyFfiBackend;

        let ulonglong = Type::Primitive(Primitive::UnsignedLongLong);
        assert_eq!(b.transport_descriptor(&ulonglong, &cx).unwrap(), ":ulong_long");
        assert_eq!(b.transport_descriptor(&Type::String, &cx).unwrap(), ":string");
        assert_eq!(b.transport_descriptor(&Type::opaque(), &cx).unwrap(), ":pointer");
        assert_eq!(b.doc_description(&Type::int(), &cx).unwrap(), "Integer");
        assert_eq!(b.doc_description(&Type::void(), &cx).unwrap(), "nil");
    }

    #[test]
    fn aggregate_spelling_follows_emission_state() {
        let model = model();
        let options = EmitOptions::new("Clang").with_prefixes(["CX"]);
        let b = RubyFfiBackend;
        let by_value = Type::by_value(Type::aggregate_ref("CXCursor"));
        let by_ref = Type::pointer_to(Type::aggregate_ref("CXCursor"));

        let mut state = EmissionState::new();
        {
            let cx = TypeContext::new(&model, &state, &options, b.naming());
            assert_eq!(b.transport_descriptor(&by_value, &cx).unwrap(), ":pointer");
            assert_eq!(b.transport_descriptor(&by_ref, &cx).unwrap(), ":pointer");
        }
        state.mark_emitted("CXCursor").unwrap();
        let cx = TypeContext::new(&model, &state, &options, b.naming());
        assert_eq!(b.transport_descriptor(&by_value, &cx).unwrap(), "Cursor.by_value");
        assert_eq!(b.transport_descriptor(&by_ref, &cx).unwrap(), "Cursor.by_ref");
        assert_eq!(b.canonical_name(&by_value, &cx).unwrap(), "Cursor");
        assert_eq!(b.canonical_name(&by_ref, &cx).unwrap(), ":pointer");
        assert_eq!(b.doc_description(&by_ref, &cx).unwrap(), "FFI::Pointer(*Cursor)");
    }

    #[test]
    fn enum_and_callback_references() {
        let model = model();
        let state = EmissionState::new();
        let options = EmitOptions::new("Clang").with_prefixes(["CX"]);
        let cx = TypeContext::new(&model, &state, &options, RubyFfiBackend.naming());
        let b = RubyFfiBackend;

        let kind = Type::enum_ref("CXCursorKind");
        assert_eq!(b.transport_descriptor(&kind, &cx).unwrap(), ":cursor_kind");
        assert_eq!(
            b.doc_description(&kind, &cx).unwrap(),
            "Symbol from `enum_cursor_kind`"
        );
        let visitor = Type::callback_ref("CXCursorVisitor");
        assert_eq!(b.transport_descriptor(&visitor, &cx).unwrap(), ":cursor_visitor");
        assert_eq!(b.canonical_name(&visitor, &cx).unwrap(), ":pointer");
    }

    #[test]
    fn arrays_and_deep_pointers() {
        let model = model();
        let state = EmissionState::new();
        let options = EmitOptions::new("Clang");
        let cx = TypeContext::new(&model, &state, &options, RubyFfiBackend.naming());
        let b = RubyFfiBackend;

        let data = Type::array(Type::pointer_to(Type::void()), ArrayLength::Fixed(3));
        assert_eq!(b.canonical_name(&data, &cx).unwrap(), "[:pointer, 3]");
        assert_eq!(b.doc_description(&data, &cx).unwrap(), "Array<FFI::Pointer(*Void)>");

        let argv = Type::pointer(Type::Primitive(Primitive::Char), 2);
        assert_eq!(b.transport_descriptor(&argv, &cx).unwrap(), ":pointer");
        assert_eq!(b.doc_description(&argv, &cx).unwrap(), "FFI::Pointer(**Char)");

        let strict = Type::Pointer {
            pointee: Box::new(Type::Primitive(Primitive::Char)),
            depth: 2,
            nullable: false,
        };
        assert_eq!(
            b.doc_description(&strict, &cx).unwrap(),
            "FFI::Pointer(**Char, non-null)"
        );
    }

    #[test]
    fn dangling_reference_is_an_error() {
        let model = model();
        let state = EmissionState::new();
        let options = EmitOptions::new("Clang");
        let cx = TypeContext::new(&model, &state, &options, RubyFfiBackend.naming());
        let ty = Type::pointer_to(Type::aggregate_ref("CXType"));
        assert!(RubyFfiBackend.canonical_name(&ty, &cx).is_err());
        assert!(RubyFfiBackend.transport_descriptor(&ty, &cx).is_err());
    }

    #[test]
    fn file_name_is_snake_case() {
        assert_eq!(RubyFfiBackend.file_name(&EmitOptions::new("LibGit")), "lib_git.rb");
    }
}
