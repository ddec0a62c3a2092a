//! Java Native Access backend.
//!
//! Emits a single `Library` interface: enumerations implement `NativeEnum`
//! and are converted by a type mapper, aggregates are `Structure`/`Union`
//! classes with `ByValue`/`ByReference` variants, callbacks are `Callback`
//! interfaces, and functions are interface methods bound to their native
//! symbol through `@NativeName`.

use ffigen_core::{resolve, ArrayLength, Convention, Name, NamingProfile, Primitive, Type};
use tracing::debug;

use super::{generated_notice, integer_literal, null_note, pointee_label, JAVA_RESERVED};
use crate::aggregate::{RenderedAggregate, RenderedField};
use crate::backend::{Backend, BackendKind, EmitOptions, TypeContext};
use crate::callable::RenderedCallable;
use crate::define::RenderedDefine;
use crate::enumeration::RenderedEnumeration;
use crate::error::Result;
use crate::writer::Writer;

#[derive(Debug, Clone, Copy, Default)]
pub struct JnaBackend;

const IMPORTS: &[&str] = &[
    "import java.lang.annotation.ElementType;",
    "import java.lang.annotation.Retention;",
    "import java.lang.annotation.RetentionPolicy;",
    "import java.lang.annotation.Target;",
    "import java.lang.reflect.Method;",
    "import java.util.HashMap;",
    "import java.util.Map;",
    "",
    "import com.sun.jna.*;",
];

/// Support types every generated interface relies on.
const PREAMBLE: &[&str] = &[
    "public interface NativeEnum {",
    "    int toNativeInt();",
    "}",
    "",
    "public static class EnumConverter implements TypeConverter {",
    "    @Override",
    "    public Object fromNative(Object input, FromNativeContext context) {",
    "        int value = (Integer) input;",
    "        for (Object constant : context.getTargetType().getEnumConstants()) {",
    "            if (((NativeEnum) constant).toNativeInt() == value) {",
    "                return constant;",
    "            }",
    "        }",
    "        return null;",
    "    }",
    "",
    "    @Override",
    "    public Object toNative(Object input, ToNativeContext context) {",
    "        return ((NativeEnum) input).toNativeInt();",
    "    }",
    "",
    "    @Override",
    "    public Class<?> nativeType() {",
    "        return Integer.class;",
    "    }",
    "}",
    "",
    "@Retention(RetentionPolicy.RUNTIME)",
    "@Target(ElementType.METHOD)",
    "public @interface NativeName {",
    "    String value();",
    "}",
    "",
    "public static class NativeNameAnnotationFunctionMapper implements FunctionMapper {",
    "    @Override",
    "    public String getFunctionName(NativeLibrary library, Method method) {",
    "        NativeName name = method.getAnnotation(NativeName.class);",
    "        return name != null ? name.value() : method.getName();",
    "    }",
    "}",
];

fn jna_type(p: Primitive) -> &'static str {
    match p {
        Primitive::Void => "void",
        Primitive::Bool => "boolean",
        Primitive::Char
        | Primitive::SignedChar
        | Primitive::UnsignedChar
        | Primitive::Int8
        | Primitive::UInt8 => "byte",
        Primitive::Short | Primitive::UnsignedShort | Primitive::Int16 | Primitive::UInt16 => {
            "short"
        }
        Primitive::Int | Primitive::UnsignedInt | Primitive::Int32 | Primitive::UInt32 => "int",
        Primitive::Long | Primitive::UnsignedLong | Primitive::SizeT => "NativeLong",
        Primitive::LongLong
        | Primitive::UnsignedLongLong
        | Primitive::Int64
        | Primitive::UInt64 => "long",
        Primitive::Float => "float",
        Primitive::Double | Primitive::LongDouble => "double",
    }
}

/// `Class` + `suffix` once the class exists, `Pointer` before that.
/// Field-less aggregates become bare `PointerType` classes with no
/// `ByValue`/`ByReference` variants.
fn structure_or_pointer(name: &Name, suffix: &str, cx: &TypeContext<'_>) -> Result<String> {
    let class = cx.aggregate_name(name)?;
    if !cx.is_emitted(name) {
        return Ok("Pointer".to_string());
    }
    let handle = cx
        .model
        .aggregate(name.raw())
        .is_some_and(|a| a.is_opaque_handle());
    if handle {
        Ok(class)
    } else {
        Ok(format!("{class}{suffix}"))
    }
}

/// Java interface name for the module.
fn interface_name(options: &EmitOptions) -> String {
    resolve(&options.module_name, Convention::UpperCamel, JAVA_RESERVED)
}

/// Java type of a define's value: string and floating literals keep their
/// type, integers widen to `long` when they overflow `int`.
fn constant_type(value: &str) -> &'static str {
    let value = value.trim();
    if value.starts_with('"') {
        return "String";
    }
    match integer_literal(value) {
        Some((_, n)) if i32::try_from(n).is_ok() => "int",
        Some(_) => "long",
        None if value.trim_end_matches(['f', 'F']).parse::<f64>().is_ok() => "double",
        None => "int",
    }
}

/// A define's value spelled as a Java literal of [`constant_type`].
fn constant_literal(value: &str) -> String {
    let value = value.trim();
    match integer_literal(value) {
        Some((digits, n)) if i32::try_from(n).is_ok() => digits.to_string(),
        Some((digits, _)) => format!("{digits}L"),
        None => value.to_string(),
    }
}

/// An enum value as a Java `int` expression. Values past `int` keep
/// their low 32 bits, which is what the native side passes.
fn java_int_literal(value: i64) -> String {
    if i32::try_from(value).is_ok() {
        value.to_string()
    } else if u32::try_from(value).is_ok() {
        format!("(int) 0x{value:X}L")
    } else {
        format!("(int) {value}L")
    }
}

fn field_line(field: &RenderedField) -> String {
    match (field.fixed_length, field.type_name.strip_suffix("[]")) {
        (Some(n), Some(element)) => {
            let (base, rest) = match element.find("[]") {
                Some(pos) => element.split_at(pos),
                None => (element, ""),
            };
            format!(
                "public {} {} = new {base}[{n}]{rest};",
                field.type_name, field.name
            )
        }
        _ => format!("public {} {};", field.type_name, field.name),
    }
}

impl Backend for JnaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Jna
    }

    fn naming(&self) -> NamingProfile {
        NamingProfile {
            type_names: Convention::UpperCamel,
            enumerations: Convention::UpperCamel,
            callbacks: Convention::UpperCamel,
            functions: Convention::LowerCamel,
            constants: Convention::UpperSnake,
            enum_constants: Convention::UpperSnake,
            fields: Convention::LowerCamel,
            parameters: Convention::LowerCamel,
            reserved: JAVA_RESERVED,
        }
    }

    fn writer(&self) -> Writer {
        Writer::new("    ", " * ").with_comment_delimiters("/**", " */")
    }

    fn file_name(&self, options: &EmitOptions) -> String {
        format!("{}.java", interface_name(options))
    }

    fn canonical_name(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let name = match ty {
            Type::Primitive(p) => jna_type(*p).to_string(),
            Type::Opaque { .. } => "Pointer".to_string(),
            Type::String => "String".to_string(),
            Type::ByValue(inner) => match inner.strip_alias() {
                Type::AggregateRef(name) => structure_or_pointer(name, "", cx)?,
                _ => self.canonical_name(inner, cx)?,
            },
            Type::Alias { target, .. } => self.canonical_name(target, cx)?,
            Type::Pointer {
                pointee, depth: 1, ..
            } => match pointee.strip_alias() {
                Type::AggregateRef(name) => structure_or_pointer(name, ".ByReference", cx)?,
                _ => {
                    cx.check(ty)?;
                    "Pointer".to_string()
                }
            },
            Type::Pointer { .. } => {
                cx.check(ty)?;
                "Pointer".to_string()
            }
            Type::Array {
                element,
                length: ArrayLength::Fixed(_),
            } => format!("{}[]", self.canonical_name(element, cx)?),
            Type::Array { .. } => {
                cx.check(ty)?;
                "Pointer".to_string()
            }
            Type::EnumRef(name) => {
                cx.enumeration_name(name)?;
                "int".to_string()
            }
            Type::AggregateRef(name) => structure_or_pointer(name, "", cx)?,
            Type::CallbackRef(name) => cx.callback_name(name)?,
        };
        Ok(name)
    }

    fn transport_descriptor(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let descriptor = match ty {
            Type::Primitive(p) => jna_type(*p).to_string(),
            Type::Opaque { .. } => "Pointer".to_string(),
            Type::String => "String".to_string(),
            Type::ByValue(inner) => match inner.strip_alias() {
                Type::AggregateRef(name) => structure_or_pointer(name, ".ByValue", cx)?,
                _ => self.transport_descriptor(inner, cx)?,
            },
            Type::Alias { target, .. } => self.transport_descriptor(target, cx)?,
            Type::Pointer {
                pointee, depth: 1, ..
            } => match pointee.strip_alias() {
                Type::AggregateRef(name) => structure_or_pointer(name, "", cx)?,
                _ => {
                    cx.check(ty)?;
                    "Pointer".to_string()
                }
            },
            Type::Pointer { .. } => {
                cx.check(ty)?;
                "Pointer".to_string()
            }
            Type::Array { element, .. } => {
                format!("{}[]", self.transport_descriptor(element, cx)?)
            }
            Type::EnumRef(name) => cx.enumeration_name(name)?,
            Type::AggregateRef(name) => structure_or_pointer(name, ".ByValue", cx)?,
            Type::CallbackRef(name) => cx.callback_name(name)?,
        };
        Ok(descriptor)
    }

    fn doc_description(&self, ty: &Type, cx: &TypeContext<'_>) -> Result<String> {
        let doc = match ty {
            Type::Primitive(p) => jna_type(*p).to_string(),
            Type::Opaque { .. } => "opaque Pointer".to_string(),
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
                "Pointer({}{}{})",
                "*".repeat(*depth as usize),
                pointee_label(pointee, cx)?,
                null_note(*nullable)
            ),
            Type::Array { element, .. } => {
                format!("Array of {}", self.doc_description(element, cx)?)
            }
            Type::EnumRef(name) => cx.enumeration_name(name)?,
            Type::AggregateRef(name) => cx.aggregate_name(name)?,
            Type::CallbackRef(name) => format!("{} callback", cx.callback_name(name)?),
        };
        Ok(doc)
    }

    fn write_header(&self, w: &mut Writer, options: &EmitOptions, fingerprint: &str) {
        let interface = interface_name(options);
        w.puts(format!("// {}", generated_notice(fingerprint)));
        w.puts_all(IMPORTS);
        w.blank();
        w.puts(format!("public interface {interface} extends Library {{"));
        w.push_indent();
        w.blank();
        w.puts_all(PREAMBLE);
        w.blank();
        w.puts(format!(
            "public static {interface} INSTANCE = JnaInstanceCreator.createInstance();"
        ));
        w.blank();
        w.puts("static class JnaInstanceCreator {");
        w.indent(|w| {
            w.puts(format!("private static {interface} createInstance() {{"));
            w.indent(|w| {
                w.puts_all([
                    "DefaultTypeMapper typeMapper = new DefaultTypeMapper();",
                    "typeMapper.addFromNativeConverter(NativeEnum.class, new EnumConverter());",
                    "typeMapper.addToNativeConverter(NativeEnum.class, new EnumConverter());",
                    "",
                    "Map<String, Object> options = new HashMap<String, Object>();",
                    "options.put(Library.OPTION_FUNCTION_MAPPER, new NativeNameAnnotationFunctionMapper());",
                    "options.put(Library.OPTION_TYPE_MAPPER, typeMapper);",
                    "",
                ]);
                w.puts(format!(
                    "return Native.load(\"{}\", {interface}.class, options);",
                    options.library_name()
                ));
            });
            w.puts("}");
        });
        w.puts("}");
        w.blank();
    }

    fn write_footer(&self, w: &mut Writer, _options: &EmitOptions) {
        w.dedent();
        w.puts("}");
    }

    fn write_enumeration(&self, w: &mut Writer, enumeration: &RenderedEnumeration) {
        w.comment(|w| {
            w.write_documentation(enumeration.description.as_deref());
            w.blank();
            w.puts("Options:");
            for constant in &enumeration.constants {
                w.puts(format!("{} ::", constant.name));
                w.write_description(constant.description.as_deref(), "  ", "  ");
            }
        });
        w.puts(format!(
            "public enum {} implements NativeEnum {{",
            enumeration.name
        ));
        w.indent(|w| {
            if enumeration.constants.is_empty() {
                w.puts(";");
            }
            let last = enumeration.constants.len().saturating_sub(1);
            for (i, constant) in enumeration.constants.iter().enumerate() {
                let end = if i == last { ";" } else { "," };
                w.puts(format!(
                    "{}({}){end}",
                    constant.name,
                    java_int_literal(constant.value)
                ));
            }
            w.blank();
            w.puts("private final int nativeInt;");
            w.blank();
            w.puts(format!("private {}(int nativeInt) {{", enumeration.name));
            w.indent(|w| w.puts("this.nativeInt = nativeInt;"));
            w.puts("}");
            w.blank();
            w.puts("@Override");
            w.puts("public int toNativeInt() {");
            w.indent(|w| w.puts("return nativeInt;"));
            w.puts("}");
        });
        w.puts("}");
        w.blank();
    }

    fn write_define(&self, w: &mut Writer, define: &RenderedDefine) {
        if define.is_function_like() {
            debug!(define = %define.raw_name, "skipping function-like define");
            return;
        }
        if let Some(description) = define.description.as_deref() {
            w.comment(|w| w.write_description(Some(description), "", ""));
        }
        w.puts(format!(
            "public static final {} {} = {};",
            constant_type(&define.value),
            define.name,
            constant_literal(&define.value)
        ));
        w.blank();
    }

    fn write_aggregate(&self, w: &mut Writer, aggregate: &RenderedAggregate) {
        w.comment(|w| {
            w.write_documentation(aggregate.description.as_deref());
            if !aggregate.fields.is_empty() {
                w.blank();
                w.puts("Fields:");
                for field in &aggregate.fields {
                    w.puts(format!("{} ::", field.name));
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

        if aggregate.is_opaque_handle() {
            w.puts(format!(
                "public static class {} extends PointerType {{",
                aggregate.name
            ));
            w.indent(|w| w.puts("// hidden structure"));
            w.puts("}");
            w.blank();
            return;
        }

        let order: Vec<String> = aggregate
            .fields
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect();
        let base = if aggregate.is_union {
            "Union"
        } else {
            "Structure"
        };
        w.puts(format!("@Structure.FieldOrder({{{}}})", order.join(", ")));
        w.puts(format!(
            "public static class {} extends {base} {{",
            aggregate.name
        ));
        w.indent(|w| {
            for field in &aggregate.fields {
                w.puts(field_line(field));
            }
            for variant in ["ByValue", "ByReference"] {
                w.blank();
                w.puts(format!(
                    "public static class {variant} extends {} implements Structure.{variant} {{",
                    aggregate.name
                ));
                w.puts("}");
            }
        });
        w.puts("}");
        w.blank();
    }

    fn write_callable(&self, w: &mut Writer, callable: &RenderedCallable) {
        w.comment(|w| {
            w.write_documentation(callable.description.as_deref());
            if callable.is_blocking {
                w.blank();
                w.puts("<p>This call may block the calling thread.");
            }
            if !callable.parameters.is_empty() || !callable.returns_void {
                w.blank();
            }
            for param in &callable.parameters {
                w.write_description(
                    param.description.as_deref(),
                    &format!("@param {} [{}] ", param.name, param.doc),
                    "  ",
                );
            }
            if !callable.returns_void {
                w.write_description(
                    callable.return_description.as_deref(),
                    &format!("@return [{}] ", callable.return_doc),
                    "  ",
                );
            }
        });

        let params: Vec<String> = callable
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.transport, p.name))
            .collect();
        let params = params.join(", ");
        if callable.is_callback {
            w.puts(format!(
                "public interface {} extends Callback {{",
                callable.name
            ));
            w.indent(|w| w.puts(format!("{} invoke({params});", callable.return_transport)));
            w.puts("}");
        } else {
            w.puts(format!("@NativeName(\"{}\")", callable.symbol));
            w.puts(format!(
                "{} {}({params});",
                callable.return_transport, callable.name
            ));
        }
        w.blank();
    }
}
