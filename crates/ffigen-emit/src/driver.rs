//! Backend driver: one full emission run for one backend.

use ffigen_core::{Aggregate, Model, NameRole};
use tracing::debug;

use crate::aggregate::render_aggregate;
use crate::backend::{Backend, BackendKind, EmitOptions, TypeContext};
use crate::backends::{FiddleBackend, JnaBackend, RubyFfiBackend};
use crate::callable::render_callable;
use crate::define::render_define;
use crate::enumeration::render_enumeration;
use crate::error::Result;
use crate::state::EmissionState;

/// The output of one backend run.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub backend: BackendKind,
    /// Suggested file name, relative to the output directory.
    pub file_name: String,
    pub text: String,
    /// Layout warnings, prefixed with the native aggregate name.
    pub warnings: Vec<String>,
    /// Fingerprint of the model the text was generated from.
    pub fingerprint: String,
    /// References rendered before their aggregate's definition.
    pub forward_references: usize,
}

/// Render `model` with `backend`.
///
/// The model is validated before anything is written. Sections come out in
/// a fixed order (enumerations, defines, aggregates, callbacks, functions),
/// each sorted by resolved name with the native name as tie-breaker, so the
/// same inputs always produce byte-identical text.
pub fn emit<B: Backend>(model: &Model, backend: &B, options: &EmitOptions) -> Result<SourceUnit> {
    model.validate()?;
    let fingerprint = model.fingerprint()?;
    let naming = backend.naming();
    let mut state = EmissionState::new();
    let mut w = backend.writer();
    let mut warnings = Vec::new();

    backend.write_header(&mut w, options, &fingerprint);

    let aggregates: Vec<&Aggregate> = {
        let cx = TypeContext::new(model, &state, options, naming);

        let mut enumerations: Vec<_> = model
            .enumerations()
            .filter_map(|e| render_enumeration(e, &cx))
            .collect();
        enumerations.sort_by(|a, b| (&a.name, &a.raw_name).cmp(&(&b.name, &b.raw_name)));
        for enumeration in &enumerations {
            backend.write_enumeration(&mut w, enumeration);
        }

        let mut defines: Vec<_> = model.defines().map(|d| render_define(d, &cx)).collect();
        defines.sort_by(|a, b| (&a.name, &a.raw_name).cmp(&(&b.name, &b.raw_name)));
        for define in &defines {
            backend.write_define(&mut w, define);
        }

        let mut keyed: Vec<((String, String), &Aggregate)> = model
            .aggregates()
            .map(|a| {
                let key = a
                    .name
                    .as_ref()
                    .map(|n| (cx.declaration_name(n, NameRole::Type), n.raw().to_string()))
                    .unwrap_or_default();
                (key, a)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, a)| a).collect()
    };

    for aggregate in aggregates {
        let Some(rendered) = render_aggregate(backend, aggregate, model, options, &mut state)? else {
            continue;
        };
        warnings.extend(
            rendered
                .warnings()
                .map(|message| format!("{}: {message}", rendered.raw_name)),
        );
        backend.write_aggregate(&mut w, &rendered);
    }

    let cx = TypeContext::new(model, &state, options, naming);
    let mut callbacks = Vec::new();
    let mut functions = Vec::new();
    for callable in model.callables() {
        let rendered = render_callable(backend, callable, &cx)?;
        if rendered.is_callback {
            callbacks.push(rendered);
        } else {
            functions.push(rendered);
        }
    }
    for list in [&mut callbacks, &mut functions] {
        list.sort_by(|a, b| (&a.name, &a.symbol).cmp(&(&b.name, &b.symbol)));
    }
    for callable in callbacks.iter().chain(&functions) {
        backend.write_callable(&mut w, callable);
    }

    backend.write_footer(&mut w, options);

    debug!(
        backend = %backend.kind(),
        aggregates = state.emitted_count(),
        forward_references = state.forward_reference_count(),
        warnings = warnings.len(),
        "emission finished"
    );

    Ok(SourceUnit {
        backend: backend.kind(),
        file_name: backend.file_name(options),
        text: w.output(),
        warnings,
        fingerprint,
        forward_references: state.forward_reference_count(),
    })
}

/// Render `model` with the backend named by `kind`.
pub fn emit_kind(kind: BackendKind, model: &Model, options: &EmitOptions) -> Result<SourceUnit> {
    match kind {
        BackendKind::Fiddle => emit(model, &FiddleBackend, options),
        BackendKind::Jna => emit(model, &JnaBackend, options),
        BackendKind::RubyFfi => emit(model, &RubyFfiBackend, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmitError;
    use ffigen_core::{
        Callable, Declaration, DefinePart, EnumConstant, Enumeration, Field, ModelError, Name,
        Parameter, Primitive, Type,
    };

    fn enumeration(name: Option<&str>, constants: &[(&str, i64)]) -> Declaration {
        Declaration::Enumeration(Enumeration {
            name: name.map(Name::new),
            constants: constants
                .iter()
                .map(|(n, v)| EnumConstant {
                    name: Name::new(*n),
                    value: *v,
                    description: None,
                })
                .collect(),
            description: None,
        })
    }

    fn aggregate(name: &str, fields: Vec<(&str, Type)>) -> Declaration {
        Declaration::Aggregate(ffigen_core::Aggregate {
            name: Some(Name::new(name)),
            fields: fields
                .into_iter()
                .map(|(n, ty)| Field {
                    name: Name::new(n),
                    ty,
                    description: None,
                })
                .collect(),
            is_union: false,
            description: None,
        })
    }

    fn callable(name: &str, params: Vec<(&str, Type)>, ret: Type, is_callback: bool) -> Declaration {
        Declaration::Callable(Callable {
            name: Name::new(name),
            parameters: params
                .into_iter()
                .map(|(n, ty)| Parameter {
                    name: if n.is_empty() { None } else { Some(Name::new(n)) },
                    ty,
                    description: None,
                })
                .collect(),
            return_type: ret,
            return_description: None,
            is_callback,
            is_blocking: false,
            description: None,
        })
    }

    fn options() -> EmitOptions {
        EmitOptions::new("Demo").with_library("demo")
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn scenario_enumeration_prefix_and_values() {
        let model = Model::new(vec![enumeration(
            Some("Color"),
            &[("COLOR_RED", 0), ("COLOR_GREEN", 1), ("COLOR_BLUE", 2)],
        )]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(unit.text.contains(
            "  enum :color, [\n    :red, 0,\n    :green, 1,\n    :blue, 2\n  ]\n"
        ));

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert!(java.text.contains("        RED(0),\n        GREEN(1),\n        BLUE(2);\n"));

        let fiddle = emit(&model, &FiddleBackend, &options()).unwrap();
        assert!(fiddle.text.contains("Color = Hash[\n      :red, 0,"));
    }

    #[test]
    fn duplicate_enum_values_are_kept() {
        let model = Model::new(vec![enumeration(
            Some("Mode"),
            &[("MODE_FIRST", 0), ("MODE_DEFAULT", 0), ("MODE_LAST", 1)],
        )]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(unit.text.contains(":first, 0,\n    :default, 0,\n    :last, 1\n"));
    }

    #[test]
    fn scenario_self_referential_aggregate() {
        let model = Model::new(vec![aggregate(
            "Node",
            vec![("next", Type::pointer_to(Type::aggregate_ref("Node")))],
        )]);

        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert_eq!(count(&unit.text, "class Node < FFI::Struct"), 1);
        // `next` is a Ruby keyword.
        assert!(unit.text.contains("    layout :next_, :pointer\n"));
        assert!(unit.text.contains("  # :next_ ::\n  #   (FFI::Pointer(*Node))\n"));
        assert_eq!(unit.forward_references, 1);
        assert!(unit.warnings.is_empty());

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert_eq!(count(&java.text, "public static class Node extends Structure"), 1);
        assert!(java.text.contains("public Pointer next;"));

        let fiddle = emit(&model, &FiddleBackend, &options()).unwrap();
        assert_eq!(count(&fiddle.text, "Node = struct"), 1);
        assert!(fiddle.text.contains("Node = struct ['void* next_']"));
    }

    #[test]
    fn mutually_referential_aggregates() {
        let model = Model::new(vec![
            aggregate("Parent", vec![("child", Type::pointer_to(Type::aggregate_ref("Child")))]),
            aggregate("Child", vec![("parent", Type::pointer_to(Type::aggregate_ref("Parent")))]),
        ]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert_eq!(count(&unit.text, "class Child <"), 1);
        assert_eq!(count(&unit.text, "class Parent <"), 1);
        // Child sorts first, so only its reference to Parent is forward.
        assert_eq!(unit.forward_references, 1);
        assert!(unit.text.find("class Child").unwrap() < unit.text.find("class Parent").unwrap());
    }

    #[test]
    fn scenario_direct_binding() {
        let model = Model::new(vec![callable(
            "add",
            vec![("x", Type::int()), ("y", Type::int())],
            Type::int(),
            false,
        )]);

        let ruby = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(ruby.text.contains("  attach_function :add, :add, [:int, :int], :int\n"));
        assert!(ruby.text.contains("  # @method add(x, y)\n"));
        assert!(ruby.text.contains("  # @param [Integer] x\n"));
        assert!(ruby.text.contains("  # @return [Integer]\n"));

        let fiddle = emit(&model, &FiddleBackend, &options()).unwrap();
        assert!(fiddle.text.contains("    cdef :add, INT, x: INT, y: INT\n"));

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert!(java.text.contains("    @NativeName(\"add\")\n    int add(int x, int y);\n"));
    }

    #[test]
    fn scenario_reserved_word() {
        let model = Model::new(vec![callable(
            "describe",
            vec![("class", Type::String)],
            Type::void(),
            false,
        )]);
        let first = emit(&model, &RubyFfiBackend, &options()).unwrap();
        let second = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(first.text.contains("@method describe(class_)"));
        assert!(!first.text.contains("describe(class)"));
        assert_eq!(first.text, second.text);

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert!(java.text.contains("void describe(String class_);"));
    }

    #[test]
    fn emission_is_idempotent() {
        let model = Model::new(vec![
            enumeration(Some("Color"), &[("COLOR_RED", 0)]),
            aggregate("Node", vec![("next", Type::pointer_to(Type::aggregate_ref("Node")))]),
            callable("node_new", vec![], Type::pointer_to(Type::aggregate_ref("Node")), false),
        ]);
        for kind in crate::backend::available_backends() {
            let a = emit_kind(*kind, &model, &options()).unwrap();
            let b = emit_kind(*kind, &model, &options()).unwrap();
            assert_eq!(a.text, b.text, "{kind} output differs between runs");
            assert_eq!(a.fingerprint, b.fingerprint);
        }
    }

    #[test]
    fn dangling_reference_aborts_the_run() {
        let model = Model::new(vec![callable(
            "use_widget",
            vec![("w", Type::pointer_to(Type::aggregate_ref("Widget")))],
            Type::void(),
            false,
        )]);
        for kind in crate::backend::available_backends() {
            let err = emit_kind(*kind, &model, &options()).unwrap_err();
            match err {
                EmitError::Model(ModelError::UnresolvedReference {
                    referrer, target, ..
                }) => {
                    assert_eq!(referrer, "use_widget");
                    assert_eq!(target, "Widget");
                }
                other => panic!("expected UnresolvedReference, got {other:?}"),
            }
        }
    }

    #[test]
    fn sections_come_out_in_fixed_order() {
        let model = Model::new(vec![
            callable("zeta_fn", vec![], Type::void(), false),
            callable("alpha_cb", vec![], Type::void(), true),
            aggregate("Mid", vec![("v", Type::int())]),
            enumeration(Some("Last"), &[("LAST_ONE", 1)]),
            Declaration::Define(ffigen_core::Define {
                name: Name::new("VERSION"),
                value: vec![DefinePart::Literal("3".to_string())],
                parameters: None,
                description: None,
            }),
        ]);
        let text = emit(&model, &RubyFfiBackend, &options()).unwrap().text;
        let positions: Vec<usize> = [
            "enum :last",
            "VERSION = 3",
            "class Mid",
            "callback :alpha_cb, [], :void",
            "attach_function :zeta_fn",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn declarations_sort_by_resolved_name() {
        let model = Model::new(vec![
            callable("b_second", vec![], Type::void(), false),
            callable("a_first", vec![], Type::void(), false),
        ]);
        let text = emit(&model, &RubyFfiBackend, &options()).unwrap().text;
        assert!(text.find(":a_first").unwrap() < text.find(":b_second").unwrap());
    }

    #[test]
    fn anonymous_declarations_are_skipped() {
        let model = Model::new(vec![
            enumeration(None, &[("FLAG_A", 1)]),
            Declaration::Aggregate(ffigen_core::Aggregate {
                name: None,
                fields: vec![Field {
                    name: Name::new("x"),
                    ty: Type::int(),
                    description: None,
                }],
                is_union: true,
                description: None,
            }),
        ]);
        let text = emit(&model, &RubyFfiBackend, &options()).unwrap().text;
        assert!(!text.contains("enum :"));
        assert!(!text.contains("FFI::Union"));
    }

    #[test]
    fn layout_warnings() {
        let model = Model::new(vec![
            aggregate("Alpha", vec![("z", Type::by_value(Type::aggregate_ref("Zeta")))]),
            aggregate("Handle", vec![("imp", Type::alias("Impl", Type::opaque()))]),
            aggregate("Zeta", vec![("v", Type::int())]),
        ]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert_eq!(unit.warnings.len(), 2);
        assert!(unit.warnings[0].starts_with("Alpha: field 'z' embeds 'Zeta'"));
        assert!(unit.warnings[1].starts_with("Handle: field 'imp' has an opaque type"));
        assert!(unit.text.contains("    layout :z, :pointer\n"));
        assert!(unit.text.contains("    layout :imp, :pointer\n"));
        assert!(unit.text.contains("#   WARNING: field 'z'"));

        // Fiddle never embeds, so even an already emitted aggregate warns.
        let model = Model::new(vec![
            aggregate("Inner", vec![("v", Type::int())]),
            aggregate("Outer", vec![("inner", Type::by_value(Type::aggregate_ref("Inner")))]),
        ]);
        assert!(emit(&model, &RubyFfiBackend, &options()).unwrap().warnings.is_empty());
        assert_eq!(emit(&model, &FiddleBackend, &options()).unwrap().warnings.len(), 1);
    }

    #[test]
    fn opaque_fields_per_backend() {
        let model = Model::new(vec![
            aggregate("Handle", vec![("imp", Type::alias("Impl", Type::opaque()))]),
            aggregate("Sized", vec![("storage", Type::Opaque { size_hint: Some(16) })]),
        ]);
        let fiddle = emit(&model, &FiddleBackend, &options()).unwrap();
        assert!(fiddle.text.contains("    Handle = struct ['void* imp']\n"));
        assert!(!fiddle.text.contains("VOIDP imp"));

        let ruby = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(ruby.text.contains("    layout :storage, :pointer\n"));
        assert!(ruby.warnings[1].starts_with("Sized: field 'storage' has an opaque type of 16 bytes"));
        assert!(ruby.warnings[0].ends_with("its native layout is unknown"));
    }

    #[test]
    fn jna_handles_are_referenced_by_class_name() {
        let model = Model::new(vec![
            aggregate("Handle", vec![]),
            aggregate("Holder", vec![("h", Type::pointer_to(Type::aggregate_ref("Handle")))]),
            callable(
                "holder_get",
                vec![("holder", Type::pointer_to(Type::aggregate_ref("Holder")))],
                Type::pointer_to(Type::aggregate_ref("Handle")),
                false,
            ),
        ]);
        let java = emit(&model, &JnaBackend, &options()).unwrap().text;
        assert!(java.contains("public static class Handle extends PointerType {"));
        assert!(java.contains("public Handle h;"));
        assert!(java.contains("Handle holderGet(Holder holder);"));
        assert!(!java.contains("Handle.ByReference"));
        assert!(!java.contains("Handle.ByValue"));
    }

    #[test]
    fn jna_literals_are_valid_java() {
        let model = Model::new(vec![
            enumeration(Some("Flags"), &[("FLAGS_NONE", 0), ("FLAGS_ALL", 0xFFFF_FFFF)]),
            Declaration::Define(ffigen_core::Define {
                name: Name::new("LIMIT"),
                value: vec![DefinePart::Literal("100UL".to_string())],
                parameters: None,
                description: None,
            }),
            Declaration::Define(ffigen_core::Define {
                name: Name::new("HUGE"),
                value: vec![DefinePart::Literal("0x1FFFFFFFFULL".to_string())],
                parameters: None,
                description: None,
            }),
        ]);
        let java = emit(&model, &JnaBackend, &options()).unwrap().text;
        assert!(java.contains("        NONE(0),\n        ALL((int) 0xFFFFFFFFL);\n"));
        assert!(java.contains("public static final int LIMIT = 100;"));
        assert!(java.contains("public static final long HUGE = 0x1FFFFFFFFL;"));
    }

    #[test]
    fn embedded_aggregates_after_definition() {
        let model = Model::new(vec![
            aggregate("Location", vec![("line", Type::Primitive(Primitive::UnsignedInt))]),
            aggregate(
                "Range",
                vec![
                    ("start", Type::aggregate_ref("Location")),
                    ("ends", Type::array(Type::aggregate_ref("Location"), ffigen_core::ArrayLength::Fixed(2))),
                ],
            ),
            callable(
                "get_range",
                vec![("", Type::by_value(Type::aggregate_ref("Location"))), ("", Type::pointer_to(Type::aggregate_ref("Range")))],
                Type::by_value(Type::aggregate_ref("Range")),
                false,
            ),
        ]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(unit.warnings.is_empty());
        assert!(unit.text.contains("    layout :start, Location,\n           :ends, [Location, 2]\n"));
        assert!(unit.text.contains(
            "attach_function :get_range, :get_range, [Location.by_value, Range.by_ref], Range.by_value"
        ));
        assert!(unit.text.contains("@method get_range(arg0, arg1)"));

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert!(java.text.contains("public Location[] ends = new Location[2];"));
        assert!(java.text.contains("Range.ByValue getRange(Location.ByValue arg0, Range arg1);"));
    }

    #[test]
    fn prefixes_are_stripped_but_symbols_kept() {
        let model = Model::new(vec![
            aggregate("CXString", vec![("data", Type::pointer_to(Type::void()))]),
            callable(
                "clang_getCString",
                vec![("string", Type::by_value(Type::aggregate_ref("CXString")))],
                Type::String,
                false,
            ),
        ]);
        let options = EmitOptions::new("Clang").with_prefixes(["clang_", "CX"]);
        let ruby = emit(&model, &RubyFfiBackend, &options).unwrap();
        assert!(ruby.text.contains(
            "attach_function :get_c_string, :clang_getCString, [String.by_value], :string"
        ));
        let java = emit(&model, &JnaBackend, &options).unwrap();
        assert!(java.text.contains("@NativeName(\"clang_getCString\")"));
        assert!(java.text.contains("String getCString(String_.ByValue string);"));
        let fiddle = emit(&model, &FiddleBackend, &options).unwrap();
        assert!(fiddle.text.contains("cdef :clang_getCString, VOIDP, string: VOIDP"));
        assert_eq!(fiddle.file_name, "clang_fiddle.rb");
    }

    #[test]
    fn header_and_footer() {
        let model = Model::new(vec![]);
        let unit = emit(&model, &RubyFfiBackend, &options()).unwrap();
        assert!(unit.text.starts_with(&format!(
            "# Generated by ffigen from model {}.",
            unit.fingerprint
        )));
        assert!(unit.text.contains("require 'ffi'\n\nmodule Demo\n  extend FFI::Library\n  ffi_lib 'demo'\n"));
        assert!(unit.text.ends_with("\nend\n"));
        assert_eq!(unit.file_name, "demo.rb");
        assert_eq!(unit.backend, BackendKind::RubyFfi);

        let java = emit(&model, &JnaBackend, &options()).unwrap();
        assert!(java.text.contains("public interface Demo extends Library {"));
        assert!(java.text.contains("return Native.load(\"demo\", Demo.class, options);"));
        assert!(java.text.ends_with("}\n"));
    }

    #[test]
    fn callbacks_and_defines() {
        let model = Model::new(vec![
            callable(
                "visitor",
                vec![("depth", Type::int())],
                Type::int(),
                true,
            ),
            callable(
                "walk",
                vec![("cb", Type::callback_ref("visitor"))],
                Type::void(),
                false,
            ),
            Declaration::Define(ffigen_core::Define {
                name: Name::new("MAX_DEPTH"),
                value: vec![
                    DefinePart::Constant(Name::new("BASE_DEPTH")),
                    DefinePart::Literal(" * 2".to_string()),
                ],
                parameters: None,
                description: None,
            }),
            Declaration::Define(ffigen_core::Define {
                name: Name::new("TWICE"),
                value: vec![DefinePart::Literal("x * 2".to_string())],
                parameters: Some(vec!["x".to_string()]),
                description: None,
            }),
        ]);
        let ruby = emit(&model, &RubyFfiBackend, &options()).unwrap().text;
        assert!(ruby.contains("  callback :visitor, [:int], :int\n"));
        assert!(ruby.contains("  attach_function :walk, :walk, [:visitor], :void\n"));
        assert!(ruby.contains("# @param [Proc(callback_visitor)] cb"));
        assert!(ruby.contains("  MAX_DEPTH = BASE_DEPTH * 2\n"));
        assert!(ruby.contains("  def twice(x)\n    x * 2\n  end\n"));

        let java = emit(&model, &JnaBackend, &options()).unwrap().text;
        assert!(java.contains("public interface Visitor extends Callback {\n        int invoke(int depth);\n    }"));
        assert!(java.contains("void walk(Visitor cb);"));
        assert!(java.contains("public static final int MAX_DEPTH = BASE_DEPTH * 2;"));
        assert!(!java.contains("TWICE"));

        let fiddle = emit(&model, &FiddleBackend, &options()).unwrap().text;
        assert!(fiddle.contains("    # callback :visitor, INT, depth: INT\n"));
        assert!(fiddle.contains("    cdef :walk, VOID, cb: VOIDP\n"));
    }
}
