//! Preprocessor define rendering.

use ffigen_core::{Define, DefinePart, NameRole};

use crate::backend::TypeContext;

/// A define with its body re-spelled for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDefine {
    /// Constant name, or method name for a function-like define.
    pub name: String,
    pub raw_name: String,
    pub value: String,
    pub parameters: Option<Vec<String>>,
    pub description: Option<String>,
}

impl RenderedDefine {
    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }
}

/// Join the parts of a define: literals verbatim, constant references in
/// the constant convention, method references in the function convention.
pub fn render_define(define: &Define, cx: &TypeContext<'_>) -> RenderedDefine {
    let value = define
        .value
        .iter()
        .map(|part| match part {
            DefinePart::Literal(text) => text.clone(),
            DefinePart::Constant(name) => cx.declaration_name(name, NameRole::Constant),
            DefinePart::Method(name) => cx.declaration_name(name, NameRole::Function),
        })
        .collect();

    let role = if define.parameters.is_some() {
        NameRole::Function
    } else {
        NameRole::Constant
    };

    RenderedDefine {
        name: cx.declaration_name(&define.name, role),
        raw_name: define.name.raw().to_string(),
        value,
        parameters: define.parameters.clone(),
        description: define.description.clone(),
    }
}
