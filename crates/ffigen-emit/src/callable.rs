//! Function and callback rendering.

use std::collections::HashSet;

use ffigen_core::{Callable, NameRole};

use crate::backend::{Backend, TypeContext};
use crate::error::Result;

/// One parameter, spelled for the call boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedParameter {
    pub name: String,
    pub transport: String,
    pub doc: String,
    pub description: Option<String>,
}

/// A function binding or callback type ready to be laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCallable {
    pub name: String,
    /// Exact native symbol.
    pub symbol: String,
    pub is_callback: bool,
    pub is_blocking: bool,
    pub parameters: Vec<RenderedParameter>,
    pub return_transport: String,
    pub returns_void: bool,
    pub return_doc: String,
    pub return_description: Option<String>,
    pub description: Option<String>,
}

/// Render a callable's signature with transport descriptors.
///
/// Unnamed parameters become `arg0`, `arg1`, ...; a parameter whose host
/// name collides with an earlier one gets its position appended.
pub fn render_callable<B: Backend>(
    backend: &B,
    callable: &Callable,
    cx: &TypeContext<'_>,
) -> Result<RenderedCallable> {
    let role = if callable.is_callback {
        NameRole::Callback
    } else {
        NameRole::Function
    };

    let mut seen = HashSet::new();
    let mut parameters = Vec::with_capacity(callable.parameters.len());
    for (i, param) in callable.parameters.iter().enumerate() {
        let mut name = match &param.name {
            Some(n) if !n.is_empty() => cx.member_name(n, NameRole::Parameter),
            _ => cx.naming.resolve_raw(&format!("arg{i}"), NameRole::Parameter),
        };
        if !seen.insert(name.clone()) {
            name = format!("{name}_{i}");
            seen.insert(name.clone());
        }
        parameters.push(RenderedParameter {
            name,
            transport: backend.transport_descriptor(&param.ty, cx)?,
            doc: backend.doc_description(&param.ty, cx)?,
            description: param.description.clone(),
        });
    }

    Ok(RenderedCallable {
        name: cx.declaration_name(&callable.name, role),
        symbol: callable.name.raw().to_string(),
        is_callback: callable.is_callback,
        is_blocking: callable.is_blocking,
        parameters,
        return_transport: backend.transport_descriptor(&callable.return_type, cx)?,
        returns_void: callable.return_type.is_void(),
        return_doc: backend.doc_description(&callable.return_type, cx)?,
        return_description: callable.return_description.clone(),
        description: callable.description.clone(),
    })
}
