//! Aggregate (struct/union) rendering.
//!
//! References are noted in the emission state before the context is built,
//! so a field pointing back at its own aggregate sees it as forward
//! referenced and renders as a pointer/handle. The aggregate only becomes
//! `FullyEmitted` after every field has been rendered.

use ffigen_core::{Aggregate, ArrayLength, Model, NameRole, Type};
use tracing::{debug, warn};

use crate::backend::{Backend, EmitOptions, TypeContext};
use crate::error::Result;
use crate::state::EmissionState;

/// One field, spelled for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub name: String,
    pub raw_name: String,
    /// Canonical spelling, or the opaque transport spelling for fields of
    /// unknown layout.
    pub type_name: String,
    pub doc: String,
    /// Element count for fixed-size array fields.
    pub fixed_length: Option<u64>,
    pub warning: Option<String>,
    pub description: Option<String>,
}

/// A struct or union ready to be laid out by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAggregate {
    pub name: String,
    pub raw_name: String,
    pub is_union: bool,
    pub description: Option<String>,
    pub fields: Vec<RenderedField>,
}

impl RenderedAggregate {
    /// Layout warnings attached to fields, in field order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| f.warning.as_deref())
    }

    pub fn is_opaque_handle(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Render one aggregate and mark it fully emitted.
///
/// Anonymous aggregates yield `Ok(None)` and leave the state untouched.
pub fn render_aggregate<B: Backend>(
    backend: &B,
    aggregate: &Aggregate,
    model: &Model,
    options: &EmitOptions,
    state: &mut EmissionState,
) -> Result<Option<RenderedAggregate>> {
    let Some(name) = &aggregate.name else {
        debug!(fields = aggregate.fields.len(), "skipping anonymous aggregate");
        return Ok(None);
    };

    for field in &aggregate.fields {
        state.note_references(&field.ty);
    }

    let rendered = {
        let cx = TypeContext::new(model, state, options, backend.naming());
        let mut fields = Vec::with_capacity(aggregate.fields.len());
        for field in &aggregate.fields {
            let field_name = cx.member_name(&field.name, NameRole::Field);
            let mut type_name = backend.canonical_name(&field.ty, &cx)?;
            let mut warning = None;

            if field.ty.is_opaque_layout() {
                type_name = backend.opaque_field_type(&field.ty, &cx)?;
                warning = Some(match field.ty.opaque_size_hint() {
                    Some(size) => format!(
                        "field '{}' has an opaque type of {size} bytes; \
                         rendered as a pointer, native layout differs",
                        field.name
                    ),
                    None => format!(
                        "field '{}' has an opaque type; its native layout is unknown",
                        field.name
                    ),
                });
            } else if let Some(inner) = field.ty.embedded_aggregate() {
                if !backend.embeds_aggregates() || !cx.is_emitted(inner) {
                    warning = Some(format!(
                        "field '{}' embeds '{}' by value but is rendered as a reference; \
                         native layout may differ",
                        field.name, inner
                    ));
                }
            }

            if let Some(message) = &warning {
                warn!(backend = %backend.kind(), aggregate = %name, "{message}");
            }

            fields.push(RenderedField {
                name: field_name,
                raw_name: field.name.raw().to_string(),
                type_name,
                doc: backend.doc_description(&field.ty, &cx)?,
                fixed_length: fixed_length(&field.ty),
                warning,
                description: field.description.clone(),
            });
        }

        RenderedAggregate {
            name: cx.declaration_name(name, NameRole::Type),
            raw_name: name.raw().to_string(),
            is_union: aggregate.is_union,
            description: aggregate.description.clone(),
            fields,
        }
    };

    state.mark_emitted(name.raw())?;
    Ok(Some(rendered))
}

fn fixed_length(ty: &Type) -> Option<u64> {
    match ty.strip_alias() {
        Type::Array {
            length: ArrayLength::Fixed(n),
            ..
        } => Some(*n),
        _ => None,
    }
}
