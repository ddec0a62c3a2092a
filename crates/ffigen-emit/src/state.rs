//! Per-run aggregate emission state.
//!
//! Every aggregate moves `NotYetSeen -> ForwardReferenced -> FullyEmitted`
//! (or straight to `FullyEmitted`). The state belongs to one driver run and
//! is never stored on the model, so a second run or another backend always
//! starts from scratch.

use std::collections::HashMap;

use ffigen_core::{RefKind, Type};
use tracing::debug;

use crate::error::{EmitError, Result};

/// Where an aggregate stands in the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateState {
    #[default]
    NotYetSeen,
    /// Referenced before its definition; rendered as a pointer/handle.
    ForwardReferenced,
    /// Definition written. Terminal.
    FullyEmitted,
}

/// Emission state keyed by native aggregate name.
#[derive(Debug, Default)]
pub struct EmissionState {
    aggregates: HashMap<String, AggregateState>,
    forward_references: usize,
}

impl EmissionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, raw: &str) -> AggregateState {
        self.aggregates.get(raw).copied().unwrap_or_default()
    }

    pub fn is_emitted(&self, raw: &str) -> bool {
        self.state(raw) == AggregateState::FullyEmitted
    }

    /// Record a reference to `raw`. Returns `true` when the reference is a
    /// forward reference, i.e. the aggregate has no definition yet.
    pub fn note_reference(&mut self, raw: &str) -> bool {
        let entry = self.aggregates.entry(raw.to_string()).or_default();
        match *entry {
            AggregateState::FullyEmitted => false,
            AggregateState::NotYetSeen | AggregateState::ForwardReferenced => {
                if *entry == AggregateState::NotYetSeen {
                    debug!(aggregate = raw, "forward referenced");
                }
                *entry = AggregateState::ForwardReferenced;
                self.forward_references += 1;
                true
            }
        }
    }

    /// Record every aggregate reference reachable from `ty`.
    pub fn note_references(&mut self, ty: &Type) {
        for (kind, name) in ty.references() {
            if kind == RefKind::Aggregate {
                self.note_reference(name.raw());
            }
        }
    }

    /// Transition `raw` to `FullyEmitted`. Fails if it already was.
    pub fn mark_emitted(&mut self, raw: &str) -> Result<()> {
        let entry = self.aggregates.entry(raw.to_string()).or_default();
        if *entry == AggregateState::FullyEmitted {
            return Err(EmitError::DuplicateEmission {
                name: raw.to_string(),
            });
        }
        let previous = *entry;
        *entry = AggregateState::FullyEmitted;
        debug!(aggregate = raw, from = ?previous, "fully emitted");
        Ok(())
    }

    /// How many references were rendered before their target's definition.
    pub fn forward_reference_count(&self) -> usize {
        self.forward_references
    }

    /// How many aggregates have been fully emitted.
    pub fn emitted_count(&self) -> usize {
        self.aggregates
            .values()
            .filter(|s| **s == AggregateState::FullyEmitted)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut state = EmissionState::new();
        assert_eq!(state.state("Node"), AggregateState::NotYetSeen);
        assert!(state.note_reference("Node"));
        assert_eq!(state.state("Node"), AggregateState::ForwardReferenced);
        state.mark_emitted("Node").unwrap();
        assert!(state.is_emitted("Node"));
        assert!(!state.note_reference("Node"));
        assert_eq!(state.forward_reference_count(), 1);
    }

    #[test]
    fn direct_emission_skips_forward_state() {
        let mut state = EmissionState::new();
        state.mark_emitted("Point").unwrap();
        assert_eq!(state.state("Point"), AggregateState::FullyEmitted);
        assert_eq!(state.forward_reference_count(), 0);
    }

    #[test]
    fn second_emission_is_rejected() {
        let mut state = EmissionState::new();
        state.mark_emitted("Node").unwrap();
        let err = state.mark_emitted("Node").unwrap_err();
        assert!(matches!(err, EmitError::DuplicateEmission { name } if name == "Node"));
        assert_eq!(state.emitted_count(), 1);
    }

    #[test]
    fn references_through_pointers_and_arrays() {
        let mut state = EmissionState::new();
        let ty = Type::array(
            Type::pointer_to(Type::aggregate_ref("Node")),
            ffigen_core::ArrayLength::Fixed(2),
        );
        state.note_references(&ty);
        state.note_references(&Type::enum_ref("Color"));
        assert_eq!(state.state("Node"), AggregateState::ForwardReferenced);
        assert_eq!(state.state("Color"), AggregateState::NotYetSeen);
    }
}
