//! Enumeration rendering: common-prefix shortening and per-backend naming.

use std::collections::HashSet;

use ffigen_core::{Enumeration, NameRole};
use tracing::debug;

use crate::backend::TypeContext;

/// One constant, named for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConstant {
    pub name: String,
    pub raw_name: String,
    pub value: i64,
    pub description: Option<String>,
}

/// An enumeration ready to be laid out by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEnumeration {
    pub name: String,
    pub raw_name: String,
    pub description: Option<String>,
    /// Declaration order, original values.
    pub constants: Vec<RenderedConstant>,
}

/// Render an enumeration. Anonymous enumerations yield `None`.
pub fn render_enumeration(
    enumeration: &Enumeration,
    cx: &TypeContext<'_>,
) -> Option<RenderedEnumeration> {
    let Some(name) = &enumeration.name else {
        debug!(
            constants = enumeration.constants.len(),
            "skipping anonymous enumeration"
        );
        return None;
    };

    let raw: Vec<&str> = enumeration.constants.iter().map(|c| c.name.raw()).collect();
    let short = shorten_constant_names(&raw);
    let mut seen = HashSet::new();
    let mut constants = Vec::with_capacity(short.len());
    for (i, (constant, short)) in enumeration.constants.iter().zip(short).enumerate() {
        // Shortening compares case-insensitively, so `COLOR_Red` and
        // `COLOR_RED` can resolve to one host name.
        let mut host = cx.naming.resolve_raw(&short, NameRole::EnumConstant);
        if !seen.insert(host.clone()) {
            host = format!("{host}_{i}");
            seen.insert(host.clone());
        }
        constants.push(RenderedConstant {
            name: host,
            raw_name: constant.name.raw().to_string(),
            value: constant.value,
            description: constant.description.clone(),
        });
    }

    Some(RenderedEnumeration {
        name: cx.declaration_name(name, NameRole::Enumeration),
        raw_name: name.raw().to_string(),
        description: enumeration.description.clone(),
        constants,
    })
}

/// Strip the longest `_`-separated segment prefix shared by every name
/// (compared case-insensitively).
///
/// At least one segment is always left. A name whose remainder would be
/// empty or start with a digit keeps its raw spelling.
pub fn shorten_constant_names(names: &[&str]) -> Vec<String> {
    let split: Vec<Vec<&str>> = names.iter().map(|n| n.split('_').collect()).collect();
    let shortest = split.iter().map(Vec::len).min().unwrap_or(0);

    let mut common = 0;
    'segments: while common + 1 < shortest {
        let first = split[0][common];
        for segments in &split[1..] {
            if !segments[common].eq_ignore_ascii_case(first) {
                break 'segments;
            }
        }
        common += 1;
    }

    names
        .iter()
        .zip(&split)
        .map(|(raw, segments)| {
            let rest = segments[common..].join("_");
            let usable = rest
                .chars()
                .find(|c| c.is_ascii_alphanumeric())
                .is_some_and(|c| !c.is_ascii_digit());
            if usable {
                rest
            } else {
                raw.to_string()
            }
        })
        .collect()
}
