//! The declaration list handed over by the header parser.
//!
//! References between declarations are by native name; the model keeps
//! per-kind lookup tables so renderers can resolve them without embedding
//! one declaration inside another.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decl::{Aggregate, Callable, DeclKind, Declaration, Define, Enumeration};
use crate::error::{ModelError, Result};
use crate::hash::Fingerprint;
use crate::types::RefKind;

/// An immutable, ordered list of declarations with by-name lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ModelRepr")]
pub struct Model {
    declarations: Vec<Declaration>,
    #[serde(skip)]
    index: ModelIndex,
}

#[derive(Deserialize)]
struct ModelRepr {
    #[serde(default)]
    declarations: Vec<Declaration>,
}

impl From<ModelRepr> for Model {
    fn from(repr: ModelRepr) -> Self {
        Model::new(repr.declarations)
    }
}

#[derive(Debug, Clone, Default)]
struct ModelIndex {
    enumerations: BTreeMap<String, usize>,
    aggregates: BTreeMap<String, usize>,
    callbacks: BTreeMap<String, usize>,
    duplicates: Vec<(DeclKind, String)>,
}

impl Model {
    /// Build a model from parser output.
    ///
    /// A field-less aggregate is a C forward declaration (`struct Foo;`).
    /// It is dropped when the name has a full definition, and repeated
    /// forward declarations of one name collapse into the first.
    pub fn new(declarations: Vec<Declaration>) -> Self {
        let defined: BTreeSet<String> = declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Aggregate(a) if !a.fields.is_empty() => {
                    a.name.as_ref().map(|n| n.raw().to_string())
                }
                _ => None,
            })
            .collect();

        let mut declared = BTreeSet::new();
        let declarations: Vec<Declaration> = declarations
            .into_iter()
            .filter(|d| match d {
                Declaration::Aggregate(a) if a.fields.is_empty() => {
                    let Some(name) = &a.name else { return true };
                    let forward =
                        defined.contains(name.raw()) || !declared.insert(name.raw().to_string());
                    if forward {
                        debug!(name = %name, "dropping forward declaration");
                    }
                    !forward
                }
                _ => true,
            })
            .collect();

        let mut index = ModelIndex::default();
        for (pos, decl) in declarations.iter().enumerate() {
            let table = match decl {
                Declaration::Enumeration(_) => &mut index.enumerations,
                Declaration::Aggregate(_) => &mut index.aggregates,
                Declaration::Callable(c) if c.is_callback => &mut index.callbacks,
                Declaration::Callable(_) | Declaration::Define(_) => continue,
            };
            let Some(name) = decl.name() else { continue };
            if table.insert(name.raw().to_string(), pos).is_some() {
                index.duplicates.push((decl.kind(), name.raw().to_string()));
            }
        }

        Self {
            declarations,
            index,
        }
    }

    /// All declarations in parser order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn enumerations(&self) -> impl Iterator<Item = &Enumeration> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Enumeration(e) => Some(e),
            _ => None,
        })
    }

    pub fn aggregates(&self) -> impl Iterator<Item = &Aggregate> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Aggregate(a) => Some(a),
            _ => None,
        })
    }

    pub fn callables(&self) -> impl Iterator<Item = &Callable> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Callable(c) => Some(c),
            _ => None,
        })
    }

    pub fn defines(&self) -> impl Iterator<Item = &Define> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Define(d) => Some(d),
            _ => None,
        })
    }

    /// Look up an enumeration by native name.
    pub fn enumeration(&self, raw: &str) -> Option<&Enumeration> {
        match self.lookup(&self.index.enumerations, raw)? {
            Declaration::Enumeration(e) => Some(e),
            _ => None,
        }
    }

    /// Look up a struct or union by native name.
    pub fn aggregate(&self, raw: &str) -> Option<&Aggregate> {
        match self.lookup(&self.index.aggregates, raw)? {
            Declaration::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a callback declaration by native name.
    pub fn callback(&self, raw: &str) -> Option<&Callable> {
        match self.lookup(&self.index.callbacks, raw)? {
            Declaration::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Whether a reference of `kind` to `raw` resolves.
    pub fn contains(&self, kind: RefKind, raw: &str) -> bool {
        let table = match kind {
            RefKind::Enumeration => &self.index.enumerations,
            RefKind::Aggregate => &self.index.aggregates,
            RefKind::Callback => &self.index.callbacks,
        };
        table.contains_key(raw)
    }

    fn lookup(&self, table: &BTreeMap<String, usize>, raw: &str) -> Option<&Declaration> {
        table.get(raw).and_then(|&pos| self.declarations.get(pos))
    }

    /// Check that the model is well formed: no duplicate names per kind and
    /// every by-name reference resolves. Reports the first problem found.
    pub fn validate(&self) -> Result<()> {
        if let Some((kind, name)) = self.index.duplicates.first() {
            return Err(ModelError::DuplicateDeclaration {
                kind: *kind,
                name: name.clone(),
            });
        }
        for decl in &self.declarations {
            for ty in decl.types() {
                for (kind, target) in ty.references() {
                    if !self.contains(kind, target.raw()) {
                        return Err(ModelError::UnresolvedReference {
                            referrer: decl.display_name().to_string(),
                            target: target.raw().to_string(),
                            kind,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Hex SHA-256 over the canonical JSON of the declarations.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(Fingerprint::of(&self.declarations)?.to_string())
    }
}
