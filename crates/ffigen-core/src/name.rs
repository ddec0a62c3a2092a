//! Identifier segmentation and per-convention resolution.
//!
//! Native identifiers arrive in whatever style the header used
//! (`clang_getCString`, `CXCursor_UnexposedDecl`, `COLOR_RED`). Every
//! backend needs them re-spelled in its own convention and kept clear of its
//! reserved words. Resolution is a pure function of the identifier, the
//! convention and the reserved-word list, so the same input always yields the
//! same output no matter where in a run it is asked.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier used when a raw name has no usable characters.
pub const PLACEHOLDER: &str = "unnamed";

/// Target naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// `lower_snake_case`
    LowerSnake,
    /// `UpperCamelCase`
    UpperCamel,
    /// `lowerCamelCase`
    LowerCamel,
    /// `UPPER_SNAKE_CASE`
    UpperSnake,
}

/// Split a raw identifier into case/underscore-delimited segments.
///
/// Any non-alphanumeric character separates segments. Inside a run of
/// alphanumerics a new segment starts at a lower-to-upper transition
/// (`getCString` -> `get`, `CString`) and before the last capital of an
/// acronym that is followed by a lowercase letter (`CString` -> `C`,
/// `String`). Digits stay with the segment they follow.
pub fn split_segments(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for word in raw.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let chars: Vec<char> = word.chars().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let prev = chars[i - 1];
            let cur = chars[i];
            let next = chars.get(i + 1).copied();
            let lower_to_upper =
                (prev.is_ascii_lowercase() || prev.is_ascii_digit()) && cur.is_ascii_uppercase();
            let acronym_end = prev.is_ascii_uppercase()
                && cur.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase());
            if lower_to_upper || acronym_end {
                segments.push(chars[start..i].iter().collect());
                start = i;
            }
        }
        segments.push(chars[start..].iter().collect());
    }
    segments
}

/// Resolve a raw native identifier into a collision-free target identifier.
///
/// Never fails: an identifier with no usable characters becomes
/// [`PLACEHOLDER`], a leading digit gets a `_` prefix, and a reserved word
/// gets `_` appended until it is no longer reserved.
pub fn resolve(raw: &str, convention: Convention, reserved: &[&str]) -> String {
    let segments = split_segments(raw);
    let mut ident = if segments.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        // An all-caps identifier carries no case information worth keeping.
        let shouting = !raw.chars().any(|c| c.is_ascii_lowercase());
        join_segments(&segments, convention, shouting)
    };
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    while reserved.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

fn join_segments(segments: &[String], convention: Convention, shouting: bool) -> String {
    match convention {
        Convention::LowerSnake => segments
            .iter()
            .map(|s| s.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        Convention::UpperSnake => segments
            .iter()
            .map(|s| s.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join("_"),
        Convention::UpperCamel => segments.iter().map(|s| capitalize(s, shouting)).collect(),
        Convention::LowerCamel => segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if i == 0 {
                    s.to_ascii_lowercase()
                } else {
                    capitalize(s, shouting)
                }
            })
            .collect(),
    }
}

/// Upper-case the first character; keep the interior case of acronyms such
/// as `CXX` unless the whole identifier was shouted.
fn capitalize(segment: &str, normalize: bool) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.collect();
            let rest = if normalize {
                rest.to_ascii_lowercase()
            } else {
                rest
            };
            format!("{}{rest}", first.to_ascii_uppercase())
        }
        None => String::new(),
    }
}

/// What a name is used as, which decides the convention applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameRole {
    /// Struct and union type names.
    Type,
    /// Enumeration type names.
    Enumeration,
    /// Callback type names.
    Callback,
    /// Bound function names.
    Function,
    /// Preprocessor constants.
    Constant,
    /// Members of an enumeration.
    EnumConstant,
    /// Aggregate fields.
    Field,
    /// Callable parameters.
    Parameter,
}

/// A backend's naming rules: one convention per role plus its reserved words.
#[derive(Debug, Clone, Copy)]
pub struct NamingProfile {
    pub type_names: Convention,
    pub enumerations: Convention,
    pub callbacks: Convention,
    pub functions: Convention,
    pub constants: Convention,
    pub enum_constants: Convention,
    pub fields: Convention,
    pub parameters: Convention,
    pub reserved: &'static [&'static str],
}

impl NamingProfile {
    /// Convention applied to names used in `role`.
    pub fn convention(&self, role: NameRole) -> Convention {
        match role {
            NameRole::Type => self.type_names,
            NameRole::Enumeration => self.enumerations,
            NameRole::Callback => self.callbacks,
            NameRole::Function => self.functions,
            NameRole::Constant => self.constants,
            NameRole::EnumConstant => self.enum_constants,
            NameRole::Field => self.fields,
            NameRole::Parameter => self.parameters,
        }
    }

    /// Resolve a model name for `role`.
    pub fn resolve(&self, name: &Name, role: NameRole) -> String {
        name.format(self.convention(role), self.reserved)
    }

    /// Resolve a bare identifier for `role`.
    pub fn resolve_raw(&self, raw: &str, role: NameRole) -> String {
        resolve(raw, self.convention(role), self.reserved)
    }
}

/// A native identifier.
///
/// `raw` is the exact spelling in the header and is what native symbols are
/// bound by. `stem` is the part used for host-language naming, which is the
/// raw spelling minus any configured library prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Name {
    raw: String,
    stem: String,
}

impl Name {
    /// Create a name with no prefix stripped.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            stem: raw.clone(),
            raw,
        }
    }

    /// The exact native spelling.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The spelling used for host naming.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Whether the raw spelling is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Return a copy with the first matching library prefix removed from the
    /// stem. A prefix is not stripped when that would leave nothing usable or
    /// a leading digit.
    pub fn without_prefixes(&self, prefixes: &[String]) -> Name {
        for prefix in prefixes {
            if prefix.is_empty() {
                continue;
            }
            if let Some(rest) = self.raw.strip_prefix(prefix.as_str()) {
                let usable = rest
                    .chars()
                    .find(|c| c.is_ascii_alphanumeric())
                    .is_some_and(|c| !c.is_ascii_digit());
                if usable {
                    return Name {
                        raw: self.raw.clone(),
                        stem: rest.to_string(),
                    };
                }
            }
        }
        self.clone()
    }

    /// Format the stem in `convention`, avoiding `reserved`.
    pub fn format(&self, convention: Convention, reserved: &[&str]) -> String {
        resolve(&self.stem, convention, reserved)
    }
}

impl From<String> for Name {
    fn from(raw: String) -> Self {
        Name::new(raw)
    }
}

impl From<&str> for Name {
    fn from(raw: &str) -> Self {
        Name::new(raw)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.raw
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
