use std::fmt::{self, Display, Formatter};

use crate::ast::NameContext;
use crate::types::Fqn;

/// Symbolic PHP type used by the inference engine.
///
/// `Mixed` is the widest assumption and the only failure signal; inference
/// never raises. `Compound` is a flat union: construction flattens nested
/// compounds and collapses to the single member when only one distinct type
/// remains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhpType {
    Mixed,
    Boolean,
    Integer,
    Float,
    String,
    /// `array`; element and key types when they could be proven.
    Array {
        value: Option<Box<PhpType>>,
        key: Option<Box<PhpType>>,
    },
    /// Object instance; no FQSEN for anonymous classes.
    Object(Option<Fqn>),
    /// `self` in a type position.
    SelfType,
    /// `static` (late static binding).
    StaticType,
    /// The type of `$this`.
    This,
    /// Union of at least two distinct types; never nests.
    Compound(Vec<PhpType>),
}

impl PhpType {
    pub fn object(fqn: impl Into<Fqn>) -> Self {
        PhpType::Object(Some(fqn.into()))
    }

    pub fn array_of(value: PhpType) -> Self {
        PhpType::Array {
            value: Some(Box::new(value)),
            key: None,
        }
    }

    pub fn plain_array() -> Self {
        PhpType::Array {
            value: None,
            key: None,
        }
    }

    /// Builds a union: flattens compound members, drops duplicates, and
    /// returns the sole member directly when only one distinct type
    /// remains. An empty input is `Mixed`.
    pub fn compound(types: impl IntoIterator<Item = PhpType>) -> Self {
        let mut members: Vec<PhpType> = Vec::new();
        for ty in types {
            match ty {
                PhpType::Compound(inner) => {
                    for t in inner {
                        if !members.contains(&t) {
                            members.push(t);
                        }
                    }
                }
                other => {
                    if !members.contains(&other) {
                        members.push(other);
                    }
                }
            }
        }
        match members.len() {
            0 => PhpType::Mixed,
            1 => members.pop().unwrap(),
            _ => PhpType::Compound(members),
        }
    }

    /// All object FQNs mentioned by this type, recursing into compounds.
    pub fn object_fqns(&self) -> Vec<Fqn> {
        match self {
            PhpType::Object(Some(fqn)) => vec![fqn.clone()],
            PhpType::Compound(members) => {
                members.iter().flat_map(|t| t.object_fqns()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The components seen when treating this type as a union: a compound
    /// yields its members, anything else yields itself.
    pub fn components(&self) -> Vec<PhpType> {
        match self {
            PhpType::Compound(members) => members.clone(),
            other => vec![other.clone()],
        }
    }

    /// Parses a doc-comment type string (`int|string`, `Foo[]`, `\A\B`).
    /// Class names resolve through the name context the comment was written
    /// in. Unknown words degrade to `Mixed`.
    pub fn from_doc_string(raw: &str, context: &NameContext) -> PhpType {
        let members = raw
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Self::from_doc_part(part, context));
        Self::compound(members)
    }

    fn from_doc_part(part: &str, context: &NameContext) -> PhpType {
        if let Some(inner) = part.strip_suffix("[]") {
            return PhpType::array_of(Self::from_doc_part(inner, context));
        }
        // A leading backslash is the doc-block FQSEN convention.
        if part.starts_with('\\') {
            return PhpType::Object(Some(Fqn::from_fqsen(part)));
        }
        match part.to_ascii_lowercase().as_str() {
            "int" | "integer" => PhpType::Integer,
            "bool" | "boolean" | "true" | "false" => PhpType::Boolean,
            "float" | "double" => PhpType::Float,
            "string" => PhpType::String,
            "array" | "iterable" => PhpType::plain_array(),
            "object" => PhpType::Object(None),
            "self" => PhpType::SelfType,
            "static" => PhpType::StaticType,
            "$this" | "this" => PhpType::This,
            "mixed" | "null" | "void" | "callable" | "resource" | "scalar" | "never" => {
                PhpType::Mixed
            }
            _ => match context.resolve_class(part) {
                Some(resolved) => PhpType::Object(Some(Fqn::new(resolved))),
                None => PhpType::Mixed,
            },
        }
    }

    /// Maps a primitive type-hint keyword; `None` if the word names a
    /// class (including the relative `self`/`static`/`parent`, which the
    /// class-designator rules interpret).
    pub fn from_hint_keyword(keyword: &str) -> Option<PhpType> {
        let ty = match keyword.to_ascii_lowercase().as_str() {
            "int" | "integer" => PhpType::Integer,
            "bool" | "boolean" | "false" | "true" => PhpType::Boolean,
            "float" | "double" => PhpType::Float,
            "string" => PhpType::String,
            "array" | "iterable" => PhpType::plain_array(),
            "object" => PhpType::Object(None),
            "mixed" | "void" | "callable" | "null" | "never" => PhpType::Mixed,
            _ => return None,
        };
        Some(ty)
    }
}

impl Display for PhpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PhpType::Mixed => write!(f, "mixed"),
            PhpType::Boolean => write!(f, "bool"),
            PhpType::Integer => write!(f, "int"),
            PhpType::Float => write!(f, "float"),
            PhpType::String => write!(f, "string"),
            PhpType::Array { value, key } => match (value, key) {
                (Some(value), Some(key)) => write!(f, "array<{}, {}>", key, value),
                (Some(value), None) => write!(f, "{}[]", value),
                _ => write!(f, "array"),
            },
            PhpType::Object(Some(fqn)) => write!(f, "{}", fqn),
            PhpType::Object(None) => write!(f, "object"),
            PhpType::SelfType => write!(f, "self"),
            PhpType::StaticType => write!(f, "static"),
            PhpType::This => write!(f, "$this"),
            PhpType::Compound(members) => {
                let parts: Vec<String> = members.iter().map(|t| t.to_string()).collect();
                write!(f, "{}", parts.join("|"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_flattens_and_dedups() {
        let inner = PhpType::compound([PhpType::Integer, PhpType::String]);
        let outer = PhpType::compound([inner, PhpType::Integer, PhpType::Boolean]);
        assert_eq!(
            outer,
            PhpType::Compound(vec![PhpType::Integer, PhpType::String, PhpType::Boolean])
        );
    }

    #[test]
    fn test_compound_collapses_single_member() {
        assert_eq!(
            PhpType::compound([PhpType::Integer, PhpType::Integer]),
            PhpType::Integer
        );
        assert_eq!(PhpType::compound([]), PhpType::Mixed);
    }

    #[test]
    fn test_compound_never_nests() {
        let a = PhpType::compound([PhpType::Integer, PhpType::String]);
        let b = PhpType::compound([PhpType::Float, a.clone()]);
        match b {
            PhpType::Compound(members) => {
                assert!(members.iter().all(|m| !matches!(m, PhpType::Compound(_))));
                assert_eq!(members.len(), 3);
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_object_fqns_recurses_compounds() {
        let ty = PhpType::compound([
            PhpType::object("A\\B"),
            PhpType::Integer,
            PhpType::compound([PhpType::object("C"), PhpType::Boolean]),
        ]);
        let fqns = ty.object_fqns();
        assert_eq!(fqns, vec![Fqn::new("A\\B"), Fqn::new("C")]);
    }

    #[test]
    fn test_doc_string_unions_and_arrays() {
        let ctx = NameContext {
            namespace: Some("N".to_string()),
            ..NameContext::default()
        };
        assert_eq!(
            PhpType::from_doc_string("int|string", &ctx),
            PhpType::Compound(vec![PhpType::Integer, PhpType::String])
        );
        assert_eq!(
            PhpType::from_doc_string("Foo[]", &ctx),
            PhpType::array_of(PhpType::object("N\\Foo"))
        );
        assert_eq!(
            PhpType::from_doc_string("\\A\\B", &ctx),
            PhpType::object("A\\B")
        );
        assert_eq!(PhpType::from_doc_string("bool", &ctx), PhpType::Boolean);
    }

    #[test]
    fn test_display() {
        assert_eq!(PhpType::Integer.to_string(), "int");
        assert_eq!(PhpType::array_of(PhpType::String).to_string(), "string[]");
        assert_eq!(
            PhpType::compound([PhpType::Integer, PhpType::String]).to_string(),
            "int|string"
        );
        assert_eq!(PhpType::object("A\\B").to_string(), "A\\B");
    }
}
