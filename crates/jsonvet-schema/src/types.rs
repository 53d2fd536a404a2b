//! # Type Registry and Schema Pre-Flight
//!
//! The draft vocabulary admits seven primitive type names. A schema
//! that writes any other name under a `type` keyword is the schema
//! author's defect, and there are two distinct flavors:
//!
//! - an *unknown type*: the name is not in the vocabulary at all
//!   (a typo such as `"strnig"`);
//! - an *undefined type check*: the name was admitted to the vocabulary
//!   (a custom extension) but no checker was ever registered for it.
//!
//! The pre-flight walk finds the first offender before the validator is
//! compiled, so every record audited against the schema gets the same
//! deterministic diagnostic.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// The primitive type names of the JSON Schema draft vocabulary.
pub const PRIMITIVE_TYPES: [&str; 7] = [
    "array", "boolean", "integer", "null", "number", "object", "string",
];

/// Keywords whose values are name-keyed maps of sub-schemas. The map
/// keys are user-chosen names, not keywords, so the walk descends into
/// the values only.
const NAME_KEYED_KEYWORDS: [&str; 5] = [
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
];

/// Keywords whose values are plain data, where a nested `"type"` key is
/// not a keyword.
const DATA_KEYWORDS: [&str; 4] = ["enum", "const", "default", "examples"];

/// The set of admissible type names and the subset that can actually be
/// checked.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    vocabulary: BTreeSet<String>,
    checked: BTreeSet<String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let primitives: BTreeSet<String> =
            PRIMITIVE_TYPES.iter().map(|name| (*name).to_owned()).collect();
        Self {
            vocabulary: primitives.clone(),
            checked: primitives,
        }
    }
}

impl TypeRegistry {
    /// A registry admitting and checking the seven draft primitives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a custom type name to the vocabulary without a checker.
    /// Schemas may then name it, but validation against it cannot run
    /// until [`TypeRegistry::register`] attaches a check.
    pub fn declare(&mut self, name: &str) {
        self.vocabulary.insert(name.to_owned());
    }

    /// Admit a custom type name with a working checker.
    pub fn register(&mut self, name: &str) {
        self.vocabulary.insert(name.to_owned());
        self.checked.insert(name.to_owned());
    }

    /// Whether the vocabulary admits the name.
    pub fn admits(&self, name: &str) -> bool {
        self.vocabulary.contains(name)
    }

    /// Whether a checker is registered for the name.
    pub fn has_check(&self, name: &str) -> bool {
        self.checked.contains(name)
    }
}

/// Context for a type-registration failure: the offending name and the
/// serialized sub-schema it appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheckFailure {
    /// The offending type name.
    pub type_name: String,
    /// Compact serialization of the sub-schema carrying the `type`
    /// keyword.
    pub context: String,
}

/// The two pre-flight failure flavors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightFailure {
    /// The name is outside the vocabulary.
    Unknown(TypeCheckFailure),
    /// The name is admitted but has no registered checker.
    Unchecked(TypeCheckFailure),
}

/// Walk every `type` keyword in the schema and report the first name
/// the registry cannot handle. Walk order is deterministic (object keys
/// are visited in map order), so the same schema always yields the same
/// offender.
pub fn preflight(schema: &Value, registry: &TypeRegistry) -> Result<(), PreflightFailure> {
    walk_schema(schema, registry)
}

fn walk_schema(schema: &Value, registry: &TypeRegistry) -> Result<(), PreflightFailure> {
    match schema {
        Value::Object(object) => {
            for (key, value) in object {
                if DATA_KEYWORDS.contains(&key.as_str()) {
                    continue;
                }
                if key == "type" {
                    check_type_keyword(value, object, registry)?;
                    continue;
                }
                if NAME_KEYED_KEYWORDS.contains(&key.as_str()) {
                    if let Value::Object(named) = value {
                        for sub_schema in named.values() {
                            walk_schema(sub_schema, registry)?;
                        }
                        continue;
                    }
                }
                walk_schema(value, registry)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                walk_schema(item, registry)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_type_keyword(
    value: &Value,
    enclosing: &Map<String, Value>,
    registry: &TypeRegistry,
) -> Result<(), PreflightFailure> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    for name in names {
        let failure = || TypeCheckFailure {
            type_name: name.to_owned(),
            context: Value::Object(enclosing.clone()).to_string(),
        };
        if !registry.admits(name) {
            return Err(PreflightFailure::Unknown(failure()));
        }
        if !registry.has_check(name) {
            return Err(PreflightFailure::Unchecked(failure()));
        }
    }
    Ok(())
}
