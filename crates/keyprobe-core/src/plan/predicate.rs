//! Success predicates and field extraction over JSON response bodies.
//!
//! Pointers follow RFC 6901 as implemented by [`serde_json::Value::pointer`]:
//! the empty string addresses the whole document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decides whether a successful response proves the credential is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Any parseable body counts.
    Always,
    /// The value at `pointer` equals `value`.
    Equals { pointer: String, value: Value },
    /// The value at `pointer` exists and is not null.
    Present { pointer: String },
    /// The value at `pointer` exists and is not empty.
    NonEmpty { pointer: String },
    /// The value at `pointer` is an array, possibly empty.
    IsArray { pointer: String },
}

impl Predicate {
    /// `pointer == value`.
    pub fn equals(pointer: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            pointer: pointer.into(),
            value: value.into(),
        }
    }

    /// `pointer` is present.
    pub fn present(pointer: impl Into<String>) -> Self {
        Self::Present {
            pointer: pointer.into(),
        }
    }

    /// `pointer` is non-empty.
    pub fn non_empty(pointer: impl Into<String>) -> Self {
        Self::NonEmpty {
            pointer: pointer.into(),
        }
    }

    /// `pointer` is an array.
    pub fn is_array(pointer: impl Into<String>) -> Self {
        Self::IsArray {
            pointer: pointer.into(),
        }
    }

    /// Evaluates the predicate against a parsed body.
    pub fn evaluate(&self, body: &Value) -> bool {
        match self {
            Self::Always => true,
            Self::Equals { pointer, value } => body.pointer(pointer) == Some(value),
            Self::Present { pointer } => body.pointer(pointer).is_some_and(|v| !v.is_null()),
            Self::NonEmpty { pointer } => body.pointer(pointer).is_some_and(|v| !is_empty(v)),
            Self::IsArray { pointer } => body.pointer(pointer).is_some_and(Value::is_array),
        }
    }

    /// Short description used in failure causes.
    pub fn describe(&self) -> String {
        match self {
            Self::Always => "always".to_owned(),
            Self::Equals { pointer, value } => format!("{} == {value}", display_pointer(pointer)),
            Self::Present { pointer } => format!("{} is present", display_pointer(pointer)),
            Self::NonEmpty { pointer } => format!("{} is not empty", display_pointer(pointer)),
            Self::IsArray { pointer } => format!("{} is a list", display_pointer(pointer)),
        }
    }
}

/// Where an extracted field comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum Source {
    /// The value at a pointer.
    Pointer(String),
    /// The number of elements of the array at a pointer.
    Length(String),
    /// The first `limit` elements of the array at `pointer`, each reduced
    /// to `fields` (output name, pointer relative to the element).
    Sample {
        pointer: String,
        limit: usize,
        fields: Vec<(String, String)>,
    },
}

/// A named field pulled out of a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub key: String,
    pub source: Source,
}

impl Extraction {
    /// Extracts the value at `pointer` into `key`.
    pub fn field(key: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: Source::Pointer(pointer.into()),
        }
    }

    /// Extracts the length of the array at `pointer` into `key`.
    pub fn length(key: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: Source::Length(pointer.into()),
        }
    }

    /// Extracts a summary of the first `limit` elements of the array at
    /// `pointer` into `key`.
    pub fn sample<'a>(
        key: impl Into<String>,
        pointer: impl Into<String>,
        limit: usize,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, pointer)| (name.to_owned(), pointer.to_owned()))
            .collect();

        Self {
            key: key.into(),
            source: Source::Sample {
                pointer: pointer.into(),
                limit,
                fields,
            },
        }
    }

    /// Returns the extracted value, or `None` if the source is absent.
    pub fn apply(&self, body: &Value) -> Option<Value> {
        match &self.source {
            Source::Pointer(pointer) => body.pointer(pointer).filter(|v| !v.is_null()).cloned(),
            Source::Length(pointer) => body
                .pointer(pointer)
                .and_then(Value::as_array)
                .map(|items| Value::from(items.len())),
            Source::Sample {
                pointer,
                limit,
                fields,
            } => {
                let items = body.pointer(pointer)?.as_array()?;
                let sample = items
                    .iter()
                    .take(*limit)
                    .map(|item| {
                        fields
                            .iter()
                            .filter_map(|(name, field)| {
                                let value = item.pointer(field).filter(|v| !v.is_null())?;
                                Some((name.clone(), value.clone()))
                            })
                            .collect::<Map<String, Value>>()
                    })
                    .map(Value::Object)
                    .collect();
                Some(Value::Array(sample))
            }
        }
    }
}

/// Returns `true` for null, empty strings, arrays and objects.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Returns the first non-empty string (or number) found at any pointer.
pub fn first_text(body: &Value, pointers: &[String]) -> Option<String> {
    pointers.iter().find_map(|pointer| match body.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() { "body" } else { pointer }
}
