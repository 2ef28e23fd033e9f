//! Selections and the check request shape.
//!
//! A request is a JSON object mapping category names to component ids:
//!
//! ```json
//! { "cpu": "cpu-r5-7600x", "motherboard": "mb-b650-atx", "gpu": null }
//! ```
//!
//! `null` and `""` mean "unselected". The request is rejected before any
//! evaluation when it names an unknown category, repeats a category, or
//! carries a value that is not a single id.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::schema::{Category, UnknownCategoryError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
    #[error("Category `{0}` is selected more than once")]
    DuplicateSelection(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// One component id per category, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    choices: BTreeMap<Category, Option<String>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id` for `category`, replacing an earlier choice.
    pub fn with(mut self, category: Category, id: &str) -> Self {
        self.select(category, id);
        self
    }

    pub fn select(&mut self, category: Category, id: &str) {
        let id = id.trim();
        let choice = if id.is_empty() { None } else { Some(id.to_string()) };
        self.choices.insert(category, choice);
    }

    pub fn clear(&mut self, category: Category) {
        self.choices.insert(category, None);
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.choices.get(&category).and_then(|c| c.as_deref())
    }

    /// Selected categories with their ids, in category order.
    pub fn selected(&self) -> impl Iterator<Item = (Category, &str)> {
        self.choices
            .iter()
            .filter_map(|(category, id)| id.as_deref().map(|id| (*category, id)))
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    /// Parse and validate a JSON request body.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| RequestError::InvalidRequest(e.to_string()))?;
        Self::from_entries(raw.0)
    }

    /// Validate request entries in the order they were sent.
    pub fn from_entries(entries: Vec<(String, Value)>) -> Result<Self, RequestError> {
        let mut selection = Selection::new();
        let mut seen = BTreeMap::new();

        for (name, value) in entries {
            let category: Category = name.parse()?;
            if seen.insert(category, ()).is_some() {
                return Err(RequestError::DuplicateSelection(name));
            }
            match value {
                Value::Null => selection.clear(category),
                Value::String(id) => selection.select(category, &id),
                Value::Array(ids) => match ids.as_slice() {
                    [] => selection.clear(category),
                    [Value::String(id)] => selection.select(category, id),
                    [_] => {
                        return Err(RequestError::InvalidRequest(format!(
                            "`{}` must be a component id string",
                            name
                        )))
                    }
                    _ => return Err(RequestError::DuplicateSelection(name)),
                },
                other => {
                    return Err(RequestError::InvalidRequest(format!(
                        "`{}` must be a component id string, got {}",
                        name,
                        json_kind(&other)
                    )))
                }
            }
        }

        Ok(selection)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Request object entries in wire order, duplicates preserved.
struct RawRequest(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawRequest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping category names to component ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawRequest, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(RawRequest(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRequest::deserialize(deserializer)?;
        Selection::from_entries(raw.0).map_err(de::Error::custom)
    }
}
