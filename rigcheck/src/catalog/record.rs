//! Component records as delivered by a catalog feed and as held by the catalog.

use crate::schema::{AttributeValue, Category};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A component as a data source delivers it, before schema validation.
///
/// Mirrors one element of the per-category feed: `{id, name, compatibility}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComponent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub compatibility: BTreeMap<String, AttributeValue>,
}

impl RawComponent {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            compatibility: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        self.compatibility.insert(attribute.to_string(), value.into());
        self
    }
}

/// A schema-valid, immutable component owned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRecord {
    pub category: Category,
    pub id: String,
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl ComponentRecord {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}
