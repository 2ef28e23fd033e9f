//! Attribute Schema Registry
//!
//! Declares, per hardware category, the typed attributes that compatibility
//! rules rely on. The catalog validates every record against this registry at
//! load time, and rule sets are checked against it when they are installed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A hardware component class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cpu,
    Motherboard,
    Gpu,
    Ram,
    Storage,
    Psu,
    Case,
    Cooler,
}

impl Category {
    /// Every category, in the order the selection form lists them.
    pub const ALL: [Category; 8] = [
        Category::Cpu,
        Category::Motherboard,
        Category::Gpu,
        Category::Ram,
        Category::Storage,
        Category::Psu,
        Category::Case,
        Category::Cooler,
    ];

    /// Canonical lowercase name, used in requests, file names and ordering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::Motherboard => "motherboard",
            Category::Gpu => "gpu",
            Category::Ram => "ram",
            Category::Storage => "storage",
            Category::Psu => "psu",
            Category::Case => "case",
            Category::Cooler => "cooler",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategoryError(pub String);

impl FromStr for Category {
    type Err = UnknownCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategoryError(s.to_string()))
    }
}

/// One attribute value of a component.
///
/// Serialized as the bare JSON scalar, so a catalog feed looks like
/// `{"socket": "AM5", "wattage": 650}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Float(_) => "float",
            AttributeValue::String(_) => "string",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Boolean(b) => write!(f, "{}", b),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(x: f64) -> Self {
        AttributeValue::Float(x)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

/// Declared type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Integer,
    /// Accepts integer values as well.
    Float,
    Boolean,
    /// Comma-separated members carried in a string value, e.g. `"DDR4,DDR5"`.
    StringList,
}

impl AttributeType {
    pub fn accepts(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (AttributeType::String, AttributeValue::String(_))
                | (AttributeType::StringList, AttributeValue::String(_))
                | (AttributeType::Integer, AttributeValue::Integer(_))
                | (AttributeType::Float, AttributeValue::Float(_))
                | (AttributeType::Float, AttributeValue::Integer(_))
                | (AttributeType::Boolean, AttributeValue::Boolean(_))
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeType::Integer | AttributeType::Float)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Float => "float",
            AttributeType::Boolean => "boolean",
            AttributeType::StringList => "string_list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSpec {
    pub name: String,
    pub ty: AttributeType,
}

/// Why a component's attribute map does not satisfy its category schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("missing required attribute `{name}`")]
    MissingAttribute { name: String },
    #[error("attribute `{name}` must be {expected}, found {found}")]
    WrongType {
        name: String,
        expected: AttributeType,
        found: &'static str,
    },
    #[error("attribute `{name}` must be a finite, non-negative number, found {found}")]
    OutOfRange { name: String, found: String },
}

/// Quantities in the schema are measurements: sizes, wattages, draws.
fn is_measurement(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Integer(i) => *i >= 0,
        AttributeValue::Float(x) => x.is_finite() && *x >= 0.0,
        _ => true,
    }
}

/// Immutable per-category attribute declarations.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    categories: BTreeMap<Category, Vec<AttributeSpec>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            categories: BTreeMap::new(),
        }
    }

    /// The attribute schema used by the built-in rule set.
    pub fn with_default_schema() -> Self {
        use AttributeType::*;
        Self::builder()
            .category(Category::Cpu, &[("socket", String), ("power_draw", Float)])
            .category(
                Category::Motherboard,
                &[("socket", String), ("memory_type", StringList), ("form_factor", String)],
            )
            .category(Category::Gpu, &[("length_mm", Float), ("power_draw", Float)])
            .category(Category::Ram, &[("type", String)])
            .category(Category::Storage, &[("power_draw", Float)])
            .category(Category::Psu, &[("wattage", Integer)])
            .category(
                Category::Case,
                &[
                    ("form_factors", StringList),
                    ("max_gpu_length_mm", Float),
                    ("max_cooler_height_mm", Float),
                ],
            )
            .category(Category::Cooler, &[("height_mm", Float), ("power_draw", Float)])
            .build()
    }

    pub fn required_attributes(
        &self,
        category: Category,
    ) -> Result<&[AttributeSpec], UnknownCategoryError> {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .ok_or_else(|| UnknownCategoryError(category.to_string()))
    }

    pub fn is_registered(&self, category: Category) -> bool {
        self.categories.contains_key(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    pub fn attribute_type(&self, category: Category, name: &str) -> Option<AttributeType> {
        self.categories
            .get(&category)?
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.ty)
    }

    /// Check an attribute map against the category's declarations.
    ///
    /// Reports the first violation in declaration order.
    pub fn validate(
        &self,
        category: Category,
        attributes: &BTreeMap<String, AttributeValue>,
    ) -> Result<(), SchemaError> {
        for spec in self.required_attributes(category)? {
            match attributes.get(&spec.name) {
                None => {
                    return Err(SchemaViolation::MissingAttribute {
                        name: spec.name.clone(),
                    }
                    .into())
                }
                Some(value) if !spec.ty.accepts(value) => {
                    return Err(SchemaViolation::WrongType {
                        name: spec.name.clone(),
                        expected: spec.ty,
                        found: value.kind(),
                    }
                    .into())
                }
                Some(value) if spec.ty.is_numeric() && !is_measurement(value) => {
                    return Err(SchemaViolation::OutOfRange {
                        name: spec.name.clone(),
                        found: value.to_string(),
                    }
                    .into())
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_default_schema()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Violation(#[from] SchemaViolation),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
}

pub struct SchemaRegistryBuilder {
    categories: BTreeMap<Category, Vec<AttributeSpec>>,
}

impl SchemaRegistryBuilder {
    /// Register a category. Registering it again replaces its attributes.
    pub fn category(mut self, category: Category, attributes: &[(&str, AttributeType)]) -> Self {
        let specs = attributes
            .iter()
            .map(|(name, ty)| AttributeSpec {
                name: name.to_string(),
                ty: *ty,
            })
            .collect();
        self.categories.insert(category, specs);
        self
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            categories: self.categories,
        }
    }
}
