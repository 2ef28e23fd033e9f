//! Typed, scoped access to resolved components.
//!
//! Rules never look at a raw attribute map. They go through [`RuleInputs`],
//! which only exposes the categories the rule declared and returns a
//! [`RuleFault`] instead of a wrong-typed value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ComponentRecord;
use crate::schema::{AttributeValue, Category};

/// `category.attribute`, e.g. `cpu.socket`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttrRef {
    pub category: Category,
    pub attribute: String,
}

impl AttrRef {
    pub fn new(category: Category, attribute: &str) -> Self {
        Self {
            category,
            attribute: attribute.to_string(),
        }
    }

    /// Template key for this attribute.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.attribute)
    }
}

impl FromStr for AttrRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, attribute) = s
            .split_once('.')
            .ok_or_else(|| format!("expected `category.attribute`, got `{}`", s))?;
        if attribute.is_empty() {
            return Err(format!("empty attribute name in `{}`", s));
        }
        let category = category.parse::<Category>().map_err(|e| e.to_string())?;
        Ok(AttrRef::new(category, attribute))
    }
}

impl TryFrom<String> for AttrRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AttrRef> for String {
    fn from(r: AttrRef) -> Self {
        r.to_string()
    }
}

/// A rule misbehaved: it read something it did not declare, or the data did
/// not have the shape the rule expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleFault {
    #[error("read undeclared category {0}")]
    UndeclaredCategory(Category),
    #[error("no resolved {0} component")]
    MissingComponent(Category),
    #[error("{0} has no value")]
    MissingAttribute(AttrRef),
    #[error("{attr} must be {expected}, found {found}")]
    WrongType {
        attr: AttrRef,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown message placeholder `{0}`")]
    UnknownPlaceholder(String),
    #[error("{wattage}W minus a {margin}W margin is out of range")]
    LimitOverflow { wattage: i64, margin: i64 },
}

/// The components of one selection that resolved successfully.
#[derive(Debug, Clone, Default)]
pub struct ResolvedComponents<'a> {
    records: BTreeMap<Category, &'a ComponentRecord>,
}

impl<'a> ResolvedComponents<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: &'a ComponentRecord) {
        self.records.insert(record.category, record);
    }

    pub fn contains(&self, category: Category) -> bool {
        self.records.contains_key(&category)
    }

    pub fn get(&self, category: Category) -> Option<&'a ComponentRecord> {
        self.records.get(&category).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restrict access to the categories a rule declared.
    pub fn scoped<'r>(&'r self, declared: &'r BTreeSet<Category>) -> RuleInputs<'r, 'a> {
        RuleInputs {
            resolved: self,
            declared,
        }
    }
}

/// Read-only view handed to a rule while it evaluates.
pub struct RuleInputs<'r, 'a> {
    resolved: &'r ResolvedComponents<'a>,
    declared: &'r BTreeSet<Category>,
}

impl<'r, 'a> RuleInputs<'r, 'a> {
    /// Whether a declared category resolved for this selection.
    pub fn has(&self, category: Category) -> bool {
        self.declared.contains(&category) && self.resolved.contains(category)
    }

    pub fn record(&self, category: Category) -> Result<&'a ComponentRecord, RuleFault> {
        if !self.declared.contains(&category) {
            return Err(RuleFault::UndeclaredCategory(category));
        }
        self.resolved
            .get(category)
            .ok_or(RuleFault::MissingComponent(category))
    }

    fn value(&self, attr: &AttrRef) -> Result<&'a AttributeValue, RuleFault> {
        self.record(attr.category)?
            .attribute(&attr.attribute)
            .ok_or_else(|| RuleFault::MissingAttribute(attr.clone()))
    }

    pub fn string(&self, attr: &AttrRef) -> Result<&'a str, RuleFault> {
        match self.value(attr)? {
            AttributeValue::String(s) => Ok(s.as_str()),
            other => Err(wrong_type(attr, "string", other)),
        }
    }

    /// Integer or float, widened to `f64`.
    pub fn number(&self, attr: &AttrRef) -> Result<f64, RuleFault> {
        match self.value(attr)? {
            AttributeValue::Integer(i) => Ok(*i as f64),
            AttributeValue::Float(x) => Ok(*x),
            other => Err(wrong_type(attr, "number", other)),
        }
    }

    pub fn integer(&self, attr: &AttrRef) -> Result<i64, RuleFault> {
        match self.value(attr)? {
            AttributeValue::Integer(i) => Ok(*i),
            other => Err(wrong_type(attr, "integer", other)),
        }
    }

    /// Members of a comma-separated list attribute, trimmed, empty members dropped.
    pub fn list(&self, attr: &AttrRef) -> Result<Vec<&'a str>, RuleFault> {
        let raw = self.string(attr)?;
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .collect())
    }
}

fn wrong_type(attr: &AttrRef, expected: &'static str, found: &AttributeValue) -> RuleFault {
    RuleFault::WrongType {
        attr: attr.clone(),
        expected,
        found: found.kind(),
    }
}
