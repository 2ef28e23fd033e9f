//! Component Catalog
//!
//! Read-only lookup from `(category, id)` to a schema-valid [`ComponentRecord`].
//!
//! ```text
//! ┌──────────────┐  fetch   ┌──────────────┐ validate ┌──────────────┐
//! │ CatalogSource│─────────▶│ RawComponent │─────────▶│   Catalog    │
//! │ (dir / http) │          │    feed      │  schema  │  (snapshot)  │
//! └──────────────┘          └──────────────┘          └──────────────┘
//! ```
//!
//! Records that fail schema validation are kept as tombstones so that a
//! lookup can tell "no such component" apart from "component is broken".

pub mod builtin;
pub mod record;
pub mod source;

pub use record::{ComponentRecord, RawComponent};
pub use source::{CatalogSource, DirectorySource, HttpSource, SourceError, StaticSource};

use crate::schema::{Category, SchemaError, SchemaRegistry, SchemaViolation};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("{category} component `{id}` not found in catalog")]
    ComponentNotFound { category: Category, id: String },
    #[error("{category} component `{id}` is invalid: {violation}")]
    InvalidComponent {
        category: Category,
        id: String,
        violation: SchemaViolation,
    },
    #[error("{0} is not registered in the attribute schema")]
    UnregisteredCategory(Category),
}

#[derive(Debug, Clone)]
enum CatalogEntry {
    Valid(Arc<ComponentRecord>),
    Invalid(SchemaViolation),
}

/// An immutable, schema-checked set of components.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<Category, BTreeMap<String, CatalogEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a catalog validated against `schema`.
    pub fn builder(schema: &SchemaRegistry) -> CatalogBuilder<'_> {
        CatalogBuilder {
            schema,
            catalog: Catalog::new(),
        }
    }

    /// Validate `(category, component)` pairs into a catalog.
    pub fn from_components(
        schema: &SchemaRegistry,
        components: impl IntoIterator<Item = (Category, RawComponent)>,
    ) -> Self {
        components
            .into_iter()
            .fold(Catalog::builder(schema), |builder, (category, raw)| {
                builder.add(category, raw)
            })
            .build()
    }

    /// Fetch every registered category from `source` and validate the result.
    pub async fn load(
        source: &dyn CatalogSource,
        schema: &SchemaRegistry,
    ) -> Result<Catalog, SourceError> {
        let mut builder = Catalog::builder(schema);
        for category in schema.categories() {
            let items = source.fetch(category).await?;
            tracing::debug!(
                "Fetched {} {} components from {}",
                items.len(),
                category,
                source.name()
            );
            builder = builder.add_all(category, items);
        }
        let catalog = builder.build();
        tracing::info!(
            "Loaded catalog from {}: {} valid, {} invalid components",
            source.name(),
            catalog.valid_count(),
            catalog.invalid_count()
        );
        Ok(catalog)
    }

    pub fn resolve(&self, category: Category, id: &str) -> Result<&ComponentRecord, CatalogError> {
        match self.entries.get(&category).and_then(|items| items.get(id)) {
            Some(CatalogEntry::Valid(record)) => Ok(record.as_ref()),
            Some(CatalogEntry::Invalid(violation)) => Err(CatalogError::InvalidComponent {
                category,
                id: id.to_string(),
                violation: violation.clone(),
            }),
            None => Err(CatalogError::ComponentNotFound {
                category,
                id: id.to_string(),
            }),
        }
    }

    /// Valid components of a category, in id order.
    pub fn components(&self, category: Category) -> Vec<&ComponentRecord> {
        self.entries
            .get(&category)
            .map(|items| {
                items
                    .values()
                    .filter_map(|entry| match entry {
                        CatalogEntry::Valid(record) => Some(record.as_ref()),
                        CatalogEntry::Invalid(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn valid_count(&self) -> usize {
        self.count(|e| matches!(e, CatalogEntry::Valid(_)))
    }

    pub fn invalid_count(&self) -> usize {
        self.count(|e| matches!(e, CatalogEntry::Invalid(_)))
    }

    fn count(&self, pred: impl Fn(&CatalogEntry) -> bool) -> usize {
        self.entries
            .values()
            .flat_map(|items| items.values())
            .filter(|e| pred(e))
            .count()
    }
}

pub struct CatalogBuilder<'a> {
    schema: &'a SchemaRegistry,
    catalog: Catalog,
}

impl<'a> CatalogBuilder<'a> {
    /// Validate and add one component. A later item with the same id replaces
    /// an earlier one.
    pub fn add(mut self, category: Category, raw: RawComponent) -> Self {
        let entry = match self.schema.validate(category, &raw.compatibility) {
            Ok(()) => CatalogEntry::Valid(Arc::new(ComponentRecord {
                category,
                id: raw.id.clone(),
                name: raw.name,
                attributes: raw.compatibility,
            })),
            Err(SchemaError::Violation(violation)) => {
                tracing::warn!("Invalid {} component `{}`: {}", category, raw.id, violation);
                CatalogEntry::Invalid(violation)
            }
            Err(SchemaError::UnknownCategory(_)) => {
                tracing::warn!(
                    "Skipping {} component `{}`: {}",
                    category,
                    raw.id,
                    CatalogError::UnregisteredCategory(category)
                );
                return self;
            }
        };
        self.catalog
            .entries
            .entry(category)
            .or_default()
            .insert(raw.id, entry);
        self
    }

    pub fn add_all(self, category: Category, items: impl IntoIterator<Item = RawComponent>) -> Self {
        items
            .into_iter()
            .fold(self, |builder, raw| builder.add(category, raw))
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}
