//! Immutable point-in-time view of schema, catalog and rules.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::rules::{RuleSet, RuleSetError};
use crate::schema::SchemaRegistry;

/// Everything one evaluation reads. Shared read-only between concurrent
/// checks; replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub schema: Arc<SchemaRegistry>,
    pub catalog: Arc<Catalog>,
    pub rules: Arc<RuleSet>,
}

impl Snapshot {
    /// Assemble a snapshot without checking rules against the schema.
    pub fn new(schema: SchemaRegistry, catalog: Catalog, rules: RuleSet) -> Self {
        Self::from_parts(Arc::new(schema), Arc::new(catalog), Arc::new(rules))
    }

    /// Assemble a snapshot, rejecting rules that read undeclared attributes.
    pub fn validated(
        schema: SchemaRegistry,
        catalog: Catalog,
        rules: RuleSet,
    ) -> Result<Self, RuleSetError> {
        rules.validate(&schema)?;
        Ok(Self::new(schema, catalog, rules))
    }

    pub(crate) fn from_parts(
        schema: Arc<SchemaRegistry>,
        catalog: Arc<Catalog>,
        rules: Arc<RuleSet>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            schema,
            catalog,
            rules,
        }
    }

    /// Same schema and rules, new catalog.
    pub fn with_catalog(&self, catalog: Catalog) -> Self {
        Self::from_parts(self.schema.clone(), Arc::new(catalog), self.rules.clone())
    }

    /// Same schema and catalog, new rules.
    pub fn with_rules(&self, rules: RuleSet) -> Result<Self, RuleSetError> {
        rules.validate(&self.schema)?;
        Ok(Self::from_parts(
            self.schema.clone(),
            self.catalog.clone(),
            Arc::new(rules),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AttrRef, Rule, RuleCheck};
    use crate::schema::Category;

    #[test]
    fn test_validated_rejects_bad_rules() {
        let mut rules = RuleSet::with_default_rules();
        rules.insert(Rule::new(
            "bogus",
            "Bogus",
            RuleCheck::AttributeMatch {
                left: AttrRef::new(Category::Gpu, "socket"),
                right: AttrRef::new(Category::Cpu, "socket"),
            },
            "x",
        ));
        assert!(Snapshot::validated(SchemaRegistry::default(), Catalog::new(), rules).is_err());
    }

    #[test]
    fn test_derived_snapshots_share_unchanged_parts() {
        let base = Snapshot::new(SchemaRegistry::default(), Catalog::new(), RuleSet::with_default_rules());
        let next = base.with_catalog(Catalog::new());
        assert!(Arc::ptr_eq(&base.rules, &next.rules));
        assert!(!Arc::ptr_eq(&base.catalog, &next.catalog));
        assert_ne!(base.id, next.id);
    }
}
