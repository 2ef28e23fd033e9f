//! Compatibility Evaluator
//!
//! Pure function of (selection, snapshot): resolve each selected component,
//! run every applicable rule, collect failures.

use std::sync::Arc;

use crate::report::{CompatibilityReport, EntryKind, FailureEntry};
use crate::rules::ResolvedComponents;
use crate::selection::Selection;
use crate::snapshot::Snapshot;

/// Evaluates selections against one fixed snapshot.
#[derive(Clone)]
pub struct Evaluator {
    snapshot: Arc<Snapshot>,
}

impl Evaluator {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn check(&self, selection: &Selection) -> CompatibilityReport {
        evaluate(&self.snapshot, selection)
    }
}

/// Run a compatibility check. Never fails: catalog and rule problems become
/// report entries.
pub fn evaluate(snapshot: &Snapshot, selection: &Selection) -> CompatibilityReport {
    let mut entries = Vec::new();
    let mut resolved = ResolvedComponents::new();

    for (category, id) in selection.selected() {
        match snapshot.catalog.resolve(category, id) {
            Ok(record) => resolved.insert(record),
            Err(e) => {
                tracing::debug!("Excluding {} from rule evaluation: {}", category, e);
                entries.push(FailureEntry::from_catalog_error(category, &e));
            }
        }
    }

    for rule in snapshot.rules.iter() {
        if !rule.enabled {
            continue;
        }
        if !rule.is_applicable(&resolved) {
            tracing::trace!("Skipping rule `{}`: inputs not selected", rule.id);
            continue;
        }
        match rule.evaluate(&resolved) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(fault) => {
                tracing::error!("Rule `{}` failed to evaluate: {}", rule.id, fault);
                let involved = rule
                    .categories()
                    .into_iter()
                    .filter(|c| resolved.contains(*c));
                entries.push(FailureEntry::new(
                    &rule.id,
                    EntryKind::RuleEvaluationError,
                    involved,
                    format!("Rule `{}` could not be evaluated: {}", rule.id, fault),
                ));
            }
        }
    }

    CompatibilityReport::from_entries(entries)
}
