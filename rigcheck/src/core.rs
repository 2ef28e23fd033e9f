//! Core engine API shared by the CLI and embedders.
//! Holds the current snapshot and publishes replacements atomically.

use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::catalog::{builtin, Catalog, CatalogSource, DirectorySource, HttpSource, SourceError};
use crate::config::{ConfigError, EngineConfig};
use crate::evaluator::{evaluate, Evaluator};
use crate::report::CompatibilityReport;
use crate::rules::{RuleSet, RuleSetError};
use crate::schema::{SchemaRegistry, UnknownCategoryError};
use crate::selection::{RequestError, Selection};
use crate::snapshot::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum RigCheckError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
    #[error("Category `{0}` is selected more than once")]
    DuplicateSelection(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Catalog error: {0}")]
    Catalog(#[from] SourceError),
    #[error("Rule set error: {0}")]
    RuleSet(#[from] RuleSetError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RequestError> for RigCheckError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::UnknownCategory(e) => RigCheckError::UnknownCategory(e),
            RequestError::DuplicateSelection(c) => RigCheckError::DuplicateSelection(c),
            RequestError::InvalidRequest(m) => RigCheckError::InvalidRequest(m),
        }
    }
}

impl RigCheckError {
    /// Whether the caller sent a malformed request, as opposed to the engine
    /// failing to load its data.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            RigCheckError::UnknownCategory(_)
                | RigCheckError::DuplicateSelection(_)
                | RigCheckError::InvalidRequest(_)
        )
    }
}

/// Process-wide compatibility engine.
///
/// Checks clone the current `Arc<Snapshot>` and run without holding any lock,
/// so a reload never tears down an in-flight check.
pub struct CompatibilityEngine {
    current: RwLock<Arc<Snapshot>>,
}

impl CompatibilityEngine {
    pub fn new(snapshot: Snapshot) -> Self {
        tracing::info!(
            "Engine started with snapshot {} ({} rules, {} components)",
            snapshot.id,
            snapshot.rules.len(),
            snapshot.catalog.valid_count()
        );
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Default schema and rules over the embedded sample catalog.
    pub fn with_defaults() -> Self {
        let schema = SchemaRegistry::default();
        let catalog = builtin::embedded_catalog(&schema);
        Self::new(Snapshot::new(schema, catalog, RuleSet::with_default_rules()))
    }

    /// Build an engine from configuration, loading catalog and rules.
    pub async fn from_config(config: &EngineConfig) -> Result<Self, RigCheckError> {
        config.check()?;
        let schema = SchemaRegistry::default();

        let mut rules = match &config.rules_file {
            Some(path) => RuleSet::load_file(path)?,
            None => RuleSet::with_default_rules(),
        };
        config.apply_to_rules(&mut rules);

        let catalog = match (&config.catalog_dir, &config.catalog_url) {
            (Some(dir), _) => Catalog::load(&DirectorySource::new(dir)?, &schema).await?,
            (None, Some(url)) => Catalog::load(&HttpSource::new(url), &schema).await?,
            (None, None) => builtin::embedded_catalog(&schema),
        };

        Ok(Self::new(Snapshot::validated(schema, catalog, rules)?))
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.snapshot())
    }

    pub fn check(&self, selection: &Selection) -> CompatibilityReport {
        let snapshot = self.snapshot();
        let report = evaluate(&snapshot, selection);
        tracing::debug!(
            "Checked {} components against snapshot {}: {} entries",
            selection.selected_count(),
            snapshot.id,
            report.len()
        );
        report
    }

    /// Parse a JSON request and check it. Request-shape errors abort before
    /// evaluation; everything else ends up in the report.
    pub fn check_request(&self, json: &str) -> Result<CompatibilityReport, RigCheckError> {
        let selection = Selection::from_json(json)?;
        Ok(self.check(&selection))
    }

    pub fn replace_catalog(&self, catalog: Catalog) {
        let mut guard = self.write();
        let next = guard.with_catalog(catalog);
        Self::install(&mut guard, next);
    }

    /// Validate `rules` against the current schema and swap them in.
    pub fn replace_rules(&self, rules: RuleSet) -> Result<(), RigCheckError> {
        let mut guard = self.write();
        let next = guard.with_rules(rules)?;
        Self::install(&mut guard, next);
        Ok(())
    }

    /// Load a fresh catalog from `source` and swap it in.
    ///
    /// Loading happens outside the lock; a failed load leaves the current
    /// snapshot untouched.
    pub async fn refresh_catalog(&self, source: &dyn CatalogSource) -> Result<(), RigCheckError> {
        let schema = Arc::clone(&self.snapshot().schema);
        let catalog = Catalog::load(source, &schema).await?;
        self.replace_catalog(catalog);
        Ok(())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<Snapshot>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }

    fn install(current: &mut Arc<Snapshot>, next: Snapshot) {
        tracing::info!("Published snapshot {} (replacing {})", next.id, current.id);
        *current = Arc::new(next);
    }
}

impl Default for CompatibilityEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RawComponent, StaticSource};
    use crate::schema::Category;

    #[test]
    fn test_check_request_rejects_bad_shapes() {
        let engine = CompatibilityEngine::with_defaults();
        let err = engine.check_request(r#"{"keyboard":"k1"}"#).unwrap_err();
        assert!(matches!(err, RigCheckError::UnknownCategory(_)));
        assert!(err.is_request_error());

        let err = engine.check_request(r#"{"cpu":"a","cpu":"b"}"#).unwrap_err();
        assert!(matches!(err, RigCheckError::DuplicateSelection(_)));
    }

    #[test]
    fn test_check_request_reports_incompatibility() {
        let engine = CompatibilityEngine::with_defaults();
        let report = engine
            .check_request(r#"{"cpu":"cpu-r5-7600x","motherboard":"mb-z790-atx"}"#)
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.entries()[0].message,
            "CPU socket AM5 is incompatible with motherboard socket LGA1700"
        );
    }

    #[test]
    fn test_swap_does_not_affect_taken_snapshot() {
        let engine = CompatibilityEngine::with_defaults();
        let before = engine.snapshot();
        engine.replace_catalog(Catalog::new());
        let after = engine.snapshot();

        assert_ne!(before.id, after.id);
        assert!(before.catalog.resolve(Category::Cpu, "cpu-r5-7600x").is_ok());
        assert!(after.catalog.resolve(Category::Cpu, "cpu-r5-7600x").is_err());
    }

    #[test]
    fn test_replace_rules_validates_first() {
        let engine = CompatibilityEngine::with_defaults();
        let id = engine.snapshot().id;
        let bad = RuleSet::from_json_str(
            r#"{"name":"bad","version":"1","rules":[{"id":"x","name":"X",
                "check":{"type":"max_dimension","value":"cpu.socket","limit":"case.max_gpu_length_mm"},
                "message":"x"}]}"#,
        )
        .unwrap();
        assert!(matches!(engine.replace_rules(bad), Err(RigCheckError::RuleSet(_))));
        assert_eq!(engine.snapshot().id, id);

        engine.replace_rules(RuleSet::new("empty", "1")).unwrap();
        assert!(engine.snapshot().rules.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_catalog_from_source() {
        let engine = CompatibilityEngine::with_defaults();
        let source = StaticSource::new().with(
            Category::Psu,
            RawComponent::new("psu-tiny", "Tiny PSU").with("wattage", 150i64),
        );
        engine.refresh_catalog(&source).await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.catalog.valid_count(), 1);
        assert!(snapshot.catalog.resolve(Category::Psu, "psu-tiny").is_ok());
    }

    #[tokio::test]
    async fn test_from_config_with_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cpu.json"),
            r#"[{"id":"c1","name":"CPU","compatibility":{"socket":"AM4","power_draw":65}}]"#,
        )
        .unwrap();
        let config = EngineConfig {
            catalog_dir: Some(dir.path().to_path_buf()),
            power_margin_watts: Some(0),
            ..EngineConfig::default()
        };
        let engine = CompatibilityEngine::from_config(&config).await.unwrap();
        assert_eq!(engine.snapshot().catalog.valid_count(), 1);
    }
}
