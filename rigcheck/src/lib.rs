//! RigCheck - PC build compatibility engine
//!
//! Given one selected component per hardware category, decides whether the
//! build is physically and electrically valid, and if not, explains why.
//!
//! # Quick Start
//!
//! ```no_run
//! use rigcheck::prelude::*;
//!
//! let engine = CompatibilityEngine::with_defaults();
//! let report = engine
//!     .check_request(r#"{"cpu": "cpu-r5-7600x", "motherboard": "mb-z790-atx"}"#)
//!     .unwrap();
//!
//! for line in Reporter::render(&report, ReportFormat::Detailed) {
//!     println!("{}", line);
//! }
//! ```
//!
//! # Features
//!
//! - **Typed attribute schema**: catalog records are checked once, at load
//! - **Declarative rules**: socket, memory type, form factor, power budget,
//!   GPU and cooler clearance; more can be loaded from JSON
//! - **Deterministic reports**: entries sorted by rule id, then category
//! - **Snapshot reloads**: catalog and rules swap atomically under load

pub mod catalog;
pub mod config;
pub mod core;
pub mod evaluator;
pub mod report;
pub mod rules;
pub mod schema;
pub mod selection;
pub mod snapshot;

// Re-export main types
pub use crate::core::{CompatibilityEngine, RigCheckError};
pub use catalog::{Catalog, CatalogError, CatalogSource, ComponentRecord, RawComponent};
pub use config::EngineConfig;
pub use evaluator::{evaluate, Evaluator};
pub use report::{CheckResponse, CompatibilityReport, EntryKind, FailureEntry, ReportFormat, Reporter};
pub use rules::{AttrRef, Rule, RuleCheck, RuleSet};
pub use schema::{AttributeType, AttributeValue, Category, SchemaRegistry};
pub use selection::Selection;
pub use snapshot::Snapshot;

/// Check a JSON request against the default engine (convenience wrapper).
pub fn check_json(json: &str) -> Result<CompatibilityReport, RigCheckError> {
    CompatibilityEngine::with_defaults().check_request(json)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Category, CompatibilityEngine, CompatibilityReport, EntryKind, FailureEntry, ReportFormat,
        Reporter, RigCheckError, Selection,
    };
}
