//! Compatibility reports and the Result Reporter.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::catalog::CatalogError;
use crate::schema::Category;

/// Rule id used for catalog lookups that found nothing.
pub const COMPONENT_NOT_FOUND: &str = "component_not_found";
/// Rule id used for catalog records that violate the schema.
pub const INVALID_COMPONENT: &str = "invalid_component";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A rule found the selected components incompatible.
    Incompatible,
    ComponentNotFound,
    InvalidComponent,
    /// A rule could not be evaluated.
    RuleEvaluationError,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Incompatible => "incompatible",
            EntryKind::ComponentNotFound => "component_not_found",
            EntryKind::InvalidComponent => "invalid_component",
            EntryKind::RuleEvaluationError => "rule_evaluation_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub rule_id: String,
    pub kind: EntryKind,
    /// Categories involved, in name order.
    pub categories: Vec<Category>,
    pub message: String,
}

impl FailureEntry {
    pub fn new(
        rule_id: &str,
        kind: EntryKind,
        categories: impl IntoIterator<Item = Category>,
        message: String,
    ) -> Self {
        let mut categories: Vec<Category> = categories.into_iter().collect();
        categories.sort_by_key(|c| c.as_str());
        categories.dedup();
        Self {
            rule_id: rule_id.to_string(),
            kind,
            categories,
            message,
        }
    }

    /// Entry for a selected component the catalog could not resolve.
    pub fn from_catalog_error(category: Category, error: &CatalogError) -> Self {
        match error {
            CatalogError::InvalidComponent { id, violation, .. } => Self::new(
                INVALID_COMPONENT,
                EntryKind::InvalidComponent,
                [category],
                format!("Selected {} `{}` has invalid catalog data: {}", category, id, violation),
            ),
            CatalogError::ComponentNotFound { id, .. } => Self::new(
                COMPONENT_NOT_FOUND,
                EntryKind::ComponentNotFound,
                [category],
                format!("Selected {} `{}` does not exist in the catalog", category, id),
            ),
            CatalogError::UnregisteredCategory(_) => Self::new(
                COMPONENT_NOT_FOUND,
                EntryKind::ComponentNotFound,
                [category],
                error.to_string(),
            ),
        }
    }

    fn ordering(&self, other: &Self) -> Ordering {
        self.rule_id
            .cmp(&other.rule_id)
            .then_with(|| {
                let a = self.categories.iter().map(Category::as_str);
                let b = other.categories.iter().map(Category::as_str);
                a.cmp(b)
            })
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Ordered rule failures for one selection. Empty means compatible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    entries: Vec<FailureEntry>,
}

impl CompatibilityReport {
    /// Build a report, normalizing entry order.
    pub fn from_entries(entries: Vec<FailureEntry>) -> Self {
        let mut entries = entries;
        entries.sort_by(FailureEntry::ordering);
        Self { entries }
    }

    pub fn entries(&self) -> &[FailureEntry] {
        &self.entries
    }

    pub fn is_compatible(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a FailureEntry> {
        self.entries.iter().filter(move |e| e.rule_id == rule_id)
    }

    pub fn count_kind(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn to_response(&self) -> CheckResponse {
        CheckResponse {
            compatible: self.is_compatible(),
            errors: Reporter::render(self, ReportFormat::Plain),
            entries: self.entries.clone(),
        }
    }
}

/// Wire shape of a check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub compatible: bool,
    pub entries: Vec<FailureEntry>,
    /// Display strings, one per entry.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Message only.
    #[default]
    Plain,
    /// `[rule_id] cat+cat: message`
    Detailed,
    /// GitHub Actions workflow annotations.
    Github,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(ReportFormat::Plain),
            "detailed" => Ok(ReportFormat::Detailed),
            "github" => Ok(ReportFormat::Github),
            other => Err(format!("unknown report format `{}`", other)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Plain => "plain",
            ReportFormat::Detailed => "detailed",
            ReportFormat::Github => "github",
        };
        f.write_str(name)
    }
}

pub struct Reporter;

impl Reporter {
    /// Display strings for a report, one per entry, in normalized order.
    pub fn render(report: &CompatibilityReport, format: ReportFormat) -> Vec<String> {
        let mut entries: Vec<&FailureEntry> = report.entries.iter().collect();
        entries.sort_by(|a, b| a.ordering(b));
        entries
            .into_iter()
            .map(|entry| Self::render_entry(entry, format))
            .collect()
    }

    pub fn render_entry(entry: &FailureEntry, format: ReportFormat) -> String {
        match format {
            ReportFormat::Plain => entry.message.clone(),
            ReportFormat::Detailed => format!(
                "[{}] {}: {}",
                entry.rule_id,
                join_categories(&entry.categories),
                entry.message
            ),
            ReportFormat::Github => {
                let level = match entry.kind {
                    EntryKind::Incompatible => "error",
                    EntryKind::ComponentNotFound | EntryKind::InvalidComponent => "warning",
                    EntryKind::RuleEvaluationError => "notice",
                };
                format!(
                    "::{} title={}::{}",
                    level,
                    escape_property(&entry.rule_id),
                    escape_data(&entry.message)
                )
            }
        }
    }
}

/// Workflow command message escaping.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Workflow command property escaping; `:` and `,` delimit properties.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

fn join_categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join("+")
}
