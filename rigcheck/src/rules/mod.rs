//! Constraint Rule Set
//!
//! Rules are data: an id, a [`RuleCheck`] variant naming the attributes it
//! compares, and a message template. Adding a rule is a registration, not a
//! new type. Rule sets can be built in code or loaded from JSON:
//!
//! ```json
//! {
//!   "name": "Shop rules",
//!   "version": "1",
//!   "rules": [
//!     {
//!       "id": "socket_match",
//!       "name": "CPU socket matches motherboard",
//!       "check": { "type": "attribute_match", "left": "cpu.socket", "right": "motherboard.socket" },
//!       "message": "CPU socket {cpu.socket} is incompatible with motherboard socket {motherboard.socket}"
//!     }
//!   ]
//! }
//! ```

pub mod access;
pub mod template;

pub use access::{AttrRef, ResolvedComponents, RuleFault, RuleInputs};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

use crate::report::{EntryKind, FailureEntry, COMPONENT_NOT_FOUND, INVALID_COMPONENT};
use crate::schema::{AttributeType, Category, SchemaRegistry};

pub const DEFAULT_POWER_MARGIN_WATTS: i64 = 50;

#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("Failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate rule id `{0}`")]
    DuplicateRule(String),
    #[error("Rule `{rule}` reads {attr}, which the schema does not declare")]
    UnknownAttribute { rule: String, attr: AttrRef },
    #[error("Rule `{rule}` reads {attr} as {expected}, but the schema declares {declared}")]
    AttributeType {
        rule: String,
        attr: AttrRef,
        expected: &'static str,
        declared: AttributeType,
    },
    #[error("Rule `{rule}` message uses unknown placeholder `{placeholder}`")]
    UnknownPlaceholder { rule: String, placeholder: String },
    #[error("Rule `{0}` reads from a category outside the schema")]
    UnregisteredCategory(String),
    #[error("Rule id `{0}` is reserved for catalog failures")]
    ReservedRuleId(String),
}

/// How a rule compares attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCheck {
    /// Two string attributes must be equal.
    AttributeMatch { left: AttrRef, right: AttrRef },
    /// A string attribute must be a member of a list attribute.
    AttributeInSet { value: AttrRef, set: AttrRef },
    /// A numeric attribute must not exceed another.
    MaxDimension { value: AttrRef, limit: AttrRef },
    /// Summed consumer draw, truncated to whole watts, must not exceed the
    /// supply's rating minus `margin_watts`.
    PowerBudget {
        supply: AttrRef,
        consumers: Vec<AttrRef>,
        #[serde(default)]
        margin_watts: i64,
    },
}

/// What a check needs to read an attribute as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    String,
    List,
    Number,
    Integer,
}

impl Usage {
    fn name(&self) -> &'static str {
        match self {
            Usage::String => "string",
            Usage::List => "string_list",
            Usage::Number => "number",
            Usage::Integer => "integer",
        }
    }

    fn allows(&self, declared: AttributeType) -> bool {
        match self {
            Usage::String => declared == AttributeType::String,
            Usage::List => matches!(declared, AttributeType::StringList | AttributeType::String),
            Usage::Number => declared.is_numeric(),
            Usage::Integer => declared == AttributeType::Integer,
        }
    }
}

impl RuleCheck {
    /// Categories that must all be resolved for the rule to run.
    pub fn required_categories(&self) -> BTreeSet<Category> {
        match self {
            RuleCheck::AttributeMatch { left: a, right: b }
            | RuleCheck::AttributeInSet { value: a, set: b }
            | RuleCheck::MaxDimension { value: a, limit: b } => {
                [a.category, b.category].into_iter().collect()
            }
            RuleCheck::PowerBudget { supply, .. } => [supply.category].into_iter().collect(),
        }
    }

    /// Categories of which at least one must be resolved, if any are declared.
    pub fn optional_categories(&self) -> BTreeSet<Category> {
        match self {
            RuleCheck::PowerBudget { consumers, .. } => {
                consumers.iter().map(|c| c.category).collect()
            }
            _ => BTreeSet::new(),
        }
    }

    fn reads(&self) -> Vec<(&AttrRef, Usage)> {
        match self {
            RuleCheck::AttributeMatch { left, right } => {
                vec![(left, Usage::String), (right, Usage::String)]
            }
            RuleCheck::AttributeInSet { value, set } => {
                vec![(value, Usage::String), (set, Usage::List)]
            }
            RuleCheck::MaxDimension { value, limit } => {
                vec![(value, Usage::Number), (limit, Usage::Number)]
            }
            RuleCheck::PowerBudget { supply, consumers, .. } => {
                let mut reads = vec![(supply, Usage::Integer)];
                reads.extend(consumers.iter().map(|c| (c, Usage::Number)));
                reads
            }
        }
    }

    /// Placeholder keys this check adds beyond `category.attribute`.
    fn extra_keys(&self) -> &'static [&'static str] {
        match self {
            RuleCheck::PowerBudget { .. } => &["total", "limit", "margin", "wattage"],
            _ => &[],
        }
    }
}

fn default_true() -> bool {
    true
}

/// A single compatibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier; also the primary sort key of report entries.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub check: RuleCheck,
    /// Failure message template.
    pub message: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Rule {
    pub fn new(id: &str, name: &str, check: RuleCheck, message: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            check,
            message: message.to_string(),
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Every category the rule may read.
    pub fn categories(&self) -> BTreeSet<Category> {
        let mut all = self.check.required_categories();
        all.extend(self.check.optional_categories());
        all
    }

    /// Whether the rule has enough resolved inputs to run.
    pub fn is_applicable(&self, resolved: &ResolvedComponents<'_>) -> bool {
        let required = self.check.required_categories();
        let optional = self.check.optional_categories();
        required.iter().all(|c| resolved.contains(*c))
            && (optional.is_empty() || optional.iter().any(|c| resolved.contains(*c)))
    }

    /// Run the rule. `Ok(None)` means the inputs are compatible.
    pub fn evaluate(
        &self,
        resolved: &ResolvedComponents<'_>,
    ) -> Result<Option<FailureEntry>, RuleFault> {
        let declared = self.categories();
        let inputs = resolved.scoped(&declared);
        let mut context = BTreeMap::new();
        for category in &declared {
            if let Ok(record) = inputs.record(*category) {
                context.insert(format!("{}.name", category), record.name.clone());
                context.insert(format!("{}.id", category), record.id.clone());
            }
        }

        let involved: Vec<Category> = match &self.check {
            RuleCheck::AttributeMatch { left, right } => {
                let l = inputs.string(left)?;
                let r = inputs.string(right)?;
                if l == r {
                    return Ok(None);
                }
                context.insert(left.key(), l.to_string());
                context.insert(right.key(), r.to_string());
                vec![left.category, right.category]
            }
            RuleCheck::AttributeInSet { value, set } => {
                let v = inputs.string(value)?;
                let members = inputs.list(set)?;
                if members.contains(&v) {
                    return Ok(None);
                }
                context.insert(value.key(), v.to_string());
                context.insert(set.key(), members.join(", "));
                vec![value.category, set.category]
            }
            RuleCheck::MaxDimension { value, limit } => {
                let v = inputs.number(value)?;
                let max = inputs.number(limit)?;
                if v <= max {
                    return Ok(None);
                }
                context.insert(value.key(), v.to_string());
                context.insert(limit.key(), max.to_string());
                vec![value.category, limit.category]
            }
            RuleCheck::PowerBudget {
                supply,
                consumers,
                margin_watts,
            } => {
                let wattage = inputs.integer(supply)?;
                let mut sum = 0.0_f64;
                let mut involved = vec![supply.category];
                for consumer in consumers {
                    if !inputs.has(consumer.category) {
                        continue;
                    }
                    let draw = inputs.number(consumer)?;
                    context.insert(consumer.key(), draw.to_string());
                    sum += draw;
                    involved.push(consumer.category);
                }
                // Truncate once, after summation; margin applies to the total.
                let total = sum.trunc() as i64;
                let limit = wattage.checked_sub(*margin_watts).ok_or(RuleFault::LimitOverflow {
                    wattage,
                    margin: *margin_watts,
                })?;
                if total <= limit {
                    return Ok(None);
                }
                context.insert(supply.key(), wattage.to_string());
                context.insert("wattage".to_string(), wattage.to_string());
                context.insert("total".to_string(), total.to_string());
                context.insert("limit".to_string(), limit.to_string());
                context.insert("margin".to_string(), margin_watts.to_string());
                involved
            }
        };

        // Templates may mention any declared attribute, not only the compared ones.
        for (attr, _) in self.check.reads() {
            if !context.contains_key(&attr.key()) && inputs.has(attr.category) {
                if let Some(value) = resolved
                    .get(attr.category)
                    .and_then(|r| r.attribute(&attr.attribute))
                {
                    context.insert(attr.key(), value.to_string());
                }
            }
        }

        let message = template::render(&self.message, &context)?;
        Ok(Some(FailureEntry::new(
            &self.id,
            EntryKind::Incompatible,
            involved,
            message,
        )))
    }

    /// Check the rule's declared reads and template against a schema.
    pub fn validate(&self, schema: &SchemaRegistry) -> Result<(), RuleSetError> {
        if self.id == COMPONENT_NOT_FOUND || self.id == INVALID_COMPONENT {
            return Err(RuleSetError::ReservedRuleId(self.id.clone()));
        }
        for (attr, usage) in self.check.reads() {
            if !schema.is_registered(attr.category) {
                return Err(RuleSetError::UnregisteredCategory(self.id.clone()));
            }
            let declared = schema
                .attribute_type(attr.category, &attr.attribute)
                .ok_or_else(|| RuleSetError::UnknownAttribute {
                    rule: self.id.clone(),
                    attr: attr.clone(),
                })?;
            if !usage.allows(declared) {
                return Err(RuleSetError::AttributeType {
                    rule: self.id.clone(),
                    attr: attr.clone(),
                    expected: usage.name(),
                    declared,
                });
            }
        }

        let known: BTreeSet<String> = self
            .check
            .reads()
            .into_iter()
            .map(|(attr, _)| attr.key())
            .chain(
                self.categories()
                    .into_iter()
                    .flat_map(|c| [format!("{}.name", c), format!("{}.id", c)]),
            )
            .chain(self.check.extra_keys().iter().map(|k| k.to_string()))
            .collect();
        for placeholder in template::placeholders(&self.message) {
            if !known.contains(&placeholder) {
                return Err(RuleSetError::UnknownPlaceholder {
                    rule: self.id.clone(),
                    placeholder,
                });
            }
        }
        Ok(())
    }
}

/// Serialized form of a rule set file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetFile {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub rules: Vec<Rule>,
}

/// Rules keyed by id. Iteration is in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub name: String,
    pub version: String,
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            rules: BTreeMap::new(),
        }
    }

    /// The built-in PC compatibility rules.
    pub fn with_default_rules() -> Self {
        let mut set = Self::new("Default PC compatibility rules", "1");
        for rule in default_rules() {
            set.insert(rule);
        }
        set
    }

    pub fn from_json_str(json: &str) -> Result<Self, RuleSetError> {
        let file: RuleSetFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    pub fn load_file(path: &Path) -> Result<Self, RuleSetError> {
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_json_str(&content)?;
        tracing::info!("Loaded {} rules from {:?}", set.len(), path);
        Ok(set)
    }

    pub fn from_file(file: RuleSetFile) -> Result<Self, RuleSetError> {
        let mut set = Self::new(&file.name, &file.version);
        for rule in file.rules {
            if set.rules.contains_key(&rule.id) {
                return Err(RuleSetError::DuplicateRule(rule.id));
            }
            set.insert(rule);
        }
        Ok(set)
    }

    pub fn to_file(&self) -> RuleSetFile {
        RuleSetFile {
            name: self.name.clone(),
            version: self.version.clone(),
            description: None,
            author: None,
            rules: self.rules.values().cloned().collect(),
        }
    }

    /// Add a rule, replacing any rule with the same id.
    pub fn insert(&mut self, rule: Rule) -> Option<Rule> {
        self.rules.insert(rule.id.clone(), rule)
    }

    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        self.rules.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Disable rules by id. Unknown ids are logged and ignored.
    pub fn disable(&mut self, ids: &[String]) {
        for id in ids {
            match self.rules.get_mut(id) {
                Some(rule) => rule.enabled = false,
                None => tracing::warn!("Cannot disable unknown rule `{}`", id),
            }
        }
    }

    /// Override the margin of every power budget rule.
    pub fn set_power_margin(&mut self, watts: i64) {
        for rule in self.rules.values_mut() {
            if let RuleCheck::PowerBudget { margin_watts, .. } = &mut rule.check {
                *margin_watts = watts;
            }
        }
    }

    /// Check every rule against the schema.
    pub fn validate(&self, schema: &SchemaRegistry) -> Result<(), RuleSetError> {
        self.rules.values().try_for_each(|rule| rule.validate(schema))
    }
}

fn attr(category: Category, attribute: &str) -> AttrRef {
    AttrRef::new(category, attribute)
}

fn default_rules() -> Vec<Rule> {
    use Category::*;
    vec![
        Rule::new(
            "socket_match",
            "CPU socket",
            RuleCheck::AttributeMatch {
                left: attr(Cpu, "socket"),
                right: attr(Motherboard, "socket"),
            },
            "CPU socket {cpu.socket} is incompatible with motherboard socket {motherboard.socket}",
        )
        .with_description("CPU socket must equal the motherboard socket"),
        Rule::new(
            "memory_type_match",
            "Memory type",
            RuleCheck::AttributeInSet {
                value: attr(Ram, "type"),
                set: attr(Motherboard, "memory_type"),
            },
            "RAM type {ram.type} is not supported by the motherboard (supports {motherboard.memory_type})",
        )
        .with_description("RAM module type must be one the motherboard supports"),
        Rule::new(
            "form_factor_fit",
            "Form factor",
            RuleCheck::AttributeInSet {
                value: attr(Motherboard, "form_factor"),
                set: attr(Case, "form_factors"),
            },
            "Motherboard form factor {motherboard.form_factor} does not fit the case (supports {case.form_factors})",
        )
        .with_description("Motherboard form factor must be supported by the case"),
        Rule::new(
            "power_budget",
            "Power budget",
            RuleCheck::PowerBudget {
                supply: attr(Psu, "wattage"),
                consumers: vec![
                    attr(Cpu, "power_draw"),
                    attr(Gpu, "power_draw"),
                    attr(Storage, "power_draw"),
                    attr(Cooler, "power_draw"),
                ],
                margin_watts: DEFAULT_POWER_MARGIN_WATTS,
            },
            "Estimated power draw {total}W exceeds the {wattage}W PSU limit of {limit}W ({margin}W safety margin)",
        )
        .with_description("CPU, GPU, storage and cooler draw must fit the PSU rating minus a safety margin"),
        Rule::new(
            "gpu_clearance",
            "GPU clearance",
            RuleCheck::MaxDimension {
                value: attr(Gpu, "length_mm"),
                limit: attr(Case, "max_gpu_length_mm"),
            },
            "GPU length {gpu.length_mm}mm exceeds the case maximum of {case.max_gpu_length_mm}mm",
        )
        .with_description("GPU length must not exceed the case's maximum GPU length"),
        Rule::new(
            "cooler_clearance",
            "Cooler clearance",
            RuleCheck::MaxDimension {
                value: attr(Cooler, "height_mm"),
                limit: attr(Case, "max_cooler_height_mm"),
            },
            "Cooler height {cooler.height_mm}mm exceeds the case maximum of {case.max_cooler_height_mm}mm",
        )
        .with_description("Cooler height must not exceed the case's maximum cooler height"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentRecord;
    use crate::schema::AttributeValue;

    fn record(category: Category, attrs: &[(&str, AttributeValue)]) -> ComponentRecord {
        ComponentRecord {
            category,
            id: format!("{}-test", category),
            name: format!("Test {}", category),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn power_rule(margin: i64) -> Rule {
        let mut set = RuleSet::with_default_rules();
        set.set_power_margin(margin);
        set.get("power_budget").unwrap().clone()
    }

    #[test]
    fn test_default_rules_validate_against_default_schema() {
        let rules = RuleSet::with_default_rules();
        assert_eq!(rules.len(), 6);
        rules.validate(&SchemaRegistry::default()).unwrap();
    }

    #[test]
    fn test_iteration_in_id_order() {
        let rules = RuleSet::with_default_rules();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_socket_match() {
        let rule = RuleSet::with_default_rules().get("socket_match").unwrap().clone();
        let cpu = record(Category::Cpu, &[("socket", "AM5".into())]);
        let same = record(Category::Motherboard, &[("socket", "AM5".into())]);
        let other = record(Category::Motherboard, &[("socket", "LGA1700".into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&cpu);
        resolved.insert(&same);
        assert_eq!(rule.evaluate(&resolved), Ok(None));

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&cpu);
        resolved.insert(&other);
        let entry = rule.evaluate(&resolved).unwrap().unwrap();
        assert_eq!(entry.categories, vec![Category::Cpu, Category::Motherboard]);
        assert_eq!(
            entry.message,
            "CPU socket AM5 is incompatible with motherboard socket LGA1700"
        );
    }

    #[test]
    fn test_power_budget_boundary_is_inclusive() {
        let rule = power_rule(0);
        let psu = record(Category::Psu, &[("wattage", 600i64.into())]);
        let cpu = record(Category::Cpu, &[("power_draw", 200i64.into())]);
        let gpu_ok = record(Category::Gpu, &[("power_draw", 400i64.into())]);
        let gpu_over = record(Category::Gpu, &[("power_draw", 401i64.into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&psu);
        resolved.insert(&cpu);
        resolved.insert(&gpu_ok);
        assert_eq!(rule.evaluate(&resolved), Ok(None));

        resolved.insert(&gpu_over);
        let entry = rule.evaluate(&resolved).unwrap().unwrap();
        assert_eq!(entry.rule_id, "power_budget");
        assert_eq!(entry.categories, vec![Category::Cpu, Category::Gpu, Category::Psu]);
        assert!(entry.message.contains("601W"), "{}", entry.message);
    }

    #[test]
    fn test_power_budget_truncates_after_summation() {
        let rule = power_rule(0);
        let psu = record(Category::Psu, &[("wattage", 600i64.into())]);
        // 300.6 + 300.6 = 601.2 -> 601 (per-component truncation would give 600).
        let cpu = record(Category::Cpu, &[("power_draw", 300.6.into())]);
        let gpu = record(Category::Gpu, &[("power_draw", 300.6.into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&psu);
        resolved.insert(&cpu);
        resolved.insert(&gpu);
        assert!(rule.evaluate(&resolved).unwrap().is_some());
    }

    #[test]
    fn test_power_budget_margin_applied_once() {
        let rule = power_rule(100);
        let psu = record(Category::Psu, &[("wattage", 650i64.into())]);
        let cpu = record(Category::Cpu, &[("power_draw", 250i64.into())]);
        let gpu = record(Category::Gpu, &[("power_draw", 300i64.into())]);
        let cooler = record(Category::Cooler, &[("power_draw", 1i64.into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&psu);
        resolved.insert(&cpu);
        resolved.insert(&gpu);
        assert_eq!(rule.evaluate(&resolved), Ok(None));

        resolved.insert(&cooler);
        let entry = rule.evaluate(&resolved).unwrap().unwrap();
        assert_eq!(
            entry.message,
            "Estimated power draw 551W exceeds the 650W PSU limit of 550W (100W safety margin)"
        );
    }

    #[test]
    fn test_power_budget_limit_overflow_is_a_fault() {
        let cpu = record(Category::Cpu, &[("power_draw", 65i64.into())]);
        let min_psu = record(Category::Psu, &[("wattage", i64::MIN.into())]);
        let max_psu = record(Category::Psu, &[("wattage", i64::MAX.into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&cpu);
        resolved.insert(&min_psu);
        assert_eq!(
            power_rule(DEFAULT_POWER_MARGIN_WATTS).evaluate(&resolved),
            Err(RuleFault::LimitOverflow {
                wattage: i64::MIN,
                margin: DEFAULT_POWER_MARGIN_WATTS,
            })
        );

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&cpu);
        resolved.insert(&max_psu);
        assert!(matches!(
            power_rule(i64::MIN).evaluate(&resolved),
            Err(RuleFault::LimitOverflow { .. })
        ));
        // A large but representable margin is an ordinary violation.
        assert!(power_rule(i64::MAX).evaluate(&resolved).unwrap().is_some());
    }

    #[test]
    fn test_applicability() {
        let rule = power_rule(0);
        let psu = record(Category::Psu, &[("wattage", 100i64.into())]);
        let mut resolved = ResolvedComponents::new();
        resolved.insert(&psu);
        // PSU alone has no consumers to budget.
        assert!(!rule.is_applicable(&resolved));

        let storage = record(Category::Storage, &[("power_draw", 5i64.into())]);
        resolved.insert(&storage);
        assert!(rule.is_applicable(&resolved));

        let socket = RuleSet::with_default_rules().get("socket_match").unwrap().clone();
        assert!(!socket.is_applicable(&resolved));
    }

    #[test]
    fn test_clearance_rules() {
        let rules = RuleSet::with_default_rules();
        let case = record(
            Category::Case,
            &[("max_gpu_length_mm", 330i64.into()), ("max_cooler_height_mm", 155i64.into())],
        );
        let gpu = record(Category::Gpu, &[("length_mm", 336i64.into())]);
        let cooler = record(Category::Cooler, &[("height_mm", 155.0.into())]);

        let mut resolved = ResolvedComponents::new();
        resolved.insert(&case);
        resolved.insert(&gpu);
        resolved.insert(&cooler);

        let gpu_entry = rules.get("gpu_clearance").unwrap().evaluate(&resolved).unwrap();
        assert_eq!(
            gpu_entry.unwrap().message,
            "GPU length 336mm exceeds the case maximum of 330mm"
        );
        let cooler_entry = rules.get("cooler_clearance").unwrap().evaluate(&resolved).unwrap();
        assert!(cooler_entry.is_none());
    }

    #[test]
    fn test_mistyped_data_is_a_fault() {
        let rule = RuleSet::with_default_rules().get("memory_type_match").unwrap().clone();
        let ram = record(Category::Ram, &[("type", 5i64.into())]);
        let mb = record(Category::Motherboard, &[("memory_type", "DDR5".into())]);
        let mut resolved = ResolvedComponents::new();
        resolved.insert(&ram);
        resolved.insert(&mb);
        assert!(matches!(rule.evaluate(&resolved), Err(RuleFault::WrongType { .. })));
    }

    #[test]
    fn test_rule_file_round_trip_and_duplicates() {
        let json = serde_json::to_string(&RuleSet::with_default_rules().to_file()).unwrap();
        assert!(json.contains("\"type\":\"power_budget\""));
        assert!(json.contains("\"cpu.socket\""));
        let loaded = RuleSet::from_json_str(&json).unwrap();
        assert_eq!(loaded, RuleSet::with_default_rules());

        let dup = r#"{"name":"d","version":"1","rules":[
            {"id":"a","name":"A","check":{"type":"attribute_match","left":"cpu.socket","right":"motherboard.socket"},"message":"x"},
            {"id":"a","name":"A","check":{"type":"attribute_match","left":"cpu.socket","right":"motherboard.socket"},"message":"y"}
        ]}"#;
        assert!(matches!(
            RuleSet::from_json_str(dup),
            Err(RuleSetError::DuplicateRule(id)) if id == "a"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_declarations() {
        let schema = SchemaRegistry::default();

        let unknown = Rule::new(
            "chipset",
            "Chipset",
            RuleCheck::AttributeMatch {
                left: attr(Category::Cpu, "chipset"),
                right: attr(Category::Motherboard, "chipset"),
            },
            "x",
        );
        assert!(matches!(
            unknown.validate(&schema),
            Err(RuleSetError::UnknownAttribute { .. })
        ));

        let wrong_type = Rule::new(
            "socket_len",
            "Socket",
            RuleCheck::MaxDimension {
                value: attr(Category::Cpu, "socket"),
                limit: attr(Category::Case, "max_gpu_length_mm"),
            },
            "x",
        );
        assert!(matches!(
            wrong_type.validate(&schema),
            Err(RuleSetError::AttributeType { .. })
        ));

        let bad_template = Rule::new(
            "socket_match",
            "Socket",
            RuleCheck::AttributeMatch {
                left: attr(Category::Cpu, "socket"),
                right: attr(Category::Motherboard, "socket"),
            },
            "{gpu.length_mm} is unrelated",
        );
        assert!(matches!(
            bad_template.validate(&schema),
            Err(RuleSetError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_reserved_ids() {
        let schema = SchemaRegistry::default();
        for id in [COMPONENT_NOT_FOUND, INVALID_COMPONENT] {
            let rule = Rule::new(
                id,
                "Reserved",
                RuleCheck::AttributeMatch {
                    left: attr(Category::Cpu, "socket"),
                    right: attr(Category::Motherboard, "socket"),
                },
                "x",
            );
            assert!(matches!(
                rule.validate(&schema),
                Err(RuleSetError::ReservedRuleId(ref reserved)) if reserved == id
            ));
        }
    }

    #[test]
    fn test_disable_rules() {
        let mut rules = RuleSet::with_default_rules();
        rules.disable(&["gpu_clearance".to_string(), "no_such_rule".to_string()]);
        assert!(!rules.get("gpu_clearance").unwrap().enabled);
        assert!(rules.get("socket_match").unwrap().enabled);
    }
}
