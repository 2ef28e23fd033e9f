//! Example: building a snapshot by hand with an extra rule (without the
//! embedded defaults).
//! Run with: cargo run --example custom_rules

use rigcheck::catalog::{Catalog, RawComponent};
use rigcheck::rules::{AttrRef, Rule, RuleCheck, RuleSet};
use rigcheck::{evaluate, Category, ReportFormat, Reporter, SchemaRegistry, Selection, Snapshot};

fn main() -> Result<(), rigcheck::RigCheckError> {
    let schema = SchemaRegistry::default();

    let catalog = Catalog::builder(&schema)
        .add(
            Category::Cooler,
            RawComponent::new("cooler-tall", "Tall Tower")
                .with("height_mm", 172i64)
                .with("power_draw", 5i64),
        )
        .add(
            Category::Case,
            RawComponent::new("case-slim", "Slim Case")
                .with("form_factors", "Mini-ITX")
                .with("max_gpu_length_mm", 320i64)
                .with("max_cooler_height_mm", 70i64),
        )
        .add(
            Category::Motherboard,
            RawComponent::new("mb-atx", "Full ATX Board")
                .with("socket", "AM5")
                .with("memory_type", "DDR5")
                .with("form_factor", "ATX"),
        )
        .build();

    let mut rules = RuleSet::with_default_rules();
    rules.set_power_margin(100);
    rules.insert(
        Rule::new(
            "slim_cooler",
            "Slim case cooler",
            RuleCheck::MaxDimension {
                value: AttrRef::new(Category::Cooler, "height_mm"),
                limit: AttrRef::new(Category::Case, "max_cooler_height_mm"),
            },
            "{cooler.name} needs {cooler.height_mm}mm but {case.name} allows {case.max_cooler_height_mm}mm",
        )
        .with_description("Same as cooler_clearance, with product names in the message"),
    );

    let snapshot = Snapshot::validated(schema, catalog, rules)?;
    let selection = Selection::new()
        .with(Category::Cooler, "cooler-tall")
        .with(Category::Case, "case-slim")
        .with(Category::Motherboard, "mb-atx");

    let report = evaluate(&snapshot, &selection);

    println!("Custom check found {} problems", report.len());
    for line in Reporter::render(&report, ReportFormat::Detailed) {
        println!("  {}", line);
    }

    if !report.is_compatible() {
        std::process::exit(1);
    }
    Ok(())
}
