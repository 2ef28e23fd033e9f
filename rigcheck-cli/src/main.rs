//! RigCheck CLI - PC build compatibility checks from the command line.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rigcheck::{
    Category, CompatibilityEngine, CompatibilityReport, EngineConfig, EntryKind, ReportFormat,
    Reporter, Rule, RuleCheck, RuleSet, SchemaRegistry,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "rigcheck")]
#[command(about = "PC build compatibility checker", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a build request against the catalog and rules
    Check {
        /// JSON request file mapping categories to component ids ("-" for stdin)
        #[arg(value_name = "FILE", default_value = "-")]
        file: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if the build is not compatible
        #[arg(long)]
        fail_on_incompatible: bool,
    },

    /// List the active compatibility rules
    Rules {
        /// Rule set file to list instead of the built-in rules
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Show descriptions, categories and check types
        #[arg(short, long)]
        details: bool,
    },

    /// Show the attribute schema for every category
    Schema,

    /// List the components of one category
    Catalog {
        /// Category name (cpu, motherboard, gpu, ram, storage, psu, case, cooler)
        #[arg(value_name = "CATEGORY")]
        category: Category,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Show what the engine loaded
    Info {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Where the engine gets its data. Flags override the config file.
#[derive(Args, Clone, Default)]
struct EngineArgs {
    /// Engine config file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of <category>.json catalog feeds
    #[arg(long, value_name = "DIR", conflicts_with = "catalog_url")]
    catalog: Option<PathBuf>,

    /// Base URL of a catalog service serving GET /<category>
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// Rule set file replacing the built-in rules
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Power budget safety margin in watts
    #[arg(long, value_name = "WATTS")]
    margin: Option<i64>,

    /// Disable a rule by id (repeatable)
    #[arg(long = "disable", value_name = "RULE")]
    disabled: Vec<String>,
}

impl EngineArgs {
    fn to_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(dir) = &self.catalog {
            config.catalog_dir = Some(dir.clone());
            config.catalog_url = None;
        }
        if let Some(url) = &self.catalog_url {
            config.catalog_url = Some(url.clone());
            config.catalog_dir = None;
        }
        if let Some(rules) = &self.rules {
            config.rules_file = Some(rules.clone());
        }
        if let Some(margin) = self.margin {
            config.power_margin_watts = Some(margin);
        }
        config.disabled_rules.extend(self.disabled.iter().cloned());
        Ok(config)
    }

    async fn engine(&self) -> Result<CompatibilityEngine> {
        let config = self.to_config()?;
        CompatibilityEngine::from_config(&config)
            .await
            .context("Failed to load engine")
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON response ({compatible, entries, errors})
    Json,
    /// One message per line
    Plain,
    /// GitHub Actions format
    Github,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            file,
            engine,
            format,
            fail_on_incompatible,
        } => handle_check(&file, &engine, format, fail_on_incompatible).await,
        Commands::Rules { rules, details } => handle_rules(rules.as_deref(), details),
        Commands::Schema => {
            handle_schema();
            Ok(0)
        }
        Commands::Catalog { category, engine } => handle_catalog(category, &engine).await,
        Commands::Info { engine } => handle_info(&engine).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_request(file: &str) -> Result<String> {
    if file == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read request from stdin")?;
        return Ok(input);
    }
    let path = Path::new(file);
    if !path.exists() {
        bail!("Request file not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn handle_check(
    file: &str,
    engine_args: &EngineArgs,
    format: OutputFormat,
    fail_on_incompatible: bool,
) -> Result<i32> {
    let json = read_request(file)?;
    let engine = engine_args.engine().await?;
    let report = engine.check_request(&json)?;

    match format {
        OutputFormat::Human => output_human(&report),
        OutputFormat::Json => output_json(&report)?,
        OutputFormat::Plain => output_lines(&report, ReportFormat::Plain),
        OutputFormat::Github => output_lines(&report, ReportFormat::Github),
    }

    if fail_on_incompatible && !report.is_compatible() {
        return Ok(1);
    }
    Ok(0)
}

fn output_human(report: &CompatibilityReport) {
    println!("\nBuild check");
    println!("{}", "─".repeat(60));

    if report.is_compatible() {
        println!("  Compatible: no problems found");
        return;
    }

    let sections = [
        (EntryKind::Incompatible, "INCOMPATIBLE"),
        (EntryKind::ComponentNotFound, "NOT FOUND"),
        (EntryKind::InvalidComponent, "INVALID DATA"),
        (EntryKind::RuleEvaluationError, "RULE ERRORS"),
    ];
    for (kind, title) in sections {
        let entries: Vec<_> = report.entries().iter().filter(|e| e.kind == kind).collect();
        if entries.is_empty() {
            continue;
        }
        println!("\n  {}:", title);
        for entry in entries {
            println!("    - {}", Reporter::render_entry(entry, ReportFormat::Detailed));
        }
    }

    println!("\n  Summary:");
    println!(
        "    Incompatible:  {}",
        report.count_kind(EntryKind::Incompatible)
    );
    println!(
        "    Not found:     {}",
        report.count_kind(EntryKind::ComponentNotFound)
    );
    println!(
        "    Invalid data:  {}",
        report.count_kind(EntryKind::InvalidComponent)
    );
    println!(
        "    Rule errors:   {}",
        report.count_kind(EntryKind::RuleEvaluationError)
    );
}

fn output_json(report: &CompatibilityReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report.to_response())?);
    Ok(())
}

fn output_lines(report: &CompatibilityReport, format: ReportFormat) {
    for line in Reporter::render(report, format) {
        println!("{}", line);
    }
}

fn check_kind(rule: &Rule) -> &'static str {
    match rule.check {
        RuleCheck::AttributeMatch { .. } => "attribute_match",
        RuleCheck::AttributeInSet { .. } => "attribute_in_set",
        RuleCheck::MaxDimension { .. } => "max_dimension",
        RuleCheck::PowerBudget { .. } => "power_budget",
    }
}

fn handle_rules(path: Option<&Path>, details: bool) -> Result<i32> {
    let rules = match path {
        Some(path) => RuleSet::load_file(path)?,
        None => RuleSet::with_default_rules(),
    };
    rules.validate(&SchemaRegistry::default())?;

    println!("{} (version {}):\n", rules.name, rules.version);
    for rule in rules.iter() {
        let status = if rule.enabled { "" } else { " [disabled]" };
        println!("  {}{}", rule.id, status);
        println!("    {}", rule.name);
        if details {
            if !rule.description.is_empty() {
                println!("    {}", rule.description);
            }
            let mut categories: Vec<&str> =
                rule.categories().iter().map(Category::as_str).collect();
            categories.sort_unstable();
            println!("    Check: {} on {}", check_kind(rule), categories.join(", "));
            if let RuleCheck::PowerBudget { margin_watts, .. } = rule.check {
                println!("    Margin: {}W", margin_watts);
            }
        }
        println!();
    }
    Ok(0)
}

fn handle_schema() {
    let schema = SchemaRegistry::default();
    println!("Attribute schema:\n");
    for category in schema.categories() {
        println!("  {}", category);
        if let Ok(attributes) = schema.required_attributes(category) {
            for spec in attributes {
                println!("    {}: {}", spec.name, spec.ty);
            }
        }
        println!();
    }
}

async fn handle_catalog(category: Category, engine_args: &EngineArgs) -> Result<i32> {
    let engine = engine_args.engine().await?;
    let snapshot = engine.snapshot();
    let components = snapshot.catalog.components(category);

    println!("{} components ({}):\n", category, components.len());
    for component in components {
        println!("  {}  {}", component.id, component.name);
        let attributes: Vec<String> = component
            .attributes
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!("    {}", attributes.join(", "));
    }
    Ok(0)
}

async fn handle_info(engine_args: &EngineArgs) -> Result<i32> {
    let engine = engine_args.engine().await?;
    let snapshot = engine.snapshot();

    println!("Snapshot:   {}", snapshot.id);
    println!("Loaded at:  {}", snapshot.loaded_at.to_rfc3339());
    println!(
        "Rules:      {} ({} rules, version {})",
        snapshot.rules.name,
        snapshot.rules.len(),
        snapshot.rules.version
    );
    println!(
        "Catalog:    {} valid, {} invalid",
        snapshot.catalog.valid_count(),
        snapshot.catalog.invalid_count()
    );
    for category in Category::ALL {
        println!(
            "  {:<12} {}",
            category.as_str(),
            snapshot.catalog.components(category).len()
        );
    }
    Ok(0)
}
