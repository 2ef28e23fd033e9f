//! Simple check example: check a JSON build request and print the results.
//! Run with: cargo run --example simple_check [path/to/request.json]

use rigcheck::prelude::*;
use std::path::Path;

fn main() -> Result<(), RigCheckError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/requests/incompatible_build.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_check [path/to/request.json]");
        std::process::exit(1);
    }

    let json = std::fs::read_to_string(path)?;
    let engine = CompatibilityEngine::with_defaults();
    let report = engine.check_request(&json)?;

    println!("Compatibility results for: {}", path.display());
    println!("Total problems: {}", report.len());
    println!();

    for line in Reporter::render(&report, ReportFormat::Detailed) {
        println!("  - {}", line);
    }

    if !report.is_compatible() {
        println!("\nBuild is not compatible.");
        std::process::exit(1);
    }

    println!("Build is compatible.");
    Ok(())
}
