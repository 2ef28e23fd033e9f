//! Built-in sample catalog
//!
//! A small catalog embedded into the binary so the CLI and examples work with
//! no data directory. Real deployments point the engine at a directory or an
//! HTTP catalog service instead.

use crate::catalog::{Catalog, RawComponent, StaticSource};
use crate::schema::{Category, SchemaRegistry};

const EMBEDDED_CPU: &str = include_str!("../../data/catalog/cpu.json");
const EMBEDDED_MOTHERBOARD: &str = include_str!("../../data/catalog/motherboard.json");
const EMBEDDED_GPU: &str = include_str!("../../data/catalog/gpu.json");
const EMBEDDED_RAM: &str = include_str!("../../data/catalog/ram.json");
const EMBEDDED_STORAGE: &str = include_str!("../../data/catalog/storage.json");
const EMBEDDED_PSU: &str = include_str!("../../data/catalog/psu.json");
const EMBEDDED_CASE: &str = include_str!("../../data/catalog/case.json");
const EMBEDDED_COOLER: &str = include_str!("../../data/catalog/cooler.json");

fn embedded_json(category: Category) -> &'static str {
    match category {
        Category::Cpu => EMBEDDED_CPU,
        Category::Motherboard => EMBEDDED_MOTHERBOARD,
        Category::Gpu => EMBEDDED_GPU,
        Category::Ram => EMBEDDED_RAM,
        Category::Storage => EMBEDDED_STORAGE,
        Category::Psu => EMBEDDED_PSU,
        Category::Case => EMBEDDED_CASE,
        Category::Cooler => EMBEDDED_COOLER,
    }
}

/// Raw feed items for one category of the embedded catalog.
pub fn embedded_components(category: Category) -> Vec<RawComponent> {
    match serde_json::from_str::<Vec<RawComponent>>(embedded_json(category)) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Failed to parse embedded {} catalog: {}", category, e);
            Vec::new()
        }
    }
}

/// The embedded catalog as a [`CatalogSource`](crate::catalog::CatalogSource).
pub fn embedded_source() -> StaticSource {
    Category::ALL
        .into_iter()
        .fold(StaticSource::new(), |source, category| {
            embedded_components(category)
                .into_iter()
                .fold(source, |source, item| source.with(category, item))
        })
}

/// Build the embedded catalog synchronously.
pub fn embedded_catalog(schema: &SchemaRegistry) -> Catalog {
    let catalog = Catalog::from_components(
        schema,
        Category::ALL.into_iter().flat_map(|category| {
            embedded_components(category)
                .into_iter()
                .map(move |raw| (category, raw))
        }),
    );
    tracing::info!("Loaded {} embedded catalog components", catalog.valid_count());
    catalog
}
