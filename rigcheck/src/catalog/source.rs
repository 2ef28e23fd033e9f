//! Catalog data sources
//!
//! The only place the engine performs I/O. A source delivers the raw
//! per-category feed; validation happens in [`Catalog::load`](super::Catalog::load).

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::RawComponent;
use crate::schema::Category;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read catalog file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog feed for {category}: {message}")]
    Parse { category: Category, message: String },
    #[error("Catalog request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Catalog server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Invalid catalog directory: {0}")]
    InvalidDirectory(String),
}

/// A read-only feed of components, one category at a time.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short description used in log lines.
    fn name(&self) -> &str;

    /// All components of one category. An empty category is not an error.
    async fn fetch(&self, category: Category) -> Result<Vec<RawComponent>, SourceError>;
}

/// Reads `<dir>/<category>.json`, each file a JSON array of components.
pub struct DirectorySource {
    dir: PathBuf,
    label: String,
}

impl DirectorySource {
    pub fn new(dir: &Path) -> Result<Self, SourceError> {
        if !dir.is_dir() {
            return Err(SourceError::InvalidDirectory(
                dir.to_string_lossy().to_string(),
            ));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            label: format!("directory {}", dir.display()),
        })
    }

    fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.json", category))
    }
}

#[async_trait]
impl CatalogSource for DirectorySource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, category: Category) -> Result<Vec<RawComponent>, SourceError> {
        let path = self.path_for(category);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No catalog file for {} at {:?}", category, path);
                return Ok(Vec::new());
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        parse_feed(category, &content)
    }
}

/// Fetches `GET {base_url}/{category}`, the per-category endpoints the
/// selection form reads its options from.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, category: Category) -> String {
        format!("{}/{}", self.base_url, category)
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, category: Category) -> Result<Vec<RawComponent>, SourceError> {
        let url = self.url_for(category);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        parse_feed(category, &body)
    }
}

/// In-memory feed.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: HashMap<Category, Vec<RawComponent>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, item: RawComponent) -> Self {
        self.items.entry(category).or_default().push(item);
        self
    }

    /// Parse one category's JSON feed into the source.
    pub fn with_json(mut self, category: Category, json: &str) -> Result<Self, SourceError> {
        let items = parse_feed(category, json)?;
        self.items.entry(category).or_default().extend(items);
        Ok(self)
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, category: Category) -> Result<Vec<RawComponent>, SourceError> {
        Ok(self.items.get(&category).cloned().unwrap_or_default())
    }
}

fn parse_feed(category: Category, json: &str) -> Result<Vec<RawComponent>, SourceError> {
    serde_json::from_str(json).map_err(|e| SourceError::Parse {
        category,
        message: e.to_string(),
    })
}
