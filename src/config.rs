use crate::normalize::SyntheticRanges;
use crate::parse::{CsvDialect, ParseOptions, DEFAULT_MAX_RECORDS};
use crate::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const PRIMARY_URL: &str =
    "https://rohitproductstore.blob.core.windows.net/products/Final_dataset.csv";
pub const BLOB_JSON_URL: &str =
    "https://rohitproductstore.blob.core.windows.net/products/products_with_urls.json";
pub const JSDELIVR_URL: &str =
    "https://cdn.jsdelivr.net/gh/2023aa05550-bit/product-dataset@main/products_with_urls.json";
pub const GITHUB_RAW_URL: &str =
    "https://raw.githubusercontent.com/2023aa05550-bit/product-dataset/main/products_with_urls.json";

/// Environment variables that may carry a signed URL for the primary source.
pub const PRIMARY_URL_ENV: &[&str] = &["SASURL", "SAS_URL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn accept_header(self) -> &'static str {
        match self {
            Self::Csv => "text/csv, text/plain, */*",
            Self::Json => "application/json, text/plain, */*",
        }
    }

    /// Prefix for ids synthesized for records from this kind of source.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Csv => "csv-product",
            Self::Json => "alt-product",
        }
    }
}

/// One candidate in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    /// `http(s)://…` or `file://…`
    pub url: String,
    pub format: SourceFormat,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            format,
        }
    }

    /// First 50 characters of the URL; signed URLs carry credentials past that point.
    pub fn url_preview(&self) -> String {
        let head: String = self.url.chars().take(50).collect();
        format!("{head}...")
    }
}

pub fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new("Azure Blob Storage CSV", PRIMARY_URL, SourceFormat::Csv),
        SourceSpec::new("Azure Blob Storage JSON", BLOB_JSON_URL, SourceFormat::Json),
        SourceSpec::new("jsDelivr CDN", JSDELIVR_URL, SourceFormat::Json),
        SourceSpec::new("GitHub Raw CDN", GITHUB_RAW_URL, SourceFormat::Json),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub bind: SocketAddr,
    pub cache_ttl_secs: u64,
    pub max_records: usize,
    pub attempt_timeout_secs: u64,
    pub total_budget_secs: u64,
    pub csv_dialect: CsvDialect,
    pub user_agent: String,
    pub sources: Vec<SourceSpec>,
    pub synthetic: SyntheticRanges,
    /// Set when the primary URL came from the environment.
    #[serde(skip)]
    pub primary_from_env: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cache_ttl_secs: 5 * 60,
            max_records: DEFAULT_MAX_RECORDS,
            attempt_timeout_secs: 20,
            total_budget_secs: 60,
            csv_dialect: CsvDialect::Compat,
            user_agent: "Mozilla/5.0 (compatible; ProductGrid/1.0)".to_string(),
            sources: default_sources(),
            synthetic: SyntheticRanges::default(),
            primary_from_env: false,
        }
    }
}

impl CatalogConfig {
    /// Load from a TOML file (or defaults), apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> CatalogResult<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    CatalogError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides: `CATALOG_BIND`, `CATALOG_CACHE_TTL_SECS`, `CATALOG_MAX_RECORDS`,
    /// and `SASURL`/`SAS_URL` for the first source's URL.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> CatalogResult<()> {
        if let Some(bind) = lookup("CATALOG_BIND") {
            self.bind = parse_env("CATALOG_BIND", &bind)?;
        }
        if let Some(ttl) = lookup("CATALOG_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_env("CATALOG_CACHE_TTL_SECS", &ttl)?;
        }
        if let Some(max) = lookup("CATALOG_MAX_RECORDS") {
            self.max_records = parse_env("CATALOG_MAX_RECORDS", &max)?;
        }
        let signed = PRIMARY_URL_ENV
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()));
        if let (Some(url), Some(primary)) = (signed, self.sources.first_mut()) {
            primary.url = url.trim().to_string();
            self.primary_from_env = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.max_records == 0 {
            return Err(CatalogError::Config("max_records must be at least 1".into()));
        }
        if self.cache_ttl_secs == 0 || self.attempt_timeout_secs == 0 || self.total_budget_secs == 0 {
            return Err(CatalogError::Config(
                "cache_ttl_secs, attempt_timeout_secs and total_budget_secs must be positive".into(),
            ));
        }
        for (name, span) in [
            ("price", self.synthetic.price),
            ("popularity", self.synthetic.popularity),
            ("net_feedback", self.synthetic.net_feedback),
        ] {
            if !span.is_valid() {
                return Err(CatalogError::Config(format!(
                    "synthetic.{name} range is empty: [{}, {})",
                    span.min, span.max
                )));
            }
        }
        if self.synthetic.price.min <= 0 {
            return Err(CatalogError::Config("synthetic.price.min must be positive".into()));
        }
        if let Some(source) = self.sources.iter().find(|s| s.url.trim().is_empty()) {
            return Err(CatalogError::Config(format!("source '{}' has no url", source.name)));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn total_budget(&self) -> Duration {
        Duration::from_secs(self.total_budget_secs)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_records: self.max_records,
            dialect: self.csv_dialect,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> CatalogResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CatalogError::Config(format!("{key}={value:?}: {e}")))
}
