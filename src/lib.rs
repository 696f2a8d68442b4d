//! Product catalog ingestion with an ordered source fallback chain.
//!
//! - Sources: one primary CSV plus JSON alternates, tried in order, with an
//!   embedded sample set as the availability floor.
//! - Parsing: streaming, quote-aware CSV (or `csv-async` in RFC 4180 mode) and
//!   JSON, both capped at `max_records`.
//! - Normalization: a declarative field-name rule table resolved into
//!   [`NormalizedProduct`].
//! - Cache: one time-boxed slot behind the [`CatalogCache`] trait.
//!
//! Data shape:
//! - `ParsedBatch { headers, records, skipped_rows, truncated }`
//! - `CacheEntry { products, fetched_at, source_label, last_error_detail }`
//
mod codec;
pub mod cache;
pub mod config;
pub mod fallback;
mod io;
pub mod logging;
pub mod normalize;
pub mod parse;
pub mod query;
pub mod record;
pub mod resolver;
pub mod server;
pub mod service;
pub mod sources;
mod tokenize;

pub use crate::cache::{CacheEntry, CatalogCache, InMemoryCache};
pub use crate::config::{CatalogConfig, SourceFormat, SourceSpec};
pub use crate::io::{build_text_reader, meta_from_content_type, meta_from_path, reader_from_path, SourceMeta};
pub use crate::normalize::{normalize, NormalizedProduct, Normalizer, SyntheticRanges};
pub use crate::parse::{
    parse_csv_str, parse_csv_stream, parse_json_str, parse_json_stream, CsvDialect, ParseOptions,
    ParsedBatch,
};
pub use crate::query::{CatalogPage, CatalogQuery, SortBy, SortOrder};
pub use crate::record::{FieldValue, ProductRecord};
pub use crate::resolver::{Resolution, SourceResolver};
pub use crate::server::{router, AppState};
pub use crate::service::{CatalogService, ProbeReport};
pub use crate::sources::{sniff_payload, ByteStream, HttpTransport, SourceResponse, Transport};

use std::time::Duration;
use thiserror::Error;

/// Coarse failure classes used when deciding whether to advance the source chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, status or timeout problems.
    Transport,
    /// The source answered, but not with catalog data (HTML page, empty body).
    InvalidPayload,
    /// The body was data-shaped but produced no records.
    Parse,
    /// Local misconfiguration.
    Config,
}

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("source timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl CatalogError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Status { .. } | Self::Timeout(_) | Self::Http(_) | Self::Io(_) => {
                FailureKind::Transport
            }
            Self::InvalidPayload(_) => FailureKind::InvalidPayload,
            Self::Parse(_) | Self::Csv(_) | Self::Json(_) => FailureKind::Parse,
            Self::Config(_) | Self::Toml(_) => FailureKind::Config,
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
