//! Cache-fronted catalog pipeline: resolve, normalize, publish.

use crate::cache::{CacheEntry, CatalogCache, InMemoryCache};
use crate::config::{CatalogConfig, SourceSpec};
use crate::io::build_text_reader;
use crate::normalize::Normalizer;
use crate::resolver::SourceResolver;
use crate::sources::{HttpTransport, SourceResponse, Transport};
use crate::CatalogResult;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

const PROBE_READ_LIMIT: u64 = 64 * 1024;
const PREVIEW_CHARS: usize = 200;
const ERROR_BODY_CHARS: usize = 500;

/// Live check of the primary source, for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub status: u16,
    pub ok: bool,
    pub content_type: String,
    pub content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_body: Option<String>,
}

pub struct CatalogService {
    resolver: SourceResolver,
    cache: Arc<dyn CatalogCache>,
    normalizer: Normalizer,
    primary_from_env: bool,
}

impl CatalogService {
    pub fn new(resolver: SourceResolver, cache: Arc<dyn CatalogCache>, normalizer: Normalizer) -> Self {
        Self {
            resolver,
            cache,
            normalizer,
            primary_from_env: false,
        }
    }

    /// Service over real HTTP/file sources.
    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let transport = HttpTransport::new(&config.user_agent, config.attempt_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &CatalogConfig, transport: Arc<dyn Transport>) -> Self {
        let resolver = SourceResolver::new(transport, config.sources.clone())
            .with_parse_options(config.parse_options())
            .with_timeouts(config.attempt_timeout(), config.total_budget());
        let cache = Arc::new(InMemoryCache::new(config.cache_ttl()));
        let mut service = Self::new(resolver, cache, Normalizer::new(config.synthetic));
        service.primary_from_env = config.primary_from_env;
        service
    }

    pub fn cache(&self) -> &Arc<dyn CatalogCache> {
        &self.cache
    }

    pub fn primary_source(&self) -> Option<&SourceSpec> {
        self.resolver.sources().first()
    }

    pub fn primary_from_env(&self) -> bool {
        self.primary_from_env
    }

    /// The cached snapshot while fresh, otherwise a new one. Never fails.
    pub async fn get_or_fetch(&self) -> Arc<CacheEntry> {
        if !self.cache.is_expired() {
            if let Some(entry) = self.cache.get() {
                debug!(source = %entry.source_label, products = entry.products.len(), "cache hit");
                return entry;
            }
        }
        self.refresh().await
    }

    /// Run the pipeline unconditionally and publish the result.
    pub async fn refresh(&self) -> Arc<CacheEntry> {
        let resolution = self.resolver.resolve().await;
        let products = self.normalizer.normalize_batch(
            &resolution.records,
            &resolution.id_prefix,
            &resolution.source_label,
        );
        info!(
            source = %resolution.source_label,
            products = products.len(),
            skipped = resolution.skipped_rows,
            truncated = resolution.truncated,
            "catalog refreshed"
        );
        self.cache.set(CacheEntry::new(
            products,
            resolution.source_label,
            resolution.last_error_detail,
        ))
    }

    /// Open the primary source once and summarize what came back. `None` when
    /// no sources are configured.
    pub async fn probe_primary(&self) -> Option<CatalogResult<ProbeReport>> {
        let source = self.primary_source()?;
        let result = match self.resolver.transport().open(source).await {
            Ok(response) => probe(response).await,
            Err(e) => Err(e),
        };
        Some(result)
    }
}

async fn probe(response: SourceResponse) -> CatalogResult<ProbeReport> {
    let ok = response.is_success();
    let SourceResponse {
        status,
        meta,
        content_length,
        body,
    } = response;

    let mut raw = Vec::new();
    build_text_reader(StreamReader::new(body), &meta)
        .take(PROBE_READ_LIMIT)
        .read_to_end(&mut raw)
        .await?;
    let text = String::from_utf8_lossy(&raw);

    let mut report = ProbeReport {
        status,
        ok,
        content_type: meta.content_type.clone(),
        content_length: content_length.or(Some(raw.len() as u64)),
        content_preview: None,
        is_html: None,
        error_body: None,
    };
    if ok {
        let trimmed = text.trim();
        report.content_preview = Some(text.chars().take(PREVIEW_CHARS).collect());
        report.is_html = Some(trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html"));
    } else {
        report.error_body = Some(text.chars().take(ERROR_BODY_CHARS).collect());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        opened: AtomicUsize,
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for Counting {
        async fn open(&self, _: &SourceSpec) -> CatalogResult<SourceResponse> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(SourceResponse::from_bytes(self.status, "text/csv", self.body))
        }
    }

    fn build(status: u16, body: &'static str) -> (CatalogService, Arc<Counting>) {
        let transport = Arc::new(Counting {
            opened: AtomicUsize::new(0),
            status,
            body,
        });
        let config = CatalogConfig {
            sources: vec![SourceSpec::new("primary", "https://x/p.csv", crate::SourceFormat::Csv)],
            ..CatalogConfig::default()
        };
        (CatalogService::with_transport(&config, transport.clone()), transport)
    }

    #[tokio::test]
    async fn hit_returns_the_same_snapshot() {
        let (service, transport) = build(200, "name,price\nLamp,12\n");
        let first = service.get_or_fetch().await;
        let second = service.get_or_fetch().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.opened.load(Ordering::SeqCst), 1);
        assert_eq!(first.products[0].data_source, "primary");
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot() {
        let (service, transport) = build(200, "name,price\nLamp,12\n");
        let first = service.get_or_fetch().await;
        let second = service.refresh().await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(transport.opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn probe_reports_html_and_errors() {
        let (service, _) = build(200, "<!DOCTYPE html><p>login</p>");
        let report = service.probe_primary().await.unwrap().unwrap();
        assert!(report.ok);
        assert_eq!(report.is_html, Some(true));
        assert_eq!(report.content_length, Some(27));

        let (service, _) = build(404, "BlobNotFound");
        let report = service.probe_primary().await.unwrap().unwrap();
        assert!(!report.ok);
        assert_eq!(report.error_body.as_deref(), Some("BlobNotFound"));
        assert!(report.content_preview.is_none());
    }
}
