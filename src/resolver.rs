//! Ordered source fallback.
//!
//! `Idle -> TryingSource(0) -> ... -> TryingSource(n-1) -> ExhaustedFallback`,
//! leaving for `Succeeded` on the first attempt that yields records. Each source
//! is tried once; an attempt is bounded by the per-attempt timeout and by what
//! is left of the total budget.

use crate::config::{SourceFormat, SourceSpec};
use crate::fallback::{sample_records, SAMPLE_SOURCE_LABEL};
use crate::io::build_text_reader;
use crate::parse::{parse_csv_stream, parse_json_stream, ParseOptions, ParsedBatch};
use crate::record::ProductRecord;
use crate::sources::{sniff_payload, SourceResponse, Transport};
use crate::{CatalogError, CatalogResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tokio_util::io::StreamReader;
use tracing::{info, instrument, warn};

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_TOTAL_BUDGET: Duration = Duration::from_secs(60);
pub const SAMPLE_ID_PREFIX: &str = "sample-product";

/// Records from the winning source (or the sample set) plus diagnostics.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub records: Vec<ProductRecord>,
    pub source_label: String,
    /// Prefix for ids the normalizer has to synthesize.
    pub id_prefix: String,
    /// `None` when the first source succeeded.
    pub last_error_detail: Option<String>,
    pub skipped_rows: usize,
    pub truncated: bool,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.source_label == SAMPLE_SOURCE_LABEL
    }
}

enum State {
    Idle,
    TryingSource(usize),
    Succeeded(usize, ParsedBatch),
    ExhaustedFallback,
}

struct Failure {
    source: String,
    error: CatalogError,
}

pub struct SourceResolver {
    transport: Arc<dyn Transport>,
    sources: Vec<SourceSpec>,
    options: ParseOptions,
    attempt_timeout: Duration,
    total_budget: Duration,
}

impl SourceResolver {
    pub fn new(transport: Arc<dyn Transport>, sources: Vec<SourceSpec>) -> Self {
        Self {
            transport,
            sources,
            options: ParseOptions::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            total_budget: DEFAULT_TOTAL_BUDGET,
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeouts(mut self, attempt: Duration, total: Duration) -> Self {
        self.attempt_timeout = attempt;
        self.total_budget = total;
        self
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Walk the chain. Never fails: exhaustion yields the sample catalog.
    pub async fn resolve(&self) -> Resolution {
        let deadline = Instant::now() + self.total_budget;
        let mut failures: Vec<Failure> = Vec::new();
        let mut state = State::Idle;

        loop {
            state = match state {
                State::Idle if self.sources.is_empty() => State::ExhaustedFallback,
                State::Idle => State::TryingSource(0),
                State::TryingSource(index) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        warn!(skipped = self.sources.len() - index, "total fetch budget spent");
                        State::ExhaustedFallback
                    } else {
                        let source = &self.sources[index];
                        let limit = remaining.min(self.attempt_timeout);
                        let outcome = match timeout(limit, self.attempt(source)).await {
                            Ok(result) => result,
                            Err(_) => Err(CatalogError::Timeout(limit)),
                        };
                        match outcome {
                            Ok(batch) => State::Succeeded(index, batch),
                            Err(error) => {
                                warn!(source = %source.name, kind = ?error.kind(), %error, "source failed");
                                failures.push(Failure {
                                    source: source.name.clone(),
                                    error,
                                });
                                if index + 1 < self.sources.len() {
                                    State::TryingSource(index + 1)
                                } else {
                                    State::ExhaustedFallback
                                }
                            }
                        }
                    }
                }
                State::Succeeded(index, batch) => return self.succeeded(index, batch, &failures),
                State::ExhaustedFallback => return exhausted(&failures),
            };
        }
    }

    fn succeeded(&self, index: usize, batch: ParsedBatch, failures: &[Failure]) -> Resolution {
        let source = &self.sources[index];
        info!(
            source = %source.name,
            records = batch.records.len(),
            skipped = batch.skipped_rows,
            truncated = batch.truncated,
            "source succeeded"
        );
        let last_error_detail = (!failures.is_empty()).then(|| {
            let listed: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.source, f.error))
                .collect();
            format!("Primary error: {}", listed.join("; "))
        });
        Resolution {
            records: batch.records,
            source_label: source.name.clone(),
            id_prefix: source.format.id_prefix().to_string(),
            last_error_detail,
            skipped_rows: batch.skipped_rows,
            truncated: batch.truncated,
        }
    }

    #[instrument(skip_all, fields(source = %source.name, format = ?source.format))]
    async fn attempt(&self, source: &SourceSpec) -> CatalogResult<ParsedBatch> {
        let response = self.transport.open(source).await?;
        if !response.is_success() {
            return Err(status_error(response.status));
        }

        let SourceResponse { meta, body, .. } = response;
        let text = build_text_reader(StreamReader::new(body), &meta);
        let payload = sniff_payload(text).await?;
        match source.format {
            SourceFormat::Csv => parse_csv_stream(payload, &self.options).await,
            SourceFormat::Json => parse_json_stream(payload, &self.options).await,
        }
    }
}

fn status_error(status: u16) -> CatalogError {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unexpected status");
    CatalogError::Status {
        status,
        reason: reason.to_string(),
    }
}

fn exhausted(failures: &[Failure]) -> Resolution {
    let primary = failures
        .first()
        .map(|f| f.error.to_string())
        .unwrap_or_else(|| "no sources configured".to_string());
    warn!(attempted = failures.len(), "all sources failed; serving sample data");
    Resolution {
        records: sample_records(),
        source_label: SAMPLE_SOURCE_LABEL.to_string(),
        id_prefix: SAMPLE_ID_PREFIX.to_string(),
        last_error_detail: Some(format!(
            "All sources failed. Primary error: {primary}. Using sample data."
        )),
        skipped_rows: 0,
        truncated: false,
    }
}
