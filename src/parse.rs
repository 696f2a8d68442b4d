//! CSV and JSON parsing into [`ProductRecord`]s, bounded by a record cap.
//!
//! The streaming CSV path consumes the body chunk by chunk through
//! [`LineCodec`](crate::codec::LineCodec) and stops reading as soon as
//! `max_records` rows have been accepted; the remainder of the input is dropped
//! unread. Hitting the cap is not an error.

use crate::codec::LineCodec;
use crate::record::ProductRecord;
use crate::tokenize::{is_blank, parse_header, parse_row_bytes};
use crate::{CatalogError, CatalogResult};
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_RECORDS: usize = 1000;

/// Which CSV tokenizer to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvDialect {
    /// Hand-authored fixture rules: quote toggling, no `""` unescaping.
    #[default]
    Compat,
    /// Full RFC 4180 via `csv-async`.
    Rfc4180,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub max_records: usize,
    pub dialect: CsvDialect,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            dialect: CsvDialect::Compat,
        }
    }
}

impl ParseOptions {
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            max_records,
            ..Self::default()
        }
    }

    fn cap(&self) -> usize {
        self.max_records.max(1)
    }
}

/// Parser output for one source.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub headers: Vec<String>,
    pub records: Vec<ProductRecord>,
    /// Rows dropped individually (bad quoting, bad encoding, non-object JSON items).
    pub skipped_rows: usize,
    /// The record cap was reached; input after that point was not read.
    pub truncated: bool,
}

impl ParsedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared row handling for the streaming and buffered compat paths.
struct CompatRows {
    batch: ParsedBatch,
    cap: usize,
    line_no: usize,
    header_seen: bool,
}

impl CompatRows {
    fn new(options: &ParseOptions) -> Self {
        Self {
            batch: ParsedBatch::default(),
            cap: options.cap(),
            line_no: 0,
            header_seen: false,
        }
    }

    /// Returns `false` once the cap is reached and no more lines are wanted.
    fn push_line(&mut self, line: &[u8]) -> bool {
        self.line_no += 1;
        if is_blank(line) {
            return true;
        }

        if !self.header_seen {
            let text = String::from_utf8_lossy(line);
            self.batch.headers = parse_header(text.trim_start_matches('\u{feff}'));
            self.header_seen = true;
            debug!(headers = ?self.batch.headers, "csv header");
            return true;
        }

        match parse_row_bytes(line) {
            Ok(values) => {
                let index = self.batch.records.len();
                self.batch
                    .records
                    .push(ProductRecord::from_row(&self.batch.headers, values, index));
            }
            Err(e) => {
                self.batch.skipped_rows += 1;
                warn!(line = self.line_no, error = %e, "skipping malformed csv row");
            }
        }

        if self.batch.records.len() >= self.cap {
            self.batch.truncated = true;
            info!(max_records = self.cap, line = self.line_no, "record cap reached; abandoning rest of input");
            return false;
        }
        true
    }

    fn finish(self) -> CatalogResult<ParsedBatch> {
        finish_batch(self.batch)
    }
}

fn finish_batch(batch: ParsedBatch) -> CatalogResult<ParsedBatch> {
    if batch.records.is_empty() {
        let reason = if batch.headers.is_empty() {
            "no header row found"
        } else {
            "header present but no data rows"
        };
        return Err(CatalogError::Parse(reason.to_string()));
    }
    debug!(
        records = batch.records.len(),
        skipped = batch.skipped_rows,
        truncated = batch.truncated,
        "parsed batch"
    );
    Ok(batch)
}

/// Stream-parse CSV text (already decompressed/transcoded to UTF-8).
pub async fn parse_csv_stream<R>(reader: R, options: &ParseOptions) -> CatalogResult<ParsedBatch>
where
    R: AsyncRead + Unpin + Send,
{
    match options.dialect {
        CsvDialect::Compat => parse_compat_stream(reader, options).await,
        CsvDialect::Rfc4180 => parse_rfc4180_stream(reader, options).await,
    }
}

async fn parse_compat_stream<R>(reader: R, options: &ParseOptions) -> CatalogResult<ParsedBatch>
where
    R: AsyncRead + Unpin + Send,
{
    let mut lines = FramedRead::with_capacity(reader, LineCodec::new(), 1 << 16);
    let mut rows = CompatRows::new(options);

    while let Some(line) = lines.next().await {
        if !rows.push_line(&line?) {
            break;
        }
    }
    // Dropping the framed reader releases the underlying stream unread.
    drop(lines);
    rows.finish()
}

async fn parse_rfc4180_stream<R>(reader: R, options: &ParseOptions) -> CatalogResult<ParsedBatch>
where
    R: AsyncRead + Unpin + Send,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .buffer_capacity(1 << 16)
        .create_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .await?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let cap = options.cap();
    let mut batch = ParsedBatch {
        headers,
        ..ParsedBatch::default()
    };

    let mut record = StringRecord::new();
    loop {
        match rdr.read_record(&mut record).await {
            Ok(true) => {
                let values = record.iter().map(str::to_string).collect();
                let index = batch.records.len();
                batch
                    .records
                    .push(ProductRecord::from_row(&batch.headers, values, index));
                if batch.records.len() >= cap {
                    batch.truncated = true;
                    info!(max_records = cap, "record cap reached; abandoning rest of input");
                    break;
                }
            }
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv_async::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                batch.skipped_rows += 1;
                warn!(error = %e, "skipping malformed csv row");
            }
        }
    }
    finish_batch(batch)
}

/// Buffered compat parse of a whole CSV body.
pub fn parse_csv_str(text: &str, options: &ParseOptions) -> CatalogResult<ParsedBatch> {
    let mut rows = CompatRows::new(options);
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !rows.push_line(line.as_bytes()) {
            break;
        }
    }
    rows.finish()
}

/// Parse a JSON body: an array of objects, or a single object.
pub fn parse_json_str(text: &str, options: &ParseOptions) -> CatalogResult<ParsedBatch> {
    let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(CatalogError::Parse(format!(
                "expected a JSON array or object, found {}",
                json_type(&other)
            )))
        }
    };

    let cap = options.cap();
    let total = items.len();
    let mut batch = ParsedBatch::default();
    for (position, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(object) => {
                let index = batch.records.len();
                batch
                    .records
                    .push(ProductRecord::from_json_object(object, index));
            }
            other => {
                batch.skipped_rows += 1;
                warn!(position, found = json_type(&other), "skipping non-object JSON item");
            }
        }
        if batch.records.len() >= cap {
            batch.truncated = true;
            info!(max_records = cap, total, "record cap reached; ignoring remaining JSON items");
            break;
        }
    }

    if let Some(first) = batch.records.first() {
        batch.headers = first.fields.keys().cloned().collect();
    }
    finish_batch(batch)
}

/// Read a JSON body to the end, then parse it.
pub async fn parse_json_stream<R>(mut reader: R, options: &ParseOptions) -> CatalogResult<ParsedBatch>
where
    R: AsyncRead + Unpin + Send,
{
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).await?;
    let text = String::from_utf8(raw)
        .map_err(|e| CatalogError::Parse(format!("JSON body is not valid UTF-8: {e}")))?;
    parse_json_str(&text, options)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
