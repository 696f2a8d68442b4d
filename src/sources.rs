//! Transport seam: opening a configured source as a byte stream, and sniffing
//! the first decoded bytes before a parser sees them.

use crate::config::SourceSpec;
use crate::io::{meta_from_content_type, meta_from_path, SourceMeta};
use crate::{CatalogError, CatalogResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{
    HeaderName, ACCEPT, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::ReaderStream;

pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

const HTML_MARKERS: &[&[u8]] = &[b"<!DOCTYPE", b"<html"];
const SNIFF_LOOKAHEAD: usize = 9;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An opened source: status, content metadata, and the raw (possibly compressed) body.
pub struct SourceResponse {
    pub status: u16,
    pub meta: SourceMeta,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl SourceResponse {
    pub fn new(status: u16, meta: SourceMeta, body: ByteStream) -> Self {
        Self {
            status,
            meta,
            content_length: None,
            body,
        }
    }

    /// Whole body in one chunk.
    pub fn from_bytes(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let meta = meta_from_content_type(Some(content_type), None, "");
        let mut response = Self::new(status, meta, stream::iter([Ok(body.clone())]).boxed());
        response.content_length = Some(body.len() as u64);
        response
    }

    /// Body delivered as the given sequence of chunks (and chunk errors).
    pub fn from_chunks(status: u16, meta: SourceMeta, chunks: Vec<io::Result<Bytes>>) -> Self {
        Self::new(status, meta, stream::iter(chunks).boxed())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResponse")
            .field("status", &self.status)
            .field("meta", &self.meta)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens one source. Implementations report transport problems only; status
/// checks and payload classification happen in the resolver.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, source: &SourceSpec) -> CatalogResult<SourceResponse>;
}

/// `reqwest` for `http(s)://`, the local filesystem for `file://`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, connect_timeout: Duration) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn open_file(&self, path: PathBuf) -> CatalogResult<SourceResponse> {
        let file = tokio::fs::File::open(&path).await?;
        let len = file.metadata().await.ok().map(|m| m.len());
        let mut response = SourceResponse::new(200, meta_from_path(&path), ReaderStream::new(file).boxed());
        response.content_length = len;
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, source: &SourceSpec) -> CatalogResult<SourceResponse> {
        if let Some(path) = source.url.strip_prefix("file://") {
            return self.open_file(PathBuf::from(path)).await;
        }

        let response = self
            .client
            .get(&source.url)
            .header(ACCEPT, source.format.accept_header())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let headers = response.headers();
        let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        let meta = meta_from_content_type(header(CONTENT_TYPE), header(CONTENT_ENCODING), name_hint(&source.url));
        let content_length = header(CONTENT_LENGTH).and_then(|v| v.parse().ok());
        let status = response.status().as_u16();

        let body = response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)).boxed();
        let mut opened = SourceResponse::new(status, meta, body);
        opened.content_length = content_length;
        Ok(opened)
    }
}

/// Last path segment of a URL, without query or fragment.
fn name_hint(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}

/// Buffer decoded text only until the payload can be classified, then hand back
/// a reader that replays the buffered prefix ahead of the rest of the stream.
///
/// Bodies that are empty after a leading BOM and whitespace, or that open with
/// an HTML marker, are `InvalidPayload`.
pub async fn sniff_payload<R>(mut reader: R) -> CatalogResult<impl AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send,
{
    let mut prefix: Vec<u8> = Vec::with_capacity(256);
    let mut chunk = [0u8; 256];
    loop {
        if let Some(start) = content_start(&prefix) {
            if prefix.len() - start >= SNIFF_LOOKAHEAD {
                break;
            }
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        prefix.extend_from_slice(&chunk[..n]);
    }

    let start = content_start(&prefix)
        .ok_or_else(|| CatalogError::InvalidPayload("empty body".into()))?;
    let head = &prefix[start..];
    if HTML_MARKERS.iter().any(|marker| head.starts_with(marker)) {
        return Err(CatalogError::InvalidPayload(
            "received an HTML page instead of catalog data".into(),
        ));
    }

    Ok(io::Cursor::new(prefix).chain(reader))
}

/// Offset of the first byte past an optional BOM and any ASCII whitespace.
fn content_start(prefix: &[u8]) -> Option<usize> {
    let skip = if prefix.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
    prefix[skip..]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|pos| skip + pos)
}
