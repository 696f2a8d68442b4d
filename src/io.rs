use crate::CatalogResult;
use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::codec::Transcoder;

#[derive(Debug, Clone)]
pub struct SourceMeta {
    /// e.g. "text/csv; charset=utf-8" or "application/gzip"
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// last path segment of the source location (used for extension fallback)
    pub name_hint: String,
    /// Which character encoding to expect (defaults to UTF-8)
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for SourceMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl SourceMeta {
    pub fn is_gzip(&self) -> bool {
        let ce = self.content_encoding.to_ascii_lowercase();
        let ct = self.media_type();
        ce.split(',').any(|s| s.trim() == "gzip")
            || matches!(ct.as_str(), "application/gzip" | "application/x-gzip")
            || self.name_hint.ends_with(".gz")
    }

    pub fn is_zstd(&self) -> bool {
        let ce = self.content_encoding.to_ascii_lowercase();
        ce.split(',').any(|s| s.trim() == "zstd")
            || self.media_type() == "application/zstd"
            || self.name_hint.ends_with(".zst")
    }

    /// Content type without parameters, lower-cased.
    fn media_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

/// Build meta from response headers. An unknown or absent `charset` parameter
/// leaves UTF-8 in place.
pub fn meta_from_content_type(
    content_type: Option<&str>,
    content_encoding: Option<&str>,
    name_hint: &str,
) -> SourceMeta {
    let content_type = content_type.unwrap_or_default().to_string();
    let charset = content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, v)| encoding_rs::Encoding::for_label(v.trim().trim_matches('"').as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);

    SourceMeta {
        content_type,
        content_encoding: content_encoding.unwrap_or_default().to_string(),
        name_hint: name_hint.to_string(),
        charset,
    }
}

/// Best-effort meta for a local file, from its extension only.
pub fn meta_from_path(path: &Path) -> SourceMeta {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut meta = SourceMeta {
        name_hint: name,
        ..Default::default()
    };

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match ext {
        "gz" => {
            meta.content_type = "application/gzip".into();
            meta.content_encoding = "gzip".into();
        }
        "zst" => {
            meta.content_type = "application/zstd".into();
            meta.content_encoding = "zstd".into();
        }
        "json" => meta.content_type = "application/json".into(),
        _ => meta.content_type = "text/csv".into(),
    }
    meta
}

/// From a generic AsyncRead, wrap with optional decompression and UTF-8 transcoding.
/// The returned reader always yields UTF-8 text bytes.
pub fn build_text_reader<R>(raw: R, meta: &SourceMeta) -> impl AsyncRead + Unpin + Send
where
    R: AsyncRead + Unpin + Send + 'static,
{
    // 1) decompression choice: encoding -> type -> extension
    let buf = BufReader::with_capacity(1 << 16, raw);
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = if meta.is_gzip() {
        Box::new(GzipDecoder::new(buf))
    } else if meta.is_zstd() {
        Box::new(ZstdDecoder::new(buf))
    } else {
        Box::new(buf)
    };

    // 2) transcoding only when charset != UTF-8
    let text: Box<dyn AsyncRead + Unpin + Send> = if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let framed = FramedRead::new(decompressed, Transcoder::new(meta.charset));
        Box::new(StreamReader::new(framed))
    };

    text
}

/// Open a local file as a text reader (meta from extension).
pub async fn reader_from_path(path: &Path) -> CatalogResult<(impl AsyncRead + Unpin + Send, SourceMeta)> {
    let file = File::open(path).await?;
    let meta = meta_from_path(path);
    let reader = build_text_reader(file, &meta);
    Ok((reader, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn reads_charset_parameter() {
        let meta = meta_from_content_type(Some("text/csv; charset=ISO-8859-1"), None, "x.csv");
        assert_eq!(meta.charset, encoding_rs::WINDOWS_1252);

        let meta = meta_from_content_type(Some("text/csv; charset=\"utf-8\""), None, "x.csv");
        assert_eq!(meta.charset, encoding_rs::UTF_8);

        let meta = meta_from_content_type(Some("text/csv; charset=klingon"), None, "x.csv");
        assert_eq!(meta.charset, encoding_rs::UTF_8);
    }

    #[test]
    fn detects_compression_from_any_hint() {
        assert!(meta_from_content_type(Some("application/gzip"), None, "data").is_gzip());
        assert!(meta_from_content_type(None, Some("br, gzip"), "data").is_gzip());
        assert!(meta_from_path(Path::new("/tmp/products.csv.zst")).is_zstd());
        assert!(!meta_from_path(Path::new("/tmp/products.csv")).is_gzip());
    }

    #[tokio::test]
    async fn transcodes_non_utf8_bodies() {
        let meta = meta_from_content_type(Some("text/csv; charset=windows-1252"), None, "x.csv");
        let raw: &'static [u8] = b"name\ncaf\xe9\n";
        let mut reader = build_text_reader(raw, &meta);
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "name\ncafé\n");
    }
}
