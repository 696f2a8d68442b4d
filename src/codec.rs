use bytes::{Buf, BytesMut};
use encoding_rs::CoderResult;
use std::io;
use tokio_util::codec::Decoder;

/// Re-encodes a non-UTF-8 body into UTF-8 chunk by chunk.
///
/// Multi-byte sequences split across chunk boundaries stay inside the
/// `encoding_rs` decoder state until the next chunk arrives.
pub struct Transcoder {
    decoder: encoding_rs::Decoder,
}

impl Transcoder {
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_without_bom_handling(),
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> BytesMut {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or_else(|| src.len() * 3 + 4);
        let mut out = vec![0u8; capacity];
        let mut read_total = 0;
        let mut written_total = 0;

        loop {
            let (result, read, written, _replaced) =
                self.decoder
                    .decode_to_utf8(&src[read_total..], &mut out[written_total..], last);
            read_total += read;
            written_total += written;
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => out.resize(out.len() * 2, 0),
            }
        }

        src.advance(read_total);
        BytesMut::from(&out[..written_total])
    }
}

impl Decoder for Transcoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let out = self.transcode(src, false);
        if out.is_empty() {
            // Only a partial sequence so far; wait for more input.
            return Ok(None);
        }
        Ok(Some(out))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let out = self.transcode(buf, true);
        buf.clear();
        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(out))
        }
    }
}

/// Splits a byte stream on `\n`, yielding each line without its terminator.
///
/// The partial tail of the last chunk stays buffered until a newline (or end of
/// stream) arrives. A trailing `\r` is dropped so CRLF files read the same as LF
/// files. Splitting on the raw byte is safe for UTF-8 input because 0x0A never
/// occurs inside a multi-byte sequence.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Bytes already scanned without finding a newline.
    scanned: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_line(mut line: BytesMut) -> BytesMut {
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        line
    }
}

impl Decoder for LineCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match memchr::memchr(b'\n', &src[self.scanned..]) {
            Some(offset) => {
                let end = self.scanned + offset;
                self.scanned = 0;
                let mut line = src.split_to(end + 1);
                line.truncate(end);
                Ok(Some(Self::take_line(line)))
            }
            None => {
                self.scanned = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        self.scanned = 0;
        if buf.is_empty() {
            Ok(None)
        } else {
            let rest = buf.split_to(buf.len());
            Ok(Some(Self::take_line(rest)))
        }
    }
}
