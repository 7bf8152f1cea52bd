//! Incremental decoding of event-stream chat responses.
//!
//! Wire format: records separated by a blank line, each a single
//! `data:` line carrying JSON, terminated by a `[DONE]` record.
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//!
//! data: [DONE]
//! ```
//!
//! [`StreamDecoder`] is fed raw bytes as they arrive. Complete records are
//! decoded immediately and their deltas passed to a callback in stream
//! order; the trailing partial record stays buffered until more bytes
//! arrive. A frame that is not valid JSON is dropped without ending the
//! stream.

use serde_json::Value;
use tracing::{debug, trace};

/// Marker that prefixes event payloads.
pub const DATA_MARKER: &str = "data:";

/// Payload that ends the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// JSON pointers tried for the text delta, in order.
pub const DEFAULT_DELTA_POINTERS: [&str; 2] = ["/choices/0/delta/content", "/delta"];

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for more bytes.
    Accumulating,
    /// The sentinel was seen or the source ended. Further input is ignored.
    Closed,
}

/// Pulls the text delta out of one decoded frame.
pub trait DeltaExtractor: Send {
    fn extract<'a>(&self, payload: &'a Value) -> Option<&'a str>;
}

/// Extracts the first string found at any of a list of JSON pointers.
#[derive(Debug, Clone)]
pub struct PointerExtractor {
    pointers: Vec<String>,
}

impl PointerExtractor {
    pub fn new<I, S>(pointers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pointers: pointers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for PointerExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DELTA_POINTERS)
    }
}

impl DeltaExtractor for PointerExtractor {
    fn extract<'a>(&self, payload: &'a Value) -> Option<&'a str> {
        self.pointers
            .iter()
            .find_map(|p| payload.pointer(p).and_then(Value::as_str))
    }
}

/// Byte-to-delta state machine for one stream.
#[derive(Debug)]
pub struct StreamDecoder<E = PointerExtractor> {
    buffer: String,
    /// Tail of a UTF-8 sequence split across chunks.
    pending: Vec<u8>,
    state: DecoderState,
    extractor: E,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::with_extractor(PointerExtractor::default())
    }
}

impl<E: DeltaExtractor> StreamDecoder<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self {
            buffer: String::new(),
            pending: Vec::new(),
            state: DecoderState::Accumulating,
            extractor,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == DecoderState::Closed
    }

    /// Text received but not yet part of a complete record.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Append a chunk and emit every delta it completes.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_delta: F) -> DecoderState
    where
        F: FnMut(&str),
    {
        if self.is_closed() {
            return self.state;
        }

        self.pending.extend_from_slice(chunk);
        self.decode_pending(false);

        while let Some((pos, len)) = find_boundary(&self.buffer) {
            let record = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + len);
            if self.process_record(&record, &mut on_delta) == DecoderState::Closed {
                self.buffer.clear();
                return self.state;
            }
        }

        self.state
    }

    /// The source ended: decode what is left and close.
    pub fn finish<F>(&mut self, mut on_delta: F) -> DecoderState
    where
        F: FnMut(&str),
    {
        if self.is_closed() {
            return self.state;
        }

        self.decode_pending(true);
        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            self.process_record(&rest, &mut on_delta);
        }
        self.close();
        self.state
    }

    /// Close without processing buffered input.
    pub fn close(&mut self) {
        self.state = DecoderState::Closed;
        self.buffer.clear();
        self.pending.clear();
    }

    fn process_record<F>(&mut self, record: &str, on_delta: &mut F) -> DecoderState
    where
        F: FnMut(&str),
    {
        let Some(data) = parse_sse_line(record.trim()) else {
            trace!("skipping non-data record");
            return self.state;
        };

        if is_done_marker(data) {
            debug!("stream sentinel received");
            self.state = DecoderState::Closed;
            return self.state;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(payload) => {
                if let Some(delta) = self.extractor.extract(&payload) {
                    if !delta.is_empty() {
                        on_delta(delta);
                    }
                }
            }
            Err(e) => debug!("dropping malformed stream frame: {}", e),
        }
        self.state
    }

    /// Move decodable bytes from `pending` into `buffer`. Invalid sequences
    /// become U+FFFD; an incomplete trailing sequence is kept unless `flush`.
    fn decode_pending(&mut self, flush: bool) {
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(s) => {
                    self.buffer.push_str(s);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.pending[start..valid]) {
                        self.buffer.push_str(s);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        None if flush => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = self.pending.len();
                            break;
                        }
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }
}

/// Position and length of the first record boundary (`\n\n` or `\r\n\r\n`).
fn find_boundary(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find("\n\n").map(|p| (p, 2));
    let crlf = buffer.find("\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse an SSE line to extract the data portion.
///
/// # Example
/// ```
/// use gaiarouter_admin::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"key\": \"value\"}"), Some("{\"key\": \"value\"}"));
/// assert_eq!(parse_sse_line("data:[DONE]"), Some("[DONE]"));
/// assert_eq!(parse_sse_line(": keep-alive"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_MARKER).map(|s| s.trim())
}

/// Check if an SSE data line indicates the stream is done.
///
/// # Example
/// ```
/// use gaiarouter_admin::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == DONE_MARKER
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "data: {\"delta\":\"a\"}\n\ndata: {\"delta\":\"b\"}\n\ndata: [DONE]\n\n";

    fn decode_chunks(chunks: &[&[u8]]) -> (Vec<String>, DecoderState) {
        let mut decoder = StreamDecoder::new();
        let mut out = Vec::new();
        for chunk in chunks {
            decoder.feed(chunk, |d| out.push(d.to_string()));
        }
        (out, decoder.state())
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(parse_sse_line("data:   spaces  "), Some("spaces"));
        assert_eq!(parse_sse_line("event: ping"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_is_done_marker() {
        assert!(is_done_marker("[DONE]"));
        assert!(!is_done_marker("data"));
        assert!(!is_done_marker("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_single_delivery() {
        let (out, state) = decode_chunks(&[STREAM.as_bytes()]);
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(state, DecoderState::Closed);
    }

    #[test]
    fn test_every_split_point_yields_same_deltas() {
        let bytes = STREAM.as_bytes();
        for i in 0..=bytes.len() {
            let (out, state) = decode_chunks(&[&bytes[..i], &bytes[i..]]);
            assert_eq!(out, vec!["a", "b"], "split at {i}");
            assert_eq!(state, DecoderState::Closed, "split at {i}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let chunks: Vec<&[u8]> = STREAM.as_bytes().chunks(1).collect();
        let (out, state) = decode_chunks(&chunks);
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(state, DecoderState::Closed);
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let input = "data: {\"delta\":\"x\"}\n\ndata: {bad\n\ndata: {\"delta\":\"y\"}\n\n";
        let (out, state) = decode_chunks(&[input.as_bytes()]);
        assert_eq!(out, vec!["x", "y"]);
        assert_eq!(state, DecoderState::Accumulating);
    }

    #[test]
    fn test_records_without_marker_are_ignored() {
        let input = ": keep-alive\n\nevent: ping\n\ndata: {\"delta\":\"z\"}\n\n";
        let (out, _) = decode_chunks(&[input.as_bytes()]);
        assert_eq!(out, vec!["z"]);
    }

    #[test]
    fn test_chat_completion_chunks() {
        let input = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let (out, state) = decode_chunks(&[input.as_bytes()]);
        assert_eq!(out, vec!["Hel", "lo"]);
        assert_eq!(state, DecoderState::Closed);
    }

    #[test]
    fn test_records_after_sentinel_are_dropped() {
        let input = "data: {\"delta\":\"a\"}\n\ndata: [DONE]\n\ndata: {\"delta\":\"late\"}\n\n";
        let mut decoder = StreamDecoder::new();
        let mut out = Vec::new();
        decoder.feed(input.as_bytes(), |d| out.push(d.to_string()));
        decoder.feed(b"data: {\"delta\":\"later\"}\n\n", |d| out.push(d.to_string()));
        assert_eq!(out, vec!["a"]);
        assert!(decoder.is_closed());
        assert!(decoder.buffered().is_empty());
    }

    #[test]
    fn test_partial_record_is_retained() {
        let mut decoder = StreamDecoder::new();
        let mut out = Vec::new();
        decoder.feed(b"data: {\"delta\":\"a\"}\n\ndata: {\"del", |d| out.push(d.to_string()));
        assert_eq!(out, vec!["a"]);
        assert_eq!(decoder.buffered(), "data: {\"del");
        decoder.feed(b"ta\":\"b\"}\n\n", |d| out.push(d.to_string()));
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_finish_flushes_trailing_record() {
        let mut decoder = StreamDecoder::new();
        let mut out = Vec::new();
        decoder.feed(b"data: {\"delta\":\"a\"}\n\ndata: {\"delta\":\"b\"}", |d| {
            out.push(d.to_string())
        });
        assert_eq!(out, vec!["a"]);
        assert_eq!(decoder.finish(|d| out.push(d.to_string())), DecoderState::Closed);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn test_crlf_boundaries() {
        let input = "data: {\"delta\":\"a\"}\r\n\r\ndata: {\"delta\":\"b\"}\r\n\r\ndata: [DONE]\r\n\r\n";
        let (out, state) = decode_chunks(&[input.as_bytes()]);
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(state, DecoderState::Closed);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let input = "data: {\"delta\":\"héllo 世界\"}\n\n".as_bytes();
        // Split inside the three-byte encoding of '世'.
        let split = input.iter().position(|&b| b == 0xE4).unwrap() + 1;
        let (out, _) = decode_chunks(&[&input[..split], &input[split..]]);
        assert_eq!(out, vec!["héllo 世界"]);
    }

    #[test]
    fn test_custom_extractor() {
        let mut decoder =
            StreamDecoder::with_extractor(PointerExtractor::new(["/output/text"]));
        let mut out = Vec::new();
        decoder.feed(b"data: {\"output\":{\"text\":\"ok\"}}\n\n", |d| out.push(d.to_string()));
        assert_eq!(out, vec!["ok"]);
    }
}
