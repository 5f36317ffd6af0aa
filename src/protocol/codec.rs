//! Newline-delimited JSON framing for stream events.
//!
//! The listing response is a sequence of JSON objects, one per line. Writers
//! append `\n` after every event; readers must reassemble lines from arbitrary
//! chunk boundaries since a network read may end anywhere, including inside a
//! multi-byte UTF-8 sequence.

use bytes::Bytes;

use super::event::StreamEvent;

/// Encode one event as a single NDJSON line (trailing `\n` included).
pub fn encode_event(event: &StreamEvent) -> Result<Bytes, serde_json::Error> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// Parse one line into an event.
pub fn decode_line(line: &str) -> Result<StreamEvent, serde_json::Error> {
    serde_json::from_str(line)
}

/// Incremental line splitter for an NDJSON byte stream.
///
/// Bytes are buffered until a `\n` arrives, so a partial trailing line is kept
/// across calls to [`push`](Self::push). Splitting happens on raw bytes, which
/// keeps multi-byte characters intact when a chunk ends mid-sequence. Blank
/// lines are dropped and a trailing `\r` is stripped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|&b| b == b'\n')
            .filter_map(normalize_line)
            .collect()
    }

    /// Flush the trailing fragment left when the stream ends without `\n`.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        normalize_line(&rest)
    }

    /// Number of buffered bytes that do not yet form a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn normalize_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
