//! Server-Sent Events Parser
//!
//! Incremental parser for the Realtime Database streaming REST endpoint
//! (`Accept: text/event-stream`). Chunks may split records, lines, or even
//! multi-byte characters; bytes are buffered until a full line arrives.

/// One parsed event-stream record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name from the `event:` field ("put", "patch", "keep-alive", ...)
    pub name: String,
    /// Concatenated `data:` payload
    pub data: String,
}

/// Incremental event-stream parser
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    name: String,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every record completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.flush() {
                    events.push(event);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.name = rest.trim_start().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            }
            // Comment lines (":") and unknown fields are ignored
        }
        events
    }

    fn flush(&mut self) -> Option<SseEvent> {
        if self.name.is_empty() && self.data.is_empty() {
            return None;
        }
        let event = SseEvent {
            name: std::mem::take(&mut self.name),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(event)
    }
}
