// src/infrastructure/market/sse.rs
// Incremental decoder for text/event-stream bodies

#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

const DEFAULT_EVENT: &str = "message";

/// Upper bound on an unfinished frame: partial line plus buffered data.
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Accepts the body in arbitrary chunks; a frame is yielded once its
/// terminating blank line has arrived.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    max_pending: usize,
    /// Set after an oversized frame until its terminating blank line.
    skipping: bool,
    skipped_in_line: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            data_len: 0,
            max_pending,
            skipping: false,
            skipped_in_line: false,
        }
    }

    /// Only the new chunk is scanned for line breaks.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        let mut start = 0;

        for end in newline_positions(chunk) {
            self.push_partial(&chunk[start..end]);
            start = end + 1;

            let mut line = std::mem::take(&mut self.buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if self.skipping {
                if !self.skipped_in_line {
                    self.skipping = false;
                }
                self.skipped_in_line = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        self.push_partial(&chunk[start..]);
        frames
    }

    fn push_partial(&mut self, bytes: &[u8]) {
        if self.skipping {
            self.skipped_in_line |= bytes.iter().any(|b| *b != b'\r');
            return;
        }
        if self.buffer.len() + bytes.len() + self.data_len > self.max_pending {
            log::warn!(
                "Dropping event stream frame larger than {} bytes",
                self.max_pending
            );
            self.buffer.clear();
            self.event = None;
            self.data.clear();
            self.data_len = 0;
            self.skipping = true;
            self.skipped_in_line = true;
            return;
        }
        self.buffer.extend_from_slice(bytes);
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data_len += value.len();
                self.data.push(value.to_string());
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        self.data_len = 0;
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
        })
    }
}

fn newline_positions(chunk: &[u8]) -> impl Iterator<Item = usize> + '_ {
    chunk
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_event() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"event: snapshot\ndata: {\"indices\":[]}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "snapshot".into(),
                data: "{\"indices\":[]}".into(),
            }]
        );
    }

    #[test]
    fn handles_arbitrary_chunking() {
        let payload = b"event: snapshot\r\ndata: {\"a\":1}\r\n\r\nevent: snapshot\ndata: {\"a\":2}\n\n";
        let mut decoder = SseDecoder::new();
        let mut frames = Vec::new();
        for chunk in payload.chunks(3) {
            frames.extend(decoder.feed(chunk));
        }
        let data: Vec<&str> = frames.iter().map(|f| f.data.as_str()).collect();
        assert_eq!(data, vec!["{\"a\":1}", "{\"a\":2}"]);
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b": keep-alive\n\ndata: line one\ndata:line two\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "line one\nline two");
    }

    #[test]
    fn incomplete_frame_is_held_back() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: snapshot\ndata: {}").is_empty());
        assert!(decoder.feed(b"\n").is_empty());
        assert_eq!(decoder.feed(b"\n").len(), 1);
    }

    #[test]
    fn oversized_frame_is_dropped_and_decoding_resumes() {
        let mut decoder = SseDecoder::with_limit(32);
        let huge = vec![b'x'; 100];

        assert!(decoder.feed(b"event: snapshot\ndata: ").is_empty());
        for _ in 0..50 {
            assert!(decoder.feed(&huge).is_empty());
        }
        assert!(decoder.buffer.is_empty());

        assert!(decoder.feed(b"\ndata: more\n\n").is_empty());
        let frames = decoder.feed(b"event: snapshot\ndata: {}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "snapshot".into(),
                data: "{}".into(),
            }]
        );
    }
}
