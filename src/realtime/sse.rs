//! Incremental `text/event-stream` decoder
//!
//! Bytes can be fed in arbitrary chunks; the dispatched events do not depend
//! on where the chunk boundaries fall.

use super::events::{SseEvent, DEFAULT_EVENT};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decoder state for one event stream
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, unterminated line. Not capped, like
    /// `EventSource`: a whole document arrives as one `data:` line, and only
    /// the new bytes of each chunk are scanned.
    buf: Vec<u8>,
    /// Previous chunk ended in `\r`; a leading `\n` belongs to that line ending
    pending_cr: bool,
    bom_checked: bool,
    data: String,
    event_type: String,
    last_event_id: Option<String>,
    retry_ms: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the stream, returning every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        let mut chunk = chunk;

        if chunk.is_empty() {
            return events;
        }
        if self.pending_cr {
            self.pending_cr = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }

        let scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let mut i = scan_from;
        if !self.bom_checked {
            if self.buf.len() < BOM.len() && BOM.starts_with(&self.buf) {
                return events;
            }
            if self.buf.starts_with(BOM) {
                self.buf.drain(..BOM.len());
            }
            self.bom_checked = true;
            i = 0;
        }

        let mut start = 0;
        while i < self.buf.len() {
            match self.buf[i] {
                b'\n' => {
                    let line = String::from_utf8_lossy(&self.buf[start..i]).into_owned();
                    self.process_line(&line, &mut events);
                    start = i + 1;
                }
                b'\r' => {
                    let line = String::from_utf8_lossy(&self.buf[start..i]).into_owned();
                    self.process_line(&line, &mut events);
                    match self.buf.get(i + 1) {
                        Some(b'\n') => i += 1,
                        Some(_) => {}
                        None => self.pending_cr = true,
                    }
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }

        self.buf.drain(..start);
        events
    }

    /// Forget the partial line and the pending event, as on a new connection.
    ///
    /// The last event id and the reconnection time survive.
    pub fn reset_stream(&mut self) {
        self.buf.clear();
        self.pending_cr = false;
        self.bom_checked = false;
        self.data.clear();
        self.event_type.clear();
    }

    /// Id to send as `Last-Event-ID` when reconnecting
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Reconnection time requested by the server
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse() {
                        self.retry_ms = Some(ms);
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        if self.data.is_empty() {
            self.event_type.clear();
            return;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        let event = if self.event_type.is_empty() {
            DEFAULT_EVENT.to_string()
        } else {
            std::mem::take(&mut self.event_type)
        };

        events.push(SseEvent {
            event,
            data,
            last_event_id: self.last_event_id.clone(),
        });
    }
}
