//! Incremental parser for `text/event-stream` bodies.
//!
//! Only the parts the order server emits are understood: `event:` and `data:` fields, with a blank line closing each
//! frame. Comments (`:`) and `id:`/`retry:` fields are skipped. Chunks can split a frame, or a line, anywhere.
use food_order_engine::notifications::SyncEvent;
use log::*;

use crate::errors::TransportError;

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the body and returns every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<SyncEvent, TransportError>> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => trace!("🔄️ Skipping SSE field {field}"),
            }
        }
        events
    }

    fn dispatch(&mut self) -> Option<Result<SyncEvent, TransportError>> {
        let kind = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        let result = serde_json::from_str::<SyncEvent>(&data).map_err(|e| {
            TransportError::InvalidResponse(format!("Could not parse {} frame. {e}", kind.as_deref().unwrap_or("an")))
        });
        Some(result)
    }
}
