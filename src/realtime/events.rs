//! Push channel event types

use serde::{Deserialize, Serialize};

/// Event name used when the stream does not name an event
pub const DEFAULT_EVENT: &str = "message";

/// Datastar event carrying an element patch
pub const PATCH_ELEMENTS_EVENT: &str = "datastar-patch-elements";

/// Datastar event carrying a script to run in the page
pub const EXECUTE_SCRIPT_EVENT: &str = "datastar-execute-script";

/// Kinds of push channel events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Unnamed event, delivered to `onmessage`
    Message,
    PatchElements,
    ExecuteScript,
    /// Any other named event
    Other,
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            DEFAULT_EVENT => EventKind::Message,
            PATCH_ELEMENTS_EVENT => EventKind::PatchElements,
            EXECUTE_SCRIPT_EVENT => EventKind::ExecuteScript,
            _ => EventKind::Other,
        }
    }
}

/// A dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Event name (`message` unless the stream set one)
    pub event: String,
    /// Data lines joined by `\n`
    pub data: String,
    /// Last event id seen on the stream when this event was dispatched
    pub last_event_id: Option<String>,
}

impl SseEvent {
    /// Create an unnamed event with the given payload
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: DEFAULT_EVENT.to_string(),
            data: data.into(),
            last_event_id: None,
        }
    }

    /// Create a named event
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            last_event_id: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_name(&self.event)
    }
}

/// Element patch sent as a `datastar-patch-elements` event.
///
/// The data lines look like `selector article#markdown`, `mode inner` and
/// one or more `elements <html>` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchElements {
    pub selector: Option<String>,
    pub mode: Option<String>,
    pub elements: String,
}

impl PatchElements {
    pub fn parse(data: &str) -> Self {
        let mut patch = PatchElements::default();
        let mut elements: Vec<&str> = Vec::new();

        for line in data.split('\n') {
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "selector" => patch.selector = Some(value.to_string()),
                "mode" => patch.mode = Some(value.to_string()),
                "elements" => elements.push(value),
                _ => {}
            }
        }

        patch.elements = elements.join("\n");
        patch
    }

    /// Whether this patch replaces the inner content of `selector`.
    /// A patch without a mode line uses Datastar's default `outer` mode.
    pub fn replaces_inner_of(&self, selector: &str) -> bool {
        let mode_ok = self.mode.as_deref().map(str::trim) == Some("inner");
        let selector_ok = self.selector.as_deref().map(str::trim) == Some(selector);
        mode_ok && selector_ok
    }
}
