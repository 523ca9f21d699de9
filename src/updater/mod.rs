//! Page updater
//!
//! Places rendered documents into the container and runs the two
//! post-processing steps after every replacement: syntax highlighting under
//! the container, then math typesetting over the whole document. The push
//! channel's `"false"` payload is a no-op.
//!
//! The updater is host independent. Hosts provide a [`Container`], a
//! [`Highlighter`] and a [`Typesetter`]; the browser host drives the DOM,
//! the native host writes a mirror file.

#[cfg(feature = "client")]
mod runner;

#[cfg(feature = "client")]
pub use runner::{load_once, run, run_until};

use serde::Serialize;

use crate::error::Result;
use crate::realtime::{EventKind, PatchElements, SseEvent};
use crate::types::{RenderedDocument, DEFAULT_SELECTOR, SENTINEL};

/// The single element whose content is replaced by rendered output
pub trait Container {
    /// Replace the whole content with `html`, verbatim
    fn replace_content(&mut self, html: &str) -> Result<()>;

    /// Current content
    fn content(&self) -> String;
}

/// Syntax highlighting over the container's subtree
pub trait Highlighter<C: ?Sized> {
    fn highlight_all_under(&mut self, container: &C) -> Result<()>;
}

/// Math typesetting over the whole document.
///
/// The container is passed so the typesetter can reach the document holding it.
pub trait Typesetter<C: ?Sized> {
    fn typeset(&mut self, container: &C) -> Result<()>;
}

/// What a push channel event means for the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Sentinel payload, nothing to do
    Skip,
    /// Replace the container content
    Replace(RenderedDocument),
    /// Event not addressed to the updater
    Ignore(EventKind),
}

impl Update {
    /// Classify `event` for a container matched by `selector`
    pub fn classify(event: &SseEvent, selector: &str) -> Self {
        match event.kind() {
            EventKind::Message => {
                if event.data == SENTINEL {
                    Update::Skip
                } else {
                    Update::Replace(RenderedDocument::new(event.data.as_str()))
                }
            }
            EventKind::PatchElements => {
                let patch = PatchElements::parse(&event.data);
                if patch.replaces_inner_of(selector) {
                    Update::Replace(RenderedDocument::new(patch.elements))
                } else {
                    Update::Ignore(EventKind::PatchElements)
                }
            }
            kind => Update::Ignore(kind),
        }
    }
}

/// Counters kept by the updater
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdaterStats {
    pub initial_loads: u64,
    pub updates_applied: u64,
    pub sentinels_skipped: u64,
    pub events_ignored: u64,
    pub highlight_runs: u64,
    pub typeset_runs: u64,
    pub postprocess_failures: u64,
}

/// Reacts to the initial load and to push channel messages
pub struct PageUpdater<C, H, T> {
    container: C,
    highlighter: H,
    typesetter: T,
    selector: String,
    stats: UpdaterStats,
}

impl<C, H, T> PageUpdater<C, H, T>
where
    C: Container,
    H: Highlighter<C>,
    T: Typesetter<C>,
{
    pub fn new(container: C, highlighter: H, typesetter: T) -> Self {
        Self {
            container,
            highlighter,
            typesetter,
            selector: DEFAULT_SELECTOR.to_string(),
            stats: UpdaterStats::default(),
        }
    }

    /// Selector the container answers to in element patches
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Render the body of the initial `init` response
    pub fn load_initial(&mut self, body: impl Into<RenderedDocument>) -> Result<()> {
        let doc = body.into();
        tracing::debug!("Initial content received ({} bytes)", doc.len());
        self.render(&doc)?;
        self.stats.initial_loads += 1;
        Ok(())
    }

    /// Handle an `onmessage` payload
    pub fn handle_payload(&mut self, payload: &str) -> Result<Update> {
        self.handle_message(&SseEvent::message(payload))
    }

    /// Handle one push channel event
    pub fn handle_message(&mut self, event: &SseEvent) -> Result<Update> {
        let update = Update::classify(event, &self.selector);

        match &update {
            Update::Skip => {
                self.stats.sentinels_skipped += 1;
                tracing::trace!("Sentinel received, content unchanged");
            }
            Update::Replace(doc) => {
                self.render(doc)?;
                self.stats.updates_applied += 1;
                tracing::debug!("Content updated ({} bytes)", doc.len());
            }
            Update::Ignore(kind) => {
                self.stats.events_ignored += 1;
                tracing::debug!("Ignoring {:?} event '{}'", kind, event.event);
            }
        }

        Ok(update)
    }

    fn render(&mut self, doc: &RenderedDocument) -> Result<()> {
        self.container.replace_content(doc.as_str())?;

        self.stats.highlight_runs += 1;
        if let Err(e) = self.highlighter.highlight_all_under(&self.container) {
            self.stats.postprocess_failures += 1;
            tracing::warn!("Syntax highlighting failed: {}", e);
        }

        self.stats.typeset_runs += 1;
        if let Err(e) = self.typesetter.typeset(&self.container) {
            self.stats.postprocess_failures += 1;
            tracing::warn!("Math typesetting failed: {}", e);
        }

        Ok(())
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    pub fn typesetter(&self) -> &T {
        &self.typesetter
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn stats(&self) -> UpdaterStats {
        self.stats
    }
}
