//! Per-page playback session state.
//!
//! Holds the one-shot selector gate for the current source and the URL the
//! quality menu is labelled from. Both are written only by the controller
//! in response to player events and play requests.

/// One-shot gate guarding selector activation for the current source.
///
/// Closed (not ready) after every source start; opened by the first
/// successful activation and kept open until the next source start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorGate {
    ready: bool,
}

impl SelectorGate {
    pub fn is_ready(self) -> bool {
        self.ready
    }

    /// Re-arms the gate for a new source.
    pub fn reset(&mut self) {
        self.ready = false;
    }

    /// Marks activation as done. Returns `false` if it already was.
    pub fn mark_ready(&mut self) -> bool {
        !std::mem::replace(&mut self.ready, true)
    }
}

/// Mutable state shared by the controller's event handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    gate: SelectorGate,
    label_source: Option<String>,
    source_generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self) -> SelectorGate {
        self.gate
    }

    pub fn is_selector_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Records that the selector was activated for the current source.
    pub fn mark_selector_ready(&mut self) -> bool {
        self.gate.mark_ready()
    }

    /// Handles a source start: closes the gate and bumps the generation.
    pub fn begin_source(&mut self) {
        self.gate.reset();
        self.source_generation += 1;
    }

    /// Counts source starts observed so far.
    pub fn source_generation(&self) -> u64 {
        self.source_generation
    }

    /// Remembers the URL of an accepted play request for relabelling.
    pub fn set_label_source(&mut self, url: impl Into<String>) {
        self.label_source = Some(url.into());
    }

    /// URL of the most recent accepted play request, if any.
    pub fn label_source(&self) -> Option<&str> {
        self.label_source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_opens_once_per_source() {
        let mut session = SessionState::new();
        assert!(!session.is_selector_ready());

        assert!(session.mark_selector_ready());
        assert!(!session.mark_selector_ready());
        assert!(session.is_selector_ready());

        session.begin_source();
        assert!(!session.is_selector_ready());
        assert!(session.mark_selector_ready());
    }

    #[test]
    fn test_begin_source_keeps_label_source() {
        let mut session = SessionState::new();
        assert_eq!(session.label_source(), None);

        session.set_label_source("https://x/v.m3u8?tr=sr-360_720");
        session.begin_source();
        session.begin_source();

        assert_eq!(session.label_source(), Some("https://x/v.m3u8?tr=sr-360_720"));
        assert_eq!(session.source_generation(), 2);
    }
}
