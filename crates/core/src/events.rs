//! Per-stage deliberation events. The Senate and Elder push through this
//! trait without knowing what, if anything, consumes the events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliberationEvent {
    SenateConvening { mission: String },
    OnyxPrecheckStart,
    OnyxPrecheckComplete { vote: Value },
    OnyxPrecheckVeto { vote: Value },
    IgnisForgeStart,
    IgnisForgeComplete { proposal_len: usize, preview: String },
    HydraStart,
    HydraComplete { findings_count: usize },
    HydraSkipped { reason: String },
    OnyxFinalStart,
    OnyxFinalComplete { vote: Value },
    HydraOverrideTriggered { unacknowledged_count: usize },
    MissionApproved { case_id: String },
    MissionRefused { case_id: String },
}

/// A push-only sink. `Senate`/`Elder` call `emit`; a transport adapter is
/// responsible for turning events into whatever the caller actually wants
/// (an SSE stream, a WebSocket frame, a log line).
pub trait DeliberationSink: Send + Sync {
    fn emit(&self, event: DeliberationEvent);
}

/// Drops every event. The default for callers that don't need streaming.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DeliberationSink for NullSink {
    fn emit(&self, _event: DeliberationEvent) {}
}

/// Records every event in arrival order. Used by tests that assert on the
/// exact stage sequence a mission produced.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<DeliberationEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeliberationEvent> {
        self.events.lock().expect("memory sink mutex poisoned").clone()
    }
}

impl DeliberationSink for MemorySink {
    fn emit(&self, event: DeliberationEvent) {
        self.events.lock().expect("memory sink mutex poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        sink.emit(DeliberationEvent::SenateConvening { mission: "m".into() });
        sink.emit(DeliberationEvent::OnyxPrecheckStart);
        let events = sink.events();
        assert_eq!(events.len(), 2);
        matches!(events[0], DeliberationEvent::SenateConvening { .. });
        matches!(events[1], DeliberationEvent::OnyxPrecheckStart);
    }
}
