//! Event tracing for debugging framewm.
//!
//! Keeps a ring buffer of recent notifications and state transitions that
//! `framewmctl events` can pull over IPC.

use std::collections::VecDeque;
use std::time::Instant;

use crate::ipc::EventLogEntry;
use crate::state::StateTransition;

/// Entries kept before the oldest are dropped
const TRACE_CAPACITY: usize = 1000;

/// Bounded log of what the manager saw and did, oldest first
pub struct EventTracer {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
    next_sequence: u64,
    started: Instant,
}

impl EventTracer {
    pub fn new() -> Self {
        Self::bounded(TRACE_CAPACITY)
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 1,
            started: Instant::now(),
        }
    }

    /// Record an incoming notification
    pub fn trace_notification(&mut self, kind: &str, window: Option<u32>, details: String) {
        self.push(kind, window, details);
    }

    /// Record a lifecycle transition
    pub fn trace_transition(&mut self, transition: &StateTransition) {
        match transition {
            StateTransition::FrameCreated { client, decoration } => self.push(
                "frame_created",
                Some(*client),
                format!("decoration=0x{:x}", decoration),
            ),
            StateTransition::FrameRemoved { client, reason } => {
                let reason = serde_json::to_string(reason).unwrap_or_default();
                self.push("frame_removed", Some(*client), reason)
            }
            StateTransition::FullscreenChanged { client, fullscreen } => self.push(
                "fullscreen_changed",
                Some(*client),
                format!("fullscreen={}", fullscreen),
            ),
            StateTransition::FrameSplit { client, side } => {
                self.push("frame_split", Some(*client), format!("side={}", side))
            }
            StateTransition::WorkspaceSwitched { from, to } => {
                self.push("workspace_switched", None, format!("from={} to={}", from, to))
            }
            StateTransition::GrabStarted { client, kind } => {
                self.push("grab_started", Some(*client), format!("kind={}", kind))
            }
        }
    }

    /// Record an answered IPC command
    pub fn trace_ipc(&mut self, command: &str, result: &str) {
        self.push(
            "ipc_command",
            None,
            format!("cmd={} result={}", command, result),
        );
    }

    fn push(&mut self, event_type: &str, window: Option<u32>, details: String) {
        while self.entries.len() >= self.capacity.max(1) {
            self.entries.pop_front();
        }
        self.entries.push_back(EventLogEntry {
            sequence: self.next_sequence,
            timestamp_ms: self.started.elapsed().as_millis() as u64,
            event_type: event_type.to_string(),
            window,
            details,
        });
        self.next_sequence += 1;
    }

    /// The newest `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<EventLogEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.range(skip..).cloned().collect()
    }
}

impl Default for EventTracer {
    fn default() -> Self {
        Self::new()
    }
}
