//! State machine types for framewm.
//!
//! This module formalizes the small state machines each frame carries:
//! - Fullscreen state, with the geometry to restore
//! - The self-initiated resize acknowledgement
//!
//! It also defines the transitions recorded by the event tracer.

use serde::{Deserialize, Serialize};

use crate::types::Rect;

/// Frame display state
///
/// ```text
///               set_fullscreen(true)
/// ┌─────────┐ ─────────────────────────► ┌────────────────────────┐
/// │ Normal  │                            │ Fullscreen { saved }   │
/// └─────────┘ ◄───────────────────────── └───────────┬────────────┘
///      ▲          set_fullscreen(false)              │
///      │          (restores saved)                   │ drag / split
///      └─────────────────────────────────────────────┘ (saved dropped)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FrameState {
    /// Frame sits wherever the user or client put it
    #[default]
    Normal,
    /// Frame covers the work area; `saved` is the geometry before expanding
    Fullscreen { saved: Rect },
}

impl FrameState {
    pub fn is_fullscreen(&self) -> bool {
        matches!(self, FrameState::Fullscreen { .. })
    }

    /// Enter fullscreen, remembering `current`. Returns false if already fullscreen.
    pub fn enter_fullscreen(&mut self, current: Rect) -> bool {
        match self {
            FrameState::Normal => {
                *self = FrameState::Fullscreen { saved: current };
                true
            }
            FrameState::Fullscreen { .. } => false,
        }
    }

    /// Leave fullscreen, yielding the geometry to restore.
    pub fn leave_fullscreen(&mut self) -> Option<Rect> {
        match std::mem::take(self) {
            FrameState::Fullscreen { saved } => Some(saved),
            FrameState::Normal => None,
        }
    }

    /// Drop back to Normal without restoring anything.
    pub fn clear(&mut self) {
        *self = FrameState::Normal;
    }
}

/// Self-initiated resize acknowledgement
///
/// ```text
///            programmatic resize
/// ┌──────┐ ──────────────────────► ┌──────────┐
/// │ Idle │                         │ Awaiting │
/// └──────┘ ◄────────────────────── └──────────┘
///            next geometry request
///            (swallowed)
/// ```
///
/// While `Awaiting`, the next geometry request targeting the frame is
/// consumed instead of honored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfAck {
    #[default]
    Idle,
    Awaiting,
}

impl SelfAck {
    pub fn arm(&mut self) {
        *self = SelfAck::Awaiting;
    }

    /// Consume a pending acknowledgement. True if one was armed.
    pub fn take(&mut self) -> bool {
        std::mem::take(self) == SelfAck::Awaiting
    }
}

/// Consistency violations that `validate_state` can report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StateViolation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Managed client missing from the client list
    ClientNotListed,
    /// Client list entry with no frame behind it
    ListedWithoutFrame,
    /// Client list contains the same window twice
    DuplicateListing,
    /// Frame whose decoration no longer exists on the server
    GhostFrame,
    /// Frame tagged with a workspace index out of range
    WorkspaceOutOfRange,
    /// Pointer grab pointing at a removed frame
    StaleGrab,
}

/// State transition events that can be traced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum StateTransition {
    /// Client was wrapped in a new frame
    FrameCreated { client: u32, decoration: u32 },
    /// Frame was torn down
    FrameRemoved { client: u32, reason: UnmanageReason },
    /// Fullscreen toggled on a frame
    FullscreenChanged { client: u32, fullscreen: bool },
    /// Frame snapped to one half of the screen
    FrameSplit { client: u32, side: String },
    /// Active workspace changed
    WorkspaceSwitched { from: usize, to: usize },
    /// Interactive move or resize began
    GrabStarted { client: u32, kind: String },
}

/// Reason a frame was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmanageReason {
    /// Client destroyed its window
    ClientDestroyed,
    /// Client was reparented away from the frame
    ClientEscaped,
    /// Client asked to be closed through a client message
    ClientRequested,
    /// Close button used on a client without the delete protocol
    WmClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullscreen_round_trip_restores_saved() {
        let mut state = FrameState::Normal;
        let saved = Rect::new(10, 20, 300, 200);

        assert!(state.enter_fullscreen(saved));
        assert!(state.is_fullscreen());
        // A second enter keeps the first snapshot
        assert!(!state.enter_fullscreen(Rect::new(0, 0, 1, 1)));

        assert_eq!(state.leave_fullscreen(), Some(saved));
        assert_eq!(state, FrameState::Normal);
        assert_eq!(state.leave_fullscreen(), None);
    }

    #[test]
    fn test_clear_drops_saved_geometry() {
        let mut state = FrameState::Fullscreen {
            saved: Rect::new(1, 2, 3, 4),
        };
        state.clear();
        assert_eq!(state.leave_fullscreen(), None);
    }

    #[test]
    fn test_self_ack_is_consumed_once() {
        let mut ack = SelfAck::Idle;
        assert!(!ack.take());

        ack.arm();
        assert_eq!(ack, SelfAck::Awaiting);
        assert!(ack.take());
        assert!(!ack.take());
    }

    #[test]
    fn test_frame_state_serialization() {
        let json = serde_json::to_string(&FrameState::Normal).unwrap();
        assert_eq!(json, r#"{"state":"normal"}"#);

        let state = FrameState::Fullscreen {
            saved: Rect::new(0, 0, 10, 10),
        };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: FrameState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_state_transition_serialization() {
        let transition = StateTransition::FrameRemoved {
            client: 42,
            reason: UnmanageReason::ClientEscaped,
        };
        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("frame_removed"));
        assert!(json.contains("client_escaped"));
    }
}
