//! Capture-cycle phases and per-session state.
//!
//! A capture cycle for one step moves through:
//! - Idle -> Scheduled (step entered, entry delay pending)
//! - Scheduled -> Prompting (prompt playback started)
//! - Prompting -> Listening (prompt finished, safety timer fired, or immediate policy)
//! - Listening -> Captured (transcript committed)
//! - any -> Idle (cycle abandoned, recognition failed, or advancing to the next step)

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Where the in-flight capture cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CapturePhase {
    /// No cycle in flight.
    #[default]
    Idle,
    /// Waiting out the step-entry delay before the prompt.
    Scheduled,
    /// Prompt is playing; the recognition channel is not open yet.
    Prompting,
    /// Recognition channel is open.
    Listening,
    /// A transcript was committed for the current step.
    Captured,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePhase::Idle => write!(f, "Idle"),
            CapturePhase::Scheduled => write!(f, "Scheduled"),
            CapturePhase::Prompting => write!(f, "Prompting"),
            CapturePhase::Listening => write!(f, "Listening"),
            CapturePhase::Captured => write!(f, "Captured"),
        }
    }
}

impl CapturePhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &CapturePhase) -> bool {
        matches!(
            (self, target),
            (CapturePhase::Idle, CapturePhase::Scheduled)
                | (CapturePhase::Idle, CapturePhase::Prompting)
                | (CapturePhase::Scheduled, CapturePhase::Prompting)
                | (CapturePhase::Prompting, CapturePhase::Listening)
                | (CapturePhase::Listening, CapturePhase::Captured)
                // Abandon or finish the cycle
                | (CapturePhase::Scheduled, CapturePhase::Idle)
                | (CapturePhase::Prompting, CapturePhase::Idle)
                | (CapturePhase::Listening, CapturePhase::Idle)
                | (CapturePhase::Captured, CapturePhase::Idle)
        )
    }

    /// True while some asynchronous work for the cycle may still complete.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            CapturePhase::Scheduled | CapturePhase::Prompting | CapturePhase::Listening
        )
    }
}

/// Generation counter identifying one capture cycle.
///
/// Every asynchronous completion carries the token of the cycle that issued
/// it; the controller drops completions whose token is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CycleToken(u64);

impl CycleToken {
    pub fn next(self) -> Self {
        CycleToken(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Session bookkeeping owned by the controller.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Identifies this intake session in logs.
    pub session_id: Uuid,
    /// When dictation was last started, if ever.
    pub started_at: Option<DateTime<Utc>>,
    /// Whether dictation is running.
    pub active: bool,
    /// Index into the field schema.
    pub step: usize,
    /// Whether a recognition channel is open.
    pub listening: bool,
    /// Set when the operator picked the sales line by hand.
    pub sales_line_override: bool,
    pub phase: CapturePhase,
    pub token: CycleToken,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: None,
            active: false,
            step: 0,
            listening: false,
            sales_line_override: false,
            phase: CapturePhase::Idle,
            token: CycleToken::default(),
        }
    }

    /// Seconds since dictation was started, or zero if it never was.
    pub fn elapsed_secs(&self) -> f32 {
        match self.started_at {
            Some(start) => (Utc::now() - start).num_milliseconds() as f32 / 1000.0,
            None => 0.0,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
