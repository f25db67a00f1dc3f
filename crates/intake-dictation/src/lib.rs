//! Intake Dictation crate - voice-guided capture of the intake record.
//!
//! [`DictationController`] is the synchronous state machine: it walks the
//! field schema one prompt-then-listen cycle at a time and answers every
//! operation with the side effects to perform. [`DictationDriver`] runs those
//! side effects on tokio against the speech collaborators. It also owns
//! submission and the operator notification.

pub mod controller;
pub mod driver;
pub mod speech;
pub mod state;

pub use controller::{
    CaptureCommand, CaptureEvent, CycleTimer, DictationController, SalesLineMode,
    SalesLineSuggestion,
};
pub use driver::{DictationDriver, DriverEvent};
pub use speech::{HardwareProbe, SpeechError, SpeechRecognizer, SpeechSynthesizer};
pub use state::{CapturePhase, CycleToken, SessionState};
