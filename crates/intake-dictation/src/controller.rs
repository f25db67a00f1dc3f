//! Synchronous dictation controller.
//!
//! `DictationController` owns the session state and the record. It performs no
//! I/O: every operation mutates state and returns the ordered side effects the
//! caller must carry out. Asynchronous completions come back in as
//! [`CaptureEvent`]s tagged with the [`CycleToken`] that issued them, and
//! completions for any other token are dropped.

use std::time::Duration;

use chrono::Utc;
use intake_core::config::DictationConfig;
use intake_core::{
    field_at, AssigneeDirectory, CapturePolicy, ContactMedium, FieldKey, FieldSpec,
    IntakeError, Record, Result, SalesLine, FIELDS, FIELD_COUNT, LOCALE,
};
use intake_rules::{classify, normalize, validate, Validation};

use crate::speech::SpeechError;
use crate::state::{CapturePhase, CycleToken, SessionState};

/// Timers a capture cycle can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleTimer {
    /// Delay between entering a step and starting its prompt.
    StepEntry,
    /// Upper bound on waiting for prompt playback to finish.
    PromptSafety,
}

/// Side effect requested by the controller. Batches are executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureCommand {
    ArmTimer {
        token: CycleToken,
        timer: CycleTimer,
        after: Duration,
    },
    CancelTimer {
        token: CycleToken,
        timer: CycleTimer,
    },
    Speak {
        token: CycleToken,
        text: String,
    },
    OpenChannel {
        token: CycleToken,
        locale: &'static str,
    },
    /// End the channel. Playback still running for the cycle stops too.
    CloseChannel {
        token: CycleToken,
    },
    /// Drop every outstanding timer, prompt and channel of the cycle.
    AbortCycle {
        token: CycleToken,
    },
}

/// Completion of a command, fed back into the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    TimerFired {
        token: CycleToken,
        timer: CycleTimer,
    },
    PromptFinished {
        token: CycleToken,
        result: std::result::Result<(), SpeechError>,
    },
    Transcript {
        token: CycleToken,
        text: String,
    },
    RecognitionFailed {
        token: CycleToken,
        error: SpeechError,
    },
}

impl CaptureEvent {
    pub fn token(&self) -> CycleToken {
        match self {
            CaptureEvent::TimerFired { token, .. }
            | CaptureEvent::PromptFinished { token, .. }
            | CaptureEvent::Transcript { token, .. }
            | CaptureEvent::RecognitionFailed { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesLineMode {
    /// Follows the concept through the classifier.
    Auto,
    /// Pinned by the operator until recomputed.
    Manual,
}

/// What the classifier would pick for the current concept, next to what the
/// record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesLineSuggestion {
    pub suggested: SalesLine,
    pub current: SalesLine,
    pub mode: SalesLineMode,
}

pub struct DictationController {
    session: SessionState,
    record: Record,
    policy: CapturePolicy,
    entry_delay: Duration,
    prompt_timeout: Duration,
}

impl DictationController {
    pub fn new(config: &DictationConfig) -> Self {
        Self {
            session: SessionState::new(),
            record: Record::default(),
            policy: config.capture_policy,
            entry_delay: config.step_entry_delay(),
            prompt_timeout: config.prompt_timeout(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn policy(&self) -> CapturePolicy {
        self.policy
    }

    /// Schema entry for the current step.
    pub fn current_field(&self) -> &'static FieldSpec {
        &FIELDS[self.session.step]
    }

    /// True once the last step has been captured.
    pub fn is_complete(&self) -> bool {
        self.session.step == FIELD_COUNT - 1 && self.session.phase == CapturePhase::Captured
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start dictating from the current step.
    pub fn start_session(&mut self) -> Vec<CaptureCommand> {
        if self.session.active {
            tracing::debug!(session_id = %self.session.session_id, "Dictation already active");
            return Vec::new();
        }

        self.session.active = true;
        self.session.started_at = Some(Utc::now());
        tracing::info!(
            session_id = %self.session.session_id,
            step = self.session.step,
            policy = %self.policy,
            "Dictation started"
        );
        self.begin_cycle()
    }

    /// Stop dictating. The record and step are kept.
    pub fn end_session(&mut self) -> Vec<CaptureCommand> {
        if !self.session.active {
            return Vec::new();
        }

        let commands = self.cancel_cycle();
        self.session.active = false;
        tracing::info!(
            session_id = %self.session.session_id,
            step = self.session.step,
            elapsed_secs = self.session.elapsed_secs(),
            "Dictation stopped"
        );
        commands
    }

    /// Jump to `step`, abandoning the cycle in flight. Re-selecting the
    /// current step restarts its cycle.
    pub fn select_step(&mut self, step: usize) -> Result<Vec<CaptureCommand>> {
        field_at(step)?;
        Ok(self.enter_step(step))
    }

    /// Clear the record after a successful submission and go back to the
    /// first step without prompting.
    pub fn reset_after_submission(&mut self) -> Vec<CaptureCommand> {
        let commands = self.cancel_cycle();
        self.record = Record::default();
        self.session.step = 0;
        tracing::info!(session_id = %self.session.session_id, "Record cleared after submission");
        commands
    }

    /// Return to the freshly loaded state: inactive, empty record, first step,
    /// automatic sales line.
    pub fn restart(&mut self) -> Vec<CaptureCommand> {
        let commands = self.cancel_cycle();
        // Keep the token sequence so late completions stay stale.
        let token = self.session.token;
        self.session = SessionState {
            token,
            ..SessionState::new()
        };
        self.record = Record::default();
        tracing::info!(session_id = %self.session.session_id, "Session restarted");
        commands
    }

    // =========================================================================
    // Capture completions
    // =========================================================================

    pub fn handle(&mut self, event: CaptureEvent) -> Vec<CaptureCommand> {
        match event {
            CaptureEvent::TimerFired { token, timer } => self.on_timer(token, timer),
            CaptureEvent::PromptFinished { token, result } => self.on_prompt_finished(token, result),
            CaptureEvent::Transcript { token, text } => self.on_transcript(token, &text),
            CaptureEvent::RecognitionFailed { token, error } => {
                self.on_recognition_error(token, &error)
            }
        }
    }

    pub fn on_timer(&mut self, token: CycleToken, timer: CycleTimer) -> Vec<CaptureCommand> {
        if !self.is_current(token) {
            return Vec::new();
        }

        match (timer, self.session.phase) {
            (CycleTimer::StepEntry, CapturePhase::Scheduled) => self.start_prompt(),
            (CycleTimer::PromptSafety, CapturePhase::Prompting) => {
                tracing::warn!(
                    step = self.session.step,
                    token = %token,
                    "Prompt did not finish in time, listening anyway"
                );
                self.open_channel()
            }
            (timer, phase) => {
                tracing::debug!(?timer, %phase, "Ignoring timer");
                Vec::new()
            }
        }
    }

    /// Playback ended. A failed playback counts as finished.
    pub fn on_prompt_finished(
        &mut self,
        token: CycleToken,
        result: std::result::Result<(), SpeechError>,
    ) -> Vec<CaptureCommand> {
        if !self.is_current(token) {
            return Vec::new();
        }
        if let Err(e) = result {
            tracing::warn!(error = %e, step = self.session.step, "Prompt playback failed");
        }
        if self.session.phase != CapturePhase::Prompting {
            // Channel already open: immediate policy, or the safety timer won.
            return Vec::new();
        }

        let mut commands = vec![CaptureCommand::CancelTimer {
            token,
            timer: CycleTimer::PromptSafety,
        }];
        commands.extend(self.open_channel());
        commands
    }

    /// Commit the first transcript of the open channel and move on.
    pub fn on_transcript(&mut self, token: CycleToken, text: &str) -> Vec<CaptureCommand> {
        if !self.is_current(token) || self.session.phase != CapturePhase::Listening {
            tracing::debug!(token = %token, "Ignoring transcript outside an open channel");
            return Vec::new();
        }

        let key = self.current_field().key;
        if let Err(e) = self.write_field(key, text) {
            tracing::warn!(error = %e, field = %key, "Discarding transcript");
        }
        self.session.listening = false;
        self.set_phase(CapturePhase::Captured);
        tracing::info!(
            session_id = %self.session.session_id,
            step = self.session.step,
            field = %key,
            "Field captured"
        );

        let mut commands = vec![CaptureCommand::CloseChannel { token }];
        let next = self.session.step + 1;
        if next < FIELD_COUNT {
            commands.extend(self.enter_step(next));
        } else {
            tracing::info!(session_id = %self.session.session_id, "All fields captured");
        }
        commands
    }

    /// The channel failed. No advance and no retry.
    pub fn on_recognition_error(
        &mut self,
        token: CycleToken,
        error: &SpeechError,
    ) -> Vec<CaptureCommand> {
        if !self.is_current(token) || self.session.phase != CapturePhase::Listening {
            return Vec::new();
        }

        tracing::warn!(
            error = %error,
            step = self.session.step,
            field = %self.current_field().key,
            "Recognition failed"
        );
        self.session.listening = false;
        self.set_phase(CapturePhase::Idle);
        vec![CaptureCommand::CloseChannel { token }]
    }

    // =========================================================================
    // Manual editing
    // =========================================================================

    /// Write `value` for `key` through the same normalization as dictation.
    /// Does not touch the step or the channel.
    /// An assignee must be a directory label, or empty to clear it.
    pub fn manual_edit(&mut self, key: FieldKey, value: &str) -> Result<()> {
        if key == FieldKey::AsignadoA {
            let label = value.trim();
            if !label.is_empty() && !AssigneeDirectory::contains_label(label) {
                return Err(IntakeError::UnknownAssignee(label.to_string()));
            }
        }
        self.write_field(key, value)?;
        if key == FieldKey::LineaVenta {
            self.session.sales_line_override = true;
        }
        tracing::debug!(field = %key, "Manual edit");
        Ok(())
    }

    pub fn select_contact_medium(&mut self, medium: ContactMedium) {
        self.record.medio_contacto = medium;
        tracing::debug!(medium = medium.as_str(), "Contact medium selected");
    }

    /// Assign the record to a staff member by directory id. Only the label is
    /// stored.
    pub fn assign_to(&mut self, assignee_id: &str) -> Result<()> {
        let label = AssigneeDirectory::label_for(assignee_id)?;
        self.record.asignado_a = label.to_string();
        tracing::debug!(assignee = label, "Assignee selected");
        Ok(())
    }

    /// Pin the sales line; concept changes no longer reclassify.
    pub fn select_sales_line(&mut self, line: SalesLine) {
        self.record.linea_venta = line;
        self.session.sales_line_override = true;
        tracing::debug!(sales_line = %line, "Sales line pinned");
    }

    /// Unpin the sales line and classify the current concept again.
    pub fn recompute_sales_line(&mut self) -> SalesLine {
        self.session.sales_line_override = false;
        self.reclassify();
        self.record.linea_venta
    }

    pub fn sales_line_suggestion(&self) -> SalesLineSuggestion {
        SalesLineSuggestion {
            suggested: classify(&self.record.concepto),
            current: self.record.linea_venta,
            mode: if self.session.sales_line_override {
                SalesLineMode::Manual
            } else {
                SalesLineMode::Auto
            },
        }
    }

    /// Recomputed on every call.
    pub fn validation(&self) -> Validation {
        validate(&self.record)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn enter_step(&mut self, step: usize) -> Vec<CaptureCommand> {
        let mut commands = self.cancel_cycle();
        self.session.step = step;
        tracing::debug!(step, field = %self.current_field().key, "Entered step");
        if self.session.active {
            commands.extend(self.begin_cycle());
        }
        commands
    }

    fn begin_cycle(&mut self) -> Vec<CaptureCommand> {
        self.session.token = self.session.token.next();
        if self.entry_delay.is_zero() {
            return self.start_prompt();
        }

        self.set_phase(CapturePhase::Scheduled);
        vec![CaptureCommand::ArmTimer {
            token: self.session.token,
            timer: CycleTimer::StepEntry,
            after: self.entry_delay,
        }]
    }

    fn start_prompt(&mut self) -> Vec<CaptureCommand> {
        let token = self.session.token;
        let field = self.current_field();
        self.set_phase(CapturePhase::Prompting);
        tracing::info!(
            session_id = %self.session.session_id,
            step = self.session.step,
            field = %field.key,
            token = %token,
            "Prompting"
        );

        let mut commands = vec![CaptureCommand::Speak {
            token,
            text: field.prompt.to_string(),
        }];
        match self.policy {
            CapturePolicy::PromptThenListen => commands.push(CaptureCommand::ArmTimer {
                token,
                timer: CycleTimer::PromptSafety,
                after: self.prompt_timeout,
            }),
            CapturePolicy::ListenImmediately => commands.extend(self.open_channel()),
        }
        commands
    }

    fn open_channel(&mut self) -> Vec<CaptureCommand> {
        self.set_phase(CapturePhase::Listening);
        self.session.listening = true;
        vec![CaptureCommand::OpenChannel {
            token: self.session.token,
            locale: LOCALE,
        }]
    }

    fn cancel_cycle(&mut self) -> Vec<CaptureCommand> {
        let mut commands = Vec::new();
        if self.session.phase.is_pending() {
            tracing::debug!(
                token = %self.session.token,
                phase = %self.session.phase,
                "Abandoning capture cycle"
            );
            commands.push(CaptureCommand::AbortCycle {
                token: self.session.token,
            });
        }
        if self.session.phase != CapturePhase::Idle {
            self.set_phase(CapturePhase::Idle);
        }
        self.session.listening = false;
        commands
    }

    fn set_phase(&mut self, target: CapturePhase) {
        debug_assert!(
            self.session.phase.can_transition_to(&target),
            "invalid capture transition: {} -> {}",
            self.session.phase,
            target
        );
        tracing::trace!("Capture phase: {} -> {}", self.session.phase, target);
        self.session.phase = target;
    }

    fn is_current(&self, token: CycleToken) -> bool {
        let current = token == self.session.token;
        if !current {
            tracing::debug!(token = %token, current = %self.session.token, "Ignoring stale completion");
        }
        current
    }

    fn write_field(&mut self, key: FieldKey, raw: &str) -> Result<()> {
        self.record.set(key, normalize(key, raw))?;
        if key == FieldKey::Concepto && !self.session.sales_line_override {
            self.reclassify();
        }
        Ok(())
    }

    fn reclassify(&mut self) {
        self.record.linea_venta = classify(&self.record.concepto);
        tracing::debug!(sales_line = %self.record.linea_venta, "Sales line classified");
    }
}

// =============================================================================
// Tests
// =============================================================================
