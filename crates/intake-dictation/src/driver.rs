//! Async executor around the controller.
//!
//! The driver turns [`CaptureCommand`]s into tokio tasks (timers, prompt
//! playback, recognition channels) and funnels their completions back through
//! one channel, so the controller is only ever touched from the task that owns
//! the driver. It also holds the operator notification and the delayed
//! restart that follows a successful submission.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use intake_core::{
    ContactMedium, Dismissal, FieldKey, IntakeConfig, IntakeError, Notification,
    NotificationLevel, Record, Result, SalesLine, LOCALE,
};
use intake_gateway::{RecordSink, SubmissionGateway, SubmissionOutcome};
use intake_rules::Validation;

use crate::controller::{
    CaptureCommand, CaptureEvent, CycleTimer, DictationController, SalesLineSuggestion,
};
use crate::speech::{HardwareProbe, SpeechRecognizer, SpeechSynthesizer};
use crate::state::{CycleToken, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TaskKind {
    Timer(CycleTimer),
    Prompt,
    Channel,
}

/// Wake-up delivered to the driver's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Capture(CaptureEvent),
    NotificationExpired { seq: u64 },
    RestartDue { seq: u64 },
}

pub struct DictationDriver {
    controller: DictationController,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    recognizer: Arc<dyn SpeechRecognizer>,
    tasks: HashMap<(CycleToken, TaskKind), JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    events_rx: mpsc::UnboundedReceiver<DriverEvent>,
    notification: Option<Notification>,
    notification_seq: u64,
    notification_timer: Option<JoinHandle<()>>,
    restart_seq: u64,
    restart_timer: Option<JoinHandle<()>>,
    auto_dismiss: Duration,
}

impl DictationDriver {
    pub fn new(
        config: &IntakeConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller: DictationController::new(&config.dictation),
            synthesizer,
            recognizer,
            tasks: HashMap::new(),
            events_tx,
            events_rx,
            notification: None,
            notification_seq: 0,
            notification_timer: None,
            restart_seq: 0,
            restart_timer: None,
            auto_dismiss: config.notifications.auto_dismiss(),
        }
    }

    pub fn controller(&self) -> &DictationController {
        &self.controller
    }

    pub fn session(&self) -> &SessionState {
        self.controller.session()
    }

    pub fn record(&self) -> &Record {
        self.controller.record()
    }

    pub fn validation(&self) -> Validation {
        self.controller.validation()
    }

    pub fn sales_line_suggestion(&self) -> SalesLineSuggestion {
        self.controller.sales_line_suggestion()
    }

    /// Number of timers, prompts and channels still running.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    // =========================================================================
    // Operator actions
    // =========================================================================

    pub fn start_session(&mut self) {
        let commands = self.controller.start_session();
        self.execute(commands);
    }

    pub fn end_session(&mut self) {
        let commands = self.controller.end_session();
        self.execute(commands);
    }

    pub fn select_step(&mut self, step: usize) -> Result<()> {
        let commands = self.controller.select_step(step)?;
        self.execute(commands);
        Ok(())
    }

    pub fn manual_edit(&mut self, key: FieldKey, value: &str) -> Result<()> {
        self.controller.manual_edit(key, value)
    }

    pub fn select_contact_medium(&mut self, medium: ContactMedium) {
        self.controller.select_contact_medium(medium);
    }

    pub fn assign_to(&mut self, assignee_id: &str) -> Result<()> {
        self.controller.assign_to(assignee_id)
    }

    pub fn select_sales_line(&mut self, line: SalesLine) {
        self.controller.select_sales_line(line);
    }

    pub fn recompute_sales_line(&mut self) -> SalesLine {
        self.controller.recompute_sales_line()
    }

    /// Send the record once. Refused while validation fails.
    ///
    /// On success the record is cleared at once and the session restarts after
    /// the gateway's restart delay. Any other outcome leaves the record as it
    /// was. Either way the outcome is also posted as the current notification.
    pub async fn submit<S: RecordSink>(
        &mut self,
        gateway: &SubmissionGateway<S>,
    ) -> Result<SubmissionOutcome> {
        let validation = self.controller.validation();
        if !validation.is_ok() {
            return Err(IntakeError::NotReady(validation.messages()));
        }

        let snapshot = self.controller.record().clone();
        tracing::info!(
            session_id = %self.session().session_id,
            sales_line = %snapshot.linea_venta,
            "Submitting record"
        );
        let submission = gateway.submit(&snapshot).await;

        self.notify(submission.notification);
        if let Some(after) = submission.restart_after {
            let commands = self.controller.reset_after_submission();
            self.execute(commands);
            self.schedule_restart(after);
        }
        Ok(submission.outcome)
    }

    /// Warm up the microphone and voices, and report the result.
    pub async fn sync_hardware(&mut self, probe: &dyn HardwareProbe) -> Result<()> {
        match probe.check().await {
            Ok(()) => {
                self.notify(Notification::success(
                    "Hardware sincronizado correctamente",
                    self.auto_dismiss,
                ));
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::error_after(
                    "Error al sincronizar hardware",
                    self.auto_dismiss,
                ));
                Err(e.into())
            }
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dismiss_notification(&mut self) -> Option<Notification> {
        if let Some(timer) = self.notification_timer.take() {
            timer.abort();
        }
        self.notification_seq += 1;
        self.notification.take()
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Wait for the next completion or timer.
    pub async fn next_event(&mut self) -> Option<DriverEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: DriverEvent) {
        match event {
            DriverEvent::Capture(event) => {
                let commands = self.controller.handle(event);
                self.execute(commands);
            }
            DriverEvent::NotificationExpired { seq } => {
                if seq == self.notification_seq {
                    self.notification_timer = None;
                    if let Some(n) = self.notification.take() {
                        tracing::debug!(message = %n.message, "Notification dismissed");
                    }
                }
            }
            DriverEvent::RestartDue { seq } => {
                if seq == self.restart_seq {
                    self.restart_timer = None;
                    let commands = self.controller.restart();
                    self.execute(commands);
                }
            }
        }
    }

    /// Wait for one event and apply it.
    pub async fn pump(&mut self) -> Option<DriverEvent> {
        let event = self.next_event().await?;
        self.handle_event(event.clone());
        Some(event)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn execute(&mut self, commands: Vec<CaptureCommand>) {
        self.tasks.retain(|_, handle| !handle.is_finished());

        for command in commands {
            match command {
                CaptureCommand::ArmTimer {
                    token,
                    timer,
                    after,
                } => {
                    let tx = self.events_tx.clone();
                    self.spawn(token, TaskKind::Timer(timer), async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(DriverEvent::Capture(CaptureEvent::TimerFired {
                            token,
                            timer,
                        }));
                    });
                }
                CaptureCommand::CancelTimer { token, timer } => {
                    self.cancel(token, TaskKind::Timer(timer));
                }
                CaptureCommand::Speak { token, text } => {
                    let tx = self.events_tx.clone();
                    let synthesizer = Arc::clone(&self.synthesizer);
                    self.spawn(token, TaskKind::Prompt, async move {
                        let result = synthesizer.speak(&text, LOCALE).await;
                        let _ = tx.send(DriverEvent::Capture(CaptureEvent::PromptFinished {
                            token,
                            result,
                        }));
                    });
                }
                CaptureCommand::OpenChannel { token, locale } => {
                    let tx = self.events_tx.clone();
                    let recognizer = Arc::clone(&self.recognizer);
                    self.spawn(token, TaskKind::Channel, async move {
                        let event = match recognizer.listen(locale).await {
                            Ok(text) => CaptureEvent::Transcript { token, text },
                            Err(error) => CaptureEvent::RecognitionFailed { token, error },
                        };
                        let _ = tx.send(DriverEvent::Capture(event));
                    });
                }
                CaptureCommand::CloseChannel { token } => {
                    self.cancel(token, TaskKind::Channel);
                    self.cancel(token, TaskKind::Prompt);
                }
                CaptureCommand::AbortCycle { token } => {
                    let keys: Vec<_> = self
                        .tasks
                        .keys()
                        .filter(|(t, _)| *t == token)
                        .copied()
                        .collect();
                    for key in keys {
                        self.cancel(key.0, key.1);
                    }
                }
            }
        }
    }

    fn spawn<F>(&mut self, token: CycleToken, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.tasks.insert((token, kind), handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, token: CycleToken, kind: TaskKind) {
        if let Some(handle) = self.tasks.remove(&(token, kind)) {
            handle.abort();
            tracing::trace!(token = %token, ?kind, "Task cancelled");
        }
    }

    fn notify(&mut self, notification: Notification) {
        if let Some(timer) = self.notification_timer.take() {
            timer.abort();
        }
        self.notification_seq += 1;

        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(message = %notification.message, "Notification")
            }
            NotificationLevel::Error => {
                tracing::warn!(message = %notification.message, "Notification")
            }
        }

        if let Dismissal::After(after) = notification.dismissal {
            let tx = self.events_tx.clone();
            let seq = self.notification_seq;
            self.notification_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = tx.send(DriverEvent::NotificationExpired { seq });
            }));
        }
        self.notification = Some(notification);
    }

    fn schedule_restart(&mut self, after: Duration) {
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
        self.restart_seq += 1;

        let tx = self.events_tx.clone();
        let seq = self.restart_seq;
        self.restart_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(DriverEvent::RestartDue { seq });
        }));
        tracing::debug!(after_ms = after.as_millis() as u64, "Restart scheduled");
    }
}

impl Drop for DictationDriver {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
        if let Some(timer) = self.notification_timer.take() {
            timer.abort();
        }
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
    }
}
