//! One-shot submission with outcome classification.

use std::time::Duration;

use intake_core::{Notification, Record};

use crate::sink::RecordSink;

/// What happened to a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The service answered with a 2xx status.
    Accepted { status: u16 },
    /// The service answered with any other status.
    Rejected { status: u16 },
    /// No response was received.
    Unreachable { detail: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }
}

/// Result of [`SubmissionGateway::submit`]: the outcome, what to tell the
/// operator, and when to restart the session (success only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub outcome: SubmissionOutcome,
    pub notification: Notification,
    pub restart_after: Option<Duration>,
}

pub struct SubmissionGateway<S> {
    sink: S,
    restart_delay: Duration,
}

impl<S: RecordSink> SubmissionGateway<S> {
    pub fn new(sink: S, restart_delay: Duration) -> Self {
        Self {
            sink,
            restart_delay,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Write `record` once. Never retries.
    pub async fn submit(&self, record: &Record) -> Submission {
        let outcome = match self.sink.post_record(record).await {
            Ok(response) if response.is_success() => SubmissionOutcome::Accepted {
                status: response.status,
            },
            Ok(response) => SubmissionOutcome::Rejected {
                status: response.status,
            },
            Err(e) => {
                tracing::error!(error = %e, "Record submission failed");
                SubmissionOutcome::Unreachable {
                    detail: e.to_string(),
                }
            }
        };

        let (notification, restart_after) = match &outcome {
            SubmissionOutcome::Accepted { status } => {
                tracing::info!(status, "Record saved");
                (
                    Notification::success("Datos guardados exitosamente", self.restart_delay),
                    Some(self.restart_delay),
                )
            }
            SubmissionOutcome::Rejected { status } => (
                Notification::error(format!("Error al guardar. Status: {}", status)),
                None,
            ),
            SubmissionOutcome::Unreachable { detail } => (
                Notification::error(format!("Error de conexión al servidor ({})", detail)),
                None,
            ),
        };

        Submission {
            outcome,
            notification,
            restart_after,
        }
    }
}
