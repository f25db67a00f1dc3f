//! Speech collaborator seams.
//!
//! The platform's synthesis and recognition services sit behind these traits
//! so the capture flow can run against real devices, a console, or test fakes.

use async_trait::async_trait;
use intake_core::IntakeError;

/// Errors reported by speech collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech service unavailable: {0}")]
    Unavailable(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("speech recognition failed: {0}")]
    Recognition(String),
    #[error("no speech recognized")]
    NoMatch,
}

impl From<SpeechError> for IntakeError {
    fn from(err: SpeechError) -> Self {
        IntakeError::Speech(err.to_string())
    }
}

/// Text-to-speech. Resolves when playback ends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str, locale: &str) -> Result<(), SpeechError>;
}

/// Speech-to-text. Each call opens one channel and yields at most one
/// committed transcript.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn listen(&self, locale: &str) -> Result<String, SpeechError>;
}

/// Device warm-up: microphone permission and voice list.
#[async_trait]
pub trait HardwareProbe: Send + Sync {
    async fn check(&self) -> Result<(), SpeechError>;
}
