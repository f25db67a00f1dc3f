//! Console stand-ins for the speech collaborators.
//!
//! Prompts are printed instead of spoken, and typed lines play the role of
//! recognized speech.

use std::io::IsTerminal;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use intake_dictation::{HardwareProbe, SpeechError, SpeechRecognizer, SpeechSynthesizer};

pub struct ConsoleVoice;

#[async_trait]
impl SpeechSynthesizer for ConsoleVoice {
    async fn speak(&self, text: &str, locale: &str) -> Result<(), SpeechError> {
        println!("[{}] >> {}", locale, text);
        Ok(())
    }
}

/// Recognizer fed by the console loop.
pub struct ConsoleEar {
    utterances: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ConsoleEar {
    pub fn new(utterances: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            utterances: Mutex::new(utterances),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleEar {
    async fn listen(&self, locale: &str) -> Result<String, SpeechError> {
        let mut utterances = self.utterances.lock().await;
        // Lines typed before this channel opened belong to no one.
        while utterances.try_recv().is_ok() {}

        println!("[{}] (escuchando...)", locale);
        match utterances.recv().await {
            Some(text) if text.trim().is_empty() => Err(SpeechError::NoMatch),
            Some(text) => Ok(text),
            None => Err(SpeechError::Unavailable("console closed".to_string())),
        }
    }
}

/// Hardware check: an interactive console stands in for the microphone.
pub struct ConsoleProbe;

#[async_trait]
impl HardwareProbe for ConsoleProbe {
    async fn check(&self) -> Result<(), SpeechError> {
        if std::io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(SpeechError::Unavailable(
                "stdin is not an interactive console".to_string(),
            ))
        }
    }
}
