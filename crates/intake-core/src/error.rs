use thiserror::Error;

/// Top-level error type for the intake system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for IntakeError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    #[error("Step {step} is out of range (fields: {len})")]
    StepOutOfRange { step: usize, len: usize },

    #[error("Unknown assignee: {0}")]
    UnknownAssignee(String),

    #[error("Record is not ready for submission: {}", .0.join("; "))]
    NotReady(Vec<String>),
}

impl From<toml::de::Error> for IntakeError {
    fn from(err: toml::de::Error) -> Self {
        IntakeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for IntakeError {
    fn from(err: toml::ser::Error) -> Self {
        IntakeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
