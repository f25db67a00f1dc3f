pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use config::IntakeConfig;
pub use error::{IntakeError, Result};
pub use schema::{field_at, Assignee, AssigneeDirectory, FieldSpec, FIELDS, FIELD_COUNT, LOCALE};
pub use types::*;
