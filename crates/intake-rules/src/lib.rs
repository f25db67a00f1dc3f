//! Pure text rules for the intake record.
//!
//! - [`normalize`]: raw dictated/typed text to the canonical stored value.
//! - [`classify`]: free-text concept to sales line.
//! - [`validate`]: record completeness and consistency.
//!
//! Nothing here holds state or performs I/O.

pub mod classify;
pub mod normalize;
pub mod validate;

pub use classify::classify;
pub use normalize::{is_null_word, normalize, transcribe_email};
pub use validate::{is_valid_email, validate, Validation, ValidationError};
