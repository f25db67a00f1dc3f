//! Record completeness and consistency checks.
//!
//! Validation never fails with an error value; it produces a report that gates
//! submission. The report is cheap and is rebuilt on every read.

use std::sync::LazyLock;

use intake_core::{ContactMedium, Record};
use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

/// A single reason the record cannot be submitted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("NIT es obligatorio")]
    MissingNit,
    #[error("Ciudad es obligatoria")]
    MissingCity,
    #[error("Tipo de cliente es obligatorio")]
    MissingClientType,
    #[error("Concepto es obligatorio")]
    MissingConcept,
    #[error("Selecciona a quién queda asignado")]
    MissingAssignee,
    #[error("Selecciona la línea de venta")]
    MissingSalesLine,
    #[error("Correo inválido para medio Correo")]
    InvalidEmailForCorreo,
    #[error("Celular requerido para medio WhatsApp")]
    MissingPhoneForWhatsApp,
}

/// Outcome of validating a record: ordered errors, empty when it passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    errors: Vec<ValidationError>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Human-readable messages, in check order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn contains(&self, error: ValidationError) -> bool {
        self.errors.contains(&error)
    }
}

/// Minimal address shape: local part, one `@`, a dotted domain, no spaces.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate(record: &Record) -> Validation {
    let mut errors = Vec::new();

    let required = [
        (record.nit.is_empty(), ValidationError::MissingNit),
        (record.ciudad.is_empty(), ValidationError::MissingCity),
        (record.tipo_cliente.is_empty(), ValidationError::MissingClientType),
        (record.concepto.is_empty(), ValidationError::MissingConcept),
        (record.asignado_a.is_empty(), ValidationError::MissingAssignee),
        (record.linea_venta.is_unset(), ValidationError::MissingSalesLine),
    ];
    errors.extend(
        required
            .into_iter()
            .filter(|(missing, _)| *missing)
            .map(|(_, error)| error),
    );

    match record.medio_contacto {
        ContactMedium::Correo if !is_valid_email(&record.correo) => {
            errors.push(ValidationError::InvalidEmailForCorreo);
        }
        ContactMedium::WhatsApp if record.celular.is_empty() => {
            errors.push(ValidationError::MissingPhoneForWhatsApp);
        }
        _ => {}
    }

    Validation { errors }
}
