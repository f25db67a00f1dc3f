//! Static capture schema and staff directory.
//!
//! `FIELDS` is the dictation sequence: one prompt-then-listen cycle per entry,
//! in order. The remaining record attributes (contact medium, assignee, sales
//! line) are selected manually and have no prompt.

use crate::error::{IntakeError, Result};
use crate::types::FieldKey;

/// Locale passed to both speech collaborators.
pub const LOCALE: &str = "es-ES";

/// One dictated attribute: where it lands, how it is labelled, what is spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const FIELD_COUNT: usize = 8;

pub static FIELDS: [FieldSpec; FIELD_COUNT] = [
    FieldSpec { key: FieldKey::Nit, label: "NIT", prompt: "NIT" },
    FieldSpec { key: FieldKey::Empresa, label: "Nombre de Empresa", prompt: "Empresa" },
    FieldSpec { key: FieldKey::Ciudad, label: "Ciudad", prompt: "Ciudad" },
    FieldSpec { key: FieldKey::Cliente, label: "Nombre del Cliente", prompt: "Nombre" },
    FieldSpec { key: FieldKey::Celular, label: "Celular", prompt: "Celular" },
    FieldSpec { key: FieldKey::Correo, label: "Correo", prompt: "Correo" },
    FieldSpec { key: FieldKey::TipoCliente, label: "Tipo de Cliente", prompt: "Tipo" },
    FieldSpec { key: FieldKey::Concepto, label: "Concepto", prompt: "Concepto" },
];

/// Schema entry for a dictation step.
pub fn field_at(step: usize) -> Result<&'static FieldSpec> {
    FIELDS.get(step).ok_or(IntakeError::StepOutOfRange {
        step,
        len: FIELD_COUNT,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignee {
    /// Bookkeeping id on the backend side. Never written into the record.
    pub id: &'static str,
    pub label: &'static str,
}

static ASSIGNEES: [Assignee; 8] = [
    Assignee { id: "9", label: "LILIANA DEL PILAR" },
    Assignee { id: "40", label: "OSCAR FERNANDO" },
    Assignee { id: "34", label: "JOSE" },
    Assignee { id: "60", label: "JESSICA MARCELA" },
    Assignee { id: "78", label: "LAURA ALEJANDRA" },
    Assignee { id: "79", label: "GERALDINE" },
    Assignee { id: "80", label: "JOSE AUGUSTO" },
    Assignee { id: "81", label: "MARIA CAMILA" },
];

/// Fixed staff list records can be assigned to.
pub struct AssigneeDirectory;

impl AssigneeDirectory {
    pub fn all() -> &'static [Assignee] {
        &ASSIGNEES
    }

    /// Display label for a directory id.
    pub fn label_for(id: &str) -> Result<&'static str> {
        let id = id.trim();
        ASSIGNEES
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.label)
            .ok_or_else(|| IntakeError::UnknownAssignee(id.to_string()))
    }

    /// Directory entry whose label matches exactly.
    pub fn by_label(label: &str) -> Option<&'static Assignee> {
        ASSIGNEES.iter().find(|a| a.label == label)
    }

    pub fn contains_label(label: &str) -> bool {
        Self::by_label(label).is_some()
    }
}
