use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Ordering of prompt playback and channel opening within a capture cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePolicy {
    /// Open the recognition channel once the prompt finishes (or times out).
    #[default]
    PromptThenListen,
    /// Start the prompt and open the channel in the same step.
    ListenImmediately,
}

impl fmt::Display for CapturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePolicy::PromptThenListen => write!(f, "prompt_then_listen"),
            CapturePolicy::ListenImmediately => write!(f, "listen_immediately"),
        }
    }
}

impl FromStr for CapturePolicy {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "prompt_then_listen" => Ok(CapturePolicy::PromptThenListen),
            "listen_immediately" => Ok(CapturePolicy::ListenImmediately),
            _ => Err(IntakeError::Config(format!("unknown capture policy: {}", s))),
        }
    }
}

/// Attribute of the intake record. Serialized names are the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Nit,
    Empresa,
    Ciudad,
    Cliente,
    Celular,
    Correo,
    TipoCliente,
    Concepto,
    MedioContacto,
    AsignadoA,
    LineaVenta,
}

impl FieldKey {
    /// Every record attribute, in wire order.
    pub const ALL: [FieldKey; 11] = [
        FieldKey::Nit,
        FieldKey::Empresa,
        FieldKey::Ciudad,
        FieldKey::Cliente,
        FieldKey::Celular,
        FieldKey::Correo,
        FieldKey::TipoCliente,
        FieldKey::Concepto,
        FieldKey::MedioContacto,
        FieldKey::AsignadoA,
        FieldKey::LineaVenta,
    ];

    /// JSON property name used by the persistence service.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldKey::Nit => "nit",
            FieldKey::Empresa => "empresa",
            FieldKey::Ciudad => "ciudad",
            FieldKey::Cliente => "cliente",
            FieldKey::Celular => "celular",
            FieldKey::Correo => "correo",
            FieldKey::TipoCliente => "tipoCliente",
            FieldKey::Concepto => "concepto",
            FieldKey::MedioContacto => "medioContacto",
            FieldKey::AsignadoA => "asignadoA",
            FieldKey::LineaVenta => "lineaVenta",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FieldKey {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        FieldKey::ALL
            .into_iter()
            .find(|k| k.wire_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| IntakeError::InvalidValue {
                field: "field".to_string(),
                value: s.to_string(),
            })
    }
}

/// Preferred contact channel. `Unset` travels as `""`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactMedium {
    #[default]
    #[serde(rename = "")]
    Unset,
    WhatsApp,
    Correo,
}

impl ContactMedium {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMedium::Unset => "",
            ContactMedium::WhatsApp => "WhatsApp",
            ContactMedium::Correo => "Correo",
        }
    }
}

impl FromStr for ContactMedium {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(ContactMedium::Unset),
            "whatsapp" => Ok(ContactMedium::WhatsApp),
            "correo" => Ok(ContactMedium::Correo),
            _ => Err(IntakeError::InvalidValue {
                field: FieldKey::MedioContacto.wire_name().to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Sales category used for downstream routing. `Unset` travels as `""`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesLine {
    #[default]
    #[serde(rename = "")]
    Unset,
    Venta,
    Mantenimiento,
    #[serde(rename = "Servicio montacargas")]
    ServicioMontacargas,
    #[serde(rename = "Alquiler montacargas")]
    AlquilerMontacargas,
}

impl SalesLine {
    /// Selectable categories, excluding `Unset`.
    pub const OPTIONS: [SalesLine; 4] = [
        SalesLine::Venta,
        SalesLine::Mantenimiento,
        SalesLine::ServicioMontacargas,
        SalesLine::AlquilerMontacargas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesLine::Unset => "",
            SalesLine::Venta => "Venta",
            SalesLine::Mantenimiento => "Mantenimiento",
            SalesLine::ServicioMontacargas => "Servicio montacargas",
            SalesLine::AlquilerMontacargas => "Alquiler montacargas",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, SalesLine::Unset)
    }
}

impl fmt::Display for SalesLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesLine {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(SalesLine::Unset);
        }
        SalesLine::OPTIONS
            .into_iter()
            .find(|line| line.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| IntakeError::InvalidValue {
                field: FieldKey::LineaVenta.wire_name().to_string(),
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Record
// =============================================================================

/// The client-intake record. All attributes are always present; an empty
/// value means "unset".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub nit: String,
    pub empresa: String,
    pub ciudad: String,
    pub cliente: String,
    pub celular: String,
    pub correo: String,
    pub tipo_cliente: String,
    pub concepto: String,
    pub medio_contacto: ContactMedium,
    /// Display label of the assignee, never its directory id.
    pub asignado_a: String,
    pub linea_venta: SalesLine,
}

impl Record {
    /// Current value of `key` as text (`""` when unset).
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Nit => &self.nit,
            FieldKey::Empresa => &self.empresa,
            FieldKey::Ciudad => &self.ciudad,
            FieldKey::Cliente => &self.cliente,
            FieldKey::Celular => &self.celular,
            FieldKey::Correo => &self.correo,
            FieldKey::TipoCliente => &self.tipo_cliente,
            FieldKey::Concepto => &self.concepto,
            FieldKey::MedioContacto => self.medio_contacto.as_str(),
            FieldKey::AsignadoA => &self.asignado_a,
            FieldKey::LineaVenta => self.linea_venta.as_str(),
        }
    }

    /// Store an already-normalized value. Enumerated keys reject values
    /// outside their domain and leave the record untouched.
    pub fn set(&mut self, key: FieldKey, value: String) -> Result<()> {
        match key {
            FieldKey::Nit => self.nit = value,
            FieldKey::Empresa => self.empresa = value,
            FieldKey::Ciudad => self.ciudad = value,
            FieldKey::Cliente => self.cliente = value,
            FieldKey::Celular => self.celular = value,
            FieldKey::Correo => self.correo = value,
            FieldKey::TipoCliente => self.tipo_cliente = value,
            FieldKey::Concepto => self.concepto = value,
            FieldKey::MedioContacto => self.medio_contacto = value.parse()?,
            FieldKey::AsignadoA => self.asignado_a = value,
            FieldKey::LineaVenta => self.linea_venta = value.parse()?,
        }
        Ok(())
    }

    /// True when every attribute is unset.
    pub fn is_blank(&self) -> bool {
        *self == Record::default()
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// How a notification leaves the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dismissal {
    /// Cleared automatically after the given delay.
    After(Duration),
    /// Stays until the operator dismisses it.
    Manual,
}

/// Operator-facing message raised by submission or hardware sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub dismissal: Dismissal,
}

impl Notification {
    pub fn success(message: impl Into<String>, after: Duration) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            dismissal: Dismissal::After(after),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            dismissal: Dismissal::Manual,
        }
    }

    pub fn error_after(message: impl Into<String>, after: Duration) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            dismissal: Dismissal::After(after),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NotificationLevel::Success
    }
}
