//! Operator console input.
//!
//! Lines starting with `:` are commands; anything else is treated as speech
//! for the open recognition channel.

use intake_core::{ContactMedium, FieldKey, IntakeError, Result, SalesLine, FIELD_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// Zero-based step index.
    Step(usize),
    Edit { key: FieldKey, value: String },
    Medium(ContactMedium),
    Assign(String),
    Assignees,
    SalesLine(SalesLine),
    AutoSalesLine,
    Status,
    Submit,
    Sync,
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Utterance(String),
    Empty,
}

pub const HELP: &str = "\
Comandos:
  :iniciar               iniciar dictado
  :detener               detener dictado
  :paso <1-8>            ir a un campo
  :editar <campo> <txt>  editar un campo (nit, empresa, ciudad, cliente,
                         celular, correo, tipoCliente, concepto)
  :medio <WhatsApp|Correo|->
  :asignar <id>          asignar responsable (ver :asignados)
  :asignados             listar responsables
  :linea <linea>         fijar linea de venta
  :auto                  recalcular linea de venta desde el concepto
  :estado                mostrar el registro
  :enviar                guardar el registro
  :sync                  sincronizar hardware
  :cerrar                cerrar la notificacion
  :salir
Cualquier otra linea se toma como respuesta hablada mientras se escucha.";

pub fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Input::Utterance(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "iniciar" | "start" => Command::Start,
        "detener" | "stop" => Command::Stop,
        "paso" | "step" => Command::Step(parse_step(arg)?),
        "editar" | "edit" => {
            let (field, value) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
            Command::Edit {
                key: field.parse()?,
                value: value.trim().to_string(),
            }
        }
        "medio" => match arg {
            "-" => Command::Medium(ContactMedium::Unset),
            other => Command::Medium(other.parse()?),
        },
        "asignar" => Command::Assign(arg.to_string()),
        "asignados" => Command::Assignees,
        "linea" => Command::SalesLine(arg.parse()?),
        "auto" => Command::AutoSalesLine,
        "estado" | "status" => Command::Status,
        "enviar" | "submit" => Command::Submit,
        "sync" => Command::Sync,
        "cerrar" | "dismiss" => Command::Dismiss,
        "ayuda" | "help" => Command::Help,
        "salir" | "quit" => Command::Quit,
        _ => {
            return Err(IntakeError::InvalidValue {
                field: "command".to_string(),
                value: name.to_string(),
            })
        }
    };
    Ok(Input::Command(command))
}

/// Operators count fields from 1.
fn parse_step(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if (1..=FIELD_COUNT).contains(&n) => Ok(n - 1),
        _ => Err(IntakeError::InvalidValue {
            field: "step".to_string(),
            value: arg.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse_input(line).unwrap() {
            Input::Command(c) => c,
            other => panic!("Expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_is_utterance() {
        assert_eq!(
            parse_input("  juan arroba gmail punto com ").unwrap(),
            Input::Utterance("juan arroba gmail punto com".to_string())
        );
        assert_eq!(parse_input("   ").unwrap(), Input::Empty);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(command(":iniciar"), Command::Start);
        assert_eq!(command(":DETENER"), Command::Stop);
        assert_eq!(command(":enviar"), Command::Submit);
        assert_eq!(command(":auto"), Command::AutoSalesLine);
        assert_eq!(command(":salir"), Command::Quit);
    }

    #[test]
    fn test_step_is_one_based() {
        assert_eq!(command(":paso 1"), Command::Step(0));
        assert_eq!(command(":paso 8"), Command::Step(7));
        assert!(parse_input(":paso 0").is_err());
        assert!(parse_input(":paso 9").is_err());
        assert!(parse_input(":paso dos").is_err());
    }

    #[test]
    fn test_edit_keeps_raw_value() {
        assert_eq!(
            command(":editar correo  ana arroba hotmail punto com"),
            Command::Edit {
                key: FieldKey::Correo,
                value: "ana arroba hotmail punto com".to_string()
            }
        );
        assert_eq!(
            command(":editar empresa"),
            Command::Edit {
                key: FieldKey::Empresa,
                value: String::new()
            }
        );
        assert!(parse_input(":editar telefono 300").is_err());
    }

    #[test]
    fn test_selection_commands() {
        assert_eq!(command(":medio whatsapp"), Command::Medium(ContactMedium::WhatsApp));
        assert_eq!(command(":medio -"), Command::Medium(ContactMedium::Unset));
        assert_eq!(command(":asignar 81"), Command::Assign("81".to_string()));
        assert_eq!(
            command(":linea Alquiler montacargas"),
            Command::SalesLine(SalesLine::AlquilerMontacargas)
        );
        assert!(parse_input(":linea Repuestos").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_input(":bailar").unwrap_err();
        assert!(err.to_string().contains("bailar"));
    }
}
