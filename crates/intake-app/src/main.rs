//! Intake application binary - composition root.
//!
//! 1. Resolve configuration (CLI > env > TOML file > defaults)
//! 2. Initialize tracing
//! 3. Wire the dictation driver to console speech stand-ins and the HTTP sink
//! 4. Run the operator loop on a single-threaded runtime

mod cli;
mod command;
mod console;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use intake_core::{AssigneeDirectory, IntakeConfig, FIELDS};
use intake_dictation::{CaptureEvent, DictationDriver, DriverEvent, SalesLineMode};
use intake_gateway::{HttpRecordSink, RecordSink, SubmissionGateway};

use crate::cli::CliArgs;
use crate::command::{parse_input, Command, Input, HELP};
use crate::console::{ConsoleEar, ConsoleProbe, ConsoleVoice};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = IntakeConfig::load_or_default(&config_file);
    config.gateway.endpoint = args.resolve_endpoint(&config.gateway.endpoint);
    config.dictation.capture_policy = args.resolve_policy(config.dictation.capture_policy)?;
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Intake v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        endpoint = %config.gateway.endpoint,
        policy = %config.dictation.capture_policy,
        "Configuration resolved"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: IntakeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();
    let mut driver = DictationDriver::new(
        &config,
        Arc::new(ConsoleVoice),
        Arc::new(ConsoleEar::new(utterance_rx)),
    );
    let gateway = SubmissionGateway::new(
        HttpRecordSink::new(&config.gateway)?,
        config.gateway.restart_delay(),
    );

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = driver.next_event() => {
                let Some(event) = event else { break };
                let step = driver.session().step;
                let was_complete = driver.controller().is_complete();
                let transcript = matches!(event, DriverEvent::Capture(CaptureEvent::Transcript { .. }));
                driver.handle_event(event);

                let committed = transcript
                    && (driver.session().step != step
                        || (!was_complete && driver.controller().is_complete()));
                if committed {
                    let field = &FIELDS[step];
                    println!("  {} = {:?}", field.label, driver.record().get(field.key));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Ok(Input::Empty) => {}
                    Ok(Input::Utterance(text)) => {
                        if driver.session().listening {
                            let _ = utterance_tx.send(text);
                        } else {
                            println!("(no se esta escuchando; use :editar o :iniciar)");
                        }
                    }
                    Ok(Input::Command(Command::Quit)) => break,
                    Ok(Input::Command(command)) => {
                        if let Err(e) = apply(&mut driver, &gateway, command).await {
                            println!("! {}", e);
                        }
                    }
                    Err(e) => println!("! {}", e),
                }
            }
        }
    }

    driver.end_session();
    tracing::info!("Intake stopped");
    Ok(())
}

async fn apply<S: RecordSink>(
    driver: &mut DictationDriver,
    gateway: &SubmissionGateway<S>,
    command: Command,
) -> intake_core::Result<()> {
    match command {
        Command::Start => driver.start_session(),
        Command::Stop => driver.end_session(),
        Command::Step(step) => driver.select_step(step)?,
        Command::Edit { key, value } => driver.manual_edit(key, &value)?,
        Command::Medium(medium) => driver.select_contact_medium(medium),
        Command::Assign(id) => driver.assign_to(&id)?,
        Command::Assignees => {
            for assignee in AssigneeDirectory::all() {
                println!("  {:>3}  {}", assignee.id, assignee.label);
            }
        }
        Command::SalesLine(line) => driver.select_sales_line(line),
        Command::AutoSalesLine => {
            let line = driver.recompute_sales_line();
            println!("  Linea de venta: {:?}", line.as_str());
        }
        Command::Status => print_status(driver),
        Command::Submit => {
            driver.submit(gateway).await?;
            print_notification(driver);
        }
        Command::Sync => {
            if let Err(e) = driver.sync_hardware(&ConsoleProbe).await {
                tracing::warn!(error = %e, "Hardware sync failed");
            }
            print_notification(driver);
        }
        Command::Dismiss => {
            driver.dismiss_notification();
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_status(driver: &DictationDriver) {
    let session = driver.session();
    let record = driver.record();
    println!(
        "Sesion {} ({}, paso {}/{})",
        session.session_id,
        if session.active { "activa" } else { "inactiva" },
        session.step + 1,
        FIELDS.len()
    );
    for (i, field) in FIELDS.iter().enumerate() {
        let marker = if i == session.step { ">" } else { " " };
        println!("{} {:<20} {:?}", marker, field.label, record.get(field.key));
    }

    let suggestion = driver.sales_line_suggestion();
    let mode = match suggestion.mode {
        SalesLineMode::Auto => "auto",
        SalesLineMode::Manual => "manual",
    };
    println!("  {:<20} {:?}", "Medio de contacto", record.medio_contacto.as_str());
    println!("  {:<20} {:?}", "Asignado a", record.asignado_a);
    println!(
        "  {:<20} {:?} ({}; sugerida {:?})",
        "Linea de venta",
        suggestion.current.as_str(),
        mode,
        suggestion.suggested.as_str()
    );

    let validation = driver.validation();
    if validation.is_ok() {
        println!("Listo para enviar");
    } else {
        for message in validation.messages() {
            println!("  - {}", message);
        }
    }
    print_notification(driver);
}

fn print_notification(driver: &DictationDriver) {
    if let Some(notification) = driver.notification() {
        let tag = if notification.is_success() { "OK" } else { "ERROR" };
        println!("[{}] {}", tag, notification.message);
    }
}
