//! Driver tests against scripted speech collaborators and a fake record sink.
//!
//! All tests run on a paused clock, so timers fire as soon as the runtime is
//! otherwise idle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use intake_core::{
    CapturePolicy, Dismissal, FieldKey, IntakeConfig, IntakeError, NotificationLevel, Record,
    SalesLine, FIELDS,
};
use intake_dictation::{
    CapturePhase, DictationDriver, HardwareProbe, SpeechError, SpeechRecognizer,
    SpeechSynthesizer,
};
use intake_gateway::{GatewayError, RecordSink, SinkResponse, SubmissionGateway, SubmissionOutcome};

// =============================================================================
// Fakes
// =============================================================================

/// Records every prompt. Optionally never finishes playback.
#[derive(Default)]
struct FakeVoice {
    spoken: Mutex<Vec<String>>,
    hang: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeVoice {
    async fn speak(&self, text: &str, _locale: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Answers each channel with the next scripted result; waits forever once the
/// script runs out.
#[derive(Default)]
struct ScriptedEar {
    script: Mutex<VecDeque<Result<String, SpeechError>>>,
    locales: Mutex<Vec<String>>,
    dropped: Arc<AtomicUsize>,
}

impl ScriptedEar {
    fn with(results: Vec<Result<String, SpeechError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.locales.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedEar {
    async fn listen(&self, locale: &str) -> Result<String, SpeechError> {
        self.locales.lock().unwrap().push(locale.to_string());
        let _guard = DropCounter(Arc::clone(&self.dropped));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

struct FakeProbe {
    fail: bool,
}

#[async_trait]
impl HardwareProbe for FakeProbe {
    async fn check(&self) -> Result<(), SpeechError> {
        if self.fail {
            Err(SpeechError::Unavailable("permission denied".to_string()))
        } else {
            Ok(())
        }
    }
}

struct FakeSink {
    status: u16,
    posted: Mutex<Vec<Record>>,
}

impl FakeSink {
    fn answering(status: u16) -> Self {
        Self {
            status,
            posted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordSink for FakeSink {
    async fn post_record(&self, record: &Record) -> Result<SinkResponse, GatewayError> {
        self.posted.lock().unwrap().push(record.clone());
        Ok(SinkResponse {
            status: self.status,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn driver_with(
    config: &IntakeConfig,
    voice: Arc<FakeVoice>,
    ear: Arc<ScriptedEar>,
) -> DictationDriver {
    DictationDriver::new(config, voice, ear)
}

/// Pump events until `done` holds, failing after `max` events.
async fn pump_until(driver: &mut DictationDriver, max: usize, done: impl Fn(&DictationDriver) -> bool) {
    for _ in 0..max {
        if done(driver) {
            return;
        }
        driver.pump().await.expect("event channel closed");
    }
    assert!(done(driver), "condition not reached after {} events", max);
}

fn fill_valid_record(driver: &mut DictationDriver) {
    driver.manual_edit(FieldKey::Nit, "900.123.456").unwrap();
    driver.manual_edit(FieldKey::Ciudad, "Cali").unwrap();
    driver.manual_edit(FieldKey::TipoCliente, "cliente antiguo").unwrap();
    driver.manual_edit(FieldKey::Concepto, "venta de repuestos").unwrap();
    driver.assign_to("34").unwrap();
}

// =============================================================================
// Capture flow
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_dictation_fills_every_field() {
    let voice = Arc::new(FakeVoice::default());
    let ear = Arc::new(ScriptedEar::with(vec![
        Ok("900 123 456".to_string()),
        Ok("montacargas del pacifico".to_string()),
        Ok("Cali".to_string()),
        Ok("juan perez".to_string()),
        Ok("300 555 1234".to_string()),
        Ok("juan punto perez arroba gmail punto com".to_string()),
        Ok("fidelizado".to_string()),
        Ok("mantenimiento preventivo montacargas".to_string()),
    ]));
    let mut driver = driver_with(&IntakeConfig::default(), voice.clone(), ear.clone());

    driver.start_session();
    pump_until(&mut driver, 100, |d| d.controller().is_complete()).await;

    let record = driver.record();
    assert_eq!(record.nit, "900123456");
    assert_eq!(record.empresa, "MONTACARGAS DEL PACIFICO");
    assert_eq!(record.cliente, "JUAN PEREZ");
    assert_eq!(record.correo, "juan.perez@gmail.com");
    assert_eq!(record.tipo_cliente, "Fidelizado");
    assert_eq!(record.linea_venta, SalesLine::ServicioMontacargas);

    let prompts: Vec<&str> = FIELDS.iter().map(|f| f.prompt).collect();
    assert_eq!(*voice.spoken.lock().unwrap(), prompts);
    assert!(ear.locales.lock().unwrap().iter().all(|l| l == "es-ES"));
    assert_eq!(ear.calls(), 8);
    assert!(driver.session().active);
}

#[tokio::test(start_paused = true)]
async fn test_safety_timer_opens_channel_when_prompt_hangs() {
    let voice = Arc::new(FakeVoice {
        hang: true,
        ..Default::default()
    });
    let ear = Arc::new(ScriptedEar::with(vec![Ok("4455".to_string())]));
    let mut driver = driver_with(&IntakeConfig::default(), voice, ear.clone());

    let started = Instant::now();
    driver.start_session();
    pump_until(&mut driver, 10, |d| !d.record().nit.is_empty()).await;

    // 200 ms entry delay plus the 5 s prompt timeout
    assert!(started.elapsed() >= Duration::from_millis(5200));
    assert_eq!(driver.record().nit, "4455");
    assert_eq!(ear.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listen_immediately_opens_channel_with_prompt() {
    let mut config = IntakeConfig::default();
    config.dictation.capture_policy = CapturePolicy::ListenImmediately;
    let voice = Arc::new(FakeVoice {
        hang: true,
        ..Default::default()
    });
    let ear = Arc::new(ScriptedEar::with(vec![Ok("123".to_string())]));
    let mut driver = driver_with(&config, voice.clone(), ear.clone());

    let started = Instant::now();
    driver.start_session();
    pump_until(&mut driver, 10, |d| !d.record().nit.is_empty()).await;

    // No waiting on the prompt at all
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(voice.spoken.lock().unwrap()[0], "NIT");
}

#[tokio::test(start_paused = true)]
async fn test_step_jump_aborts_open_channel() {
    let voice = Arc::new(FakeVoice::default());
    let ear = Arc::new(ScriptedEar::default());
    let mut driver = driver_with(&IntakeConfig::default(), voice, ear.clone());

    driver.start_session();
    pump_until(&mut driver, 10, |d| d.session().listening).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(ear.calls(), 1);

    driver.select_step(2).unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(ear.dropped.load(Ordering::SeqCst), 1);
    assert_eq!(driver.session().step, 2);

    pump_until(&mut driver, 10, |d| d.session().listening).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(ear.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_end_session_cancels_pending_work() {
    let voice = Arc::new(FakeVoice::default());
    let ear = Arc::new(ScriptedEar::default());
    let mut driver = driver_with(&IntakeConfig::default(), voice.clone(), ear.clone());

    driver.start_session();
    driver.end_session();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(driver.pending_tasks(), 0);
    assert!(voice.spoken.lock().unwrap().is_empty());
    assert_eq!(ear.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_recognition_error_does_not_retry() {
    let voice = Arc::new(FakeVoice::default());
    let ear = Arc::new(ScriptedEar::with(vec![Err(SpeechError::NoMatch)]));
    let mut driver = driver_with(&IntakeConfig::default(), voice, ear.clone());

    driver.start_session();
    pump_until(&mut driver, 10, |d| {
        d.session().phase == CapturePhase::Idle && ear.calls() == 1
    })
    .await;

    assert!(!driver.session().listening);
    assert_eq!(driver.session().step, 0);

    let quiet = tokio::time::timeout(Duration::from_secs(30), driver.pump()).await;
    assert!(quiet.is_err());
    assert_eq!(ear.calls(), 1);
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_submit_refused_while_invalid() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );
    let gateway = SubmissionGateway::new(FakeSink::answering(201), Duration::from_secs(3));

    let err = driver.submit(&gateway).await.unwrap_err();
    match err {
        IntakeError::NotReady(messages) => {
            assert_eq!(messages[0], "NIT es obligatorio");
            assert_eq!(messages.len(), 6);
        }
        other => panic!("Expected NotReady, got {:?}", other),
    }
    assert!(gateway.sink().posted.lock().unwrap().is_empty());
    assert!(driver.notification().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_successful_submission_resets_then_restarts() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );
    let gateway = SubmissionGateway::new(FakeSink::answering(201), Duration::from_secs(3));

    fill_valid_record(&mut driver);
    driver.start_session();
    driver.select_step(4).unwrap();
    let expected = driver.record().clone();

    let outcome = driver.submit(&gateway).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Accepted { status: 201 });
    assert_eq!(gateway.sink().posted.lock().unwrap()[0], expected);
    assert_eq!(expected.asignado_a, "JOSE");

    // Cleared immediately
    assert!(driver.record().is_blank());
    assert_eq!(driver.session().step, 0);
    let notification = driver.notification().unwrap();
    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, "Datos guardados exitosamente");

    // Then back to a fresh, inactive session
    pump_until(&mut driver, 10, |d| {
        !d.session().active && d.notification().is_none()
    })
    .await;
    assert!(driver.record().is_blank());
    assert_eq!(driver.session().phase, CapturePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_submission_keeps_record() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );
    let gateway = SubmissionGateway::new(FakeSink::answering(500), Duration::from_secs(3));

    fill_valid_record(&mut driver);
    driver.select_sales_line(SalesLine::Mantenimiento);
    let before = driver.record().clone();

    let outcome = driver.submit(&gateway).await.unwrap();
    assert_eq!(outcome, SubmissionOutcome::Rejected { status: 500 });
    assert_eq!(*driver.record(), before);

    let notification = driver.notification().unwrap();
    assert_eq!(notification.message, "Error al guardar. Status: 500");
    assert_eq!(notification.dismissal, Dismissal::Manual);

    // Manual notifications wait for the operator
    let quiet = tokio::time::timeout(Duration::from_secs(60), driver.pump()).await;
    assert!(quiet.is_err());
    assert!(driver.dismiss_notification().is_some());
    assert!(driver.notification().is_none());
}

// =============================================================================
// Hardware sync
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_hardware_sync_success_auto_dismisses() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );

    driver.sync_hardware(&FakeProbe { fail: false }).await.unwrap();
    assert_eq!(
        driver.notification().unwrap().message,
        "Hardware sincronizado correctamente"
    );

    let started = Instant::now();
    pump_until(&mut driver, 5, |d| d.notification().is_none()).await;
    assert!(started.elapsed() >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_hardware_sync_failure() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );

    let err = driver
        .sync_hardware(&FakeProbe { fail: true })
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::Speech(_)));

    let notification = driver.notification().unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.message, "Error al sincronizar hardware");
    assert_eq!(
        notification.dismissal,
        Dismissal::After(Duration::from_millis(2000))
    );
}

#[tokio::test(start_paused = true)]
async fn test_newer_notification_outlives_old_timer() {
    let mut driver = driver_with(
        &IntakeConfig::default(),
        Arc::new(FakeVoice::default()),
        Arc::new(ScriptedEar::default()),
    );
    let gateway = SubmissionGateway::new(FakeSink::answering(503), Duration::from_secs(3));

    driver.sync_hardware(&FakeProbe { fail: false }).await.unwrap();
    fill_valid_record(&mut driver);
    driver.submit(&gateway).await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(1), driver.next_event()).await
    {
        driver.handle_event(event);
    }
    assert_eq!(
        driver.notification().unwrap().message,
        "Error al guardar. Status: 503"
    );
}
