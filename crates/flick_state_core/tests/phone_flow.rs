use crossbeam_channel::unbounded;
use flick_state_core::model::calls::{CallDirection, CallState, CallStatus};
use flick_state_core::service::{CallControl, PhoneClient, PhoneCommand, PhoneDaemon, ServiceError};
use flick_state_core::{PollControl, SignalFile, StateConfig};
use serde_json::Value;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Modem double: logs requests and reports whatever call the test sets.
#[derive(Clone, Default)]
struct FakeModem {
    requests: Arc<Mutex<Vec<String>>>,
    current: Arc<Mutex<CallStatus>>,
}

impl FakeModem {
    fn log(&self, request: String) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }

    fn set(&self, state: CallState, number: &str) {
        *self.current.lock().unwrap() = call(state, number);
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl CallControl for FakeModem {
    fn dial(&mut self, number: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log(format!("dial {number}"))
    }

    fn answer(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log("answer".to_string())
    }

    fn hangup(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log("hangup".to_string())
    }

    fn set_speaker(&mut self, enabled: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log(format!("speaker {enabled}"))
    }

    fn current_call(&mut self) -> Result<CallStatus, Box<dyn Error + Send + Sync>> {
        Ok(self.current.lock().unwrap().clone())
    }
}

fn call(state: CallState, number: &str) -> CallStatus {
    CallStatus {
        state,
        number: number.to_string(),
        ..CallStatus::default()
    }
}

fn config_in(dir: &std::path::Path) -> StateConfig {
    let mut config = StateConfig::new(dir.join("state")).with_command_dir(dir.join("tmp"));
    config.poll.call_status = Duration::from_millis(10);
    config
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn client_writes_flat_phone_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let slot = config.command_dir.join("flick_phone_cmd");
    let read_slot = || -> Value {
        let raw = std::fs::read_to_string(&slot).unwrap();
        serde_json::from_str(&raw).unwrap()
    };

    client.dial(" 5551234 ").unwrap();
    let raw = read_slot();
    assert_eq!(raw["action"], "dial");
    assert_eq!(raw["number"], "5551234");

    client.set_speaker(true).unwrap();
    let raw = read_slot();
    assert_eq!(raw["action"], "speaker");
    assert_eq!(raw["enabled"], true);

    client.hangup().unwrap();
    assert_eq!(read_slot()["action"], "hangup");

    assert!(matches!(client.dial("  "), Err(ServiceError::Invalid(_))));
    assert_eq!(read_slot()["action"], "hangup");
}

#[test]
fn daemon_runs_pending_command_on_modem() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let modem = FakeModem::default();
    let mut daemon = PhoneDaemon::new(&config, modem.clone()).unwrap();

    client.dial("5551234").unwrap();
    assert_eq!(
        daemon.process_pending().unwrap(),
        Some(PhoneCommand::Dial("5551234".to_string()))
    );
    assert_eq!(daemon.process_pending().unwrap(), None);

    client.set_speaker(false).unwrap();
    assert_eq!(
        daemon.process_pending().unwrap(),
        Some(PhoneCommand::Speaker(false))
    );

    std::fs::write(
        config.command_dir.join("flick_phone_cmd"),
        r#"{"action":"conference"}"#,
    )
    .unwrap();
    assert_eq!(daemon.process_pending().unwrap(), None);
    assert_eq!(modem.requests(), vec!["dial 5551234", "speaker false"]);
}

#[test]
fn outgoing_call_is_recorded_once_when_it_ends() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let mut daemon = PhoneDaemon::new(&config, FakeModem::default()).unwrap();

    client.dial("5551234").unwrap();
    daemon.process_pending().unwrap();
    assert!(daemon.observe(call(CallState::Dialing, "")).unwrap().is_none());
    assert!(daemon.observe(call(CallState::Alerting, "5551234")).unwrap().is_none());
    assert!(daemon.observe(call(CallState::Active, "5551234")).unwrap().is_none());

    let live = client.status();
    assert_eq!(live.state, CallState::Active);
    assert_eq!(live.number, "5551234");
    assert_eq!(CallStatus::path(&config), config.command_dir.join("flick_phone_status"));

    let record = daemon.observe(call(CallState::Idle, "")).unwrap().unwrap();
    assert_eq!(record.number, "5551234");
    assert_eq!(record.direction, CallDirection::Outgoing);
    assert!(!record.timestamp.is_empty());
    assert!(client.status().is_idle());

    assert!(daemon.observe(call(CallState::Idle, "")).unwrap().is_none());
    let history = client.history();
    assert_eq!(history.records().len(), 1);
    assert_eq!(history.records()[0], record);
}

#[test]
fn unanswered_incoming_call_rings_and_is_missed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let haptic = SignalFile::haptic(&config);
    let mut daemon = PhoneDaemon::new(&config, FakeModem::default()).unwrap();

    daemon.observe(call(CallState::Idle, "")).unwrap();
    assert!(!haptic.check());
    daemon.observe(call(CallState::Incoming, "5559876")).unwrap();
    assert!(haptic.check());

    let record = daemon.observe(call(CallState::Idle, "")).unwrap().unwrap();
    assert_eq!(record.number, "5559876");
    assert_eq!(record.direction, CallDirection::Missed);
    assert_eq!(record.duration, 0);
}

#[test]
fn dial_that_never_connects_does_not_mark_next_call_outgoing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let mut daemon = PhoneDaemon::new(&config, FakeModem::default()).unwrap();

    client.dial("5551234").unwrap();
    daemon.process_pending().unwrap();
    assert!(daemon.observe(call(CallState::Idle, "")).unwrap().is_none());

    daemon.observe(call(CallState::Incoming, "5559876")).unwrap();
    let record = daemon.observe(call(CallState::Idle, "")).unwrap().unwrap();
    assert_eq!(record.number, "5559876");
    assert_eq!(record.direction, CallDirection::Missed);
    assert_eq!(client.history().records().len(), 1);
}

#[test]
fn answered_incoming_call_is_recorded_as_incoming() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let modem = FakeModem::default();
    let mut daemon = PhoneDaemon::new(&config, modem.clone()).unwrap();

    daemon.observe(call(CallState::Incoming, "5559876")).unwrap();
    client.answer().unwrap();
    assert_eq!(daemon.process_pending().unwrap(), Some(PhoneCommand::Answer));
    daemon.observe(call(CallState::Active, "5559876")).unwrap();
    client.hangup().unwrap();
    daemon.process_pending().unwrap();

    let record = daemon.observe(call(CallState::Idle, "")).unwrap().unwrap();
    assert_eq!(record.direction, CallDirection::Incoming);
    assert_eq!(modem.requests(), vec!["answer", "hangup"]);
    assert_eq!(client.history().missed_count(), 0);
}

#[test]
fn spawned_daemon_tracks_a_call_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = PhoneClient::new(&config).unwrap();
    let modem = FakeModem::default();
    let daemon = PhoneDaemon::new(&config, modem.clone()).unwrap();
    let handle = daemon.spawn(Duration::from_millis(10)).unwrap();

    let (tx, rx) = unbounded();
    let watch = client
        .watch_status(move |status| {
            let _ = tx.send(status.state);
            PollControl::Continue
        })
        .unwrap();

    client.dial("5551234").unwrap();
    assert!(wait_until(|| modem.requests() == vec!["dial 5551234"]));
    modem.set(CallState::Active, "5551234");
    assert!(wait_until(|| client.status().state == CallState::Active));
    assert!(wait_until(|| rx.try_iter().any(|state| state == CallState::Active)));

    modem.set(CallState::Idle, "");
    assert!(wait_until(|| client.history().records().len() == 1));
    handle.stop();
    watch.stop();

    let history = client.history();
    let record = &history.records()[0];
    assert_eq!(record.number, "5551234");
    assert_eq!(record.direction, CallDirection::Outgoing);
}
