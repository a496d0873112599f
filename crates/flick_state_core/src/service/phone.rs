//! Telephony over `flick_phone_cmd`, `flick_phone_status` and
//! `call_history.json`.
//!
//! # Responsibility
//! - UI side ([`PhoneClient`]): send dial, answer, hangup and speaker
//!   commands; read the live call and the history.
//! - Daemon side ([`PhoneDaemon`]): run commands on the modem through
//!   [`CallControl`], publish the live call, record finished calls.
//!
//! # Invariants
//! - Commands use the flat layout (`{"action":"dial","number":"..."}`).
//! - A call is recorded exactly once, when the modem returns to `idle`.
//! - An unanswered incoming call is recorded as missed.

use super::{ServiceError, ServiceResult};
use crate::channel::{Command, CommandChannel, CommandMailbox};
use crate::config::StateConfig;
use crate::model::calls::{CallDirection, CallHistory, CallRecord, CallState, CallStatus};
use crate::model::ModelError;
use crate::poll::{watch_document, PollControl, PollHandle, PollLoop, StartMode};
use crate::signal::SignalFile;
use crate::store::StateStore;
use log::{debug, info, warn};
use serde_json::json;
use std::error::Error;
use std::time::{Duration, Instant};

pub const PHONE_APP: &str = "phone";

/// Request understood by the phone daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneCommand {
    Dial(String),
    Answer,
    Hangup,
    Speaker(bool),
}

impl PhoneCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Dial(_) => "dial",
            Self::Answer => "answer",
            Self::Hangup => "hangup",
            Self::Speaker(_) => "speaker",
        }
    }

    pub fn to_command(&self) -> Command {
        let command = Command::new(self.action());
        match self {
            Self::Dial(number) => command.with_field("number", json!(number)),
            Self::Speaker(enabled) => command.with_field("enabled", json!(enabled)),
            Self::Answer | Self::Hangup => command,
        }
    }

    /// `None` for unknown actions and a dial without a number.
    pub fn from_command(command: &Command) -> Option<Self> {
        match command.action.as_str() {
            "dial" => command
                .str_field("number")
                .map(str::trim)
                .filter(|number| !number.is_empty())
                .map(|number| Self::Dial(number.to_string())),
            "answer" => Some(Self::Answer),
            "hangup" => Some(Self::Hangup),
            "speaker" => Some(Self::Speaker(command.bool_field("enabled").unwrap_or(false))),
            _ => None,
        }
    }
}

pub struct PhoneClient {
    commands: CommandMailbox,
    status_store: StateStore,
    store: StateStore,
    poll_interval: Duration,
}

impl PhoneClient {
    pub fn new(config: &StateConfig) -> ServiceResult<Self> {
        Ok(Self {
            commands: CommandMailbox::for_app(config, PHONE_APP)?,
            status_store: StateStore::volatile(config),
            store: StateStore::from_config(config),
            poll_interval: config.poll.call_status,
        })
    }

    /// # Errors
    /// - `ServiceError::Invalid` for a blank number.
    pub fn dial(&self, number: &str) -> ServiceResult<()> {
        let number = number.trim();
        if number.is_empty() {
            return Err(ModelError::EmptyField("number").into());
        }
        self.send(PhoneCommand::Dial(number.to_string()))
    }

    pub fn answer(&self) -> ServiceResult<()> {
        self.send(PhoneCommand::Answer)
    }

    pub fn hangup(&self) -> ServiceResult<()> {
        self.send(PhoneCommand::Hangup)
    }

    pub fn set_speaker(&self, enabled: bool) -> ServiceResult<()> {
        self.send(PhoneCommand::Speaker(enabled))
    }

    /// Live call; idle when the daemon has published nothing.
    pub fn status(&self) -> CallStatus {
        self.status_store.read_or_default(&CallStatus::volatile_key())
    }

    pub fn history(&self) -> CallHistory {
        self.store.read_or_default(&CallHistory::key())
    }

    /// Polls the live call every `poll.call_status` and reports changes.
    pub fn watch_status<F>(&self, on_change: F) -> ServiceResult<PollHandle>
    where
        F: FnMut(CallStatus) -> PollControl + Send + 'static,
    {
        watch_document(
            self.status_store.clone(),
            CallStatus::volatile_key(),
            CallStatus::default(),
            self.poll_interval,
            StartMode::Immediate,
            on_change,
        )
        .map_err(ServiceError::Spawn)
    }

    fn send(&self, command: PhoneCommand) -> ServiceResult<()> {
        self.commands.send(&command.to_command())?;
        info!(
            "event=phone_command module=service status=ok action={}",
            command.action()
        );
        Ok(())
    }
}

/// Modem-facing side of the phone daemon.
pub trait CallControl {
    fn dial(&mut self, number: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
    fn answer(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
    fn hangup(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
    fn set_speaker(&mut self, enabled: bool) -> Result<(), Box<dyn Error + Send + Sync>>;
    /// Current call as the modem sees it; `duration` is ignored.
    fn current_call(&mut self) -> Result<CallStatus, Box<dyn Error + Send + Sync>>;
}

/// Call being tracked between modem polls.
#[derive(Debug, Default)]
struct CallTracker {
    last_state: CallState,
    number: String,
    started: Option<Instant>,
    outgoing: bool,
    connected: bool,
}

impl CallTracker {
    fn elapsed_secs(&self) -> u64 {
        self.started
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }

    fn direction(&self) -> CallDirection {
        if self.outgoing {
            CallDirection::Outgoing
        } else if self.connected {
            CallDirection::Incoming
        } else {
            CallDirection::Missed
        }
    }
}

pub struct PhoneDaemon<M: CallControl> {
    store: StateStore,
    status_store: StateStore,
    commands: CommandMailbox,
    haptic: SignalFile,
    modem: M,
    call: CallTracker,
}

impl<M: CallControl> PhoneDaemon<M> {
    pub fn new(config: &StateConfig, modem: M) -> ServiceResult<Self> {
        Ok(Self {
            store: StateStore::from_config(config),
            status_store: StateStore::volatile(config),
            commands: CommandMailbox::for_app(config, PHONE_APP)?,
            haptic: SignalFile::haptic(config),
            modem,
            call: CallTracker::default(),
        })
    }

    pub fn modem(&self) -> &M {
        &self.modem
    }

    /// Consumes at most one command and runs it on the modem.
    ///
    /// Returns the command that was taken; a modem failure is logged and
    /// the command is not retried.
    pub fn process_pending(&mut self) -> ServiceResult<Option<PhoneCommand>> {
        let Some(raw) = self.commands.receive()? else {
            return Ok(None);
        };
        let Some(command) = PhoneCommand::from_command(&raw) else {
            warn!(
                "event=phone_command module=service status=skip reason=unknown_action action={}",
                raw.action
            );
            return Ok(None);
        };

        let result = match &command {
            PhoneCommand::Dial(number) => self.modem.dial(number),
            PhoneCommand::Answer => self.modem.answer(),
            PhoneCommand::Hangup => self.modem.hangup(),
            PhoneCommand::Speaker(enabled) => self.modem.set_speaker(*enabled),
        };
        match result {
            Ok(()) => {
                match &command {
                    PhoneCommand::Dial(number) => {
                        self.call.number = number.clone();
                        self.call.started = Some(Instant::now());
                        self.call.outgoing = true;
                    }
                    PhoneCommand::Answer if self.call.last_state == CallState::Incoming => {
                        self.call.started = Some(Instant::now());
                        self.call.connected = true;
                    }
                    _ => {}
                }
                info!(
                    "event=phone_command module=service status=ok action={}",
                    command.action()
                );
            }
            Err(err) => warn!(
                "event=phone_command module=service status=error action={} error={err}",
                command.action()
            ),
        }
        Ok(Some(command))
    }

    /// Applies one modem observation: publishes the live call and records
    /// the call that just ended, if any.
    pub fn observe(&mut self, current: CallStatus) -> ServiceResult<Option<CallRecord>> {
        let previous = self.call.last_state;
        let state = current.state;
        let ringing = previous == CallState::Idle && state == CallState::Incoming;
        if ringing {
            // A dial that never reached the modem must not mark this call outgoing.
            self.call = CallTracker::default();
        }
        if !current.number.is_empty() {
            self.call.number = current.number.clone();
        }
        if state.is_outgoing_setup() {
            self.call.outgoing = true;
        }
        if state == CallState::Active && !self.call.connected {
            self.call.connected = true;
            self.call.started.get_or_insert_with(Instant::now);
        }
        if ringing {
            match self.haptic.raise() {
                Ok(()) => info!("event=phone_ring module=service status=ok"),
                Err(err) => warn!(
                    "event=phone_ring module=service status=error reason=haptic error={err}"
                ),
            }
        }

        let mut finished = None;
        if previous.is_call() && state == CallState::Idle {
            let record = CallRecord::new(
                self.call.number.clone(),
                self.call.direction(),
                self.call.elapsed_secs(),
            );
            self.store.update(&CallHistory::key(), CallHistory::default(), |history| {
                history.record(record.clone())
            })?;
            info!(
                "event=call_end module=service status=ok direction={:?} duration={}",
                record.direction, record.duration
            );
            self.call = CallTracker::default();
            finished = Some(record);
        }

        let published = if state == CallState::Idle {
            CallStatus::default()
        } else {
            CallStatus {
                number: self.call.number.clone(),
                duration: self.call.elapsed_secs(),
                ..current
            }
        };
        self.status_store.write(&CallStatus::volatile_key(), &published)?;
        self.call.last_state = state;
        Ok(finished)
    }

    /// One daemon pass: a pending command, then a modem poll.
    pub fn tick(&mut self) -> ServiceResult<Option<CallRecord>> {
        self.process_pending()?;
        match self.modem.current_call() {
            Ok(current) => self.observe(current),
            Err(err) => {
                debug!("event=phone_poll module=service status=error error={err}");
                Ok(None)
            }
        }
    }
}

impl<M: CallControl + Send + 'static> PhoneDaemon<M> {
    /// Moves the daemon onto a poll loop that runs [`PhoneDaemon::tick`]
    /// every `interval`.
    pub fn spawn(mut self, interval: Duration) -> ServiceResult<PollHandle> {
        PollLoop::schedule("phone", interval, StartMode::Immediate, move || {
            if let Err(err) = self.tick() {
                warn!("event=phone_poll module=service status=error error={err}");
            }
            PollControl::Continue
        })
        .map_err(ServiceError::Spawn)
    }
}
