//! SMS messaging over `messages.json` and the `flick_messages_cmd` slot.
//!
//! # Responsibility
//! - UI side ([`MessagingClient`]): queue outgoing texts, read and mark
//!   conversations.
//! - Daemon side ([`MessagingDaemon`]): consume send commands, hand them to
//!   the modem through [`SmsTransport`], record every message.
//!
//! # Invariants
//! - Only the daemon appends messages; the UI only clears unread counters.
//! - Message text is never logged.
//! - A send command with an empty phone number or message is dropped.

use super::{ServiceError, ServiceResult};
use crate::channel::{Command, CommandChannel, CommandMailbox};
use crate::config::StateConfig;
use crate::model::contacts::ContactsDocument;
use crate::model::messages::{
    iso_timestamp_now, AddOutcome, Conversation, Direction, Message, MessageStatus,
    MessagesDocument,
};
use crate::model::notifications::{AppNotification, AppNotifications};
use crate::model::ModelError;
use crate::poll::{PollControl, PollHandle, PollLoop, StartMode};
use crate::signal::SignalFile;
use crate::store::StateStore;
use log::{debug, info, warn};
use serde_json::json;
use std::error::Error;
use std::time::Duration;

pub const MESSAGES_APP: &str = "messages";
pub const SEND_ACTION: &str = "send";
pub const NOTIFICATION_APP_NAME: &str = "Messages";

/// Modem-facing side of the daemon.
pub trait SmsTransport {
    fn send_sms(
        &mut self,
        phone_number: &str,
        text: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub struct MessagingClient {
    store: StateStore,
    commands: CommandMailbox,
}

impl MessagingClient {
    pub fn new(config: &StateConfig) -> ServiceResult<Self> {
        Ok(Self {
            store: StateStore::from_config(config),
            commands: CommandMailbox::for_app(config, MESSAGES_APP)?,
        })
    }

    /// Writes a send request for the daemon.
    ///
    /// An earlier request the daemon has not consumed yet is replaced.
    ///
    /// # Errors
    /// - `ServiceError::Invalid` for a blank phone number or message.
    pub fn queue_send(&self, phone_number: &str, text: &str) -> ServiceResult<()> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(ModelError::EmptyField("phone_number").into());
        }
        if text.trim().is_empty() {
            return Err(ModelError::EmptyField("message").into());
        }
        let command = Command::new(SEND_ACTION).with_data(json!({
            "phone_number": phone_number,
            "message": text,
        }));
        self.commands.send(&command)?;
        info!("event=sms_queue module=service status=ok");
        Ok(())
    }

    /// Conversations, newest first.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.store
            .read_or_default::<MessagesDocument>(&MessagesDocument::key())
            .conversations
    }

    pub fn conversation(&self, phone_number: &str) -> Option<Conversation> {
        self.store
            .read_or_default::<MessagesDocument>(&MessagesDocument::key())
            .conversation(phone_number)
            .cloned()
    }

    /// Clears the unread counter; `false` when there is no such
    /// conversation (nothing is written then).
    pub fn mark_read(&self, phone_number: &str) -> ServiceResult<bool> {
        let key = MessagesDocument::key();
        let mut document: MessagesDocument = self.store.read_or_default(&key);
        if !document.mark_read(phone_number) {
            return Ok(false);
        }
        self.store.write(&key, &document)?;
        Ok(true)
    }
}

/// Result of one [`MessagingDaemon::process_pending`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No command was waiting.
    Idle,
    Sent,
    Failed,
    /// Unknown action or incomplete send request.
    Ignored,
}

pub struct MessagingDaemon<T: SmsTransport> {
    store: StateStore,
    commands: CommandMailbox,
    haptic: SignalFile,
    transport: T,
}

impl<T: SmsTransport> MessagingDaemon<T> {
    pub fn new(config: &StateConfig, transport: T) -> ServiceResult<Self> {
        Ok(Self {
            store: StateStore::from_config(config),
            commands: CommandMailbox::for_app(config, MESSAGES_APP)?,
            haptic: SignalFile::haptic(config),
            transport,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes at most one command and acts on it.
    pub fn process_pending(&mut self) -> ServiceResult<ProcessOutcome> {
        let Some(command) = self.commands.receive()? else {
            return Ok(ProcessOutcome::Idle);
        };
        if command.action != SEND_ACTION {
            warn!(
                "event=sms_command module=service status=skip reason=unknown_action action={}",
                command.action
            );
            return Ok(ProcessOutcome::Ignored);
        }

        let phone_number = command.str_field("phone_number").unwrap_or_default().trim();
        let text = command.str_field("message").unwrap_or_default();
        if phone_number.is_empty() || text.is_empty() {
            warn!("event=sms_command module=service status=skip reason=incomplete");
            return Ok(ProcessOutcome::Ignored);
        }

        let (status, outcome) = match self.transport.send_sms(phone_number, text) {
            Ok(()) => {
                info!("event=sms_send module=service status=ok");
                (MessageStatus::Sent, ProcessOutcome::Sent)
            }
            Err(err) => {
                warn!("event=sms_send module=service status=error error={err}");
                (MessageStatus::Failed, ProcessOutcome::Failed)
            }
        };
        let message = Message::new(text, Direction::Outgoing, iso_timestamp_now(), status);
        self.record(phone_number, message)?;
        Ok(outcome)
    }

    /// Stores an incoming text. A new message also requests a shell
    /// notification and a haptic pulse; duplicates are dropped silently.
    pub fn record_incoming(
        &self,
        phone_number: &str,
        text: &str,
        timestamp: &str,
    ) -> ServiceResult<AddOutcome> {
        let message = Message::new(text, Direction::Incoming, timestamp, MessageStatus::Delivered);
        let outcome = self.record(phone_number, message)?;
        if outcome == AddOutcome::Duplicate {
            debug!("event=sms_receive module=service status=skip reason=duplicate");
            return Ok(outcome);
        }

        let summary = self
            .contact_name(phone_number)
            .unwrap_or_else(|| phone_number.to_string());
        let request = AppNotifications {
            notifications: vec![AppNotification::new(NOTIFICATION_APP_NAME, summary, text)],
        };
        self.store.write(&AppNotifications::key(), &request)?;
        if let Err(err) = self.haptic.raise() {
            warn!("event=sms_receive module=service status=error reason=haptic error={err}");
        }
        info!("event=sms_receive module=service status=ok");
        Ok(outcome)
    }

    fn record(&self, phone_number: &str, message: Message) -> ServiceResult<AddOutcome> {
        let key = MessagesDocument::key();
        let mut document: MessagesDocument = self.store.read_or_default(&key);
        let contact_name = self.contact_name(phone_number);
        let outcome = document.add_message(phone_number, message, contact_name.as_deref());
        if outcome == AddOutcome::Added {
            self.store.write(&key, &document)?;
        }
        Ok(outcome)
    }

    fn contact_name(&self, phone_number: &str) -> Option<String> {
        self.store
            .read_or_default::<ContactsDocument>(&ContactsDocument::key())
            .lookup(phone_number)
            .map(|contact| contact.name.clone())
            .filter(|name| !name.is_empty())
    }
}

impl<T: SmsTransport + Send + 'static> MessagingDaemon<T> {
    /// Moves the daemon onto a poll loop that checks the command slot every
    /// `interval`.
    pub fn spawn_command_poll(mut self, interval: Duration) -> ServiceResult<PollHandle> {
        PollLoop::schedule("sms-commands", interval, StartMode::Immediate, move || {
            if let Err(err) = self.process_pending() {
                warn!("event=sms_command module=service status=error error={err}");
            }
            PollControl::Continue
        })
        .map_err(ServiceError::Spawn)
    }
}
