use flick_state_core::model::contacts::{Contact, ContactsDocument};
use flick_state_core::model::messages::{AddOutcome, MessageStatus, MessagesDocument};
use flick_state_core::model::notifications::AppNotifications;
use flick_state_core::service::{
    MessagingClient, MessagingDaemon, ProcessOutcome, ServiceError, SmsTransport,
};
use flick_state_core::{SignalFile, StateConfig, StateStore};
use std::error::Error;
use std::time::{Duration, Instant};

#[derive(Default)]
struct RecordingModem {
    sent: Vec<(String, String)>,
    fail: bool,
}

impl SmsTransport for RecordingModem {
    fn send_sms(
        &mut self,
        phone_number: &str,
        text: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.fail {
            return Err("modem offline".into());
        }
        self.sent.push((phone_number.to_string(), text.to_string()));
        Ok(())
    }
}

fn config_in(dir: &std::path::Path) -> StateConfig {
    StateConfig::new(dir.join("state")).with_command_dir(dir.join("cmd"))
}

#[test]
fn queued_send_is_delivered_and_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = MessagingClient::new(&config).unwrap();
    let mut daemon = MessagingDaemon::new(&config, RecordingModem::default()).unwrap();

    client.queue_send("+1 555 000 1111", "hi").unwrap();
    assert_eq!(daemon.process_pending().unwrap(), ProcessOutcome::Sent);
    assert_eq!(daemon.process_pending().unwrap(), ProcessOutcome::Idle);
    assert!(!config.command_dir.join("flick_messages_cmd").exists());

    assert_eq!(
        daemon.transport().sent,
        vec![("+1 555 000 1111".to_string(), "hi".to_string())]
    );
    let conversation = client.conversation("5550001111").unwrap();
    assert_eq!(conversation.phone_number, "5550001111");
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].status, MessageStatus::Sent);
    assert_eq!(conversation.unread_count, 0);
}

#[test]
fn failed_send_is_recorded_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = MessagingClient::new(&config).unwrap();
    let modem = RecordingModem {
        fail: true,
        ..RecordingModem::default()
    };
    let mut daemon = MessagingDaemon::new(&config, modem).unwrap();

    client.queue_send("5550001111", "are you there").unwrap();
    assert_eq!(daemon.process_pending().unwrap(), ProcessOutcome::Failed);
    let conversation = client.conversation("5550001111").unwrap();
    assert_eq!(conversation.messages[0].status, MessageStatus::Failed);
}

#[test]
fn incomplete_or_unknown_commands_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::create_dir_all(&config.command_dir).unwrap();
    let slot = config.command_dir.join("flick_messages_cmd");
    let mut daemon = MessagingDaemon::new(&config, RecordingModem::default()).unwrap();

    std::fs::write(
        &slot,
        r#"{"action":"send","data":{"phone_number":"","message":"hi"}}"#,
    )
    .unwrap();
    assert_eq!(daemon.process_pending().unwrap(), ProcessOutcome::Ignored);
    std::fs::write(&slot, r#"{"action":"delete","data":{}}"#).unwrap();
    assert_eq!(daemon.process_pending().unwrap(), ProcessOutcome::Ignored);

    assert!(daemon.transport().sent.is_empty());
    assert!(!slot.exists());
}

#[test]
fn blank_send_is_rejected_by_client() {
    let dir = tempfile::tempdir().unwrap();
    let client = MessagingClient::new(&config_in(dir.path())).unwrap();

    assert!(matches!(
        client.queue_send(" ", "hi"),
        Err(ServiceError::Invalid(_))
    ));
    assert!(matches!(
        client.queue_send("5550001111", ""),
        Err(ServiceError::Invalid(_))
    ));
}

#[test]
fn incoming_message_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = StateStore::from_config(&config);
    let mut contacts = ContactsDocument::default();
    contacts.upsert(Contact::new("Ada Lovelace", "+1 (555) 000-1111"));
    store.write(&ContactsDocument::key(), &contacts).unwrap();
    let daemon = MessagingDaemon::new(&config, RecordingModem::default()).unwrap();

    let outcome = daemon
        .record_incoming("+15550001111", "hello there", "2025-12-23T10:00:00")
        .unwrap();
    assert_eq!(outcome, AddOutcome::Added);

    let notifications: AppNotifications = store.read_or_default(&AppNotifications::key());
    assert_eq!(notifications.notifications.len(), 1);
    assert_eq!(notifications.notifications[0].app_name, "Messages");
    assert_eq!(notifications.notifications[0].summary, "Ada Lovelace");
    assert!(SignalFile::haptic(&config).check());

    store.remove(&AppNotifications::key()).unwrap();
    SignalFile::haptic(&config).clear().unwrap();
    let outcome = daemon
        .record_incoming("5550001111", "hello there", "2025-12-23T10:01:00")
        .unwrap();
    assert_eq!(outcome, AddOutcome::Duplicate);
    assert!(!store.exists(&AppNotifications::key()));
    assert!(!SignalFile::haptic(&config).check());

    let document: MessagesDocument = store.read_or_default(&MessagesDocument::key());
    assert_eq!(document.conversations.len(), 1);
    assert_eq!(document.conversations[0].contact_name, "Ada Lovelace");
    assert_eq!(document.unread_total(), 1);
}

#[test]
fn mark_read_clears_unread_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = MessagingClient::new(&config).unwrap();
    let daemon = MessagingDaemon::new(&config, RecordingModem::default()).unwrap();

    daemon
        .record_incoming("5550001111", "one", "2025-12-23T10:00:00")
        .unwrap();
    daemon
        .record_incoming("5550002222", "two", "2025-12-23T11:00:00")
        .unwrap();

    let conversations = client.conversations();
    assert_eq!(conversations[0].phone_number, "5550002222");
    assert!(client.mark_read("+1 555 000 1111").unwrap());
    assert!(!client.mark_read("5559999999").unwrap());
    assert_eq!(client.conversation("5550001111").unwrap().unread_count, 0);
    assert_eq!(client.conversation("5550002222").unwrap().unread_count, 1);
}

#[test]
fn spawned_command_poll_delivers_queued_send() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let client = MessagingClient::new(&config).unwrap();
    let daemon = MessagingDaemon::new(&config, RecordingModem::default()).unwrap();
    let handle = daemon.spawn_command_poll(Duration::from_millis(10)).unwrap();

    client.queue_send("5550002222", "on my way").unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut conversation = None;
    while conversation.is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
        conversation = client.conversation("5550002222");
    }
    handle.stop();

    let conversation = conversation.expect("send recorded by the daemon loop");
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].text, "on my way");
    assert_eq!(conversation.messages[0].status, MessageStatus::Sent);
    assert!(!config.command_dir.join("flick_messages_cmd").exists());
}
