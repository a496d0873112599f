use flick_state_core::{
    Command, CommandChannel, CommandMailbox, CommandQueue, MediaCommand, StateConfig,
};
use serde_json::json;

fn config_in(dir: &std::path::Path) -> StateConfig {
    StateConfig::new(dir.join("state")).with_command_dir(dir.join("cmd"))
}

#[test]
fn send_then_receive_returns_command_once() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = CommandMailbox::for_app(&config_in(dir.path()), "phone").unwrap();
    let command = Command::new("dial").with_data(json!({"number": "5551234"}));

    mailbox.send(&command).unwrap();
    assert!(mailbox.pending());

    let received = mailbox.receive().unwrap().unwrap();
    assert_eq!(received, command);
    assert!(mailbox.receive().unwrap().is_none());
    assert!(!mailbox.pending());
}

#[test]
fn second_send_before_receive_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = CommandMailbox::for_app(&config_in(dir.path()), "messages").unwrap();

    mailbox.send(&Command::new("first")).unwrap();
    mailbox.send(&Command::new("second")).unwrap();

    let received = mailbox.receive().unwrap().unwrap();
    assert_eq!(received.action, "second");
    assert!(mailbox.receive().unwrap().is_none());
}

#[test]
fn send_sms_command_is_consumed_and_slot_removed() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let slot = config.command_dir.join("flick_messages_cmd");
    std::fs::create_dir_all(&config.command_dir).unwrap();
    std::fs::write(
        &slot,
        r#"{"action":"send","data":{"phone_number":"+15550001111","message":"hi"}}"#,
    )
    .unwrap();

    let mailbox = CommandMailbox::for_app(&config, "messages").unwrap();
    assert_eq!(mailbox.path(), slot.as_path());

    let command = mailbox.receive().unwrap().unwrap();
    assert_eq!(command.action, "send");
    assert_eq!(command.str_field("phone_number"), Some("+15550001111"));
    assert_eq!(command.str_field("message"), Some("hi"));
    assert_eq!(command.timestamp, 0);
    assert!(!slot.exists());
    assert!(mailbox.receive().unwrap().is_none());
}

#[test]
fn flat_legacy_command_keeps_top_level_fields() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::create_dir_all(&config.command_dir).unwrap();
    std::fs::write(
        config.command_dir.join("flick_phone_cmd"),
        r#"{"action":"dial","number":"5551234"}"#,
    )
    .unwrap();

    let mailbox = CommandMailbox::for_app(&config, "phone").unwrap();
    let command = mailbox.receive().unwrap().unwrap();
    assert_eq!(command.str_field("number"), Some("5551234"));

    mailbox.send(&command).unwrap();
    let raw = std::fs::read_to_string(mailbox.path()).unwrap();
    assert!(raw.contains("\"number\":\"5551234\""));
}

#[test]
fn malformed_slot_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    std::fs::create_dir_all(&config.command_dir).unwrap();
    let slot = config.command_dir.join("flick_messages_cmd");
    std::fs::write(&slot, "{not json").unwrap();

    let mailbox = CommandMailbox::for_app(&config, "messages").unwrap();
    assert!(mailbox.receive().unwrap().is_none());
    assert!(!slot.exists());
}

#[test]
fn app_names_are_validated() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    assert!(CommandMailbox::for_app(&config, "../etc").is_err());
    assert!(CommandMailbox::for_app(&config, "Messages").is_err());
    assert!(CommandMailbox::in_state_dir(&config, "media_command").is_ok());
}

#[test]
fn media_lines_round_trip_through_state_slot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let slot = CommandMailbox::in_state_dir(&config, "media_command").unwrap();
    assert_eq!(slot.path(), config.state_dir.join("media_command").as_path());

    let line = MediaCommand::Seek { position_secs: 30 }.encode_line(1_734_960_000_000);
    assert_eq!(line, "seek:30:1734960000000");
    slot.send_line(&line).unwrap();

    let received = slot.receive_line().unwrap().unwrap();
    assert_eq!(
        MediaCommand::parse_line(&received),
        Some(MediaCommand::Seek { position_secs: 30 })
    );
    assert!(slot.receive_line().unwrap().is_none());
}

#[test]
fn media_command_parsing() {
    assert_eq!(MediaCommand::parse_line("toggle\n"), Some(MediaCommand::Toggle));
    assert_eq!(MediaCommand::parse_line("prev"), Some(MediaCommand::Previous));
    assert_eq!(
        MediaCommand::parse_line("seek:12.7"),
        Some(MediaCommand::Seek { position_secs: 12 })
    );
    assert_eq!(MediaCommand::parse_line("seek:-1:5"), None);
    assert_eq!(MediaCommand::parse_line("rewind"), None);
    assert_eq!(MediaCommand::Next.encode_line(99), "next");
}

#[test]
fn queue_keeps_every_command_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let queue = CommandQueue::new(dir.path().join("spool"));
    assert!(queue.is_empty());

    for action in ["first", "second", "third"] {
        queue.send(&Command::new(action)).unwrap();
    }
    assert_eq!(queue.len(), 3);
    assert!(queue.pending());

    let received: Vec<String> = std::iter::from_fn(|| queue.receive().unwrap())
        .map(|command| command.action)
        .collect();
    assert_eq!(received, vec!["first", "second", "third"]);
    assert!(queue.is_empty());
}

#[test]
fn queue_skips_malformed_entries() {
    let dir = tempfile::tempdir().unwrap();
    let queue = CommandQueue::new(dir.path());
    std::fs::write(dir.path().join("0000000000001-000000-bad.json"), "oops").unwrap();
    queue.send(&Command::new("good")).unwrap();

    assert_eq!(queue.receive().unwrap().unwrap().action, "good");
    assert!(queue.receive().unwrap().is_none());
    assert!(queue.is_empty());
}

#[test]
fn concurrent_receivers_take_each_command_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mailbox = CommandMailbox::for_app(&config, "phone").unwrap();

    for round in 0..20 {
        mailbox
            .send(&Command::new("dial").with_field("number", json!(format!("555{round}"))))
            .unwrap();
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(4));
        let receivers: Vec<_> = (0..4)
            .map(|_| {
                let mailbox = mailbox.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    mailbox.receive().unwrap()
                })
            })
            .collect();
        let delivered: Vec<Command> = receivers
            .into_iter()
            .filter_map(|receiver| receiver.join().unwrap())
            .collect();
        assert_eq!(delivered.len(), 1, "round {round}");
        assert_eq!(delivered[0].str_field("number"), Some(format!("555{round}").as_str()));
    }

    let leftovers: Vec<_> = std::fs::read_dir(&config.command_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

#[test]
fn queue_orders_by_enqueue_time_not_sender_clock() {
    let dir = tempfile::tempdir().unwrap();
    let queue = CommandQueue::new(dir.path().join("spool"));

    let mut skewed = Command::new("first");
    skewed.timestamp = 9_999_999_999_999;
    queue.send(&skewed).unwrap();
    let mut unstamped = Command::new("second");
    unstamped.timestamp = 0;
    queue.send(&unstamped).unwrap();
    queue.send(&Command::new("third")).unwrap();

    let received: Vec<Command> = std::iter::from_fn(|| queue.receive().unwrap()).collect();
    let actions: Vec<&str> = received.iter().map(|command| command.action.as_str()).collect();
    assert_eq!(actions, vec!["first", "second", "third"]);
    assert_eq!(received[0].timestamp, 9_999_999_999_999);
    assert_eq!(received[1].timestamp, 0);
}
