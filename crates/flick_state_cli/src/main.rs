//! `flick-state`: inspect and drive the Flick state directory from a shell.
//!
//! # Responsibility
//! - Expose store, command slot, signal and calendar operations for
//!   scripts and manual debugging.
//! - Map outcomes to exit codes (`signal check` is 0 when raised, 1 when not).

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::unbounded;
use flick_state_core::model::calendar::DATE_KEY_FORMAT;
use flick_state_core::service::CalendarService;
use flick_state_core::{
    default_log_level, init_logging, watch_document, Command, CommandChannel, CommandMailbox,
    DocumentKey, JsonStyle, PollControl, SignalFile, StartMode, StateConfig, StateStore,
};
use log::info;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flick-state", version, about = "Flick state directory tool")]
struct Cli {
    /// State directory; defaults to the resolved per-user location.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Directory of `flick_<app>_cmd` slots and volatile markers.
    #[arg(long, global = true)]
    command_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enables file logging into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Write compact JSON instead of pretty-printed.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print a document.
    Read { key: String },
    /// Replace a document with the given JSON.
    Write { key: String, json: String },
    /// Put a command into a slot, replacing any unconsumed one.
    Send {
        /// App name (`messages` -> `flick_messages_cmd`) or, with
        /// `--state-slot`, a slot file in the state directory.
        slot: String,
        action: String,
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        state_slot: bool,
    },
    /// Take the pending command from a slot and print it.
    Receive {
        slot: String,
        #[arg(long)]
        state_slot: bool,
        /// Print the raw line instead of parsing JSON.
        #[arg(long)]
        line: bool,
    },
    /// Raise, check or clear a marker file.
    Signal {
        action: SignalAction,
        name: String,
        /// Look in the command directory instead of the state directory.
        #[arg(long)]
        volatile: bool,
    },
    /// Print a document every time its content changes.
    Watch {
        key: String,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many reports.
        #[arg(long)]
        count: Option<usize>,
    },
    /// List calendar events of one day.
    Events {
        /// `YYYY-MM-DD`.
        date: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SignalAction {
    Raise,
    Check,
    Clear,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = if log_dir.is_absolute() {
            log_dir.clone()
        } else {
            std::env::current_dir()?.join(log_dir)
        };
        init_logging(level, &log_dir).map_err(|err| anyhow!("{err}"))?;
    }

    let mut config = match &cli.state_dir {
        Some(state_dir) => StateConfig::new(state_dir),
        None => StateConfig::from_env()?,
    };
    if let Some(command_dir) = &cli.command_dir {
        config = config.with_command_dir(command_dir);
    }
    if cli.compact {
        config = config.with_json_style(JsonStyle::Compact);
    }
    info!(
        "event=cli_start module=cli status=ok state_dir={}",
        config.state_dir.display()
    );

    run(cli.command, &config)
}

fn run(command: Cmd, config: &StateConfig) -> anyhow::Result<ExitCode> {
    let store = StateStore::from_config(config);
    match command {
        Cmd::Read { key } => {
            let key = DocumentKey::new(key)?;
            let document = store
                .try_read::<Value>(&key)?
                .ok_or_else(|| anyhow!("document `{key}` not found"))?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Cmd::Write { key, json } => {
            let key = DocumentKey::new(key)?;
            let document: Value =
                serde_json::from_str(&json).context("document is not valid JSON")?;
            store.write(&key, &document)?;
        }
        Cmd::Send {
            slot,
            action,
            data,
            state_slot,
        } => {
            let mailbox = open_slot(config, &slot, state_slot)?;
            let mut command = Command::new(action);
            if let Some(data) = data {
                let data: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
                command = command.with_data(data);
            }
            mailbox.send(&command)?;
        }
        Cmd::Receive {
            slot,
            state_slot,
            line,
        } => {
            let mailbox = open_slot(config, &slot, state_slot)?;
            if line {
                match mailbox.receive_line()? {
                    Some(line) => println!("{line}"),
                    None => return Ok(ExitCode::FAILURE),
                }
            } else {
                match mailbox.receive()? {
                    Some(command) => println!("{}", serde_json::to_string(&command)?),
                    None => return Ok(ExitCode::FAILURE),
                }
            }
        }
        Cmd::Signal {
            action,
            name,
            volatile,
        } => {
            let name = DocumentKey::new(name)?;
            let dir = if volatile {
                &config.command_dir
            } else {
                &config.state_dir
            };
            let signal = SignalFile::new(name.resolve(dir));
            match action {
                SignalAction::Raise => signal.raise()?,
                SignalAction::Clear => signal.clear()?,
                SignalAction::Check => {
                    if !signal.check() {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Cmd::Watch {
            key,
            interval_ms,
            count,
        } => watch(store, DocumentKey::new(key)?, interval_ms, count)?,
        Cmd::Events { date } => {
            let date = NaiveDate::parse_from_str(date.trim(), DATE_KEY_FORMAT)
                .with_context(|| format!("invalid date `{date}`; expected YYYY-MM-DD"))?;
            for event in CalendarService::new(store).events_for(date) {
                let time = if event.time.is_empty() {
                    "all-day"
                } else {
                    event.time.as_str()
                };
                println!("{time}\t{}", event.title);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open_slot(
    config: &StateConfig,
    slot: &str,
    state_slot: bool,
) -> anyhow::Result<CommandMailbox> {
    let mailbox = if state_slot {
        CommandMailbox::in_state_dir(config, slot)?
    } else {
        CommandMailbox::for_app(config, slot)?
    };
    Ok(mailbox)
}

fn watch(
    store: StateStore,
    key: DocumentKey,
    interval_ms: u64,
    count: Option<usize>,
) -> anyhow::Result<()> {
    if interval_ms == 0 {
        bail!("--interval-ms must be positive");
    }
    let (changes_tx, changes) = unbounded();
    let _handle = watch_document(
        store,
        key,
        Value::Null,
        Duration::from_millis(interval_ms),
        StartMode::Immediate,
        move |document: Value| {
            if changes_tx.send(document).is_err() {
                return PollControl::Stop;
            }
            PollControl::Continue
        },
    )?;

    let mut reported = 0usize;
    for document in changes.iter() {
        println!("{}", serde_json::to_string(&document)?);
        reported += 1;
        if count.is_some_and(|limit| reported >= limit) {
            break;
        }
    }
    Ok(())
}
