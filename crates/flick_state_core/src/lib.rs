//! Shared state directory for Flick apps, daemons and the shell.
//! Documents, one-shot command slots and signal markers live here as plain
//! files; this crate owns their formats and access rules.

pub mod channel;
pub mod config;
pub mod logging;
pub mod model;
pub mod poll;
pub mod service;
pub mod signal;
pub mod store;
pub mod view;
pub mod watch;

pub use channel::{
    ChannelError, ChannelResult, Command, CommandChannel, CommandMailbox, CommandQueue,
    MediaCommand,
};
pub use config::{ConfigError, ConfigResult, JsonStyle, PollIntervals, StateConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use poll::{watch_document, DocumentWatch, PollControl, PollHandle, PollLoop, StartMode};
pub use service::{ServiceError, ServiceResult};
pub use signal::SignalFile;
pub use store::{
    DocumentChange, DocumentKey, StateStore, StoreError, StoreHandle, StoreResult, StoreService,
    Subscription,
};
pub use view::ViewState;
pub use watch::{StateDirWatcher, WatchError, WatchResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
