//! State directory configuration.
//!
//! # Responsibility
//! - Resolve the per-user Flick state directory the way every helper expects.
//! - Carry channel-wide settings: command slot directory, JSON style, poll
//!   intervals.
//!
//! # Invariants
//! - `FLICK_STATE_DIR` always wins over any derived location.
//! - Resolution only looks up variables; it never mutates the process env.
//! - `device.conf` problems degrade to the next resolution step.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const STATE_DIR_ENV: &str = "FLICK_STATE_DIR";
pub const HOME_ENV: &str = "FLICK_HOME";
pub const DEVICE_CONFIG_PATH: &str = "/etc/flick/device.conf";
pub const STATE_SUBDIR: &str = ".local/state/flick";
pub const DEFAULT_COMMAND_DIR: &str = "/tmp";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    /// No variable or device config yields a home directory.
    MissingHome,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHome => write!(
                f,
                "cannot resolve state directory: set {STATE_DIR_ENV}, {HOME_ENV} or HOME"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingHome => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// How documents are serialized on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    Pretty,
    Compact,
}

/// Poll periods used by the apps for each kind of status document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub vault_status: Duration,
    pub call_status: Duration,
    pub media_status: Duration,
    pub config_reload: Duration,
    pub conversations: Duration,
    pub photo_config: Duration,
    /// Daemon-side command slot check.
    pub command_check: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            vault_status: Duration::from_millis(100),
            call_status: Duration::from_millis(500),
            media_status: Duration::from_millis(1000),
            config_reload: Duration::from_millis(1000),
            conversations: Duration::from_millis(2000),
            photo_config: Duration::from_millis(3000),
            command_check: Duration::from_millis(500),
        }
    }
}

/// Channel-wide settings shared by stores, mailboxes and signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConfig {
    pub state_dir: PathBuf,
    /// Where `flick_<app>_cmd` slots and volatile status files live.
    pub command_dir: PathBuf,
    pub json_style: JsonStyle,
    pub poll: PollIntervals,
}

impl StateConfig {
    /// Builds a config rooted at an explicit state directory.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            command_dir: PathBuf::from(DEFAULT_COMMAND_DIR),
            json_style: JsonStyle::default(),
            poll: PollIntervals::default(),
        }
    }

    /// Resolves the state directory from the process environment and
    /// `/etc/flick/device.conf`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::resolve_with(|name| std::env::var(name).ok(), Path::new(DEVICE_CONFIG_PATH))
    }

    /// Resolution with an injectable variable lookup.
    ///
    /// Order: `FLICK_STATE_DIR`, `FLICK_HOME`, device config
    /// (`DEVICE_HOME`, then `DEVICE_USER`), `SUDO_USER`, `HOME`.
    pub fn resolve_with<F>(lookup: F, device_config: &Path) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(state_dir) = non_empty(STATE_DIR_ENV) {
            info!("event=config_resolve module=config status=ok source=state_dir_env");
            return Ok(Self::new(state_dir));
        }

        let (home, source) = if let Some(home) = non_empty(HOME_ENV) {
            (PathBuf::from(home), "flick_home_env")
        } else if let Some(home) = DeviceConfig::load(device_config).and_then(|c| c.home_dir()) {
            (home, "device_config")
        } else if let Some(user) = non_empty("SUDO_USER") {
            (PathBuf::from("/home").join(user), "sudo_user")
        } else if let Some(home) = non_empty("HOME") {
            (PathBuf::from(home), "home_env")
        } else {
            return Err(ConfigError::MissingHome);
        };

        info!("event=config_resolve module=config status=ok source={source}");
        Ok(Self::new(home.join(STATE_SUBDIR)))
    }

    pub fn with_command_dir(mut self, command_dir: impl Into<PathBuf>) -> Self {
        self.command_dir = command_dir.into();
        self
    }

    pub fn with_json_style(mut self, json_style: JsonStyle) -> Self {
        self.json_style = json_style;
        self
    }

    /// Creates the state and command directories when missing.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [&self.state_dir, &self.command_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Values read from `/etc/flick/device.conf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device_home: Option<String>,
    pub device_user: Option<String>,
}

impl DeviceConfig {
    /// Reads a shell-style `KEY=VALUE` file. Missing file yields `None`;
    /// malformed lines are skipped.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=device_config_load module=config status=error path={} error={}",
                    path.display(),
                    err
                );
                return None;
            }
        };

        let mut config = Self::default();
        for entry in entries {
            match entry {
                Ok((key, value)) => match key.as_str() {
                    "DEVICE_HOME" => config.device_home = Some(value),
                    "DEVICE_USER" => config.device_user = Some(value),
                    _ => {}
                },
                Err(err) => warn!(
                    "event=device_config_load module=config status=skip path={} error={}",
                    path.display(),
                    err
                ),
            }
        }
        Some(config)
    }

    /// `DEVICE_HOME`, else `/home/<DEVICE_USER>`.
    pub fn home_dir(&self) -> Option<PathBuf> {
        if let Some(home) = self.device_home.as_deref().filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(home));
        }
        self.device_user
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|user| PathBuf::from("/home").join(user))
    }
}
