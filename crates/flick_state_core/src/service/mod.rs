//! Use-case services over the store and the command channels.
//!
//! # Responsibility
//! - Combine document models, command slots and signal markers into the
//!   operations the apps and daemons perform.
//! - Keep callers decoupled from file names and wire layouts.

use crate::channel::ChannelError;
use crate::model::ModelError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod calendar_service;
pub mod lock_session;
pub mod media_remote;
pub mod messaging;
pub mod phone;
pub mod vault_client;

pub use calendar_service::CalendarService;
pub use lock_session::LockSession;
pub use media_remote::MediaRemote;
pub use messaging::{MessagingClient, MessagingDaemon, ProcessOutcome, SmsTransport};
pub use phone::{CallControl, PhoneClient, PhoneCommand, PhoneDaemon};
pub use vault_client::VaultClient;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for state-directory use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before anything was written.
    Invalid(ModelError),
    Store(StoreError),
    Channel(ChannelError),
    /// Background loop thread could not be started.
    Spawn(std::io::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Channel(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "cannot start background loop: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Channel(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(value: ModelError) -> Self {
        Self::Invalid(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ChannelError> for ServiceError {
    fn from(value: ChannelError) -> Self {
        Self::Channel(value)
    }
}
