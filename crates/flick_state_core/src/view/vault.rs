use super::ViewState;
use crate::model::vault::VaultStatus;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VaultView {
    #[default]
    VaultPicker,
    /// Waiting for the password or the helper's unlock response.
    Unlocking { path: String },
    EntryList,
    EntryDetail { uuid: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    SelectVault(String),
    UnlockSucceeded,
    /// Wrong password; the unlock screen stays up.
    UnlockFailed,
    OpenEntry(String),
    Back,
    /// Vault closed or auto-locked.
    Lock,
}

impl VaultEvent {
    /// Maps a helper response to navigation.
    ///
    /// An `unlock` reply succeeds on `success: true` without an `error`;
    /// the helper does not send `unlocked` with it. A successful `lock`
    /// reply closes the vault. Other responses carry no navigation.
    pub fn from_status(status: &VaultStatus) -> Option<Self> {
        match status.action.as_str() {
            "unlock" if status.success == Some(true) && status.error.is_none() => {
                Some(Self::UnlockSucceeded)
            }
            "unlock" => Some(Self::UnlockFailed),
            "lock" if status.success == Some(true) => Some(Self::Lock),
            _ => None,
        }
    }
}

impl ViewState for VaultView {
    type Event = VaultEvent;

    fn transition(self, event: VaultEvent) -> Self {
        match (self, event) {
            (Self::VaultPicker, VaultEvent::SelectVault(path)) if !path.trim().is_empty() => {
                Self::Unlocking { path }
            }
            (Self::Unlocking { .. }, VaultEvent::UnlockSucceeded) => Self::EntryList,
            (Self::Unlocking { .. }, VaultEvent::Back) => Self::VaultPicker,
            (Self::EntryList, VaultEvent::OpenEntry(uuid)) if !uuid.is_empty() => {
                Self::EntryDetail { uuid }
            }
            (Self::EntryDetail { .. }, VaultEvent::Back) => Self::EntryList,
            (Self::EntryList | Self::EntryDetail { .. }, VaultEvent::Lock) => Self::VaultPicker,
            (state, _) => state,
        }
    }
}
