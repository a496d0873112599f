use super::ViewState;
use crate::model::lock::{LockConfig, LockMethod};

/// Seconds a lockout lasts before input is accepted again.
pub const LOCKOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockView {
    Locked {
        method: LockMethod,
        failed_attempts: u32,
        max_attempts: u32,
    },
    /// Too many failures; input is ignored until `LockoutExpired`.
    LockedOut {
        method: LockMethod,
        failed_attempts: u32,
        max_attempts: u32,
    },
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    /// Screen locked with the given config; ignored when no method is set.
    Lock(LockConfig),
    CredentialRejected,
    CredentialAccepted,
    LockoutExpired,
}

impl LockView {
    /// Initial state for `config`.
    pub fn for_config(config: &LockConfig) -> Self {
        Self::Unlocked.transition(LockEvent::Lock(config.clone()))
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    pub fn failed_attempts(&self) -> u32 {
        match self {
            Self::Locked { failed_attempts, .. } | Self::LockedOut { failed_attempts, .. } => {
                *failed_attempts
            }
            Self::Unlocked => 0,
        }
    }
}

impl ViewState for LockView {
    type Event = LockEvent;

    fn transition(self, event: LockEvent) -> Self {
        match (self, event) {
            (Self::Unlocked, LockEvent::Lock(config)) => {
                if config.requires_unlock() {
                    Self::Locked {
                        method: config.method,
                        failed_attempts: 0,
                        max_attempts: config.max_attempts.max(1),
                    }
                } else {
                    Self::Unlocked
                }
            }
            (
                Self::Locked {
                    method,
                    failed_attempts,
                    max_attempts,
                },
                LockEvent::CredentialRejected,
            ) => {
                let failed_attempts = failed_attempts.saturating_add(1);
                if failed_attempts >= max_attempts {
                    Self::LockedOut {
                        method,
                        failed_attempts,
                        max_attempts,
                    }
                } else {
                    Self::Locked {
                        method,
                        failed_attempts,
                        max_attempts,
                    }
                }
            }
            (Self::Locked { .. }, LockEvent::CredentialAccepted) => Self::Unlocked,
            // One more rejection locks out again.
            (
                Self::LockedOut {
                    method,
                    failed_attempts,
                    max_attempts,
                },
                LockEvent::LockoutExpired,
            ) => Self::Locked {
                method,
                failed_attempts: failed_attempts.saturating_sub(1),
                max_attempts,
            },
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LockEvent, LockView};
    use crate::model::lock::{LockConfig, LockMethod};
    use crate::view::ViewState;

    fn pin_config(max_attempts: u32) -> LockConfig {
        LockConfig {
            method: LockMethod::Pin,
            max_attempts,
            ..LockConfig::default()
        }
    }

    #[test]
    fn no_method_never_locks() {
        assert_eq!(LockView::for_config(&LockConfig::default()), LockView::Unlocked);
    }

    #[test]
    fn rejections_lead_to_lockout_and_back() {
        let state = LockView::for_config(&pin_config(2))
            .replay([LockEvent::CredentialRejected, LockEvent::CredentialRejected]);
        assert!(matches!(state, LockView::LockedOut { failed_attempts: 2, .. }));

        let state = state.transition(LockEvent::CredentialAccepted);
        assert!(matches!(state, LockView::LockedOut { .. }));

        let state = state.transition(LockEvent::LockoutExpired);
        assert!(state.accepts_input());
        let state = state.transition(LockEvent::CredentialRejected);
        assert!(matches!(state, LockView::LockedOut { .. }));
    }

    #[test]
    fn accepted_credential_unlocks() {
        let state = LockView::for_config(&pin_config(5))
            .replay([LockEvent::CredentialRejected, LockEvent::CredentialAccepted]);
        assert_eq!(state, LockView::Unlocked);
        assert_eq!(state.failed_attempts(), 0);
    }
}
