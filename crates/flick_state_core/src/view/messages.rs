use super::ViewState;
use crate::model::messages::normalize_phone_number;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessagesView {
    #[default]
    ConversationList,
    /// `phone` is normalized.
    Thread { phone: String },
    /// New message; `to` is raw user input until sent.
    Compose { to: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagesEvent {
    OpenThread(String),
    StartCompose,
    SetRecipient(String),
    /// Send succeeded; the compose screen opens the recipient's thread.
    Sent,
    Back,
}

impl ViewState for MessagesView {
    type Event = MessagesEvent;

    fn transition(self, event: MessagesEvent) -> Self {
        match (self, event) {
            (Self::ConversationList, MessagesEvent::OpenThread(phone)) => {
                let phone = normalize_phone_number(&phone);
                if phone.is_empty() {
                    Self::ConversationList
                } else {
                    Self::Thread { phone }
                }
            }
            (Self::ConversationList, MessagesEvent::StartCompose) => Self::Compose {
                to: String::new(),
            },
            (Self::Compose { .. }, MessagesEvent::SetRecipient(to)) => Self::Compose { to },
            (Self::Compose { to }, MessagesEvent::Sent) => {
                let phone = normalize_phone_number(&to);
                if phone.is_empty() {
                    Self::Compose { to }
                } else {
                    Self::Thread { phone }
                }
            }
            (Self::Thread { .. } | Self::Compose { .. }, MessagesEvent::Back) => {
                Self::ConversationList
            }
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MessagesEvent, MessagesView};
    use crate::view::ViewState;

    #[test]
    fn compose_then_send_opens_thread() {
        let state = MessagesView::default().replay([
            MessagesEvent::StartCompose,
            MessagesEvent::SetRecipient("+1 (541) 799-9824".to_string()),
            MessagesEvent::Sent,
        ]);
        assert_eq!(
            state,
            MessagesView::Thread {
                phone: "5417999824".to_string()
            }
        );
    }

    #[test]
    fn send_without_recipient_stays_in_compose() {
        let state =
            MessagesView::default().replay([MessagesEvent::StartCompose, MessagesEvent::Sent]);
        assert_eq!(state, MessagesView::Compose { to: String::new() });
    }

    #[test]
    fn invalid_events_are_ignored() {
        let state = MessagesView::default().transition(MessagesEvent::Back);
        assert_eq!(state, MessagesView::ConversationList);
        let state = MessagesView::Thread {
            phone: "5551234".to_string(),
        }
        .transition(MessagesEvent::SetRecipient("x".to_string()));
        assert!(matches!(state, MessagesView::Thread { .. }));
    }
}
