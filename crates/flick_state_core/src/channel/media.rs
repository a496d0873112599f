use std::fmt::{Display, Formatter};

/// Line-oriented command written to the `media_command` slot.
///
/// Seeks carry a `:timestamp` suffix so two seeks to the same position are
/// still distinct slot contents for a consumer that compares with the last
/// value it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    Seek { position_secs: u64 },
}

impl MediaCommand {
    /// Wire form; `timestamp_ms` is only used by `Seek`.
    pub fn encode_line(&self, timestamp_ms: i64) -> String {
        match self {
            Self::Seek { position_secs } => format!("seek:{position_secs}:{timestamp_ms}"),
            other => other.to_string(),
        }
    }

    /// Parses a wire line; the seek timestamp suffix is optional.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.trim().split(':');
        match parts.next()? {
            "play" => Some(Self::Play),
            "pause" => Some(Self::Pause),
            "toggle" => Some(Self::Toggle),
            "next" => Some(Self::Next),
            "previous" | "prev" => Some(Self::Previous),
            "seek" => {
                let position_secs = parts.next()?.trim().parse::<f64>().ok()?;
                if !position_secs.is_finite() || position_secs < 0.0 {
                    return None;
                }
                Some(Self::Seek {
                    position_secs: position_secs as u64,
                })
            }
            _ => None,
        }
    }
}

impl Display for MediaCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play => f.write_str("play"),
            Self::Pause => f.write_str("pause"),
            Self::Toggle => f.write_str("toggle"),
            Self::Next => f.write_str("next"),
            Self::Previous => f.write_str("previous"),
            Self::Seek { position_secs } => write!(f, "seek:{position_secs}"),
        }
    }
}
