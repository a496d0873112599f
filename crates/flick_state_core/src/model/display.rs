//! `display_config.json`: text scale, wallpaper and screen-saver settings.

use crate::store::DocumentKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DISPLAY_CONFIG_KEY: &str = "display_config.json";
pub const DEFAULT_SCREEN_SAVER_DURATION_SECS: u64 = 60;
pub const MAX_SCREEN_SAVER_DURATION_SECS: u64 = 300;
pub const DEFAULT_SCREEN_SAVER_DELAY_SECS: u64 = 30;
const DEFAULT_ACCENT_RGBA: [f32; 4] = [0.91, 0.27, 0.38, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_text_scale")]
    pub text_scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_saver_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_saver_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_saver_delay: Option<u64>,
    /// `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_savers: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_text_scale() -> f64 {
    1.0
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            text_scale: default_text_scale(),
            wallpaper: None,
            screen_saver_enabled: None,
            screen_saver_duration: None,
            screen_saver_delay: None,
            accent_color: None,
            screen_savers: None,
            extra: Map::new(),
        }
    }
}

impl DisplayConfig {
    pub fn key() -> DocumentKey {
        DocumentKey::well_known(DISPLAY_CONFIG_KEY)
    }

    pub fn screen_saver_enabled(&self) -> bool {
        self.screen_saver_enabled.unwrap_or(true)
    }

    /// Capped at five minutes.
    pub fn screen_saver_duration_secs(&self) -> u64 {
        self.screen_saver_duration
            .unwrap_or(DEFAULT_SCREEN_SAVER_DURATION_SECS)
            .min(MAX_SCREEN_SAVER_DURATION_SECS)
    }

    pub fn screen_saver_delay_secs(&self) -> u64 {
        self.screen_saver_delay
            .unwrap_or(DEFAULT_SCREEN_SAVER_DELAY_SECS)
    }

    /// Accent color as RGBA floats; malformed values fall back to the
    /// default accent.
    pub fn accent_rgba(&self) -> [f32; 4] {
        self.accent_color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(DEFAULT_ACCENT_RGBA)
    }
}

fn parse_hex_color(raw: &str) -> Option<[f32; 4]> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() < 6 || !hex.is_char_boundary(6) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .ok()
            .map(|value| f32::from(value) / 255.0)
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0])
}

#[cfg(test)]
mod tests {
    use super::{parse_hex_color, DisplayConfig};

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(parse_hex_color("#ffffff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("000000"), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn screen_saver_duration_is_capped() {
        let config = DisplayConfig {
            screen_saver_duration: Some(9_999),
            ..DisplayConfig::default()
        };
        assert_eq!(config.screen_saver_duration_secs(), 300);
        assert_eq!(DisplayConfig::default().screen_saver_duration_secs(), 60);
    }
}
