//! Document addressing.

use super::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

// Leading dot is reserved for in-flight temp files and claimed command slots.
static KEY_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("valid key segment regex"));

/// Relative, validated name of a document inside the state directory,
/// e.g. `calendar.json` or `passwordsafe/vaults.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// # Errors
    /// - `StoreError::InvalidKey` for empty, absolute, `..` or dot-prefixed
    ///   segments and characters outside `[A-Za-z0-9_.-]`.
    pub fn new(raw: impl Into<String>) -> StoreResult<Self> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw
                .split('/')
                .all(|segment| KEY_SEGMENT_RE.is_match(segment));
        if valid {
            Ok(Self(raw))
        } else {
            Err(StoreError::InvalidKey(raw))
        }
    }

    /// Builds a key for one of the crate's well-known document names.
    pub(crate) fn well_known(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "well-known key `{name}` must be valid");
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Absolute path of this document under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    /// Inverse of [`DocumentKey::resolve`]; `None` for paths outside `root`
    /// or names that are not valid keys (temp files included).
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Self::new(segments.join("/")).ok()
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for DocumentKey {
    type Error = StoreError;

    fn try_from(value: &str) -> StoreResult<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentKey;
    use std::path::Path;

    #[test]
    fn accepts_flat_and_nested_names() {
        assert!(DocumentKey::new("calendar.json").is_ok());
        assert!(DocumentKey::new("passwordsafe/vaults.json").is_ok());
        assert!(DocumentKey::new("media_command").is_ok());
    }

    #[test]
    fn rejects_escapes_and_hidden_names() {
        for raw in ["", "/etc/passwd", "../secret.json", "a//b", ".calendar.json.tmp", "a b"] {
            assert!(DocumentKey::new(raw).is_err(), "`{raw}` should be rejected");
        }
    }

    #[test]
    fn from_path_round_trips_and_skips_temp_files() {
        let root = Path::new("/state");
        let key = DocumentKey::new("passwordsafe/last_vault.json").unwrap();
        assert_eq!(DocumentKey::from_path(root, &key.resolve(root)), Some(key));
        assert_eq!(
            DocumentKey::from_path(root, Path::new("/state/.calendar.json.Ab12.tmp")),
            None
        );
        assert_eq!(DocumentKey::from_path(root, Path::new("/other/calendar.json")), None);
    }
}
