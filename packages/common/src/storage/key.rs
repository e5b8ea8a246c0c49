use std::fmt;

use chrono::Utc;
use rand::Rng;

use super::error::StorageError;

const RANDOM_LEN: usize = 7;
const MAX_EXTENSION_LEN: usize = 16;
const MAX_KEY_LEN: usize = 255;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A validated, flat object key such as `1718000000000-k3j9x0a.mp4`.
///
/// Keys never contain path separators, so they are safe to use both as a URL
/// segment and as a filename.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build a collision-resistant key for an uploaded file.
    ///
    /// The key is `{prefix}{unix millis}-{7 random base36 chars}` followed by
    /// the extension of `original_name`, lowercased. Names without a usable
    /// extension produce a key without one.
    pub fn generate(prefix: &str, original_name: &str) -> Self {
        let mut rng = rand::rng();
        let random: String = (0..RANDOM_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();

        let mut key = format!("{prefix}{}-{random}", Utc::now().timestamp_millis());
        if let Some(ext) = extension(original_name) {
            key.push('.');
            key.push_str(&ext);
        }
        Self(key)
    }

    /// Parse an existing key, rejecting anything that is not a flat name.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if s.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} characters"
            )));
        }
        if s.starts_with('.') {
            return Err(StorageError::InvalidKey("key must not start with '.'".into()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "key contains invalid characters (allowed: a-zA-Z0-9, -, _, .)".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract a sanitized, lowercase extension from a filename.
fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
