//! Scrubbing of secrets from diagnostic text.

use std::fmt;

use sha2::{Digest, Sha512};

use crate::error::Error;

/// Lowercase hex SHA-512 digest of `text`
pub fn sha512(text: impl AsRef<[u8]>) -> String {
    hex::encode(Sha512::digest(text.as_ref()))
}

/// Replaces secrets with their SHA-512 digest.
///
/// The digest lets an operator confirm which credential was used without the
/// credential itself ending up in logs. Empty secrets are ignored. Besides the
/// raw secret its `{:?}` escaped form is scrubbed too, so a secret with `"` or
/// `\` inside a debug formatted value is caught as well.
#[derive(Clone, Default)]
pub struct Redactor {
    /// `(pattern, digest)`, escaped patterns ahead of their raw secret
    patterns: Vec<(String, String)>,
}

impl Redactor {
    pub fn new(secret: Option<&str>) -> Self {
        Self::default().with_secret(secret)
    }

    /// Add another secret to scrub
    pub fn with_secret(mut self, secret: Option<&str>) -> Self {
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            let digest = sha512(secret);
            let escaped = secret.escape_debug().to_string();
            if escaped != secret {
                self.patterns.push((escaped, digest.clone()));
            }
            self.patterns.push((secret.to_string(), digest));
        }
        self
    }

    pub fn redact(&self, text: &str) -> String {
        self.patterns
            .iter()
            .fold(text.to_string(), |text, (pattern, digest)| {
                text.replace(pattern.as_str(), digest)
            })
    }

    pub fn redact_error(&self, error: Error) -> Error {
        if self.patterns.is_empty() {
            return error;
        }
        error.map_text(|text| self.redact(text))
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("patterns", &self.patterns.len())
            .finish()
    }
}
