// Network State - Secret Strings
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Credential storage that overwrites its memory before release.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A credential string whose backing memory is zeroed when wiped or dropped.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace the value. The previous contents are zeroed first.
    pub fn set(&mut self, value: &str) {
        self.0.zeroize();
        self.0.push_str(value);
    }

    /// Zero the contents, then clear.
    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "SecretString(\"\")")
        } else {
            write!(f, "SecretString([REDACTED])")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wipe_clears_value() {
        let mut secret = SecretString::new("hunter22");
        secret.wipe();
        assert!(secret.is_empty());
        assert_eq!(secret.as_str(), "");
        assert_eq!(secret, SecretString::default());

        secret.set("again");
        assert_eq!(secret.as_str(), "again");
    }

    #[test]
    fn test_set_replaces_value() {
        let mut secret = SecretString::new("old-passphrase");
        secret.set("new");
        assert_eq!(secret.as_str(), "new");
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::new("topsecret");
        let text = format!("{:?}", secret);
        assert!(!text.contains("topsecret"));
        assert_eq!(format!("{:?}", SecretString::default()), "SecretString(\"\")");
    }
}
