// Network State - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the network state library.
//!
//! Daemon-reported problems (unknown keys, connection failures, bad
//! netmasks) are not errors here: they degrade into entity state. This
//! enum covers the outer surfaces only.

use thiserror::Error;

/// Result type alias for network state operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for network state operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // D-Bus Errors
    // ========================================
    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("D-Bus connection failed: {0}")]
    DbusConnectionFailed(String),

    #[error("Connection manager not running")]
    ManagerNotRunning,

    // ========================================
    // Entity Errors
    // ========================================
    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Operation not supported for {kind}: {operation}")]
    UnsupportedOperation { kind: String, operation: String },

    // ========================================
    // Input Errors
    // ========================================
    #[error("Invalid hex SSID: {0}")]
    InvalidHexSsid(String),

    // ========================================
    // Configuration Errors
    // ========================================
    #[error("Failed to read configuration: {0}")]
    ConfigReadFailed(String),

    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new unsupported operation error.
    pub fn unsupported(kind: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            kind: kind.into(),
            operation: operation.into(),
        }
    }

    /// Check if this error indicates the connection manager is unreachable.
    pub fn is_manager_unavailable(&self) -> bool {
        matches!(self, Self::ManagerNotRunning | Self::DbusConnectionFailed(_))
    }

    /// Check if this error refers to a missing network or device.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NetworkNotFound(_) | Self::DeviceNotFound(_))
    }
}

// Convert from zbus errors
impl From<zbus::Error> for Error {
    fn from(err: zbus::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from zbus fdo errors
impl From<zbus::fdo::Error> for Error {
    fn from(err: zbus::fdo::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_unavailable() {
        assert!(Error::ManagerNotRunning.is_manager_unavailable());
        assert!(Error::DbusConnectionFailed("no bus".into()).is_manager_unavailable());
        assert!(!Error::NetworkNotFound("/service/0".into()).is_manager_unavailable());
    }

    #[test]
    fn test_display() {
        let err = Error::unsupported("vpn", "scan");
        assert_eq!(err.to_string(), "Operation not supported for vpn: scan");
        assert!(Error::DeviceNotFound("/device/wlan0".into()).is_not_found());
    }
}
