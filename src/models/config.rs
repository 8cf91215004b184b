// Network State - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Daemon configuration model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::CONFIG_DIR_NAME;

/// Connection manager endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Well-known bus name of the connection manager.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Object path of the manager object.
    #[serde(default = "default_manager_path")]
    pub manager_path: String,

    /// Run against the in-memory stub instead of the system bus.
    #[serde(default)]
    pub use_stub: bool,

    /// Capacity of the manager event channel.
    #[serde(default = "default_event_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            manager_path: default_manager_path(),
            use_stub: false,
            event_channel_capacity: default_event_capacity(),
        }
    }
}

fn default_service_name() -> String {
    "org.chromium.flimflam".to_string()
}

fn default_manager_path() -> String {
    "/".to_string()
}

fn default_event_capacity() -> usize {
    256
}

/// Certificate handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// Allow certificate enrollment when no matching certificate exists.
    #[serde(default = "default_true")]
    pub enrollment_enabled: bool,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            enrollment_enabled: true,
        }
    }
}

/// Thresholds used to classify how much cellular data is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPlanThresholds {
    /// Remaining bytes below which data is considered low.
    #[serde(default = "default_low_bytes")]
    pub low_data_bytes: i64,

    /// Remaining bytes below which data is considered very low.
    #[serde(default = "default_very_low_bytes")]
    pub very_low_data_bytes: i64,

    /// Remaining seconds below which a time based plan is considered low.
    #[serde(default = "default_low_secs")]
    pub low_data_secs: i64,

    /// Remaining seconds below which a time based plan is considered very low.
    #[serde(default = "default_very_low_secs")]
    pub very_low_data_secs: i64,
}

impl Default for DataPlanThresholds {
    fn default() -> Self {
        Self {
            low_data_bytes: default_low_bytes(),
            very_low_data_bytes: default_very_low_bytes(),
            low_data_secs: default_low_secs(),
            very_low_data_secs: default_very_low_secs(),
        }
    }
}

fn default_low_bytes() -> i64 {
    100 * 1024 * 1024
}

fn default_very_low_bytes() -> i64 {
    50 * 1024 * 1024
}

fn default_low_secs() -> i64 {
    60 * 60
}

fn default_very_low_secs() -> i64 {
    30 * 60
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connection manager endpoint.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Certificate matching and enrollment.
    #[serde(default)]
    pub certificates: CertificateConfig,

    /// Cellular data plan thresholds.
    #[serde(default)]
    pub data_plan: DataPlanThresholds,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            manager: ManagerConfig::default(),
            certificates: CertificateConfig::default(),
            data_plan: DataPlanThresholds::default(),
        }
    }
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join("config.toml")
    }

    /// Load configuration from TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| super::Error::ConfigReadFailed(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, super::Error> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| super::Error::ConfigWriteFailed(format!("{}: {}", path.display(), e)))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}
