// Network State - Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Network State Models
//!
//! Entity types mirrored from the connection manager:
//!
//! - **Property**: Sparse per-entity store of raw property values
//! - **Device**: Network interfaces, including SIM and modem details
//! - **Network**: Ethernet, Wifi, Cellular and VPN services
//! - **Data Plan**: Cellular usage and expiration accounting
//! - **IP Config**: Addressing of a device
//! - **Error**: Shared error types
//!
//! ## Design Principles
//!
//! 1. **Mirrors, not owners**: State follows what the daemon reports
//! 2. **Write-through**: Setters send changes to the daemon and wait for the echo
//! 3. **Zeroized secrets**: Credentials are overwritten before release

pub mod config;
pub mod data_plan;
pub mod device;
pub mod error;
pub mod ip_config;
pub mod network;
pub mod property;
pub mod secret;
pub mod validation;

// Re-export main types for convenience
pub use config::{AppConfig, CertificateConfig, DataPlanThresholds, ManagerConfig};
pub use data_plan::{CellularDataPlan, DataPlanType};
pub use device::{FoundCellularNetwork, NetworkDevice, SimLockState, SimPinRequire};
pub use error::{Error, Result};
pub use ip_config::{IpConfigType, NetworkIpConfig};
pub use network::{
    AttemptOutcome, ClientCertType, ConnectionError, ConnectionState, ConnectionType, Network,
    NetworkKind, ProfileType, PropertyWriter,
};
pub use property::{PropertyDict, PropertyIndex, PropertyStore, PropertyValue};
pub use secret::SecretString;

/// Crate version reported by the daemon binary.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name used under the user's config directory.
pub const CONFIG_DIR_NAME: &str = "network-state";
