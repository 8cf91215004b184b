// Network State - Connection Manager Interface
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Connection Manager Interface
//!
//! The network library talks to the connection manager daemon through the
//! [`ManagerClient`] trait. Every request is fire-and-forget: answers and
//! change notifications come back as [`ManagerEvent`]s, which the owner of
//! the library feeds into it on its own task.
//!
//! - **shill**: D-Bus implementation on top of zbus
//! - **stub**: In-memory implementation recording commands (tests and
//!   `--stub` mode)

pub mod shill;
pub mod stub;

use crate::models::network::ConnectionType;
use crate::models::{CellularDataPlan, PropertyDict, PropertyValue, SecretString};

pub use shill::ShillClient;
pub use stub::{ManagerCommand, StubManagerClient};

/// A SIM PIN operation on a cellular device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOperation {
    Enter { pin: SecretString },
    Require { pin: SecretString, require: bool },
    Change { old_pin: SecretString, new_pin: SecretString },
    Unblock { puk: SecretString, new_pin: SecretString },
}

impl PinOperation {
    /// D-Bus method on the device interface.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Enter { .. } => "EnterPin",
            Self::Require { .. } => "RequirePin",
            Self::Change { .. } => "ChangePin",
            Self::Unblock { .. } => "UnblockPin",
        }
    }
}

/// Outcome of a [`PinOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOperationResult {
    Success,
    IncorrectPin,
    Error,
}

impl PinOperationResult {
    /// Classify a daemon error name.
    pub fn from_error_name(name: &str) -> Self {
        if name.ends_with(".IncorrectPin") || name.ends_with(".PinBlocked") {
            Self::IncorrectPin
        } else {
            Self::Error
        }
    }
}

/// Commands sent to the connection manager.
///
/// Implementations must not call back into the library; results are
/// delivered as [`ManagerEvent`]s.
pub trait ManagerClient {
    fn request_manager_properties(&self);
    fn request_service_properties(&self, service_path: &str);
    fn request_device_properties(&self, device_path: &str);
    fn request_profile_entries(&self, profile_path: &str);
    fn request_remembered_service_properties(&self, profile_path: &str, entry_path: &str);
    fn request_ip_configs(&self, device_path: &str);
    fn request_data_plan_update(&self, service_path: &str);

    fn set_service_property(&self, service_path: &str, key: &str, value: PropertyValue);
    fn clear_service_property(&self, service_path: &str, key: &str);

    fn connect_service(&self, service_path: &str);
    fn disconnect_service(&self, service_path: &str);
    fn delete_profile_entry(&self, profile_path: &str, entry_path: &str);
    /// Start OTASP activation. Returns false if the request could not be sent.
    fn activate_cellular_modem(&self, service_path: &str, carrier: &str) -> bool;

    fn request_scan(&self, technology: ConnectionType);
    fn enable_technology(&self, technology: ConnectionType, enable: bool);
    fn set_offline_mode(&self, offline: bool);
    fn set_device_property(&self, device_path: &str, key: &str, value: PropertyValue);
    fn pin_operation(&self, device_path: &str, operation: PinOperation);
}

/// Answers and notifications from the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    ManagerProperties(PropertyDict),
    ManagerPropertyChanged { key: String, value: PropertyValue },
    /// New service list, ordered by daemon priority.
    ServiceListChanged(Vec<String>),
    DeviceListChanged(Vec<String>),
    /// Full properties of a service; `None` if the service is gone.
    ServiceProperties {
        path: String,
        properties: Option<PropertyDict>,
    },
    ServicePropertyChanged {
        path: String,
        key: String,
        value: PropertyValue,
    },
    DeviceProperties {
        path: String,
        properties: Option<PropertyDict>,
    },
    DevicePropertyChanged {
        path: String,
        key: String,
        value: PropertyValue,
    },
    ProfileEntries {
        profile_path: String,
        entries: Vec<String>,
    },
    RememberedServiceProperties {
        profile_path: String,
        entry_path: String,
        properties: Option<PropertyDict>,
    },
    IpConfigs {
        device_path: String,
        configs: Vec<PropertyDict>,
    },
    DataPlans {
        service_path: String,
        plans: Vec<CellularDataPlan>,
    },
    PinOperationCompleted {
        device_path: String,
        result: PinOperationResult,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_method_names() {
        let pin = SecretString::from("1234");
        assert_eq!(PinOperation::Enter { pin: pin.clone() }.method_name(), "EnterPin");
        assert_eq!(
            PinOperation::Unblock {
                puk: SecretString::from("12345678"),
                new_pin: pin,
            }
            .method_name(),
            "UnblockPin"
        );
    }

    #[test]
    fn test_pin_error_classification() {
        assert_eq!(
            PinOperationResult::from_error_name("org.chromium.flimflam.Error.IncorrectPin"),
            PinOperationResult::IncorrectPin
        );
        assert_eq!(
            PinOperationResult::from_error_name("org.chromium.flimflam.Error.NotSupported"),
            PinOperationResult::Error
        );
    }
}
