// Network State - Stub Connection Manager
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! A [`ManagerClient`] that records commands instead of sending them.
//!
//! Used by tests and by the daemon's stub mode, where it also provides a
//! small fixture of devices and services.

use std::cell::{Cell, RefCell};

use serde_json::json;
use tracing::debug;

use super::{ManagerClient, ManagerEvent, PinOperation};
use crate::models::network::ConnectionType;
use crate::models::{PropertyDict, PropertyValue};

/// A command received by [`StubManagerClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerCommand {
    RequestManagerProperties,
    RequestServiceProperties { path: String },
    RequestDeviceProperties { path: String },
    RequestProfileEntries { profile_path: String },
    RequestRememberedServiceProperties { profile_path: String, entry_path: String },
    RequestIpConfigs { device_path: String },
    RequestDataPlanUpdate { path: String },
    SetServiceProperty { path: String, key: String, value: PropertyValue },
    ClearServiceProperty { path: String, key: String },
    ConnectService { path: String },
    DisconnectService { path: String },
    DeleteProfileEntry { profile_path: String, entry_path: String },
    ActivateCellularModem { path: String, carrier: String },
    RequestScan { technology: ConnectionType },
    EnableTechnology { technology: ConnectionType, enable: bool },
    SetOfflineMode { offline: bool },
    SetDeviceProperty { path: String, key: String, value: PropertyValue },
    PinOperation { device_path: String, operation: PinOperation },
}

impl ManagerCommand {
    /// Whether this command only asks for data.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::RequestManagerProperties
                | Self::RequestServiceProperties { .. }
                | Self::RequestDeviceProperties { .. }
                | Self::RequestProfileEntries { .. }
                | Self::RequestRememberedServiceProperties { .. }
                | Self::RequestIpConfigs { .. }
                | Self::RequestDataPlanUpdate { .. }
        )
    }
}

/// Records every command in order.
#[derive(Debug)]
pub struct StubManagerClient {
    commands: RefCell<Vec<ManagerCommand>>,
    activation_result: Cell<bool>,
}

impl Default for StubManagerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StubManagerClient {
    pub fn new() -> Self {
        Self {
            commands: RefCell::new(Vec::new()),
            activation_result: Cell::new(true),
        }
    }

    /// Commands received so far.
    pub fn commands(&self) -> Vec<ManagerCommand> {
        self.commands.borrow().clone()
    }

    /// Commands received so far, excluding data requests.
    pub fn writes(&self) -> Vec<ManagerCommand> {
        self.commands
            .borrow()
            .iter()
            .filter(|c| !c.is_request())
            .cloned()
            .collect()
    }

    pub fn take_commands(&self) -> Vec<ManagerCommand> {
        self.commands.take()
    }

    /// Result returned by `activate_cellular_modem`.
    pub fn set_activation_result(&self, result: bool) {
        self.activation_result.set(result);
    }

    fn record(&self, command: ManagerCommand) {
        debug!("Stub manager command: {:?}", command);
        self.commands.borrow_mut().push(command);
    }

    /// Events describing a small demo system: one ethernet and one wifi
    /// device, a connected wired service and two visible wifi services.
    pub fn fixture_events() -> Vec<ManagerEvent> {
        let dict = |value: PropertyValue| -> PropertyDict {
            match value {
                PropertyValue::Object(map) => map,
                _ => PropertyDict::new(),
            }
        };
        vec![
            ManagerEvent::ManagerProperties(dict(json!({
                "AvailableTechnologies": ["ethernet", "wifi"],
                "EnabledTechnologies": ["ethernet", "wifi"],
                "ConnectedTechnologies": ["ethernet"],
                "DefaultTechnology": "ethernet",
                "OfflineMode": false,
                "ActiveProfile": "/profile/default",
                "Profiles": ["/profile/default"],
            }))),
            ManagerEvent::DeviceListChanged(vec!["/device/eth0".into(), "/device/wlan0".into()]),
            ManagerEvent::DeviceProperties {
                path: "/device/eth0".into(),
                properties: Some(dict(json!({
                    "Type": "ethernet",
                    "Name": "eth0",
                    "Powered": true,
                    "Address": "52:54:00:12:34:56",
                    "IPConfigs": ["/ipconfig/eth0_0"],
                }))),
            },
            ManagerEvent::DeviceProperties {
                path: "/device/wlan0".into(),
                properties: Some(dict(json!({
                    "Type": "wifi",
                    "Name": "wlan0",
                    "Powered": true,
                    "Scanning": false,
                }))),
            },
            ManagerEvent::ServiceListChanged(vec![
                "/service/eth0".into(),
                "/service/wifi_home".into(),
                "/service/wifi_cafe".into(),
            ]),
            ManagerEvent::ServiceProperties {
                path: "/service/eth0".into(),
                properties: Some(dict(json!({
                    "Type": "ethernet",
                    "Name": "Wired Ethernet",
                    "State": "online",
                    "Device": "/device/eth0",
                    "IsActive": true,
                }))),
            },
            ManagerEvent::ServiceProperties {
                path: "/service/wifi_home".into(),
                properties: Some(dict(json!({
                    "Type": "wifi",
                    "Name": "Home",
                    "State": "idle",
                    "Security": "psk",
                    "Strength": 82,
                    "Favorite": true,
                    "Profile": "/profile/default",
                }))),
            },
            ManagerEvent::ServiceProperties {
                path: "/service/wifi_cafe".into(),
                properties: Some(dict(json!({
                    "Type": "wifi",
                    "WiFi.HexSSID": "436166c3a9",
                    "State": "idle",
                    "Security": "none",
                    "Strength": 40,
                }))),
            },
            ManagerEvent::IpConfigs {
                device_path: "/device/eth0".into(),
                configs: vec![dict(json!({
                    "Method": "dhcp",
                    "Address": "192.168.122.15",
                    "Prefixlen": 24,
                    "Gateway": "192.168.122.1",
                    "NameServers": ["192.168.122.1"],
                }))],
            },
        ]
    }
}

impl ManagerClient for StubManagerClient {
    fn request_manager_properties(&self) {
        self.record(ManagerCommand::RequestManagerProperties);
    }

    fn request_service_properties(&self, service_path: &str) {
        self.record(ManagerCommand::RequestServiceProperties {
            path: service_path.to_string(),
        });
    }

    fn request_device_properties(&self, device_path: &str) {
        self.record(ManagerCommand::RequestDeviceProperties {
            path: device_path.to_string(),
        });
    }

    fn request_profile_entries(&self, profile_path: &str) {
        self.record(ManagerCommand::RequestProfileEntries {
            profile_path: profile_path.to_string(),
        });
    }

    fn request_remembered_service_properties(&self, profile_path: &str, entry_path: &str) {
        self.record(ManagerCommand::RequestRememberedServiceProperties {
            profile_path: profile_path.to_string(),
            entry_path: entry_path.to_string(),
        });
    }

    fn request_ip_configs(&self, device_path: &str) {
        self.record(ManagerCommand::RequestIpConfigs {
            device_path: device_path.to_string(),
        });
    }

    fn request_data_plan_update(&self, service_path: &str) {
        self.record(ManagerCommand::RequestDataPlanUpdate {
            path: service_path.to_string(),
        });
    }

    fn set_service_property(&self, service_path: &str, key: &str, value: PropertyValue) {
        self.record(ManagerCommand::SetServiceProperty {
            path: service_path.to_string(),
            key: key.to_string(),
            value,
        });
    }

    fn clear_service_property(&self, service_path: &str, key: &str) {
        self.record(ManagerCommand::ClearServiceProperty {
            path: service_path.to_string(),
            key: key.to_string(),
        });
    }

    fn connect_service(&self, service_path: &str) {
        self.record(ManagerCommand::ConnectService {
            path: service_path.to_string(),
        });
    }

    fn disconnect_service(&self, service_path: &str) {
        self.record(ManagerCommand::DisconnectService {
            path: service_path.to_string(),
        });
    }

    fn delete_profile_entry(&self, profile_path: &str, entry_path: &str) {
        self.record(ManagerCommand::DeleteProfileEntry {
            profile_path: profile_path.to_string(),
            entry_path: entry_path.to_string(),
        });
    }

    fn activate_cellular_modem(&self, service_path: &str, carrier: &str) -> bool {
        self.record(ManagerCommand::ActivateCellularModem {
            path: service_path.to_string(),
            carrier: carrier.to_string(),
        });
        self.activation_result.get()
    }

    fn request_scan(&self, technology: ConnectionType) {
        self.record(ManagerCommand::RequestScan { technology });
    }

    fn enable_technology(&self, technology: ConnectionType, enable: bool) {
        self.record(ManagerCommand::EnableTechnology { technology, enable });
    }

    fn set_offline_mode(&self, offline: bool) {
        self.record(ManagerCommand::SetOfflineMode { offline });
    }

    fn set_device_property(&self, device_path: &str, key: &str, value: PropertyValue) {
        self.record(ManagerCommand::SetDeviceProperty {
            path: device_path.to_string(),
            key: key.to_string(),
            value,
        });
    }

    fn pin_operation(&self, device_path: &str, operation: PinOperation) {
        self.record(ManagerCommand::PinOperation {
            device_path: device_path.to_string(),
            operation,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let client = StubManagerClient::new();
        client.request_service_properties("/service/1");
        client.connect_service("/service/1");
        assert_eq!(client.commands().len(), 2);
        assert_eq!(
            client.writes(),
            vec![ManagerCommand::ConnectService {
                path: "/service/1".into()
            }]
        );
        assert_eq!(client.take_commands().len(), 2);
        assert!(client.commands().is_empty());
    }

    #[test]
    fn test_fixture_lists_are_consistent() {
        let events = StubManagerClient::fixture_events();
        let services = events
            .iter()
            .find_map(|e| match e {
                ManagerEvent::ServiceListChanged(paths) => Some(paths.clone()),
                _ => None,
            })
            .unwrap();
        for path in services {
            assert!(events.iter().any(|e| matches!(
                e,
                ManagerEvent::ServiceProperties { path: p, properties: Some(_) } if *p == path
            )));
        }
    }
}
