// Network State - Network Devices
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Network devices (interfaces) reported by the connection manager.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::network::{CellularApn, ConnectionType};
use super::property::{PropertyDict, PropertyIndex, PropertyStore, PropertyValue};
use crate::parser::{dict_string, keys, DeviceParser, NativeDeviceParser};

/// Retry count reported before the SIM has been queried.
pub const DEFAULT_SIM_RETRIES: u32 = 999;

/// SIM lock status of a cellular device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimLockState {
    #[default]
    Unknown,
    /// Waiting for the PIN.
    LockedPin,
    /// Blocked; needs the PUK.
    LockedPuk,
    /// Unlocked.
    Disabled,
}

impl SimLockState {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::SIM_LOCK_PIN => Self::LockedPin,
            keys::SIM_LOCK_PUK => Self::LockedPuk,
            "" => Self::Disabled,
            _ => Self::Unknown,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::LockedPin | Self::LockedPuk)
    }
}

/// Whether the SIM asks for a PIN at power up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimPinRequire {
    #[default]
    Unknown,
    Required,
    NotRequired,
}

/// A carrier network seen during a cellular network scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundCellularNetwork {
    pub status: String,
    pub network_id: String,
    pub short_name: String,
    pub long_name: String,
    pub technology: String,
}

impl FoundCellularNetwork {
    pub fn from_dict(dict: &PropertyDict) -> Self {
        Self {
            status: dict_string(dict, keys::FOUND_STATUS),
            network_id: dict_string(dict, keys::FOUND_NETWORK_ID),
            short_name: dict_string(dict, keys::FOUND_SHORT_NAME),
            long_name: dict_string(dict, keys::FOUND_LONG_NAME),
            technology: dict_string(dict, keys::FOUND_TECHNOLOGY),
        }
    }
}

/// A network interface and, for modems, its SIM and carrier details.
#[derive(Clone)]
pub struct NetworkDevice {
    device_path: String,
    properties: PropertyStore,
    parser: Arc<dyn DeviceParser>,

    pub device_type: ConnectionType,
    pub name: String,
    pub interface: String,
    pub mac_address: String,
    pub powered: bool,
    pub scanning: bool,
    pub ip_config_paths: Vec<String>,

    // Cellular
    pub sim_lock_state: SimLockState,
    pub sim_retries_left: u32,
    pub sim_pin_required: SimPinRequire,
    pub sim_present: bool,
    pub data_roaming_allowed: bool,
    pub provider_requires_roaming: bool,
    pub support_network_scan: bool,
    pub carrier: String,
    pub imei: String,
    pub imsi: String,
    pub meid: String,
    pub esn: String,
    pub mdn: String,
    pub min: String,
    pub manufacturer: String,
    pub model_id: String,
    pub hardware_revision: String,
    pub firmware_revision: String,
    pub prl_version: i32,
    pub home_provider: String,
    pub selected_network: String,
    pub found_cellular_networks: Vec<FoundCellularNetwork>,
    pub provider_apn_list: Vec<CellularApn>,
}

impl fmt::Debug for NetworkDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkDevice")
            .field("device_path", &self.device_path)
            .field("device_type", &self.device_type)
            .field("name", &self.name)
            .field("powered", &self.powered)
            .field("scanning", &self.scanning)
            .field("sim_lock_state", &self.sim_lock_state)
            .finish_non_exhaustive()
    }
}

impl NetworkDevice {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            properties: PropertyStore::new(),
            parser: Arc::new(NativeDeviceParser),
            device_type: ConnectionType::Unknown,
            name: String::new(),
            interface: String::new(),
            mac_address: String::new(),
            powered: false,
            scanning: false,
            ip_config_paths: Vec::new(),
            sim_lock_state: SimLockState::Unknown,
            sim_retries_left: DEFAULT_SIM_RETRIES,
            sim_pin_required: SimPinRequire::Unknown,
            sim_present: false,
            data_roaming_allowed: false,
            provider_requires_roaming: false,
            support_network_scan: false,
            carrier: String::new(),
            imei: String::new(),
            imsi: String::new(),
            meid: String::new(),
            esn: String::new(),
            mdn: String::new(),
            min: String::new(),
            manufacturer: String::new(),
            model_id: String::new(),
            hardware_revision: String::new(),
            firmware_revision: String::new(),
            prl_version: 0,
            home_provider: String::new(),
            selected_network: String::new(),
            found_cellular_networks: Vec::new(),
            provider_apn_list: Vec::new(),
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn is_cellular(&self) -> bool {
        self.device_type == ConnectionType::Cellular
    }

    pub fn is_sim_locked(&self) -> bool {
        self.sim_lock_state.is_locked()
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn property(&self, index: PropertyIndex) -> Option<&PropertyValue> {
        self.properties.get(index)
    }

    pub fn update_property_map(&mut self, index: PropertyIndex, value: Option<&PropertyValue>) -> bool {
        self.properties.update(index, value)
    }

    pub fn set_parser(&mut self, parser: Arc<dyn DeviceParser>) {
        self.parser = parser;
    }

    /// Apply one property update. Returns true if the key was recognized.
    pub fn update_status(&mut self, key: &str, value: &PropertyValue) -> bool {
        let parser = Arc::clone(&self.parser);
        parser.update_status(key, value, self)
    }

    pub fn parse_info(&mut self, info: &PropertyDict) -> bool {
        let parser = Arc::clone(&self.parser);
        parser.parse_info(info, self)
    }

    /// Apply a SIM lock status dictionary.
    pub(crate) fn set_sim_lock_status(&mut self, dict: &PropertyDict) {
        self.sim_lock_state = SimLockState::from_key(&dict_string(dict, keys::SIM_LOCK_TYPE));
        if let Some(retries) = dict
            .get(keys::SIM_LOCK_RETRIES_LEFT)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
        {
            self.sim_retries_left = retries;
        }
        if let Some(enabled) = dict.get(keys::SIM_LOCK_ENABLED).and_then(|v| v.as_bool()) {
            self.sim_pin_required = if enabled {
                SimPinRequire::Required
            } else {
                SimPinRequire::NotRequired
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_device_defaults() {
        let device = NetworkDevice::new("/device/cell0");
        assert_eq!(device.device_path(), "/device/cell0");
        assert_eq!(device.device_type, ConnectionType::Unknown);
        assert_eq!(device.sim_retries_left, DEFAULT_SIM_RETRIES);
        assert_eq!(device.sim_lock_state, SimLockState::Unknown);
        assert!(device.properties().is_empty());
    }

    #[test]
    fn test_sim_lock_status() {
        let mut device = NetworkDevice::new("/device/cell0");
        let status = json!({"LockType": "sim-pin", "RetriesLeft": 3, "LockEnabled": true});
        device.set_sim_lock_status(status.as_object().unwrap());
        assert_eq!(device.sim_lock_state, SimLockState::LockedPin);
        assert_eq!(device.sim_retries_left, 3);
        assert_eq!(device.sim_pin_required, SimPinRequire::Required);
        assert!(device.is_sim_locked());

        let status = json!({"LockType": "", "LockEnabled": false});
        device.set_sim_lock_status(status.as_object().unwrap());
        assert_eq!(device.sim_lock_state, SimLockState::Disabled);
        assert_eq!(device.sim_retries_left, 3);
        assert_eq!(device.sim_pin_required, SimPinRequire::NotRequired);
    }

    #[test]
    fn test_found_network_from_dict() {
        let dict = json!({"status": "available", "network_id": "310260", "long_name": "Carrier"});
        let found = FoundCellularNetwork::from_dict(dict.as_object().unwrap());
        assert_eq!(found.network_id, "310260");
        assert_eq!(found.long_name, "Carrier");
        assert!(found.short_name.is_empty());
    }
}
