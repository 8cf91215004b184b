// Network State - Device Property Parser
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Parser for shill device properties.

use tracing::debug;

use super::{keys, value_bool, value_i32, value_str, value_string, value_string_list, DeviceParser};
use crate::models::device::FoundCellularNetwork;
use crate::models::network::{CellularApn, ConnectionType};
use crate::models::{NetworkDevice, PropertyDict, PropertyIndex, PropertyValue};

/// Understands the device property set of the shill connection manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDeviceParser;

impl DeviceParser for NativeDeviceParser {
    fn update_status(&self, key: &str, value: &PropertyValue, device: &mut NetworkDevice) -> bool {
        let recognized = parse_common(key, value, device)
            || (device.is_cellular() && parse_cellular(key, value, device));
        if !recognized {
            debug!("Unhandled key '{}' for device {}", key, device.device_path());
            return false;
        }
        if let Some(index) = PropertyIndex::from_key(key) {
            device.update_property_map(index, Some(value));
        }
        true
    }

    /// The type decides which keys apply, so it is applied first.
    fn parse_info(&self, info: &PropertyDict, device: &mut NetworkDevice) -> bool {
        let mut recognized = false;
        if let Some(device_type) = info.get(keys::TYPE) {
            recognized |= self.update_status(keys::TYPE, device_type, device);
        }
        for (key, value) in info.iter().filter(|(key, _)| key.as_str() != keys::TYPE) {
            recognized |= self.update_status(key, value, device);
        }
        recognized
    }
}

fn parse_common(key: &str, value: &PropertyValue, device: &mut NetworkDevice) -> bool {
    match key {
        keys::TYPE => {
            if let Some(device_type) = value_str(value) {
                device.device_type = ConnectionType::from_key(device_type);
            }
        }
        keys::NAME => set_string(value, &mut device.name),
        keys::INTERFACE => set_string(value, &mut device.interface),
        keys::ADDRESS => set_string(value, &mut device.mac_address),
        keys::POWERED => set_bool(value, &mut device.powered),
        keys::SCANNING => set_bool(value, &mut device.scanning),
        keys::IP_CONFIGS => {
            if let Some(paths) = value_string_list(value) {
                device.ip_config_paths = paths;
            }
        }
        keys::NETWORKS => {}
        _ => return false,
    }
    true
}

fn parse_cellular(key: &str, value: &PropertyValue, device: &mut NetworkDevice) -> bool {
    match key {
        keys::SIM_LOCK_STATUS => {
            if let Some(dict) = value.as_object() {
                device.set_sim_lock_status(dict);
            }
        }
        keys::SIM_PRESENT => set_bool(value, &mut device.sim_present),
        keys::ALLOW_ROAMING => set_bool(value, &mut device.data_roaming_allowed),
        keys::PROVIDER_REQUIRES_ROAMING => set_bool(value, &mut device.provider_requires_roaming),
        keys::SUPPORT_NETWORK_SCAN => set_bool(value, &mut device.support_network_scan),
        keys::CARRIER => set_string(value, &mut device.carrier),
        keys::IMEI => set_string(value, &mut device.imei),
        keys::IMSI => set_string(value, &mut device.imsi),
        keys::MEID => set_string(value, &mut device.meid),
        keys::ESN => set_string(value, &mut device.esn),
        keys::MDN => set_string(value, &mut device.mdn),
        keys::MIN => set_string(value, &mut device.min),
        keys::MANUFACTURER => set_string(value, &mut device.manufacturer),
        keys::MODEL_ID => set_string(value, &mut device.model_id),
        keys::HARDWARE_REVISION => set_string(value, &mut device.hardware_revision),
        keys::FIRMWARE_REVISION => set_string(value, &mut device.firmware_revision),
        keys::SELECTED_NETWORK => set_string(value, &mut device.selected_network),
        keys::PRL_VERSION => {
            if let Some(version) = value_i32(value) {
                device.prl_version = version;
            }
        }
        keys::HOME_PROVIDER => {
            // Newer daemons report a dictionary with the operator name.
            if let Some(name) = value_string(value) {
                device.home_provider = name;
            } else if let Some(dict) = value.as_object() {
                device.home_provider = super::dict_string(dict, "name");
            }
        }
        keys::FOUND_NETWORKS => {
            if let Some(list) = value.as_array() {
                device.found_cellular_networks = list
                    .iter()
                    .filter_map(|item| item.as_object())
                    .map(FoundCellularNetwork::from_dict)
                    .collect();
            }
        }
        keys::APN_LIST => {
            if let Some(list) = value.as_array() {
                device.provider_apn_list = list
                    .iter()
                    .filter_map(|item| item.as_object())
                    .map(CellularApn::from_dict)
                    .collect();
            }
        }
        _ => return false,
    }
    true
}

fn set_bool(value: &PropertyValue, field: &mut bool) {
    if let Some(v) = value_bool(value) {
        *field = v;
    }
}

fn set_string(value: &PropertyValue, field: &mut String) {
    if let Some(v) = value_string(value) {
        *field = v;
    }
}
