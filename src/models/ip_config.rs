// Network State - IP Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! IP configuration records attached to devices.

use super::property::PropertyDict;
use super::validation::{netmask_from_prefix, netmask_prefix_length};
use crate::parser::{dict_string, keys, value_i32, value_string_list};

/// Addressing method of an IP configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpConfigType {
    #[default]
    Unknown,
    Ipv4,
    Ipv6,
    Dhcp,
    Bootp,
    Zeroconf,
    Dhcp6,
    Ppp,
}

impl IpConfigType {
    pub fn from_key(value: &str) -> Self {
        match value {
            "ipv4" => Self::Ipv4,
            "ipv6" => Self::Ipv6,
            "dhcp" => Self::Dhcp,
            "bootp" => Self::Bootp,
            "zeroconf" => Self::Zeroconf,
            "dhcp6" => Self::Dhcp6,
            "ppp" => Self::Ppp,
            _ => Self::Unknown,
        }
    }
}

/// One IP configuration of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkIpConfig {
    pub device_path: String,
    pub config_type: IpConfigType,
    pub address: String,
    pub netmask: String,
    pub gateway: String,
    pub name_servers: Vec<String>,
}

impl NetworkIpConfig {
    /// Build from an IPConfig property dictionary. The netmask is derived
    /// from the prefix length when the daemon only reports the latter.
    pub fn from_properties(device_path: &str, properties: &PropertyDict) -> Self {
        let mut netmask = dict_string(properties, keys::IPCONFIG_NETMASK);
        if netmask.is_empty() {
            if let Some(prefix_len) = properties.get(keys::IPCONFIG_PREFIX_LENGTH).and_then(value_i32) {
                netmask = netmask_from_prefix(prefix_len);
            }
        }
        Self {
            device_path: device_path.to_string(),
            config_type: IpConfigType::from_key(&dict_string(properties, keys::IPCONFIG_METHOD)),
            address: dict_string(properties, keys::IPCONFIG_ADDRESS),
            netmask,
            gateway: dict_string(properties, keys::IPCONFIG_GATEWAY),
            name_servers: properties
                .get(keys::IPCONFIG_NAME_SERVERS)
                .and_then(value_string_list)
                .unwrap_or_default(),
        }
    }

    /// Prefix length of the netmask, or -1 if it is not canonical.
    pub fn prefix_length(&self) -> i32 {
        netmask_prefix_length(&self.netmask)
    }
}
