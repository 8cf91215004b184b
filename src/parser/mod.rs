// Network State - Property Parsers
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Translation of connection manager property updates into entity state.
//!
//! Networks and devices delegate every key they receive to an injectable
//! parser. A parser reports whether it recognized the key; unrecognized
//! keys are ignored so newer daemons with extra properties keep working.

pub mod device;
pub mod keys;
pub mod network;

use std::fmt;

use crate::models::{NetworkDevice, Network, PropertyDict, PropertyValue};

pub use device::NativeDeviceParser;
pub use network::NativeNetworkParser;

/// Updates a [`Network`] from connection manager properties.
pub trait NetworkParser: fmt::Debug {
    /// Apply a single property. Returns true if the key was recognized.
    fn update_status(&self, key: &str, value: &PropertyValue, network: &mut Network) -> bool;

    /// Apply a full property dictionary. Returns true if any key was recognized.
    fn parse_info(&self, info: &PropertyDict, network: &mut Network) -> bool {
        let mut recognized = false;
        for (key, value) in info {
            recognized |= self.update_status(key, value, network);
        }
        recognized
    }
}

/// Updates a [`NetworkDevice`] from connection manager properties.
pub trait DeviceParser: fmt::Debug {
    /// Apply a single property. Returns true if the key was recognized.
    fn update_status(&self, key: &str, value: &PropertyValue, device: &mut NetworkDevice) -> bool;

    /// Apply a full property dictionary. Returns true if any key was recognized.
    fn parse_info(&self, info: &PropertyDict, device: &mut NetworkDevice) -> bool {
        let mut recognized = false;
        for (key, value) in info {
            recognized |= self.update_status(key, value, device);
        }
        recognized
    }
}

// ========================================
// Value helpers shared by the native parsers
// ========================================

pub(crate) fn value_str(value: &PropertyValue) -> Option<&str> {
    value.as_str()
}

pub(crate) fn value_string(value: &PropertyValue) -> Option<String> {
    value.as_str().map(str::to_string)
}

pub(crate) fn value_bool(value: &PropertyValue) -> Option<bool> {
    value.as_bool()
}

pub(crate) fn value_i32(value: &PropertyValue) -> Option<i32> {
    value.as_i64().and_then(|v| i32::try_from(v).ok())
}

pub(crate) fn value_string_list(value: &PropertyValue) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(value_string).collect())
}

/// Read a string member of a dictionary value, empty when absent.
pub(crate) fn dict_string(dict: &PropertyDict, key: &str) -> String {
    dict.get(key).and_then(value_string).unwrap_or_default()
}
