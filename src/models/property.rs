// Network State - Property Store
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Sparse property storage for networks and devices.
//!
//! Every network and device keeps the raw value of each recognized
//! connection manager property in a [`PropertyStore`]. Values are deep
//! copies owned by the store; readers only ever get a borrow.

use std::collections::BTreeMap;

use tracing::trace;

use crate::parser::keys;

/// Dynamically typed property value as delivered by the connection manager.
pub type PropertyValue = serde_json::Value;

/// Dictionary of property values keyed by property name.
pub type PropertyDict = serde_json::Map<String, PropertyValue>;

/// Index of a recognized connection manager property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyIndex {
    // Service
    Name,
    State,
    Error,
    Type,
    Device,
    Connectable,
    IsActive,
    Favorite,
    AutoConnect,
    SaveCredentials,
    Priority,
    Profile,
    ProxyConfig,
    UiData,
    Guid,
    Strength,
    Ssid,
    WifiHexSsid,
    WifiFrequency,
    WifiHiddenSsid,
    WifiBssid,
    Security,
    Passphrase,
    PassphraseRequired,
    Identity,
    EapMethod,
    EapPhase2Auth,
    EapIdentity,
    EapAnonymousIdentity,
    EapCertId,
    EapKeyId,
    EapCaCertNss,
    EapUseSystemCas,
    EapPassword,
    ActivationState,
    RoamingState,
    NetworkTechnology,
    CellularApn,
    CellularLastGoodApn,
    PaymentUrl,
    UsageUrl,
    PaymentPortal,
    Provider,
    L2tpIpsecCaCertNss,
    L2tpIpsecPsk,
    L2tpIpsecPskRequired,
    L2tpIpsecClientCertId,
    L2tpIpsecUser,
    L2tpIpsecPassword,
    L2tpIpsecGroupName,
    OpenVpnCaCertNss,
    OpenVpnClientCertId,
    OpenVpnUser,
    OpenVpnPassword,
    // Device
    Powered,
    Scanning,
    Address,
    Interface,
    Networks,
    IpConfigs,
    SimLockStatus,
    SimPresent,
    AllowRoaming,
    Carrier,
    Imei,
    Imsi,
    Meid,
    Esn,
    Mdn,
    Min,
    Manufacturer,
    ModelId,
    HardwareRevision,
    FirmwareRevision,
    PrlVersion,
    HomeProvider,
    SelectedNetwork,
    SupportNetworkScan,
    FoundNetworks,
    ApnList,
    ProviderRequiresRoaming,
}

const INDEX_KEYS: &[(PropertyIndex, &str)] = &[
    (PropertyIndex::Name, keys::NAME),
    (PropertyIndex::State, keys::STATE),
    (PropertyIndex::Error, keys::ERROR),
    (PropertyIndex::Type, keys::TYPE),
    (PropertyIndex::Device, keys::DEVICE),
    (PropertyIndex::Connectable, keys::CONNECTABLE),
    (PropertyIndex::IsActive, keys::IS_ACTIVE),
    (PropertyIndex::Favorite, keys::FAVORITE),
    (PropertyIndex::AutoConnect, keys::AUTO_CONNECT),
    (PropertyIndex::SaveCredentials, keys::SAVE_CREDENTIALS),
    (PropertyIndex::Priority, keys::PRIORITY),
    (PropertyIndex::Profile, keys::PROFILE),
    (PropertyIndex::ProxyConfig, keys::PROXY_CONFIG),
    (PropertyIndex::UiData, keys::UI_DATA),
    (PropertyIndex::Guid, keys::GUID),
    (PropertyIndex::Strength, keys::STRENGTH),
    (PropertyIndex::Ssid, keys::SSID),
    (PropertyIndex::WifiHexSsid, keys::WIFI_HEX_SSID),
    (PropertyIndex::WifiFrequency, keys::WIFI_FREQUENCY),
    (PropertyIndex::WifiHiddenSsid, keys::WIFI_HIDDEN_SSID),
    (PropertyIndex::WifiBssid, keys::WIFI_BSSID),
    (PropertyIndex::Security, keys::SECURITY),
    (PropertyIndex::Passphrase, keys::PASSPHRASE),
    (PropertyIndex::PassphraseRequired, keys::PASSPHRASE_REQUIRED),
    (PropertyIndex::Identity, keys::IDENTITY),
    (PropertyIndex::EapMethod, keys::EAP_METHOD),
    (PropertyIndex::EapPhase2Auth, keys::EAP_PHASE_2_AUTH),
    (PropertyIndex::EapIdentity, keys::EAP_IDENTITY),
    (PropertyIndex::EapAnonymousIdentity, keys::EAP_ANONYMOUS_IDENTITY),
    (PropertyIndex::EapCertId, keys::EAP_CERT_ID),
    (PropertyIndex::EapKeyId, keys::EAP_KEY_ID),
    (PropertyIndex::EapCaCertNss, keys::EAP_CA_CERT_NSS),
    (PropertyIndex::EapUseSystemCas, keys::EAP_USE_SYSTEM_CAS),
    (PropertyIndex::EapPassword, keys::EAP_PASSWORD),
    (PropertyIndex::ActivationState, keys::ACTIVATION_STATE),
    (PropertyIndex::RoamingState, keys::ROAMING_STATE),
    (PropertyIndex::NetworkTechnology, keys::NETWORK_TECHNOLOGY),
    (PropertyIndex::CellularApn, keys::CELLULAR_APN),
    (PropertyIndex::CellularLastGoodApn, keys::CELLULAR_LAST_GOOD_APN),
    (PropertyIndex::PaymentUrl, keys::PAYMENT_URL),
    (PropertyIndex::UsageUrl, keys::USAGE_URL),
    (PropertyIndex::PaymentPortal, keys::PAYMENT_PORTAL),
    (PropertyIndex::Provider, keys::PROVIDER),
    (PropertyIndex::L2tpIpsecCaCertNss, keys::L2TP_IPSEC_CA_CERT_NSS),
    (PropertyIndex::L2tpIpsecPsk, keys::L2TP_IPSEC_PSK),
    (PropertyIndex::L2tpIpsecPskRequired, keys::L2TP_IPSEC_PSK_REQUIRED),
    (PropertyIndex::L2tpIpsecClientCertId, keys::L2TP_IPSEC_CLIENT_CERT_ID),
    (PropertyIndex::L2tpIpsecUser, keys::L2TP_IPSEC_USER),
    (PropertyIndex::L2tpIpsecPassword, keys::L2TP_IPSEC_PASSWORD),
    (PropertyIndex::L2tpIpsecGroupName, keys::L2TP_IPSEC_GROUP_NAME),
    (PropertyIndex::OpenVpnCaCertNss, keys::OPENVPN_CA_CERT_NSS),
    (PropertyIndex::OpenVpnClientCertId, keys::OPENVPN_CLIENT_CERT_ID),
    (PropertyIndex::OpenVpnUser, keys::OPENVPN_USER),
    (PropertyIndex::OpenVpnPassword, keys::OPENVPN_PASSWORD),
    (PropertyIndex::Powered, keys::POWERED),
    (PropertyIndex::Scanning, keys::SCANNING),
    (PropertyIndex::Address, keys::ADDRESS),
    (PropertyIndex::Interface, keys::INTERFACE),
    (PropertyIndex::Networks, keys::NETWORKS),
    (PropertyIndex::IpConfigs, keys::IP_CONFIGS),
    (PropertyIndex::SimLockStatus, keys::SIM_LOCK_STATUS),
    (PropertyIndex::SimPresent, keys::SIM_PRESENT),
    (PropertyIndex::AllowRoaming, keys::ALLOW_ROAMING),
    (PropertyIndex::Carrier, keys::CARRIER),
    (PropertyIndex::Imei, keys::IMEI),
    (PropertyIndex::Imsi, keys::IMSI),
    (PropertyIndex::Meid, keys::MEID),
    (PropertyIndex::Esn, keys::ESN),
    (PropertyIndex::Mdn, keys::MDN),
    (PropertyIndex::Min, keys::MIN),
    (PropertyIndex::Manufacturer, keys::MANUFACTURER),
    (PropertyIndex::ModelId, keys::MODEL_ID),
    (PropertyIndex::HardwareRevision, keys::HARDWARE_REVISION),
    (PropertyIndex::FirmwareRevision, keys::FIRMWARE_REVISION),
    (PropertyIndex::PrlVersion, keys::PRL_VERSION),
    (PropertyIndex::HomeProvider, keys::HOME_PROVIDER),
    (PropertyIndex::SelectedNetwork, keys::SELECTED_NETWORK),
    (PropertyIndex::SupportNetworkScan, keys::SUPPORT_NETWORK_SCAN),
    (PropertyIndex::FoundNetworks, keys::FOUND_NETWORKS),
    (PropertyIndex::ApnList, keys::APN_LIST),
    (PropertyIndex::ProviderRequiresRoaming, keys::PROVIDER_REQUIRES_ROAMING),
];

impl PropertyIndex {
    /// Look up the index for a connection manager property name.
    pub fn from_key(key: &str) -> Option<Self> {
        INDEX_KEYS
            .iter()
            .find(|(_, name)| *name == key)
            .map(|(index, _)| *index)
    }

    /// The connection manager property name for this index.
    pub fn key(&self) -> &'static str {
        INDEX_KEYS
            .iter()
            .find(|(index, _)| index == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

/// Sparse index to value map with deep-copy-on-write semantics.
///
/// Not shareable across threads by intent: the owning network or device
/// lives on the coordinating task.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStore<K: Ord = PropertyIndex> {
    values: BTreeMap<K, PropertyValue>,
}

impl<K: Ord> Default for PropertyStore<K> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + std::fmt::Debug> PropertyStore<K> {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Store a deep copy of `value`, releasing any previous value.
    ///
    /// Returns true if the stored value changed.
    pub fn set(&mut self, index: K, value: &PropertyValue) -> bool {
        if self.values.get(&index) == Some(value) {
            return false;
        }
        trace!("Property {:?} = {}", index, value);
        self.values.insert(index, value.clone());
        true
    }

    /// Set or remove a value. `None` removes the entry.
    pub fn update(&mut self, index: K, value: Option<&PropertyValue>) -> bool {
        match value {
            Some(value) => self.set(index, value),
            None => self.clear(index),
        }
    }

    /// Remove a value. Returns true if an entry was present.
    pub fn clear(&mut self, index: K) -> bool {
        self.values.remove(&index).is_some()
    }

    /// Borrow the stored value for `index`.
    pub fn get(&self, index: K) -> Option<&PropertyValue> {
        self.values.get(&index)
    }

    pub fn contains(&self, index: K) -> bool {
        self.values.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &PropertyValue)> {
        self.values.iter()
    }
}
