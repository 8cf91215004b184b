// Network State - Network Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Network service entities.
//!
//! A [`Network`] carries the state shared by every service type (identity,
//! connection state, profile, property map). Per-type data and behavior live
//! in the [`NetworkKind`] payload:
//!
//! - **Ethernet**: no extra state
//! - **Wifi**: SSID, security, passphrases and 802.1X settings
//! - **Cellular**: activation, roaming, technology, APN and data plan status
//! - **Vpn**: provider type and L2TP/IPsec or OpenVPN credentials
//!
//! Setters that change daemon-side configuration go through a
//! [`PropertyWriter`]; the daemon later echoes the value back as a property
//! update, which the parser applies to the local fields.

pub mod cellular;
pub mod vpn;
pub mod wifi;

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::manager::ManagerClient;
use crate::models::ip_config::NetworkIpConfig;
use crate::models::property::{PropertyDict, PropertyIndex, PropertyStore, PropertyValue};
use crate::models::validation::validate_utf8;
use crate::parser::{keys, NativeNetworkParser, NetworkParser};
use crate::services::certificate::{
    CertificatePattern, CertificateResolver, PatternMatch, PendingEnrollment,
};

pub use cellular::{
    AccountInfoUrl, ActivationState, CellularApn, CellularNetwork, DataLeft, NetworkTechnology,
    RoamingState,
};
pub use vpn::{ProviderType, VirtualNetwork};
pub use wifi::{ConnectionSecurity, EapMethod, EapPhase2Auth, WifiNetwork};

/// Priority value meaning "no preference".
pub const PRIORITY_NOT_SET: i32 = 0;
/// Priority value assigned to preferred networks.
pub const PRIORITY_PREFERRED: i32 = 1;

/// Path of the shared (machine-wide) profile.
pub const SHARED_PROFILE_PATH: &str = "/profile/default";

/// Technology of a network service or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Wimax,
    Bluetooth,
    Cellular,
    Vpn,
}

impl ConnectionType {
    /// Parse a connection manager type string.
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::TYPE_ETHERNET => Self::Ethernet,
            keys::TYPE_WIFI => Self::Wifi,
            keys::TYPE_WIMAX => Self::Wimax,
            keys::TYPE_BLUETOOTH => Self::Bluetooth,
            keys::TYPE_CELLULAR => Self::Cellular,
            keys::TYPE_VPN => Self::Vpn,
            _ => Self::Unknown,
        }
    }

    /// The connection manager type string.
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Ethernet => keys::TYPE_ETHERNET,
            Self::Wifi => keys::TYPE_WIFI,
            Self::Wimax => keys::TYPE_WIMAX,
            Self::Bluetooth => keys::TYPE_BLUETOOTH,
            Self::Cellular => keys::TYPE_CELLULAR,
            Self::Vpn => keys::TYPE_VPN,
        }
    }
}

/// Connection state of a service as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Idle,
    Carrier,
    Association,
    Configuration,
    Ready,
    Disconnect,
    Failure,
    ActivationFailure,
    Portal,
    Online,
}

impl ConnectionState {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::STATE_IDLE => Self::Idle,
            keys::STATE_CARRIER => Self::Carrier,
            keys::STATE_ASSOCIATION => Self::Association,
            keys::STATE_CONFIGURATION => Self::Configuration,
            keys::STATE_READY => Self::Ready,
            keys::STATE_DISCONNECT => Self::Disconnect,
            keys::STATE_FAILURE => Self::Failure,
            keys::STATE_ACTIVATION_FAILURE => Self::ActivationFailure,
            keys::STATE_PORTAL => Self::Portal,
            keys::STATE_ONLINE => Self::Online,
            _ => Self::Unknown,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Association | Self::Configuration | Self::Carrier)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Ready | Self::Portal | Self::Online)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Disconnect | Self::Failure | Self::ActivationFailure
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Idle => "Idle",
            Self::Carrier => "Carrier",
            Self::Association => "Association",
            Self::Configuration => "Configuration",
            Self::Ready => "Ready",
            Self::Disconnect => "Disconnected",
            Self::Failure => "Failure",
            Self::ActivationFailure => "Activation Failure",
            Self::Portal => "Portal",
            Self::Online => "Online",
        }
    }
}

/// Last connection error reported for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionError {
    #[default]
    NoError,
    OutOfRange,
    PinMissing,
    DhcpFailed,
    ConnectFailed,
    BadPassphrase,
    BadWepKey,
    ActivationFailed,
    NeedEvdo,
    NeedHomeNetwork,
    OtaspFailed,
    AaaFailed,
    Internal,
    DnsLookupFailed,
    HttpGetFailed,
    IpsecPskAuthFailed,
    IpsecCertAuthFailed,
    PppAuthFailed,
    Unknown,
}

impl ConnectionError {
    /// Parse a daemon error string. Empty means no error.
    pub fn from_key(value: &str) -> Self {
        match value {
            "" => Self::NoError,
            "out-of-range" => Self::OutOfRange,
            "pin-missing" => Self::PinMissing,
            "dhcp-failed" => Self::DhcpFailed,
            "connect-failed" => Self::ConnectFailed,
            "bad-passphrase" => Self::BadPassphrase,
            "bad-wepkey" => Self::BadWepKey,
            "activation-failed" => Self::ActivationFailed,
            "need-evdo" => Self::NeedEvdo,
            "need-home-network" => Self::NeedHomeNetwork,
            "otasp-failed" => Self::OtaspFailed,
            "aaa-failed" => Self::AaaFailed,
            "internal-error" => Self::Internal,
            "dns-lookup-failed" => Self::DnsLookupFailed,
            "http-get-failed" => Self::HttpGetFailed,
            "ipsec-psk-auth-failed" => Self::IpsecPskAuthFailed,
            "ipsec-cert-auth-failed" => Self::IpsecCertAuthFailed,
            "ppp-auth-failed" => Self::PppAuthFailed,
            _ => Self::Unknown,
        }
    }

    /// User facing description. Empty for `NoError`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NoError => "",
            Self::OutOfRange => "Out of range",
            Self::PinMissing => "PIN missing",
            Self::DhcpFailed => "DHCP failed",
            Self::ConnectFailed => "Connect failed",
            Self::BadPassphrase => "Bad passphrase",
            Self::BadWepKey => "Bad WEP key",
            Self::ActivationFailed => "Activation failed",
            Self::NeedEvdo => "Need EVDO",
            Self::NeedHomeNetwork => "Need home network",
            Self::OtaspFailed => "OTASP failed",
            Self::AaaFailed => "AAA failed",
            Self::Internal => "Internal error",
            Self::DnsLookupFailed => "DNS lookup failed",
            Self::HttpGetFailed => "HTTP GET failed",
            Self::IpsecPskAuthFailed => "IPsec PSK authentication failed",
            Self::IpsecCertAuthFailed => "IPsec certificate authentication failed",
            Self::PppAuthFailed => "PPP authentication failed",
            Self::Unknown => "Unknown error",
        }
    }
}

/// Which profile a service is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileType {
    #[default]
    None,
    Shared,
    User,
}

impl ProfileType {
    pub fn for_profile_path(profile_path: &str) -> Self {
        if profile_path.is_empty() {
            Self::None
        } else if profile_path == SHARED_PROFILE_PATH {
            Self::Shared
        } else {
            Self::User
        }
    }
}

/// How a client certificate is selected for authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientCertType {
    #[default]
    None,
    /// A fixed certificate reference.
    Ref,
    /// A pattern resolved against the certificate store at connect time.
    Pattern,
}

impl ClientCertType {
    pub fn from_key(value: &str) -> Self {
        match value {
            "ref" => Self::Ref,
            "pattern" => Self::Pattern,
            _ => Self::None,
        }
    }
}

/// Result of preparing credentials for a connection attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Credentials are resolved as far as possible; connect now.
    Ready,
    /// A certificate is being enrolled; connect once it completes.
    Enrolling(PendingEnrollment),
}

/// Writes service properties back to the connection manager.
pub struct PropertyWriter<'a> {
    client: &'a dyn ManagerClient,
    service_path: String,
}

impl<'a> PropertyWriter<'a> {
    pub fn new(client: &'a dyn ManagerClient, service_path: impl Into<String>) -> Self {
        Self {
            client,
            service_path: service_path.into(),
        }
    }

    pub fn client(&self) -> &'a dyn ManagerClient {
        self.client
    }

    pub fn service_path(&self) -> &str {
        &self.service_path
    }

    pub fn set_value(&self, key: &str, value: PropertyValue) {
        self.client
            .set_service_property(&self.service_path, key, value);
    }

    pub fn set_string(&self, key: &str, value: &str) {
        self.set_value(key, json!(value));
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.set_value(key, json!(value));
    }

    pub fn set_int(&self, key: &str, value: i32) {
        self.set_value(key, json!(value));
    }

    pub fn clear(&self, key: &str) {
        self.client.clear_service_property(&self.service_path, key);
    }

    /// Set `key` to `value`, or clear it when `value` is empty.
    pub fn set_or_clear_string(&self, key: &str, value: &str) {
        if value.is_empty() {
            self.clear(key);
        } else {
            self.set_string(key, value);
        }
    }
}

/// Type specific payload of a [`Network`].
#[derive(Debug, Clone)]
pub enum NetworkKind {
    Ethernet,
    Wifi(WifiNetwork),
    Cellular(CellularNetwork),
    Vpn(VirtualNetwork),
}

/// A network service known to the connection manager.
#[derive(Clone)]
pub struct Network {
    service_path: String,
    kind: NetworkKind,
    name: String,
    unique_id: String,
    state: ConnectionState,
    properties: PropertyStore,
    parser: Arc<dyn NetworkParser>,
    ip_refresh_pending: bool,

    /// Last error reported by the daemon.
    pub error: ConnectionError,
    /// Path of the device carrying this service.
    pub device_path: String,
    /// First address of the device while connected.
    pub ip_address: String,
    pub connectable: bool,
    /// Set when a connection was requested by this process.
    pub connection_started: bool,
    pub is_active: bool,
    pub priority: i32,
    pub auto_connect: bool,
    pub save_credentials: bool,
    /// Position in the daemon's service list.
    pub priority_order: i32,
    /// Whether the service has been added to a profile ("favorite").
    pub added: bool,
    /// Set on a new failure until observers have been told.
    pub notify_failure: bool,
    pub profile_type: ProfileType,
    pub profile_path: String,
    pub proxy_config: String,
    /// Policy and UI annotations attached to the service.
    pub ui_data: PropertyDict,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("service_path", &self.service_path)
            .field("type", &self.connection_type())
            .field("name", &self.name)
            .field("unique_id", &self.unique_id)
            .field("state", &self.state)
            .field("error", &self.error)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl Network {
    fn with_kind(service_path: impl Into<String>, kind: NetworkKind) -> Self {
        Self {
            service_path: service_path.into(),
            kind,
            name: String::new(),
            unique_id: String::new(),
            state: ConnectionState::Unknown,
            properties: PropertyStore::new(),
            parser: Arc::new(NativeNetworkParser),
            ip_refresh_pending: false,
            error: ConnectionError::NoError,
            device_path: String::new(),
            ip_address: String::new(),
            connectable: true,
            connection_started: false,
            is_active: false,
            priority: PRIORITY_NOT_SET,
            auto_connect: false,
            save_credentials: false,
            priority_order: 0,
            added: false,
            notify_failure: false,
            profile_type: ProfileType::None,
            profile_path: String::new(),
            proxy_config: String::new(),
            ui_data: PropertyDict::new(),
        }
    }

    pub fn ethernet(service_path: impl Into<String>) -> Self {
        Self::with_kind(service_path, NetworkKind::Ethernet)
    }

    pub fn wifi(service_path: impl Into<String>) -> Self {
        Self::with_kind(service_path, NetworkKind::Wifi(WifiNetwork::default()))
    }

    pub fn cellular(service_path: impl Into<String>) -> Self {
        Self::with_kind(service_path, NetworkKind::Cellular(CellularNetwork::default()))
    }

    pub fn vpn(service_path: impl Into<String>) -> Self {
        Self::with_kind(service_path, NetworkKind::Vpn(VirtualNetwork::default()))
    }

    /// Create a network of the given type. Returns `None` for types this
    /// library does not track.
    pub fn for_type(service_path: impl Into<String>, connection_type: ConnectionType) -> Option<Self> {
        match connection_type {
            ConnectionType::Ethernet => Some(Self::ethernet(service_path)),
            ConnectionType::Wifi => Some(Self::wifi(service_path)),
            ConnectionType::Cellular => Some(Self::cellular(service_path)),
            ConnectionType::Vpn => Some(Self::vpn(service_path)),
            _ => None,
        }
    }

    // ========================================
    // Identity
    // ========================================

    pub fn service_path(&self) -> &str {
        &self.service_path
    }

    pub fn connection_type(&self) -> ConnectionType {
        match self.kind {
            NetworkKind::Ethernet => ConnectionType::Ethernet,
            NetworkKind::Wifi(_) => ConnectionType::Wifi,
            NetworkKind::Cellular(_) => ConnectionType::Cellular,
            NetworkKind::Vpn(_) => ConnectionType::Vpn,
        }
    }

    pub fn kind(&self) -> &NetworkKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NetworkKind {
        &mut self.kind
    }

    pub fn as_wifi(&self) -> Option<&WifiNetwork> {
        match &self.kind {
            NetworkKind::Wifi(wifi) => Some(wifi),
            _ => None,
        }
    }

    pub fn as_wifi_mut(&mut self) -> Option<&mut WifiNetwork> {
        match &mut self.kind {
            NetworkKind::Wifi(wifi) => Some(wifi),
            _ => None,
        }
    }

    pub fn as_cellular(&self) -> Option<&CellularNetwork> {
        match &self.kind {
            NetworkKind::Cellular(cellular) => Some(cellular),
            _ => None,
        }
    }

    pub fn as_cellular_mut(&mut self) -> Option<&mut CellularNetwork> {
        match &mut self.kind {
            NetworkKind::Cellular(cellular) => Some(cellular),
            _ => None,
        }
    }

    pub fn as_vpn(&self) -> Option<&VirtualNetwork> {
        match &self.kind {
            NetworkKind::Vpn(vpn) => Some(vpn),
            _ => None,
        }
    }

    pub fn as_vpn_mut(&mut self) -> Option<&mut VirtualNetwork> {
        match &mut self.kind {
            NetworkKind::Vpn(vpn) => Some(vpn),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name, replacing unreadable characters.
    pub fn set_name(&mut self, name: &str) {
        self.name = validate_utf8(name.as_bytes());
    }

    /// Set the display name from raw bytes, replacing invalid UTF-8.
    pub fn set_name_bytes(&mut self, name: &[u8]) {
        self.name = validate_utf8(name);
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Recompute the unique id from the identity fields of this network.
    ///
    /// Never called implicitly; callers recompute after identity changes.
    pub fn calculate_unique_id(&mut self) {
        self.unique_id = match &self.kind {
            NetworkKind::Wifi(wifi) => {
                format!("{}|{}", wifi.encryption.unique_id_name(), self.name)
            }
            NetworkKind::Vpn(vpn) => {
                format!("{}|{}", vpn.provider_type.as_str(), vpn.server_hostname)
            }
            NetworkKind::Ethernet | NetworkKind::Cellular(_) => self.name.clone(),
        };
    }

    /// Signal strength for wireless services, 0 otherwise.
    pub fn strength(&self) -> i32 {
        match &self.kind {
            NetworkKind::Wifi(wifi) => wifi.strength,
            NetworkKind::Cellular(cellular) => cellular.strength,
            _ => 0,
        }
    }

    pub fn preferred(&self) -> bool {
        self.priority != PRIORITY_NOT_SET
    }

    // ========================================
    // Connection State
    // ========================================

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn connecting(&self) -> bool {
        self.state.is_connecting()
    }

    pub fn connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn connecting_or_connected(&self) -> bool {
        self.connecting() || self.connected()
    }

    pub fn disconnected(&self) -> bool {
        self.state.is_disconnected()
    }

    pub fn failed(&self) -> bool {
        self.state == ConnectionState::Failure
    }

    pub fn online(&self) -> bool {
        self.state == ConnectionState::Online
    }

    pub fn state_string(&self) -> &'static str {
        self.state.display_name()
    }

    pub fn error_string(&self) -> &'static str {
        self.error.display_name()
    }

    /// Apply a daemon reported state. Returns false if the state is unchanged.
    ///
    /// Every transition is accepted; this mirrors daemon state rather than
    /// enforcing a protocol. Side effects:
    /// - leaving the connecting states clears `connection_started`;
    /// - entering Failure from anything but Unknown or Idle sets
    ///   `notify_failure` and turns `NoError` into `Unknown` (Idle to
    ///   Failure happens on resume and is not a real failure);
    /// - any other destination drops the IP address and schedules a refresh.
    pub fn set_state(&mut self, new_state: ConnectionState) -> bool {
        if new_state == self.state {
            return false;
        }
        let old_state = self.state;
        self.state = new_state;
        if !new_state.is_connecting() {
            self.connection_started = false;
        }
        if new_state == ConnectionState::Failure {
            if old_state != ConnectionState::Unknown && old_state != ConnectionState::Idle {
                self.notify_failure = true;
                if self.error == ConnectionError::NoError {
                    self.error = ConnectionError::Unknown;
                }
            }
        } else {
            self.ip_address.clear();
            self.ip_refresh_pending = true;
        }
        debug!("{}.State = {}", self.name, self.state_string());
        true
    }

    /// Mark a locally initiated connection attempt.
    pub fn set_connecting(&mut self) {
        self.state = ConnectionState::Association;
        self.connection_started = true;
    }

    /// Take a pending IP refresh request.
    ///
    /// Returns the device to query if the network is connected to one.
    pub fn take_ip_refresh(&mut self) -> Option<String> {
        if !std::mem::take(&mut self.ip_refresh_pending) {
            return None;
        }
        if self.connected() && !self.device_path.is_empty() {
            Some(self.device_path.clone())
        } else {
            None
        }
    }

    /// Adopt the first non-empty address of the device's IP configurations.
    pub fn apply_ip_configs(&mut self, configs: &[NetworkIpConfig]) {
        self.ip_address.clear();
        if !self.connected() {
            return;
        }
        if let Some(config) = configs.iter().find(|c| !c.address.is_empty()) {
            self.ip_address = config.address.clone();
        }
    }

    // ========================================
    // Properties
    // ========================================

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn property(&self, index: PropertyIndex) -> Option<&PropertyValue> {
        self.properties.get(index)
    }

    /// Store a deep copy of `value` under `index`; `None` removes it.
    pub fn update_property_map(&mut self, index: PropertyIndex, value: Option<&PropertyValue>) -> bool {
        self.properties.update(index, value)
    }

    /// Replace the parser used for property updates.
    pub fn set_parser(&mut self, parser: Arc<dyn NetworkParser>) {
        self.parser = parser;
    }

    /// Apply one property update. Returns true if the key was recognized.
    pub fn update_status(&mut self, key: &str, value: &PropertyValue) -> bool {
        let parser = Arc::clone(&self.parser);
        parser.update_status(key, value, self)
    }

    /// Apply a full property dictionary.
    pub fn parse_info(&mut self, info: &PropertyDict) -> bool {
        let parser = Arc::clone(&self.parser);
        parser.parse_info(info, self)
    }

    // ========================================
    // Credentials
    // ========================================

    /// Wipe every secret held for this network.
    pub fn erase_credentials(&mut self) {
        match &mut self.kind {
            NetworkKind::Wifi(wifi) => wifi.erase_credentials(),
            NetworkKind::Vpn(vpn) => vpn.erase_credentials(),
            NetworkKind::Ethernet | NetworkKind::Cellular(_) => {}
        }
    }

    /// Whether credentials for this network may only live in a user profile.
    pub fn requires_user_profile(&self) -> bool {
        match &self.kind {
            NetworkKind::Wifi(wifi) => wifi.requires_user_profile(),
            NetworkKind::Vpn(_) => true,
            NetworkKind::Ethernet | NetworkKind::Cellular(_) => false,
        }
    }

    /// Fill in missing credentials from the remembered twin of this network.
    pub fn copy_credentials_from_remembered(&mut self, remembered: &Network) {
        if let (NetworkKind::Vpn(vpn), NetworkKind::Vpn(remembered_vpn)) =
            (&mut self.kind, &remembered.kind)
        {
            debug!(
                "Copy VPN credentials: {} username: {}",
                self.name, remembered_vpn.username
            );
            vpn.copy_credentials_from(remembered_vpn);
        }
    }

    pub fn client_cert_type(&self) -> ClientCertType {
        match &self.kind {
            NetworkKind::Wifi(wifi) => wifi.client_cert_type,
            NetworkKind::Vpn(vpn) => vpn.client_cert_type,
            _ => ClientCertType::None,
        }
    }

    pub fn client_cert_pattern(&self) -> Option<&CertificatePattern> {
        match &self.kind {
            NetworkKind::Wifi(wifi) => Some(&wifi.client_cert_pattern),
            NetworkKind::Vpn(vpn) => Some(&vpn.client_cert_pattern),
            _ => None,
        }
    }

    /// Prepare credentials before connecting.
    ///
    /// Only networks authenticating with a certificate pattern do any work
    /// here; everything else is ready immediately.
    pub fn attempt_connection(
        &mut self,
        client: &dyn ManagerClient,
        resolver: &CertificateResolver,
    ) -> AttemptOutcome {
        let writer = self.writer(client);
        match &mut self.kind {
            NetworkKind::Wifi(wifi) if wifi.uses_certificate_pattern() => {
                wifi.match_certificate_pattern(&writer, resolver)
            }
            NetworkKind::Vpn(vpn) if vpn.client_cert_type == ClientCertType::Pattern => {
                vpn.match_certificate_pattern(&writer, resolver)
            }
            _ => AttemptOutcome::Ready,
        }
    }

    // ========================================
    // Daemon Writes
    // ========================================

    /// Writer for this network's service properties.
    pub fn writer<'a>(&self, client: &'a dyn ManagerClient) -> PropertyWriter<'a> {
        PropertyWriter::new(client, self.service_path.clone())
    }

    pub fn set_preferred(&mut self, client: &dyn ManagerClient, preferred: bool) {
        let writer = self.writer(client);
        if preferred {
            writer.set_int(keys::PRIORITY, PRIORITY_PREFERRED);
            self.priority = PRIORITY_PREFERRED;
        } else {
            writer.clear(keys::PRIORITY);
            self.priority = PRIORITY_NOT_SET;
        }
    }

    pub fn set_auto_connect(&mut self, client: &dyn ManagerClient, auto_connect: bool) {
        self.writer(client).set_bool(keys::AUTO_CONNECT, auto_connect);
        self.auto_connect = auto_connect;
    }

    pub fn set_save_credentials(&mut self, client: &dyn ManagerClient, save_credentials: bool) {
        self.writer(client)
            .set_bool(keys::SAVE_CREDENTIALS, save_credentials);
        self.save_credentials = save_credentials;
    }

    pub fn set_profile_path(&mut self, client: &dyn ManagerClient, profile_path: &str) {
        debug!("Setting profile for: {} to: {}", self.name, profile_path);
        self.writer(client)
            .set_or_clear_string(keys::PROFILE, profile_path);
        self.profile_path = profile_path.to_string();
        self.profile_type = ProfileType::for_profile_path(profile_path);
    }

    pub fn set_proxy_config(&mut self, client: &dyn ManagerClient, proxy_config: &str) {
        self.writer(client)
            .set_or_clear_string(keys::PROXY_CONFIG, proxy_config);
        self.proxy_config = proxy_config.to_string();
    }

    pub fn clear_ui_data(&mut self, client: &dyn ManagerClient) {
        self.ui_data.clear();
        self.writer(client).clear(keys::UI_DATA);
    }
}

/// Resolve a certificate pattern and hand a match to `apply`.
///
/// A missing certificate with no enrollment path still yields `Ready`; the
/// connection then fails through the normal state machine.
pub(crate) fn resolve_certificate_pattern(
    resolver: &CertificateResolver,
    pattern: &CertificatePattern,
    network_name: &str,
    apply: impl FnOnce(&str),
) -> AttemptOutcome {
    match resolver.resolve(pattern) {
        PatternMatch::Empty => AttemptOutcome::Ready,
        PatternMatch::Matched(pkcs11_id) => {
            debug!("Certificate pattern matched for {}", network_name);
            apply(&pkcs11_id);
            AttemptOutcome::Ready
        }
        PatternMatch::Enrolling(pending) => AttemptOutcome::Enrolling(pending),
        PatternMatch::Unmatched => {
            warn!(
                "No certificate matches the pattern for {} and enrollment is unavailable",
                network_name
            );
            AttemptOutcome::Ready
        }
    }
}
