// Network State - Wifi Networks
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Wifi specific network state and credentials.

use tracing::{debug, error};

use super::{resolve_certificate_pattern, AttemptOutcome, ClientCertType, ConnectionError, Network, PropertyWriter};
use crate::models::secret::SecretString;
use crate::models::validation::decode_hex_ssid;
use crate::parser::keys;
use crate::services::certificate::{CertificatePattern, CertificateResolver};

/// Wifi security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionSecurity {
    #[default]
    Unknown,
    None,
    Wep,
    Wpa,
    Rsn,
    Ieee8021x,
    Psk,
}

impl ConnectionSecurity {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::SECURITY_NONE => Self::None,
            keys::SECURITY_WEP => Self::Wep,
            keys::SECURITY_WPA => Self::Wpa,
            keys::SECURITY_RSN => Self::Rsn,
            keys::SECURITY_8021X => Self::Ieee8021x,
            keys::SECURITY_PSK => Self::Psk,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::None => "None",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
            Self::Rsn => "RSN",
            Self::Ieee8021x => "8021X",
            Self::Psk => "PSK",
        }
    }

    /// Security name used in unique ids. The daemon treats WPA and RSN as
    /// PSK, so they share an id.
    pub fn unique_id_name(&self) -> &'static str {
        match self {
            Self::Wpa | Self::Rsn => Self::Psk.as_str(),
            other => other.as_str(),
        }
    }
}

/// Outer 802.1X EAP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EapMethod {
    #[default]
    Unknown,
    Peap,
    Tls,
    Ttls,
    Leap,
}

impl EapMethod {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::EAP_METHOD_PEAP => Self::Peap,
            keys::EAP_METHOD_TLS => Self::Tls,
            keys::EAP_METHOD_TTLS => Self::Ttls,
            keys::EAP_METHOD_LEAP => Self::Leap,
            _ => Self::Unknown,
        }
    }

    pub fn as_key(&self) -> Option<&'static str> {
        match self {
            Self::Peap => Some(keys::EAP_METHOD_PEAP),
            Self::Tls => Some(keys::EAP_METHOD_TLS),
            Self::Ttls => Some(keys::EAP_METHOD_TTLS),
            Self::Leap => Some(keys::EAP_METHOD_LEAP),
            Self::Unknown => None,
        }
    }
}

/// Inner (phase 2) authentication for PEAP and TTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EapPhase2Auth {
    #[default]
    Auto,
    Md5,
    Mschapv2,
    Mschap,
    Pap,
    Chap,
}

impl EapPhase2Auth {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::EAP_PHASE_2_AUTH_PEAP_MD5 | keys::EAP_PHASE_2_AUTH_TTLS_MD5 => Self::Md5,
            keys::EAP_PHASE_2_AUTH_PEAP_MSCHAPV2 | keys::EAP_PHASE_2_AUTH_TTLS_MSCHAPV2 => {
                Self::Mschapv2
            }
            keys::EAP_PHASE_2_AUTH_TTLS_MSCHAP => Self::Mschap,
            keys::EAP_PHASE_2_AUTH_TTLS_PAP => Self::Pap,
            keys::EAP_PHASE_2_AUTH_TTLS_CHAP => Self::Chap,
            _ => Self::Auto,
        }
    }

    /// Daemon value for this inner method under the given outer method.
    pub fn as_key(&self, outer: EapMethod) -> Option<&'static str> {
        let is_peap = outer == EapMethod::Peap;
        match self {
            Self::Auto => None,
            Self::Md5 if is_peap => Some(keys::EAP_PHASE_2_AUTH_PEAP_MD5),
            Self::Md5 => Some(keys::EAP_PHASE_2_AUTH_TTLS_MD5),
            Self::Mschapv2 if is_peap => Some(keys::EAP_PHASE_2_AUTH_PEAP_MSCHAPV2),
            Self::Mschapv2 => Some(keys::EAP_PHASE_2_AUTH_TTLS_MSCHAPV2),
            Self::Mschap => Some(keys::EAP_PHASE_2_AUTH_TTLS_MSCHAP),
            Self::Pap => Some(keys::EAP_PHASE_2_AUTH_TTLS_PAP),
            Self::Chap => Some(keys::EAP_PHASE_2_AUTH_TTLS_CHAP),
        }
    }
}

/// Wifi payload of a [`Network`].
#[derive(Debug, Clone)]
pub struct WifiNetwork {
    pub strength: i32,
    pub frequency: i32,
    pub bssid: String,
    pub hidden_ssid: bool,
    pub encryption: ConnectionSecurity,
    /// Passphrase as echoed by the daemon.
    pub passphrase: SecretString,
    /// Passphrase entered by the user in this session.
    pub user_passphrase: SecretString,
    pub passphrase_required: bool,
    pub identity: String,
    pub eap_method: EapMethod,
    pub eap_phase_2_auth: EapPhase2Auth,
    pub eap_server_ca_cert_nss_nickname: String,
    pub eap_client_cert_pkcs11_id: SecretString,
    pub eap_use_system_cas: bool,
    pub eap_identity: SecretString,
    pub eap_anonymous_identity: SecretString,
    pub eap_passphrase: SecretString,
    pub client_cert_type: ClientCertType,
    pub client_cert_pattern: CertificatePattern,
}

impl Default for WifiNetwork {
    fn default() -> Self {
        Self {
            strength: 0,
            frequency: 0,
            bssid: String::new(),
            hidden_ssid: false,
            encryption: ConnectionSecurity::None,
            passphrase: SecretString::default(),
            user_passphrase: SecretString::default(),
            passphrase_required: false,
            identity: String::new(),
            eap_method: EapMethod::Unknown,
            eap_phase_2_auth: EapPhase2Auth::Auto,
            eap_server_ca_cert_nss_nickname: String::new(),
            eap_client_cert_pkcs11_id: SecretString::default(),
            eap_use_system_cas: true,
            eap_identity: SecretString::default(),
            eap_anonymous_identity: SecretString::default(),
            eap_passphrase: SecretString::default(),
            client_cert_type: ClientCertType::None,
            client_cert_pattern: CertificatePattern::default(),
        }
    }
}

impl WifiNetwork {
    /// The passphrase to show, preferring what the user typed.
    pub fn passphrase(&self) -> &str {
        if !self.user_passphrase.is_empty() {
            self.user_passphrase.as_str()
        } else {
            self.passphrase.as_str()
        }
    }

    /// Store a user passphrase and send it to the daemon.
    ///
    /// An empty passphrase restores the value the daemon remembered. A valid
    /// passphrase comes back from the daemon as a property update.
    pub fn set_passphrase(&mut self, writer: &PropertyWriter<'_>, passphrase: &str) {
        if !passphrase.is_empty() {
            self.user_passphrase.set(passphrase);
            self.passphrase.set(passphrase);
        } else {
            let remembered = self.passphrase.clone();
            self.user_passphrase.set(remembered.as_str());
        }
        writer.set_or_clear_string(keys::PASSPHRASE, passphrase);
    }

    pub fn erase_credentials(&mut self) {
        self.passphrase.wipe();
        self.user_passphrase.wipe();
        self.eap_client_cert_pkcs11_id.wipe();
        self.eap_identity.wipe();
        self.eap_anonymous_identity.wipe();
        self.eap_passphrase.wipe();
    }

    pub fn set_identity(&mut self, writer: &PropertyWriter<'_>, identity: &str) {
        writer.set_string(keys::IDENTITY, identity);
        self.identity = identity.to_string();
    }

    pub fn set_eap_method(&mut self, writer: &PropertyWriter<'_>, method: EapMethod) {
        self.eap_method = method;
        match method.as_key() {
            Some(value) => writer.set_string(keys::EAP_METHOD, value),
            None => writer.clear(keys::EAP_METHOD),
        }
    }

    pub fn set_eap_phase_2_auth(&mut self, writer: &PropertyWriter<'_>, auth: EapPhase2Auth) {
        self.eap_phase_2_auth = auth;
        match auth.as_key(self.eap_method) {
            Some(value) => writer.set_string(keys::EAP_PHASE_2_AUTH, value),
            None => writer.clear(keys::EAP_PHASE_2_AUTH),
        }
    }

    pub fn set_eap_server_ca_cert_nss_nickname(&mut self, writer: &PropertyWriter<'_>, nickname: &str) {
        debug!("SetEAPServerCaCertNssNickname {}", nickname);
        writer.set_or_clear_string(keys::EAP_CA_CERT_NSS, nickname);
        self.eap_server_ca_cert_nss_nickname = nickname.to_string();
    }

    /// Set the client certificate. The daemon needs the same id as both
    /// certificate and key id for TLS.
    pub fn set_eap_client_cert_pkcs11_id(&mut self, writer: &PropertyWriter<'_>, pkcs11_id: &str) {
        debug!("SetEAPClientCertPkcs11Id {}", pkcs11_id);
        writer.set_or_clear_string(keys::EAP_CERT_ID, pkcs11_id);
        self.eap_client_cert_pkcs11_id.set(pkcs11_id);
        writer.set_or_clear_string(keys::EAP_KEY_ID, pkcs11_id);
    }

    pub fn set_eap_use_system_cas(&mut self, writer: &PropertyWriter<'_>, use_system_cas: bool) {
        writer.set_bool(keys::EAP_USE_SYSTEM_CAS, use_system_cas);
        self.eap_use_system_cas = use_system_cas;
    }

    pub fn set_eap_identity(&mut self, writer: &PropertyWriter<'_>, identity: &str) {
        writer.set_or_clear_string(keys::EAP_IDENTITY, identity);
        self.eap_identity.set(identity);
    }

    pub fn set_eap_anonymous_identity(&mut self, writer: &PropertyWriter<'_>, identity: &str) {
        writer.set_or_clear_string(keys::EAP_ANONYMOUS_IDENTITY, identity);
        self.eap_anonymous_identity.set(identity);
    }

    pub fn set_eap_passphrase(&mut self, writer: &PropertyWriter<'_>, passphrase: &str) {
        writer.set_or_clear_string(keys::EAP_PASSWORD, passphrase);
        self.eap_passphrase.set(passphrase);
    }

    pub fn set_certificate_pin(&self, writer: &PropertyWriter<'_>, pin: &str) {
        writer.set_or_clear_string(keys::EAP_PIN, pin);
    }

    /// Short description of the security mode, e.g. "8021X+TLS".
    pub fn encryption_string(&self) -> String {
        match self.encryption {
            ConnectionSecurity::Unknown => "Unknown".to_string(),
            ConnectionSecurity::None => String::new(),
            ConnectionSecurity::Ieee8021x => {
                let method = match self.eap_method {
                    EapMethod::Peap => "+PEAP",
                    EapMethod::Tls => "+TLS",
                    EapMethod::Ttls => "+TTLS",
                    EapMethod::Leap => "+LEAP",
                    EapMethod::Unknown => "",
                };
                format!("8021X{}", method)
            }
            other => other.as_str().to_string(),
        }
    }

    /// 802.1X with TLS needs certificates, which only live in user profiles.
    pub fn requires_user_profile(&self) -> bool {
        if self.encryption != ConnectionSecurity::Ieee8021x {
            return false;
        }
        if self.eap_method != EapMethod::Tls {
            return false;
        }
        !self.eap_client_cert_pkcs11_id.is_empty() || self.client_cert_type == ClientCertType::Pattern
    }

    pub(crate) fn uses_certificate_pattern(&self) -> bool {
        self.encryption == ConnectionSecurity::Ieee8021x
            && self.eap_method == EapMethod::Tls
            && self.client_cert_type == ClientCertType::Pattern
    }

    pub(crate) fn match_certificate_pattern(
        &mut self,
        writer: &PropertyWriter<'_>,
        resolver: &CertificateResolver,
    ) -> AttemptOutcome {
        let pattern = self.client_cert_pattern.clone();
        let mut matched = None;
        let outcome = resolve_certificate_pattern(resolver, &pattern, writer.service_path(), |id| {
            matched = Some(id.to_string());
        });
        if let Some(pkcs11_id) = matched {
            self.set_eap_client_cert_pkcs11_id(writer, &pkcs11_id);
        }
        outcome
    }
}

impl Network {
    /// Set the name from a raw SSID, accepting non UTF-8 bytes.
    pub fn set_ssid(&mut self, ssid: &[u8]) -> bool {
        self.set_name_bytes(ssid);
        true
    }

    /// Set the name from a hex encoded SSID. Returns false on bad hex.
    pub fn set_hex_ssid(&mut self, ssid_hex: &str) -> bool {
        match decode_hex_ssid(ssid_hex) {
            Ok(raw) => self.set_ssid(&raw),
            Err(e) => {
                error!("Illegal hex char is found in WiFi.HexSSID: {}", e);
                false
            }
        }
    }

    /// Whether the user has to supply a passphrase before connecting.
    pub fn is_passphrase_required(&self) -> bool {
        let Some(wifi) = self.as_wifi() else {
            return false;
        };
        if matches!(self.error, ConnectionError::BadPassphrase | ConnectionError::BadWepKey) {
            return true;
        }
        // 802.1X needs configuration whenever the daemon says it cannot connect.
        if wifi.encryption == ConnectionSecurity::Ieee8021x {
            return !self.connectable;
        }
        wifi.passphrase_required
    }
}
