// Network State - Network Property Parser
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Parser for shill service properties.

use tracing::{debug, warn};

use super::{keys, value_bool, value_i32, value_str, value_string, NetworkParser};
use crate::models::network::{
    ActivationState, ClientCertType, ConnectionError, ConnectionSecurity, ConnectionState,
    ConnectionType, EapMethod, EapPhase2Auth, NetworkKind, NetworkTechnology, ProfileType,
    ProviderType, RoamingState,
};
use crate::models::{Network, PropertyDict, PropertyIndex, PropertyValue};
use crate::services::certificate::CertificatePattern;

/// Understands the property set of the shill connection manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeNetworkParser;

impl NetworkParser for NativeNetworkParser {
    fn update_status(&self, key: &str, value: &PropertyValue, network: &mut Network) -> bool {
        let recognized = parse_common(key, value, network)
            || match network.connection_type() {
                ConnectionType::Wifi => parse_wifi(key, value, network),
                ConnectionType::Cellular => parse_cellular(key, value, network),
                ConnectionType::Vpn => parse_vpn(key, value, network),
                _ => false,
            };
        if !recognized {
            debug!("Unhandled key '{}' for network {}", key, network.service_path());
            return false;
        }
        if let Some(index) = PropertyIndex::from_key(key) {
            network.update_property_map(index, Some(value));
        }
        true
    }
}

fn parse_common(key: &str, value: &PropertyValue, network: &mut Network) -> bool {
    match key {
        keys::NAME => {
            if let Some(name) = value_str(value) {
                network.set_name(name);
            }
        }
        keys::STATE => {
            if let Some(state) = value_str(value) {
                network.set_state(ConnectionState::from_key(state));
            }
        }
        keys::ERROR => {
            if let Some(error) = value_str(value) {
                network.error = ConnectionError::from_key(error);
            }
        }
        keys::TYPE | keys::GUID => {}
        keys::DEVICE => {
            if let Some(device) = value_string(value) {
                network.device_path = device;
            }
        }
        keys::CONNECTABLE => set_bool(value, &mut network.connectable),
        keys::IS_ACTIVE => set_bool(value, &mut network.is_active),
        keys::FAVORITE => set_bool(value, &mut network.added),
        keys::AUTO_CONNECT => set_bool(value, &mut network.auto_connect),
        keys::SAVE_CREDENTIALS => set_bool(value, &mut network.save_credentials),
        keys::PRIORITY => set_i32(value, &mut network.priority),
        keys::PROFILE => {
            if let Some(profile) = value_string(value) {
                network.profile_type = ProfileType::for_profile_path(&profile);
                network.profile_path = profile;
            }
        }
        keys::PROXY_CONFIG => {
            if let Some(proxy) = value_string(value) {
                network.proxy_config = proxy;
            }
        }
        keys::UI_DATA => parse_ui_data(value, network),
        keys::STRENGTH => match network.kind_mut() {
            NetworkKind::Wifi(wifi) => set_i32(value, &mut wifi.strength),
            NetworkKind::Cellular(cellular) => set_i32(value, &mut cellular.strength),
            _ => return false,
        },
        _ => return false,
    }
    true
}

fn parse_wifi(key: &str, value: &PropertyValue, network: &mut Network) -> bool {
    match key {
        keys::SSID => {
            if let Some(ssid) = value_str(value) {
                network.set_ssid(ssid.as_bytes());
            }
            return true;
        }
        keys::WIFI_HEX_SSID => {
            if let Some(hex_ssid) = value_str(value) {
                network.set_hex_ssid(hex_ssid);
            }
            return true;
        }
        _ => {}
    }
    let Some(wifi) = network.as_wifi_mut() else {
        return false;
    };
    match key {
        keys::WIFI_FREQUENCY => set_i32(value, &mut wifi.frequency),
        keys::WIFI_HIDDEN_SSID => set_bool(value, &mut wifi.hidden_ssid),
        keys::WIFI_BSSID => set_string(value, &mut wifi.bssid),
        keys::SECURITY => {
            if let Some(security) = value_str(value) {
                wifi.encryption = ConnectionSecurity::from_key(security);
            }
        }
        keys::PASSPHRASE => {
            if let Some(passphrase) = value_str(value) {
                wifi.passphrase.set(passphrase);
            }
        }
        keys::PASSPHRASE_REQUIRED => set_bool(value, &mut wifi.passphrase_required),
        keys::IDENTITY => set_string(value, &mut wifi.identity),
        keys::EAP_METHOD => {
            if let Some(method) = value_str(value) {
                wifi.eap_method = EapMethod::from_key(method);
            }
        }
        keys::EAP_PHASE_2_AUTH => {
            if let Some(auth) = value_str(value) {
                wifi.eap_phase_2_auth = EapPhase2Auth::from_key(auth);
            }
        }
        keys::EAP_IDENTITY => {
            if let Some(identity) = value_str(value) {
                wifi.eap_identity.set(identity);
            }
        }
        keys::EAP_ANONYMOUS_IDENTITY => {
            if let Some(identity) = value_str(value) {
                wifi.eap_anonymous_identity.set(identity);
            }
        }
        keys::EAP_CERT_ID => {
            if let Some(cert_id) = value_str(value) {
                wifi.eap_client_cert_pkcs11_id.set(cert_id);
            }
        }
        keys::EAP_KEY_ID => {}
        keys::EAP_CA_CERT_NSS => set_string(value, &mut wifi.eap_server_ca_cert_nss_nickname),
        keys::EAP_USE_SYSTEM_CAS => set_bool(value, &mut wifi.eap_use_system_cas),
        keys::EAP_PASSWORD => {
            if let Some(password) = value_str(value) {
                wifi.eap_passphrase.set(password);
            }
        }
        _ => return false,
    }
    true
}

fn parse_cellular(key: &str, value: &PropertyValue, network: &mut Network) -> bool {
    let Some(cellular) = network.as_cellular_mut() else {
        return false;
    };
    match key {
        keys::ACTIVATION_STATE => {
            if let Some(state) = value_str(value) {
                cellular.activation_state = ActivationState::from_key(state);
            }
        }
        keys::ROAMING_STATE => {
            if let Some(state) = value_str(value) {
                cellular.roaming_state = RoamingState::from_key(state);
            }
        }
        keys::NETWORK_TECHNOLOGY => {
            if let Some(technology) = value_str(value) {
                cellular.network_technology = NetworkTechnology::from_key(technology);
            }
        }
        keys::CELLULAR_APN => {
            if let Some(dict) = value.as_object() {
                cellular.apn.set(dict);
            }
        }
        keys::CELLULAR_LAST_GOOD_APN => {
            if let Some(dict) = value.as_object() {
                cellular.last_good_apn.set(dict);
            }
        }
        keys::PAYMENT_URL => set_string(value, &mut cellular.payment_url),
        keys::USAGE_URL => set_string(value, &mut cellular.usage_url),
        keys::PAYMENT_PORTAL => {
            if let Some(dict) = value.as_object() {
                cellular.set_payment_portal(dict);
            }
        }
        _ => return false,
    }
    true
}

fn parse_vpn(key: &str, value: &PropertyValue, network: &mut Network) -> bool {
    let Some(vpn) = network.as_vpn_mut() else {
        return false;
    };
    match key {
        keys::PROVIDER => {
            let Some(provider) = value.as_object() else {
                return true;
            };
            for (provider_key, provider_value) in provider {
                match provider_key.as_str() {
                    keys::PROVIDER_TYPE | keys::PROVIDER_HOST => {}
                    // Credentials may be nested in the provider dictionary.
                    other => {
                        parse_vpn(other, provider_value, network);
                    }
                }
            }
            let Some(vpn) = network.as_vpn_mut() else {
                return true;
            };
            if let Some(host) = provider.get(keys::PROVIDER_HOST).and_then(value_string) {
                vpn.server_hostname = host;
            }
            if let Some(provider_type) = provider.get(keys::PROVIDER_TYPE).and_then(value_str) {
                vpn.provider_type = match provider_type {
                    keys::PROVIDER_OPENVPN => ProviderType::OpenVpn,
                    keys::PROVIDER_L2TP_IPSEC if !vpn.client_cert_id.is_empty() => {
                        ProviderType::L2tpIpsecUserCert
                    }
                    keys::PROVIDER_L2TP_IPSEC => ProviderType::L2tpIpsecPsk,
                    other => {
                        warn!("Unknown VPN provider type '{}'", other);
                        vpn.provider_type
                    }
                };
            }
        }
        keys::PASSPHRASE_REQUIRED => set_bool(value, &mut vpn.user_passphrase_required),
        keys::L2TP_IPSEC_CA_CERT_NSS | keys::OPENVPN_CA_CERT_NSS => {
            if let Some(ca) = value_str(value) {
                vpn.ca_cert_nss.set(ca);
            }
        }
        keys::L2TP_IPSEC_PSK => {
            if let Some(psk) = value_str(value) {
                vpn.psk_passphrase.set(psk);
            }
        }
        keys::L2TP_IPSEC_PSK_REQUIRED => set_bool(value, &mut vpn.psk_passphrase_required),
        keys::L2TP_IPSEC_CLIENT_CERT_ID | keys::OPENVPN_CLIENT_CERT_ID => {
            if let Some(cert_id) = value_str(value) {
                vpn.client_cert_id.set(cert_id);
            }
        }
        keys::L2TP_IPSEC_USER | keys::OPENVPN_USER => set_string(value, &mut vpn.username),
        keys::L2TP_IPSEC_PASSWORD | keys::OPENVPN_PASSWORD => {
            if let Some(password) = value_str(value) {
                vpn.user_passphrase.set(password);
            }
        }
        keys::L2TP_IPSEC_GROUP_NAME => set_string(value, &mut vpn.group_name),
        _ => return false,
    }
    true
}

/// Apply the UIData annotations: certificate type and pattern.
///
/// The daemon stores UIData as a JSON string; an already decoded object is
/// accepted too.
fn parse_ui_data(value: &PropertyValue, network: &mut Network) {
    let parsed = match value {
        PropertyValue::String(text) if text.is_empty() => Some(PropertyDict::new()),
        PropertyValue::String(text) => match serde_json::from_str::<PropertyValue>(text) {
            Ok(PropertyValue::Object(dict)) => Some(dict),
            Ok(_) | Err(_) => None,
        },
        PropertyValue::Object(dict) => Some(dict.clone()),
        _ => None,
    };
    let Some(ui_data) = parsed else {
        warn!("Ignoring malformed UIData for {}", network.service_path());
        return;
    };

    let cert_type = ui_data
        .get(keys::UI_DATA_CERT_TYPE)
        .and_then(value_str)
        .map(ClientCertType::from_key)
        .unwrap_or_default();
    let pattern = match ui_data.get(keys::UI_DATA_CERT_PATTERN) {
        Some(raw) => serde_json::from_value::<CertificatePattern>(raw.clone()).unwrap_or_else(|e| {
            warn!("Invalid certificate pattern for {}: {}", network.service_path(), e);
            CertificatePattern::default()
        }),
        None => CertificatePattern::default(),
    };
    match network.kind_mut() {
        NetworkKind::Wifi(wifi) => {
            wifi.client_cert_type = cert_type;
            wifi.client_cert_pattern = pattern;
        }
        NetworkKind::Vpn(vpn) => {
            vpn.client_cert_type = cert_type;
            vpn.client_cert_pattern = pattern;
        }
        NetworkKind::Ethernet | NetworkKind::Cellular(_) => {}
    }
    network.ui_data = ui_data;
}

fn set_bool(value: &PropertyValue, field: &mut bool) {
    if let Some(v) = value_bool(value) {
        *field = v;
    }
}

fn set_i32(value: &PropertyValue, field: &mut i32) {
    if let Some(v) = value_i32(value) {
        *field = v;
    }
}

fn set_string(value: &PropertyValue, field: &mut String) {
    if let Some(v) = value_string(value) {
        *field = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: PropertyValue) -> PropertyDict {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_wifi_service() {
        let mut network = Network::wifi("/service/wifi0");
        let info = dict(json!({
            "Name": "HomeNet",
            "Type": "wifi",
            "State": "online",
            "Security": "psk",
            "Strength": 70,
            "Device": "/device/wlan0",
            "IsActive": true,
            "Favorite": true,
            "Profile": "/profile/default",
            "PassphraseRequired": false,
        }));
        assert!(network.parse_info(&info));
        assert_eq!(network.name(), "HomeNet");
        assert!(network.online());
        assert_eq!(network.strength(), 70);
        assert_eq!(network.device_path, "/device/wlan0");
        assert!(network.is_active && network.added);
        assert_eq!(network.profile_type, ProfileType::Shared);
        let wifi = network.as_wifi().unwrap();
        assert_eq!(wifi.encryption, ConnectionSecurity::Psk);
        assert_eq!(network.property(PropertyIndex::Strength), Some(&json!(70)));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut network = Network::ethernet("/service/eth0");
        assert!(!network.update_status("Vendor.Extension", &json!(1)));
        assert!(network.properties().is_empty());
        // Wifi only keys are unknown to other types.
        assert!(!network.update_status(keys::SECURITY, &json!("wep")));
    }

    #[test]
    fn test_hex_ssid_key() {
        let mut network = Network::wifi("/service/wifi0");
        network.update_status(keys::SECURITY, &json!("wep"));
        assert!(network.update_status(keys::WIFI_HEX_SSID, &json!("48656c6c6f")));
        network.calculate_unique_id();
        assert_eq!(network.unique_id(), "WEP|Hello");
    }

    #[test]
    fn test_eap_properties() {
        let mut network = Network::wifi("/service/wifi0");
        let info = dict(json!({
            "Security": "802_1x",
            "EAP.EAP": "TTLS",
            "EAP.InnerEAP": "autheap=PAP",
            "EAP.Identity": "user@example.com",
            "EAP.UseSystemCAs": false,
        }));
        network.parse_info(&info);
        let wifi = network.as_wifi().unwrap();
        assert_eq!(wifi.eap_method, EapMethod::Ttls);
        assert_eq!(wifi.eap_phase_2_auth, EapPhase2Auth::Pap);
        assert_eq!(wifi.eap_identity.as_str(), "user@example.com");
        assert!(!wifi.eap_use_system_cas);
        assert_eq!(wifi.encryption_string(), "8021X+TTLS");
    }

    #[test]
    fn test_ui_data_certificate_pattern() {
        let mut network = Network::wifi("/service/wifi0");
        let ui_data = json!({
            "certificate_type": "pattern",
            "certificate_pattern": {
                "Issuer": {"CommonName": "Corp CA"},
                "EnrollmentURI": ["https://enroll.example.com"],
            },
        })
        .to_string();
        assert!(network.update_status(keys::UI_DATA, &json!(ui_data)));
        assert_eq!(network.client_cert_type(), ClientCertType::Pattern);
        let pattern = network.client_cert_pattern().unwrap();
        assert_eq!(pattern.issuer.common_name, "Corp CA");
        assert_eq!(pattern.enrollment_uri_list.len(), 1);
        assert!(network.ui_data.contains_key("certificate_type"));
    }

    #[test]
    fn test_malformed_ui_data_keeps_previous_state() {
        let mut network = Network::vpn("/service/vpn0");
        network.as_vpn_mut().unwrap().client_cert_type = ClientCertType::Ref;
        network.update_status(keys::UI_DATA, &json!("{not json"));
        assert_eq!(network.client_cert_type(), ClientCertType::Ref);
    }

    #[test]
    fn test_cellular_properties() {
        let mut network = Network::cellular("/service/cell0");
        let info = dict(json!({
            "Cellular.ActivationState": "activated",
            "Cellular.RoamingState": "home",
            "Cellular.NetworkTechnology": "LTE",
            "Cellular.APN": {"apn": "internet"},
            "Cellular.Olp": {"url": "https://pay.example.com", "method": "GET"},
            "Strength": 55,
        }));
        network.parse_info(&info);
        let cellular = network.as_cellular().unwrap();
        assert_eq!(cellular.activation_state, ActivationState::Activated);
        assert_eq!(cellular.roaming_state, RoamingState::Home);
        assert_eq!(cellular.network_technology, NetworkTechnology::Lte);
        assert_eq!(cellular.apn.apn, "internet");
        assert_eq!(cellular.payment_url, "https://pay.example.com");
        assert!(cellular.post_data.is_empty());
        assert_eq!(network.strength(), 55);
    }

    #[test]
    fn test_vpn_provider() {
        let mut network = Network::vpn("/service/vpn0");
        let info = dict(json!({
            "Name": "Office",
            "Provider": {
                "Type": "l2tpipsec",
                "Host": "vpn.example.com",
                "L2TPIPsec.ClientCertID": "2:abcd",
                "L2TPIPsec.User": "alice",
            },
        }));
        network.parse_info(&info);
        let vpn = network.as_vpn().unwrap();
        assert_eq!(vpn.provider_type, ProviderType::L2tpIpsecUserCert);
        assert_eq!(vpn.server_hostname, "vpn.example.com");
        assert_eq!(vpn.username, "alice");
        network.calculate_unique_id();
        assert_eq!(network.unique_id(), "L2TP_IPSEC_USER_CERT|vpn.example.com");

        let mut psk = Network::vpn("/service/vpn1");
        psk.update_status(
            keys::PROVIDER,
            &json!({"Type": "l2tpipsec", "Host": "vpn.example.com"}),
        );
        assert_eq!(psk.as_vpn().unwrap().provider_type, ProviderType::L2tpIpsecPsk);

        let mut openvpn = Network::vpn("/service/vpn2");
        openvpn.update_status(keys::PROVIDER, &json!({"Type": "openvpn", "Host": "ovpn"}));
        assert_eq!(openvpn.as_vpn().unwrap().provider_type, ProviderType::OpenVpn);
        assert!(openvpn.need_more_info_to_connect());
    }

    #[test]
    fn test_state_key_applies_state_machine() {
        let mut network = Network::cellular("/service/cell0");
        network.update_status(keys::STATE, &json!("ready"));
        network.update_status(keys::STATE, &json!("failure"));
        assert_eq!(network.error, ConnectionError::Unknown);
        assert!(network.notify_failure);
        assert_eq!(network.property(PropertyIndex::State), Some(&json!("failure")));
    }
}
