// Network State - Virtual Private Networks
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! VPN specific network state for L2TP/IPsec and OpenVPN providers.

use super::{
    resolve_certificate_pattern, AttemptOutcome, ClientCertType, ConnectionError, Network,
    PropertyWriter,
};
use crate::models::secret::SecretString;
use crate::parser::keys;
use crate::services::certificate::{CertificatePattern, CertificateResolver};

/// VPN provider and authentication flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderType {
    #[default]
    L2tpIpsecPsk,
    L2tpIpsecUserCert,
    OpenVpn,
}

impl ProviderType {
    /// Stable name used in unique ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2tpIpsecPsk => "L2TP_IPSEC_PSK",
            Self::L2tpIpsecUserCert => "L2TP_IPSEC_USER_CERT",
            Self::OpenVpn => "OPEN_VPN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::L2tpIpsecPsk => "L2TP/IPsec + PSK",
            Self::L2tpIpsecUserCert => "L2TP/IPsec + User Certificate",
            Self::OpenVpn => "OpenVPN",
        }
    }

    pub fn is_openvpn(&self) -> bool {
        *self == Self::OpenVpn
    }
}

/// VPN payload of a [`Network`].
#[derive(Debug, Clone)]
pub struct VirtualNetwork {
    pub provider_type: ProviderType,
    pub server_hostname: String,
    pub ca_cert_nss: SecretString,
    pub psk_passphrase: SecretString,
    pub client_cert_id: SecretString,
    pub username: String,
    pub user_passphrase: SecretString,
    pub group_name: String,
    pub psk_passphrase_required: bool,
    pub user_passphrase_required: bool,
    pub client_cert_type: ClientCertType,
    pub client_cert_pattern: CertificatePattern,
}

impl Default for VirtualNetwork {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::L2tpIpsecPsk,
            server_hostname: String::new(),
            ca_cert_nss: SecretString::default(),
            psk_passphrase: SecretString::default(),
            client_cert_id: SecretString::default(),
            username: String::new(),
            user_passphrase: SecretString::default(),
            group_name: String::new(),
            psk_passphrase_required: true,
            user_passphrase_required: true,
            client_cert_type: ClientCertType::None,
            client_cert_pattern: CertificatePattern::default(),
        }
    }
}

impl VirtualNetwork {
    pub fn erase_credentials(&mut self) {
        self.ca_cert_nss.wipe();
        self.psk_passphrase.wipe();
        self.client_cert_id.wipe();
        self.user_passphrase.wipe();
    }

    /// Fill empty certificate, username and passphrase fields from `other`.
    pub fn copy_credentials_from(&mut self, other: &VirtualNetwork) {
        if self.ca_cert_nss.is_empty() {
            self.ca_cert_nss = other.ca_cert_nss.clone();
        }
        if self.psk_passphrase.is_empty() {
            self.psk_passphrase = other.psk_passphrase.clone();
        }
        if self.client_cert_id.is_empty() {
            self.client_cert_id = other.client_cert_id.clone();
        }
        if self.username.is_empty() {
            self.username = other.username.clone();
        }
        if self.user_passphrase.is_empty() {
            self.user_passphrase = other.user_passphrase.clone();
        }
    }

    pub fn is_psk_passphrase_required(&self) -> bool {
        self.psk_passphrase_required && self.psk_passphrase.is_empty()
    }

    pub fn is_user_passphrase_required(&self) -> bool {
        self.user_passphrase_required && self.user_passphrase.is_empty()
    }

    pub fn provider_type_string(&self) -> &'static str {
        self.provider_type.display_name()
    }

    pub fn set_ca_cert_nss(&mut self, writer: &PropertyWriter<'_>, ca_cert_nss: &str) {
        let key = if self.provider_type.is_openvpn() {
            keys::OPENVPN_CA_CERT_NSS
        } else {
            keys::L2TP_IPSEC_CA_CERT_NSS
        };
        writer.set_string(key, ca_cert_nss);
        self.ca_cert_nss.set(ca_cert_nss);
    }

    pub fn set_l2tp_ipsec_psk_credentials(
        &mut self,
        writer: &PropertyWriter<'_>,
        psk_passphrase: &str,
        username: &str,
        user_passphrase: &str,
        group_name: &str,
    ) {
        self.set_psk_passphrase(writer, psk_passphrase);
        self.set_l2tp_ipsec_username(writer, username);
        self.set_user_passphrase(writer, user_passphrase);
        self.set_group_name(writer, group_name);
    }

    pub fn set_l2tp_ipsec_cert_credentials(
        &mut self,
        writer: &PropertyWriter<'_>,
        client_cert_id: &str,
        username: &str,
        user_passphrase: &str,
        group_name: &str,
    ) {
        self.set_client_cert_id(writer, client_cert_id);
        self.set_l2tp_ipsec_username(writer, username);
        self.set_user_passphrase(writer, user_passphrase);
        self.set_group_name(writer, group_name);
    }

    /// The one-time password is passed through and never kept.
    pub fn set_openvpn_credentials(
        &mut self,
        writer: &PropertyWriter<'_>,
        client_cert_id: &str,
        username: &str,
        user_passphrase: &str,
        otp: &str,
    ) {
        self.set_client_cert_id(writer, client_cert_id);
        writer.set_string(keys::OPENVPN_USER, username);
        self.username = username.to_string();
        self.set_user_passphrase(writer, user_passphrase);
        writer.set_string(keys::OPENVPN_OTP, otp);
    }

    /// Point the provider at the token slot and PIN holding the client key.
    pub fn set_certificate_slot_and_pin(&self, writer: &PropertyWriter<'_>, slot: &str, pin: &str) {
        if self.provider_type.is_openvpn() {
            writer.set_or_clear_string(keys::OPENVPN_CLIENT_CERT_SLOT, slot);
            writer.set_or_clear_string(keys::OPENVPN_PIN, pin);
        } else {
            writer.set_or_clear_string(keys::L2TP_IPSEC_CLIENT_CERT_SLOT, slot);
            writer.set_or_clear_string(keys::L2TP_IPSEC_PIN, pin);
        }
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
            self.set_client_cert_id(writer, &pkcs11_id);
        }
        outcome
    }

    fn set_psk_passphrase(&mut self, writer: &PropertyWriter<'_>, psk_passphrase: &str) {
        writer.set_string(keys::L2TP_IPSEC_PSK, psk_passphrase);
        self.psk_passphrase.set(psk_passphrase);
    }

    fn set_client_cert_id(&mut self, writer: &PropertyWriter<'_>, client_cert_id: &str) {
        let key = if self.provider_type.is_openvpn() {
            keys::OPENVPN_CLIENT_CERT_ID
        } else {
            keys::L2TP_IPSEC_CLIENT_CERT_ID
        };
        writer.set_string(key, client_cert_id);
        self.client_cert_id.set(client_cert_id);
    }

    fn set_l2tp_ipsec_username(&mut self, writer: &PropertyWriter<'_>, username: &str) {
        writer.set_string(keys::L2TP_IPSEC_USER, username);
        self.username = username.to_string();
    }

    fn set_user_passphrase(&mut self, writer: &PropertyWriter<'_>, user_passphrase: &str) {
        let key = if self.provider_type.is_openvpn() {
            keys::OPENVPN_PASSWORD
        } else {
            keys::L2TP_IPSEC_PASSWORD
        };
        writer.set_string(key, user_passphrase);
        self.user_passphrase.set(user_passphrase);
    }

    fn set_group_name(&mut self, writer: &PropertyWriter<'_>, group_name: &str) {
        writer.set_string(keys::L2TP_IPSEC_GROUP_NAME, group_name);
        self.group_name = group_name.to_string();
    }
}

impl Network {
    /// Whether the user must fill in more fields before this VPN can connect.
    pub fn need_more_info_to_connect(&self) -> bool {
        let Some(vpn) = self.as_vpn() else {
            return false;
        };
        if vpn.server_hostname.is_empty() || vpn.username.is_empty() || vpn.is_user_passphrase_required()
        {
            return true;
        }
        if self.error != ConnectionError::NoError {
            return true;
        }
        match vpn.provider_type {
            ProviderType::L2tpIpsecPsk => vpn.is_psk_passphrase_required(),
            ProviderType::L2tpIpsecUserCert => vpn.client_cert_id.is_empty(),
            // OpenVPN may need an OTP, which is never stored.
            ProviderType::OpenVpn => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::stub::{ManagerCommand, StubManagerClient};
    use crate::services::certificate::{
        InMemoryCertificateStore, IssuerSubjectPattern, StoredCertificate,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn complete_psk_vpn() -> Network {
        let mut network = Network::vpn("/service/vpn0");
        let vpn = network.as_vpn_mut().unwrap();
        vpn.server_hostname = "vpn.example.com".into();
        vpn.username = "alice".into();
        vpn.user_passphrase.set("secret");
        vpn.psk_passphrase.set("psk");
        network
    }

    #[test]
    fn test_unique_id_uses_provider_and_host() {
        let mut network = complete_psk_vpn();
        network.set_name("Office");
        network.calculate_unique_id();
        assert_eq!(network.unique_id(), "L2TP_IPSEC_PSK|vpn.example.com");
    }

    #[test]
    fn test_defaults_require_passphrases() {
        let vpn = VirtualNetwork::default();
        assert!(vpn.psk_passphrase_required);
        assert!(vpn.user_passphrase_required);
        assert!(vpn.is_psk_passphrase_required());
    }

    #[test]
    fn test_need_more_info_to_connect() {
        let mut network = complete_psk_vpn();
        assert!(!network.need_more_info_to_connect());

        network.error = ConnectionError::PppAuthFailed;
        assert!(network.need_more_info_to_connect());
        network.error = ConnectionError::NoError;

        network.as_vpn_mut().unwrap().psk_passphrase.wipe();
        assert!(network.need_more_info_to_connect());
        network.as_vpn_mut().unwrap().psk_passphrase_required = false;
        assert!(!network.need_more_info_to_connect());

        let vpn = network.as_vpn_mut().unwrap();
        vpn.provider_type = ProviderType::L2tpIpsecUserCert;
        assert!(network.need_more_info_to_connect());
        network.as_vpn_mut().unwrap().client_cert_id.set("1:aa");
        assert!(!network.need_more_info_to_connect());

        network.as_vpn_mut().unwrap().provider_type = ProviderType::OpenVpn;
        assert!(network.need_more_info_to_connect());
    }

    #[test]
    fn test_copy_credentials_fills_only_empty_fields() {
        let mut network = Network::vpn("/service/vpn0");
        network.as_vpn_mut().unwrap().username = "bob".into();
        let mut remembered = complete_psk_vpn();
        remembered.as_vpn_mut().unwrap().group_name = "eng".into();

        network.copy_credentials_from_remembered(&remembered);
        let vpn = network.as_vpn().unwrap();
        assert_eq!(vpn.username, "bob");
        assert_eq!(vpn.user_passphrase.as_str(), "secret");
        assert_eq!(vpn.psk_passphrase.as_str(), "psk");
        assert!(vpn.group_name.is_empty());
    }

    #[test]
    fn test_erase_credentials() {
        let mut network = complete_psk_vpn();
        network.as_vpn_mut().unwrap().ca_cert_nss.set("ca");
        network.erase_credentials();
        let vpn = network.as_vpn().unwrap();
        assert!(vpn.ca_cert_nss.is_empty());
        assert!(vpn.psk_passphrase.is_empty());
        assert!(vpn.user_passphrase.is_empty());
        assert_eq!(vpn.username, "alice");
    }

    #[test]
    fn test_openvpn_credentials_do_not_keep_otp() {
        let client = StubManagerClient::new();
        let mut network = Network::vpn("/service/vpn0");
        let writer = network.writer(&client);
        let vpn = network.as_vpn_mut().unwrap();
        vpn.provider_type = ProviderType::OpenVpn;
        vpn.set_openvpn_credentials(&writer, "1:cert", "carol", "pw", "123456");

        let set = |key: &str, value: &str| ManagerCommand::SetServiceProperty {
            path: "/service/vpn0".into(),
            key: key.into(),
            value: json!(value),
        };
        assert_eq!(
            client.commands(),
            vec![
                set(keys::OPENVPN_CLIENT_CERT_ID, "1:cert"),
                set(keys::OPENVPN_USER, "carol"),
                set(keys::OPENVPN_PASSWORD, "pw"),
                set(keys::OPENVPN_OTP, "123456"),
            ]
        );
        assert_eq!(vpn.client_cert_id.as_str(), "1:cert");
    }

    #[test]
    fn test_certificate_slot_and_pin_by_provider() {
        let client = StubManagerClient::new();
        let network = Network::vpn("/service/vpn0");
        let writer = network.writer(&client);
        network
            .as_vpn()
            .unwrap()
            .set_certificate_slot_and_pin(&writer, "0", "");
        assert_eq!(
            client.commands(),
            vec![
                ManagerCommand::SetServiceProperty {
                    path: "/service/vpn0".into(),
                    key: keys::L2TP_IPSEC_CLIENT_CERT_SLOT.into(),
                    value: json!("0"),
                },
                ManagerCommand::ClearServiceProperty {
                    path: "/service/vpn0".into(),
                    key: keys::L2TP_IPSEC_PIN.into(),
                },
            ]
        );
    }

    #[test]
    fn test_pattern_match_writes_provider_key() {
        let client = StubManagerClient::new();
        let store = InMemoryCertificateStore::default();
        store.add(StoredCertificate {
            pkcs11_id: "4:f00d".into(),
            subject: IssuerSubjectPattern {
                organization: "Example".into(),
                ..IssuerSubjectPattern::default()
            },
            ..StoredCertificate::default()
        });
        let resolver = CertificateResolver::new(Arc::new(store));

        let mut network = Network::vpn("/service/vpn0");
        let vpn = network.as_vpn_mut().unwrap();
        vpn.provider_type = ProviderType::OpenVpn;
        vpn.client_cert_type = ClientCertType::Pattern;
        vpn.client_cert_pattern.subject.organization = "Example".into();

        assert!(matches!(
            network.attempt_connection(&client, &resolver),
            AttemptOutcome::Ready
        ));
        assert_eq!(
            client.commands(),
            vec![ManagerCommand::SetServiceProperty {
                path: "/service/vpn0".into(),
                key: keys::OPENVPN_CLIENT_CERT_ID.into(),
                value: json!("4:f00d"),
            }]
        );
    }
}
