// Network State - Cellular Networks
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Cellular specific network state: activation, roaming, APN and the
//! carrier portal used for account management.

use serde_json::Value;
use tracing::debug;

use super::{Network, PropertyWriter};
use crate::manager::ManagerClient;
use crate::models::property::PropertyDict;
use crate::parser::{dict_string, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Unknown,
    Activated,
    Activating,
    NotActivated,
    PartiallyActivated,
}

impl ActivationState {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::ACTIVATION_STATE_ACTIVATED => Self::Activated,
            keys::ACTIVATION_STATE_ACTIVATING => Self::Activating,
            keys::ACTIVATION_STATE_NOT_ACTIVATED => Self::NotActivated,
            keys::ACTIVATION_STATE_PARTIALLY_ACTIVATED => Self::PartiallyActivated,
            _ => Self::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Activated => "Activated",
            Self::Activating => "Activating",
            Self::NotActivated => "Not activated",
            Self::PartiallyActivated => "Partially activated",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoamingState {
    #[default]
    Unknown,
    Home,
    Roaming,
}

impl RoamingState {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::ROAMING_STATE_HOME => Self::Home,
            keys::ROAMING_STATE_ROAMING => Self::Roaming,
            _ => Self::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Roaming => "Roaming",
            Self::Unknown => "Unknown",
        }
    }
}

/// Radio access technology of a cellular service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkTechnology {
    #[default]
    Unknown,
    OneXRtt,
    Evdo,
    Gprs,
    Edge,
    Umts,
    Hspa,
    HspaPlus,
    Lte,
    LteAdvanced,
    Gsm,
}

impl NetworkTechnology {
    pub fn from_key(value: &str) -> Self {
        match value {
            "1xRTT" => Self::OneXRtt,
            "EVDO" => Self::Evdo,
            "GPRS" => Self::Gprs,
            "EDGE" => Self::Edge,
            "UMTS" => Self::Umts,
            "HSPA" => Self::Hspa,
            "HSPA+" => Self::HspaPlus,
            "LTE" => Self::Lte,
            "LTE Advanced" => Self::LteAdvanced,
            "GSM" => Self::Gsm,
            _ => Self::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OneXRtt => "1xRTT",
            Self::Evdo => "EVDO",
            Self::Gprs => "GPRS",
            Self::Edge => "EDGE",
            Self::Umts => "UMTS",
            Self::Hspa => "HSPA",
            Self::HspaPlus => "HSPA Plus",
            Self::Lte => "LTE",
            Self::LteAdvanced => "LTE Advanced",
            Self::Gsm => "GSM",
            Self::Unknown => "Unknown",
        }
    }
}

/// How much of the current data plan is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataLeft {
    #[default]
    Unknown,
    Normal,
    Low,
    VeryLow,
    None,
}

/// Access point settings of a cellular carrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellularApn {
    pub apn: String,
    pub network_id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub localized_name: String,
    pub language: String,
}

impl CellularApn {
    pub fn new(apn: &str, network_id: &str, username: &str, password: &str) -> Self {
        Self {
            apn: apn.to_string(),
            network_id: network_id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Replace every field from an APN dictionary; missing keys become empty.
    pub fn set(&mut self, dict: &PropertyDict) {
        self.apn = dict_string(dict, keys::APN);
        self.network_id = dict_string(dict, keys::APN_NETWORK_ID);
        self.username = dict_string(dict, keys::APN_USERNAME);
        self.password = dict_string(dict, keys::APN_PASSWORD);
        self.name = dict_string(dict, keys::APN_NAME);
        self.localized_name = dict_string(dict, keys::APN_LOCALIZED_NAME);
        self.language = dict_string(dict, keys::APN_LANGUAGE);
    }

    pub fn from_dict(dict: &PropertyDict) -> Self {
        let mut apn = Self::default();
        apn.set(dict);
        apn
    }

    pub fn is_empty(&self) -> bool {
        self.apn.is_empty()
    }
}

/// Where the carrier's account page lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountInfoUrl {
    /// Open this URL directly.
    Direct(String),
    /// POST `post_data` to `form_url`; the portal answers with a redirect.
    Post { form_url: String, post_data: String },
}

/// Cellular payload of a [`Network`].
#[derive(Debug, Clone, Default)]
pub struct CellularNetwork {
    pub strength: i32,
    pub activation_state: ActivationState,
    pub network_technology: NetworkTechnology,
    pub roaming_state: RoamingState,
    pub apn: CellularApn,
    pub last_good_apn: CellularApn,
    pub payment_url: String,
    pub usage_url: String,
    pub post_data: String,
    pub data_left: DataLeft,
}

impl CellularNetwork {
    /// Ask the modem to activate. The state moves to Activating right away;
    /// the daemon reports the real outcome later.
    pub fn start_activation(&mut self, writer: &PropertyWriter<'_>) -> bool {
        if !writer
            .client()
            .activate_cellular_modem(writer.service_path(), "")
        {
            return false;
        }
        self.activation_state = ActivationState::Activating;
        true
    }

    /// Select an APN, or fall back to the carrier default when `apn` is empty.
    pub fn set_apn(&mut self, writer: &PropertyWriter<'_>, apn: &CellularApn) {
        if apn.is_empty() {
            writer.clear(keys::CELLULAR_APN);
        } else {
            let mut dict = PropertyDict::new();
            dict.insert(keys::APN.to_string(), Value::from(apn.apn.as_str()));
            dict.insert(keys::APN_NETWORK_ID.to_string(), Value::from(apn.network_id.as_str()));
            dict.insert(keys::APN_USERNAME.to_string(), Value::from(apn.username.as_str()));
            dict.insert(keys::APN_PASSWORD.to_string(), Value::from(apn.password.as_str()));
            writer.set_value(keys::CELLULAR_APN, Value::Object(dict));
        }
        self.apn = apn.clone();
    }

    pub fn supports_activation(&self) -> bool {
        !self.usage_url.is_empty() || !self.payment_url.is_empty()
    }

    pub fn supports_data_plan(&self) -> bool {
        !self.usage_url.is_empty() || !self.payment_url.is_empty()
    }

    /// True while the modem is not activated, or when the plan ran out.
    /// An unknown activation state does not count as unactivated.
    pub fn needs_activation(&self) -> bool {
        (self.activation_state != ActivationState::Activated
            && self.activation_state != ActivationState::Unknown)
            || self.needs_new_plan()
    }

    /// True when the plan is used up and the carrier sells new ones.
    pub fn needs_new_plan(&self) -> bool {
        self.supports_data_plan() && self.data_left == DataLeft::None
    }

    /// Account page of the carrier. With post data the payment URL is a
    /// form that must be submitted.
    pub fn account_info_url(&self) -> Option<AccountInfoUrl> {
        if self.post_data.is_empty() {
            if self.payment_url.is_empty() {
                return None;
            }
            return Some(AccountInfoUrl::Direct(self.payment_url.clone()));
        }
        Some(AccountInfoUrl::Post {
            form_url: self.payment_url.clone(),
            post_data: self.post_data.clone(),
        })
    }

    /// Apply the payment portal dictionary (url, postdata).
    pub fn set_payment_portal(&mut self, dict: &PropertyDict) {
        self.payment_url = dict_string(dict, keys::PORTAL_URL_KEY);
        self.post_data = dict_string(dict, keys::PORTAL_POST_DATA);
    }

    pub fn network_technology_string(&self) -> &'static str {
        self.network_technology.display_name()
    }

    pub fn activation_state_string(&self) -> &'static str {
        self.activation_state.display_name()
    }

    pub fn roaming_state_string(&self) -> &'static str {
        self.roaming_state.display_name()
    }
}

impl Network {
    /// Ask the data plan provider for fresh plans while the service is up.
    pub fn refresh_data_plans_if_needed(&self, client: &dyn ManagerClient) {
        let Some(cellular) = self.as_cellular() else {
            return;
        };
        if self.connected() && cellular.activation_state == ActivationState::Activated {
            debug!("Requesting data plan update for {}", self.name());
            client.request_data_plan_update(self.service_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::stub::{ManagerCommand, StubManagerClient};
    use crate::models::network::ConnectionState;
    use serde_json::json;

    #[test]
    fn test_apn_from_dict() {
        let dict = json!({"apn": "internet", "username": "guest", "name": "Carrier"});
        let apn = CellularApn::from_dict(dict.as_object().unwrap());
        assert_eq!(apn.apn, "internet");
        assert_eq!(apn.username, "guest");
        assert_eq!(apn.name, "Carrier");
        assert!(apn.network_id.is_empty());
        assert!(!apn.is_empty());
    }

    #[test]
    fn test_set_apn_writes_dict_or_clears() {
        let client = StubManagerClient::new();
        let mut network = Network::cellular("/service/cell0");
        let writer = network.writer(&client);
        let cellular = network.as_cellular_mut().unwrap();

        cellular.set_apn(&writer, &CellularApn::new("internet", "310260", "", ""));
        cellular.set_apn(&writer, &CellularApn::default());
        assert!(cellular.apn.is_empty());

        assert_eq!(
            client.commands(),
            vec![
                ManagerCommand::SetServiceProperty {
                    path: "/service/cell0".into(),
                    key: keys::CELLULAR_APN.into(),
                    value: json!({
                        "apn": "internet",
                        "network_id": "310260",
                        "username": "",
                        "password": "",
                    }),
                },
                ManagerCommand::ClearServiceProperty {
                    path: "/service/cell0".into(),
                    key: keys::CELLULAR_APN.into(),
                },
            ]
        );
    }

    #[test]
    fn test_start_activation_is_optimistic() {
        let client = StubManagerClient::new();
        let mut network = Network::cellular("/service/cell0");
        let writer = network.writer(&client);
        let cellular = network.as_cellular_mut().unwrap();
        assert!(cellular.start_activation(&writer));
        assert_eq!(cellular.activation_state, ActivationState::Activating);
        assert!(cellular.needs_activation());

        client.set_activation_result(false);
        let mut other = CellularNetwork::default();
        assert!(!other.start_activation(&writer));
        assert_eq!(other.activation_state, ActivationState::Unknown);
    }

    #[test]
    fn test_account_info_url() {
        let mut cellular = CellularNetwork::default();
        assert_eq!(cellular.account_info_url(), None);

        cellular.usage_url = "https://usage.example.com".into();
        let portal = json!({"url": "https://pay.example.com", "method": "GET"});
        cellular.set_payment_portal(portal.as_object().unwrap());
        assert_eq!(
            cellular.account_info_url(),
            Some(AccountInfoUrl::Direct("https://pay.example.com".into()))
        );

        let portal = json!({"url": "https://pay.example.com", "postdata": "imei=1"});
        cellular.set_payment_portal(portal.as_object().unwrap());
        assert_eq!(
            cellular.account_info_url(),
            Some(AccountInfoUrl::Post {
                form_url: "https://pay.example.com".into(),
                post_data: "imei=1".into(),
            })
        );
    }

    #[test]
    fn test_needs_activation() {
        let mut cellular = CellularNetwork::default();
        assert_eq!(cellular.activation_state, ActivationState::Unknown);
        assert!(!cellular.needs_activation());

        cellular.activation_state = ActivationState::Activating;
        assert!(cellular.needs_activation());
        cellular.activation_state = ActivationState::NotActivated;
        assert!(cellular.needs_activation());

        cellular.activation_state = ActivationState::Activated;
        assert!(!cellular.needs_activation());
        cellular.payment_url = "https://pay.example.com".into();
        cellular.data_left = DataLeft::None;
        assert!(cellular.needs_new_plan());
        assert!(cellular.needs_activation());
    }

    #[test]
    fn test_needs_new_plan() {
        let mut cellular = CellularNetwork::default();
        cellular.data_left = DataLeft::None;
        assert!(!cellular.needs_new_plan());
        cellular.payment_url = "https://pay.example.com".into();
        assert!(cellular.needs_new_plan());
        cellular.data_left = DataLeft::Low;
        assert!(!cellular.needs_new_plan());
    }

    #[test]
    fn test_refresh_data_plans_only_when_connected_and_activated() {
        let client = StubManagerClient::new();
        let mut network = Network::cellular("/service/cell0");
        network.refresh_data_plans_if_needed(&client);
        network.set_state(ConnectionState::Online);
        network.refresh_data_plans_if_needed(&client);
        assert!(client.commands().is_empty());

        network.as_cellular_mut().unwrap().activation_state = ActivationState::Activated;
        network.refresh_data_plans_if_needed(&client);
        assert_eq!(
            client.commands(),
            vec![ManagerCommand::RequestDataPlanUpdate {
                path: "/service/cell0".into()
            }]
        );
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(NetworkTechnology::from_key("HSPA+").display_name(), "HSPA Plus");
        assert_eq!(NetworkTechnology::from_key("LTE Advanced"), NetworkTechnology::LteAdvanced);
        assert_eq!(NetworkTechnology::from_key("5G"), NetworkTechnology::Unknown);
        assert_eq!(ActivationState::from_key("not-activated").display_name(), "Not activated");
        assert_eq!(RoamingState::from_key("roaming"), RoamingState::Roaming);
    }
}
