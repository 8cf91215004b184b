// Network State - Connection Manager Keys
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Property names and enumerated values used by the shill/flimflam
//! connection manager D-Bus API.

// ========================================
// D-Bus Interfaces
// ========================================
pub const MANAGER_INTERFACE: &str = "org.chromium.flimflam.Manager";
pub const SERVICE_INTERFACE: &str = "org.chromium.flimflam.Service";
pub const DEVICE_INTERFACE: &str = "org.chromium.flimflam.Device";
pub const PROFILE_INTERFACE: &str = "org.chromium.flimflam.Profile";
pub const IPCONFIG_INTERFACE: &str = "org.chromium.flimflam.IPConfig";
pub const MODEM_SERVICE: &str = "org.chromium.ModemManager";
pub const CASHEW_SERVICE: &str = "org.chromium.Cashew";
pub const CASHEW_INTERFACE: &str = "org.chromium.Cashew";
pub const CASHEW_PATH: &str = "/org/chromium/Cashew";
pub const PROPERTY_CHANGED_SIGNAL: &str = "PropertyChanged";
pub const DATA_PLANS_UPDATE_SIGNAL: &str = "DataPlansUpdate";

// ========================================
// Manager Properties
// ========================================
pub const SERVICES: &str = "Services";
pub const SERVICE_WATCH_LIST: &str = "ServiceWatchList";
pub const DEVICES: &str = "Devices";
pub const PROFILES: &str = "Profiles";
pub const ACTIVE_PROFILE: &str = "ActiveProfile";
pub const AVAILABLE_TECHNOLOGIES: &str = "AvailableTechnologies";
pub const ENABLED_TECHNOLOGIES: &str = "EnabledTechnologies";
pub const CONNECTED_TECHNOLOGIES: &str = "ConnectedTechnologies";
pub const DEFAULT_TECHNOLOGY: &str = "DefaultTechnology";
pub const OFFLINE_MODE: &str = "OfflineMode";
pub const PORTAL_URL: &str = "PortalURL";
pub const CHECK_PORTAL_LIST: &str = "CheckPortalList";

// ========================================
// Profile Properties
// ========================================
pub const ENTRIES: &str = "Entries";

// ========================================
// Service Properties
// ========================================
pub const NAME: &str = "Name";
pub const STATE: &str = "State";
pub const ERROR: &str = "Error";
pub const TYPE: &str = "Type";
pub const DEVICE: &str = "Device";
pub const CONNECTABLE: &str = "Connectable";
pub const IS_ACTIVE: &str = "IsActive";
pub const FAVORITE: &str = "Favorite";
pub const AUTO_CONNECT: &str = "AutoConnect";
pub const SAVE_CREDENTIALS: &str = "SaveCredentials";
pub const PRIORITY: &str = "Priority";
pub const PROFILE: &str = "Profile";
pub const PROXY_CONFIG: &str = "ProxyConfig";
pub const UI_DATA: &str = "UIData";
pub const GUID: &str = "GUID";
pub const STRENGTH: &str = "Strength";

// Wifi
pub const SSID: &str = "SSID";
pub const WIFI_HEX_SSID: &str = "WiFi.HexSSID";
pub const WIFI_FREQUENCY: &str = "WiFi.Frequency";
pub const WIFI_HIDDEN_SSID: &str = "WiFi.HiddenSSID";
pub const WIFI_BSSID: &str = "WiFi.BSSID";
pub const SECURITY: &str = "Security";
pub const PASSPHRASE: &str = "Passphrase";
pub const PASSPHRASE_REQUIRED: &str = "PassphraseRequired";
pub const IDENTITY: &str = "Identity";
pub const EAP_METHOD: &str = "EAP.EAP";
pub const EAP_PHASE_2_AUTH: &str = "EAP.InnerEAP";
pub const EAP_IDENTITY: &str = "EAP.Identity";
pub const EAP_ANONYMOUS_IDENTITY: &str = "EAP.AnonymousIdentity";
pub const EAP_CERT_ID: &str = "EAP.CertID";
pub const EAP_KEY_ID: &str = "EAP.KeyID";
pub const EAP_CA_CERT_NSS: &str = "EAP.CACertNSS";
pub const EAP_USE_SYSTEM_CAS: &str = "EAP.UseSystemCAs";
pub const EAP_PASSWORD: &str = "EAP.Password";
pub const EAP_PIN: &str = "EAP.PIN";

// Cellular
pub const ACTIVATION_STATE: &str = "Cellular.ActivationState";
pub const ROAMING_STATE: &str = "Cellular.RoamingState";
pub const NETWORK_TECHNOLOGY: &str = "Cellular.NetworkTechnology";
pub const CELLULAR_APN: &str = "Cellular.APN";
pub const CELLULAR_LAST_GOOD_APN: &str = "Cellular.LastGoodAPN";
pub const PAYMENT_URL: &str = "Cellular.PaymentURL";
pub const USAGE_URL: &str = "Cellular.UsageURL";
pub const PAYMENT_PORTAL: &str = "Cellular.Olp";

// VPN
pub const PROVIDER: &str = "Provider";
pub const PROVIDER_TYPE: &str = "Type";
pub const PROVIDER_HOST: &str = "Host";
pub const L2TP_IPSEC_CA_CERT_NSS: &str = "L2TPIPsec.CACertNSS";
pub const L2TP_IPSEC_PSK: &str = "L2TPIPsec.PSK";
pub const L2TP_IPSEC_PSK_REQUIRED: &str = "L2TPIPsec.PSKRequired";
pub const L2TP_IPSEC_CLIENT_CERT_ID: &str = "L2TPIPsec.ClientCertID";
pub const L2TP_IPSEC_CLIENT_CERT_SLOT: &str = "L2TPIPsec.ClientCertSlot";
pub const L2TP_IPSEC_PIN: &str = "L2TPIPsec.PIN";
pub const L2TP_IPSEC_USER: &str = "L2TPIPsec.User";
pub const L2TP_IPSEC_PASSWORD: &str = "L2TPIPsec.Password";
pub const L2TP_IPSEC_GROUP_NAME: &str = "L2TPIPsec.GroupName";
pub const OPENVPN_CA_CERT_NSS: &str = "OpenVPN.CACertNSS";
pub const OPENVPN_CLIENT_CERT_ID: &str = "OpenVPN.Client.CertID";
pub const OPENVPN_CLIENT_CERT_SLOT: &str = "OpenVPN.Client.CertSlot";
pub const OPENVPN_PIN: &str = "OpenVPN.Pin";
pub const OPENVPN_USER: &str = "OpenVPN.User";
pub const OPENVPN_PASSWORD: &str = "OpenVPN.Password";
pub const OPENVPN_OTP: &str = "OpenVPN.OTP";

// ========================================
// Device Properties
// ========================================
pub const POWERED: &str = "Powered";
pub const SCANNING: &str = "Scanning";
pub const ADDRESS: &str = "Address";
pub const INTERFACE: &str = "Interface";
pub const NETWORKS: &str = "Networks";
pub const IP_CONFIGS: &str = "IPConfigs";
pub const SIM_LOCK_STATUS: &str = "Cellular.SIMLockStatus";
pub const SIM_PRESENT: &str = "Cellular.SIMPresent";
pub const ALLOW_ROAMING: &str = "Cellular.AllowRoaming";
pub const CARRIER: &str = "Cellular.Carrier";
pub const IMEI: &str = "Cellular.IMEI";
pub const IMSI: &str = "Cellular.IMSI";
pub const MEID: &str = "Cellular.MEID";
pub const ESN: &str = "Cellular.ESN";
pub const MDN: &str = "Cellular.MDN";
pub const MIN: &str = "Cellular.MIN";
pub const MANUFACTURER: &str = "Cellular.Manufacturer";
pub const MODEL_ID: &str = "Cellular.ModelID";
pub const HARDWARE_REVISION: &str = "Cellular.HardwareRevision";
pub const FIRMWARE_REVISION: &str = "Cellular.FirmwareRevision";
pub const PRL_VERSION: &str = "Cellular.PRLVersion";
pub const HOME_PROVIDER: &str = "Cellular.HomeProvider";
pub const SELECTED_NETWORK: &str = "Cellular.SelectedNetwork";
pub const SUPPORT_NETWORK_SCAN: &str = "Cellular.SupportNetworkScan";
pub const FOUND_NETWORKS: &str = "Cellular.FoundNetworks";
pub const APN_LIST: &str = "Cellular.APNList";
pub const PROVIDER_REQUIRES_ROAMING: &str = "Cellular.ProviderRequiresRoaming";

// SIM lock status dictionary
pub const SIM_LOCK_TYPE: &str = "LockType";
pub const SIM_LOCK_ENABLED: &str = "LockEnabled";
pub const SIM_LOCK_RETRIES_LEFT: &str = "RetriesLeft";
pub const SIM_LOCK_PIN: &str = "sim-pin";
pub const SIM_LOCK_PUK: &str = "sim-puk";

// APN dictionary
pub const APN: &str = "apn";
pub const APN_NETWORK_ID: &str = "network_id";
pub const APN_USERNAME: &str = "username";
pub const APN_PASSWORD: &str = "password";
pub const APN_NAME: &str = "name";
pub const APN_LOCALIZED_NAME: &str = "localized_name";
pub const APN_LANGUAGE: &str = "language";

// Found network dictionary
pub const FOUND_STATUS: &str = "status";
pub const FOUND_NETWORK_ID: &str = "network_id";
pub const FOUND_SHORT_NAME: &str = "short_name";
pub const FOUND_LONG_NAME: &str = "long_name";
pub const FOUND_TECHNOLOGY: &str = "technology";

// Payment portal dictionary
pub const PORTAL_URL_KEY: &str = "url";
pub const PORTAL_POST_DATA: &str = "postdata";

// IPConfig properties
pub const IPCONFIG_METHOD: &str = "Method";
pub const IPCONFIG_ADDRESS: &str = "Address";
pub const IPCONFIG_NETMASK: &str = "Netmask";
pub const IPCONFIG_PREFIX_LENGTH: &str = "Prefixlen";
pub const IPCONFIG_GATEWAY: &str = "Gateway";
pub const IPCONFIG_NAME_SERVERS: &str = "NameServers";

// UIData keys
pub const UI_DATA_CERT_TYPE: &str = "certificate_type";
pub const UI_DATA_CERT_PATTERN: &str = "certificate_pattern";

// Cashew data plan dictionary keys
pub const PLAN_NAME: &str = "CellularPlanName";
pub const PLAN_TYPE: &str = "CellularPlanType";
pub const PLAN_UPDATE_TIME: &str = "CellularPlanUpdateTime";
pub const PLAN_START: &str = "CellularPlanStart";
pub const PLAN_END: &str = "CellularPlanEnd";
pub const PLAN_DATA_BYTES: &str = "CellularPlanDataBytes";
pub const PLAN_DATA_BYTES_USED: &str = "CellularDataBytesUsed";

pub const PLAN_TYPE_UNLIMITED: &str = "UNLIMITED";
pub const PLAN_TYPE_METERED_PAID: &str = "METERED_PAID";
pub const PLAN_TYPE_METERED_BASE: &str = "METERED_BASE";

// ========================================
// Enumerated Values
// ========================================
pub const TYPE_ETHERNET: &str = "ethernet";
pub const TYPE_WIFI: &str = "wifi";
pub const TYPE_CELLULAR: &str = "cellular";
pub const TYPE_VPN: &str = "vpn";
pub const TYPE_WIMAX: &str = "wimax";
pub const TYPE_BLUETOOTH: &str = "bluetooth";

pub const STATE_IDLE: &str = "idle";
pub const STATE_CARRIER: &str = "carrier";
pub const STATE_ASSOCIATION: &str = "association";
pub const STATE_CONFIGURATION: &str = "configuration";
pub const STATE_READY: &str = "ready";
pub const STATE_DISCONNECT: &str = "disconnect";
pub const STATE_FAILURE: &str = "failure";
pub const STATE_ACTIVATION_FAILURE: &str = "activation-failure";
pub const STATE_PORTAL: &str = "portal";
pub const STATE_ONLINE: &str = "online";

pub const SECURITY_NONE: &str = "none";
pub const SECURITY_WEP: &str = "wep";
pub const SECURITY_WPA: &str = "wpa";
pub const SECURITY_RSN: &str = "rsn";
pub const SECURITY_8021X: &str = "802_1x";
pub const SECURITY_PSK: &str = "psk";

pub const EAP_METHOD_PEAP: &str = "PEAP";
pub const EAP_METHOD_TLS: &str = "TLS";
pub const EAP_METHOD_TTLS: &str = "TTLS";
pub const EAP_METHOD_LEAP: &str = "LEAP";

pub const EAP_PHASE_2_AUTH_PEAP_MD5: &str = "auth=MD5";
pub const EAP_PHASE_2_AUTH_PEAP_MSCHAPV2: &str = "auth=MSCHAPV2";
pub const EAP_PHASE_2_AUTH_TTLS_MD5: &str = "autheap=MD5";
pub const EAP_PHASE_2_AUTH_TTLS_MSCHAPV2: &str = "autheap=MSCHAPV2";
pub const EAP_PHASE_2_AUTH_TTLS_MSCHAP: &str = "autheap=MSCHAP";
pub const EAP_PHASE_2_AUTH_TTLS_PAP: &str = "autheap=PAP";
pub const EAP_PHASE_2_AUTH_TTLS_CHAP: &str = "autheap=CHAP";

pub const ACTIVATION_STATE_ACTIVATED: &str = "activated";
pub const ACTIVATION_STATE_ACTIVATING: &str = "activating";
pub const ACTIVATION_STATE_NOT_ACTIVATED: &str = "not-activated";
pub const ACTIVATION_STATE_PARTIALLY_ACTIVATED: &str = "partially-activated";

pub const ROAMING_STATE_HOME: &str = "home";
pub const ROAMING_STATE_ROAMING: &str = "roaming";

pub const PROVIDER_L2TP_IPSEC: &str = "l2tpipsec";
pub const PROVIDER_OPENVPN: &str = "openvpn";
