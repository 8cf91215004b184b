// Network State - Network Library
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Network Library
//!
//! Owns every [`NetworkDevice`] and [`Network`] known to the connection
//! manager and keeps them current from [`ManagerEvent`]s.
//!
//! The library is driven from a single task: the owner feeds events into
//! [`NetworkLibrary::handle_event`] and calls the operations below. Commands
//! go out through a [`ManagerClient`] and never block.
//!
//! Indices:
//! - path to device, path to network, path to remembered network
//! - unique id to path, separately for visible and remembered networks
//! - ordered paths per type, most preferred first

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::manager::{ManagerClient, ManagerEvent, PinOperation, PinOperationResult};
use crate::models::data_plan::significant_plan;
use crate::models::network::{DataLeft, SHARED_PROFILE_PATH};
use crate::models::{
    AttemptOutcome, CellularDataPlan, ConnectionError, ConnectionState, ConnectionType,
    DataPlanThresholds, Error, Network, NetworkDevice, NetworkIpConfig, ProfileType, PropertyDict,
    PropertyIndex, PropertyValue, Result, SecretString,
};
use crate::parser::keys;
use crate::services::certificate::{CertificateResolver, EnrollmentStatus, PendingEnrollment};

// ========================================
// Observers
// ========================================

/// Notified when a network changes.
pub trait NetworkObserver {
    fn on_network_changed(&self, network: &Network);
}

/// Notified when a device changes.
pub trait DeviceObserver {
    fn on_device_changed(&self, device: &NetworkDevice);

    fn on_pin_operation_completed(&self, _device: &NetworkDevice, _result: PinOperationResult) {}
}

/// Notified when the set of networks or devices, or a manager property,
/// changes.
pub trait NetworkManagerObserver {
    fn on_network_manager_changed(&self, library: &NetworkLibrary);
}

/// Notified when a cellular network receives new data plans.
pub trait DataPlanObserver {
    fn on_data_plans_changed(&self, network: &Network, plans: &[CellularDataPlan]);
}

/// Result of [`NetworkLibrary::connect_to_network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The connect request was sent.
    Started,
    /// A client certificate is being enrolled; the connection resumes from
    /// [`NetworkLibrary::process_pending_connections`].
    AwaitingEnrollment,
}

fn remove_observer<T: ?Sized>(observers: &mut Vec<Rc<T>>, observer: &Rc<T>) {
    observers.retain(|o| !std::ptr::addr_eq(Rc::as_ptr(o), Rc::as_ptr(observer)));
}

// ========================================
// Library
// ========================================

/// Cache of connection manager state.
pub struct NetworkLibrary {
    client: Rc<dyn ManagerClient>,
    resolver: CertificateResolver,
    thresholds: DataPlanThresholds,

    // Manager
    offline_mode: bool,
    available_technologies: Vec<ConnectionType>,
    enabled_technologies: Vec<ConnectionType>,
    connected_technologies: Vec<ConnectionType>,
    default_technology: ConnectionType,
    active_profile: String,
    profiles: Vec<String>,
    portal_url: String,

    // Devices
    devices: HashMap<String, NetworkDevice>,
    device_order: Vec<String>,

    // Visible networks
    networks: HashMap<String, Network>,
    network_unique_ids: HashMap<String, String>,
    service_order: Vec<String>,
    retained: HashSet<String>,
    wifi_order: Vec<String>,
    cellular_order: Vec<String>,
    virtual_order: Vec<String>,

    // Remembered networks, keyed by profile entry
    remembered: HashMap<String, Network>,
    remembered_unique_ids: HashMap<String, String>,
    remembered_order: Vec<String>,
    remembered_wifi_order: Vec<String>,
    remembered_virtual_order: Vec<String>,

    pending_enrollments: HashMap<String, PendingEnrollment>,
    data_plans: HashMap<String, Vec<CellularDataPlan>>,
    ip_configs: HashMap<String, Vec<NetworkIpConfig>>,

    network_observers: HashMap<String, Vec<Rc<dyn NetworkObserver>>>,
    network_type_observers: HashMap<ConnectionType, Vec<Rc<dyn NetworkObserver>>>,
    device_observers: HashMap<String, Vec<Rc<dyn DeviceObserver>>>,
    manager_observers: Vec<Rc<dyn NetworkManagerObserver>>,
    data_plan_observers: Vec<Rc<dyn DataPlanObserver>>,
}

impl NetworkLibrary {
    pub fn new(
        client: Rc<dyn ManagerClient>,
        resolver: CertificateResolver,
        thresholds: DataPlanThresholds,
    ) -> Self {
        Self {
            client,
            resolver,
            thresholds,
            offline_mode: false,
            available_technologies: Vec::new(),
            enabled_technologies: Vec::new(),
            connected_technologies: Vec::new(),
            default_technology: ConnectionType::Unknown,
            active_profile: String::new(),
            profiles: Vec::new(),
            portal_url: String::new(),
            devices: HashMap::new(),
            device_order: Vec::new(),
            networks: HashMap::new(),
            network_unique_ids: HashMap::new(),
            service_order: Vec::new(),
            retained: HashSet::new(),
            wifi_order: Vec::new(),
            cellular_order: Vec::new(),
            virtual_order: Vec::new(),
            remembered: HashMap::new(),
            remembered_unique_ids: HashMap::new(),
            remembered_order: Vec::new(),
            remembered_wifi_order: Vec::new(),
            remembered_virtual_order: Vec::new(),
            pending_enrollments: HashMap::new(),
            data_plans: HashMap::new(),
            ip_configs: HashMap::new(),
            network_observers: HashMap::new(),
            network_type_observers: HashMap::new(),
            device_observers: HashMap::new(),
            manager_observers: Vec::new(),
            data_plan_observers: Vec::new(),
        }
    }

    /// Start a full enumeration from the manager properties.
    pub fn initialize(&self) {
        info!("Requesting connection manager state");
        self.client.request_manager_properties();
    }

    // ========================================
    // Event Handling
    // ========================================

    /// Apply one event from the connection manager.
    pub fn handle_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::ManagerProperties(properties) => {
                for (key, value) in &properties {
                    self.apply_manager_property(key, value);
                }
                self.notify_manager_observers();
            }
            ManagerEvent::ManagerPropertyChanged { key, value } => {
                if self.apply_manager_property(&key, &value) {
                    self.notify_manager_observers();
                }
            }
            ManagerEvent::ServiceListChanged(paths) => self.update_service_list(paths),
            ManagerEvent::DeviceListChanged(paths) => self.update_device_list(paths),
            ManagerEvent::ServiceProperties { path, properties } => match properties {
                Some(properties) => self.update_service_properties(&path, &properties),
                None => debug!("Service {} disappeared before its properties arrived", path),
            },
            ManagerEvent::ServicePropertyChanged { path, key, value } => {
                self.update_service_property(&path, &key, &value)
            }
            ManagerEvent::DeviceProperties { path, properties } => match properties {
                Some(properties) => self.update_device_properties(&path, &properties),
                None => debug!("Device {} disappeared before its properties arrived", path),
            },
            ManagerEvent::DevicePropertyChanged { path, key, value } => {
                self.update_device_property(&path, &key, &value)
            }
            ManagerEvent::ProfileEntries {
                profile_path,
                entries,
            } => self.update_profile_entries(&profile_path, &entries),
            ManagerEvent::RememberedServiceProperties {
                profile_path,
                entry_path,
                properties,
            } => self.update_remembered_network(&profile_path, &entry_path, properties.as_ref()),
            ManagerEvent::IpConfigs {
                device_path,
                configs,
            } => self.update_ip_configs(device_path, &configs),
            ManagerEvent::DataPlans {
                service_path,
                plans,
            } => self.update_data_plans(&service_path, plans),
            ManagerEvent::PinOperationCompleted {
                device_path,
                result,
            } => self.pin_operation_completed(&device_path, result),
        }
    }

    /// Returns true if an observable manager property changed.
    fn apply_manager_property(&mut self, key: &str, value: &PropertyValue) -> bool {
        let string_list = |value: &PropertyValue| -> Vec<String> {
            value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };
        let technologies = |value: &PropertyValue| -> Vec<ConnectionType> {
            string_list(value)
                .iter()
                .map(|t| ConnectionType::from_key(t))
                .collect()
        };

        match key {
            keys::SERVICES => {
                self.update_service_list(string_list(value));
                false
            }
            keys::DEVICES => {
                self.update_device_list(string_list(value));
                false
            }
            keys::SERVICE_WATCH_LIST => {
                for path in string_list(value) {
                    if self.networks.contains_key(&path) {
                        self.client.request_service_properties(&path);
                    }
                }
                false
            }
            keys::PROFILES => {
                self.update_profiles(string_list(value));
                true
            }
            keys::ACTIVE_PROFILE => {
                self.active_profile = value.as_str().unwrap_or_default().to_string();
                true
            }
            keys::OFFLINE_MODE => {
                self.offline_mode = value.as_bool().unwrap_or_default();
                true
            }
            keys::AVAILABLE_TECHNOLOGIES => {
                self.available_technologies = technologies(value);
                true
            }
            keys::ENABLED_TECHNOLOGIES => {
                self.enabled_technologies = technologies(value);
                true
            }
            keys::CONNECTED_TECHNOLOGIES => {
                self.connected_technologies = technologies(value);
                true
            }
            keys::DEFAULT_TECHNOLOGY => {
                self.default_technology =
                    ConnectionType::from_key(value.as_str().unwrap_or_default());
                true
            }
            keys::PORTAL_URL => {
                self.portal_url = value.as_str().unwrap_or_default().to_string();
                true
            }
            _ => {
                debug!("Unhandled manager property '{}'", key);
                false
            }
        }
    }

    // ========================================
    // Service List
    // ========================================

    fn update_service_list(&mut self, paths: Vec<String>) {
        let listed: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let previously_retained = std::mem::take(&mut self.retained);

        let unlisted: Vec<String> = self
            .networks
            .keys()
            .filter(|path| !listed.contains(path.as_str()))
            .cloned()
            .collect();
        let mut demoted = Vec::new();
        for path in unlisted {
            let keep = !previously_retained.contains(&path)
                && self.networks.get(&path).is_some_and(|network| {
                    network.connection_started
                        || network.notify_failure
                        || self.pending_enrollments.contains_key(&path)
                });
            if !keep {
                self.remove_network(&path);
                continue;
            }
            // Keep it one more round so observers see the failure.
            self.pending_enrollments.remove(&path);
            if let Some(network) = self.networks.get_mut(&path) {
                network.set_state(ConnectionState::Failure);
                network.notify_failure = true;
                if network.error == ConnectionError::NoError {
                    network.error = ConnectionError::Unknown;
                }
                debug!("Keeping unlisted network {} to report its failure", network.name());
            }
            self.retained.insert(path.clone());
            demoted.push(path);
        }

        for (index, path) in paths.iter().enumerate() {
            if let Some(network) = self.networks.get_mut(path) {
                network.priority_order = i32::try_from(index).unwrap_or(i32::MAX);
            }
            self.client.request_service_properties(path);
        }
        self.service_order = paths;

        self.rebuild_ordered_lists();
        for path in demoted {
            self.notify_network_observers(&path);
        }
        self.notify_manager_observers();
    }

    fn remove_network(&mut self, path: &str) {
        let Some(network) = self.networks.remove(path) else {
            return;
        };
        if self
            .network_unique_ids
            .get(network.unique_id())
            .is_some_and(|p| p == path)
        {
            self.network_unique_ids.remove(network.unique_id());
        }
        self.pending_enrollments.remove(path);
        self.data_plans.remove(path);
        info!("Removed network {} ({})", network.name(), path);
    }

    fn update_service_properties(&mut self, path: &str, properties: &PropertyDict) {
        let Some(network) = self.networks.get_mut(path) else {
            self.add_network(path, properties);
            return;
        };
        let changed = properties_differ(network, properties);
        let previous_state = network.state();
        network.parse_info(properties);
        self.network_updated(path, previous_state);
        self.rebuild_ordered_lists();
        if changed {
            self.notify_network_observers(path);
        }
    }

    fn add_network(&mut self, path: &str, properties: &PropertyDict) {
        let Some(index) = self.service_order.iter().position(|p| p == path) else {
            debug!("Ignoring properties of unlisted service {}", path);
            return;
        };
        let type_key = properties
            .get(keys::TYPE)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(mut network) = Network::for_type(path, ConnectionType::from_key(type_key)) else {
            warn!("Ignoring service {} of unsupported type '{}'", path, type_key);
            return;
        };
        network.priority_order = i32::try_from(index).unwrap_or(i32::MAX);
        network.parse_info(properties);
        info!("Added network {} ({})", network.name(), path);
        self.networks.insert(path.to_string(), network);

        self.network_updated(path, ConnectionState::Unknown);
        self.rebuild_ordered_lists();
        self.notify_network_observers(path);
        self.notify_manager_observers();
    }

    fn update_service_property(&mut self, path: &str, key: &str, value: &PropertyValue) {
        let Some(network) = self.networks.get_mut(path) else {
            debug!("Property {} changed on unknown service {}", key, path);
            return;
        };
        if let Some(index) = PropertyIndex::from_key(key) {
            if network.property(index) == Some(value) {
                return;
            }
        }
        let previous_state = network.state();
        if !network.update_status(key, value) {
            return;
        }
        self.network_updated(path, previous_state);
        self.rebuild_ordered_lists();
        self.notify_network_observers(path);
    }

    /// Bring indices and derived state in line after a network changed.
    fn network_updated(&mut self, path: &str, previous_state: ConnectionState) {
        let client = Rc::clone(&self.client);
        let Some(network) = self.networks.get_mut(path) else {
            return;
        };

        let old_id = network.unique_id().to_string();
        network.calculate_unique_id();
        let new_id = network.unique_id().to_string();
        if old_id != new_id && self.network_unique_ids.get(&old_id).is_some_and(|p| p == path) {
            self.network_unique_ids.remove(&old_id);
        }
        if !new_id.is_empty() {
            self.network_unique_ids.insert(new_id.clone(), path.to_string());
        }

        if let Some(remembered) = self
            .remembered_unique_ids
            .get(&new_id)
            .and_then(|entry| self.remembered.get(entry))
        {
            network.copy_credentials_from_remembered(remembered);
        }

        if let Some(device_path) = network.take_ip_refresh() {
            client.request_ip_configs(&device_path);
        }

        if network.state() != previous_state && network.connected() {
            network.refresh_data_plans_if_needed(client.as_ref());
            if !network.save_credentials {
                debug!("Erasing credentials of {}", network.name());
                network.erase_credentials();
            }
        }
    }

    fn rebuild_ordered_lists(&mut self) {
        self.wifi_order = ordered_paths(
            &self.wifi_order,
            &self.service_order,
            &self.networks,
            ConnectionType::Wifi,
        );
        self.cellular_order = ordered_paths(
            &self.cellular_order,
            &self.service_order,
            &self.networks,
            ConnectionType::Cellular,
        );
        self.virtual_order = ordered_paths(
            &self.virtual_order,
            &self.service_order,
            &self.networks,
            ConnectionType::Vpn,
        );
    }

    // ========================================
    // Devices
    // ========================================

    fn update_device_list(&mut self, paths: Vec<String>) {
        let listed: HashSet<&str> = paths.iter().map(String::as_str).collect();
        self.devices.retain(|path, device| {
            let keep = listed.contains(path.as_str());
            if !keep {
                info!("Removed device {} ({})", device.name, path);
            }
            keep
        });
        for path in &paths {
            self.client.request_device_properties(path);
        }
        self.device_order = paths;
        self.notify_manager_observers();
    }

    fn update_device_properties(&mut self, path: &str, properties: &PropertyDict) {
        let changed = match self.devices.get_mut(path) {
            Some(device) => {
                let changed = properties.iter().any(|(key, value)| {
                    PropertyIndex::from_key(key).is_some_and(|i| device.property(i) != Some(value))
                });
                device.parse_info(properties);
                changed
            }
            None => {
                if !self.device_order.iter().any(|p| p == path) {
                    debug!("Ignoring properties of unlisted device {}", path);
                    return;
                }
                let mut device = NetworkDevice::new(path);
                device.parse_info(properties);
                info!("Added device {} ({})", device.name, path);
                self.devices.insert(path.to_string(), device);
                self.notify_manager_observers();
                true
            }
        };
        if changed {
            self.notify_device_observers(path);
        }
    }

    fn update_device_property(&mut self, path: &str, key: &str, value: &PropertyValue) {
        let Some(device) = self.devices.get_mut(path) else {
            debug!("Property {} changed on unknown device {}", key, path);
            return;
        };
        if let Some(index) = PropertyIndex::from_key(key) {
            if device.property(index) == Some(value) {
                return;
            }
        }
        if device.update_status(key, value) {
            self.notify_device_observers(path);
        }
    }

    fn cellular_device_path(&self) -> Result<String> {
        self.cellular_device()
            .map(|device| device.device_path().to_string())
            .ok_or_else(|| Error::DeviceNotFound(keys::TYPE_CELLULAR.to_string()))
    }

    // ========================================
    // Remembered Networks
    // ========================================

    fn update_profiles(&mut self, profiles: Vec<String>) {
        let stale: Vec<String> = self
            .remembered
            .iter()
            .filter(|(_, network)| !profiles.contains(&network.profile_path))
            .map(|(entry, _)| entry.clone())
            .collect();
        for entry in stale {
            self.remove_remembered(&entry);
        }
        for profile in &profiles {
            self.client.request_profile_entries(profile);
        }
        self.profiles = profiles;
        self.rebuild_remembered_lists();
    }

    fn update_profile_entries(&mut self, profile_path: &str, entries: &[String]) {
        let stale: Vec<String> = self
            .remembered
            .iter()
            .filter(|(entry, network)| network.profile_path == profile_path && !entries.contains(entry))
            .map(|(entry, _)| entry.clone())
            .collect();
        for entry in stale {
            self.remove_remembered(&entry);
        }
        for entry in entries {
            self.client
                .request_remembered_service_properties(profile_path, entry);
        }
        self.rebuild_remembered_lists();
        self.notify_manager_observers();
    }

    fn update_remembered_network(
        &mut self,
        profile_path: &str,
        entry_path: &str,
        properties: Option<&PropertyDict>,
    ) {
        let Some(properties) = properties else {
            self.remove_remembered(entry_path);
            self.rebuild_remembered_lists();
            self.notify_manager_observers();
            return;
        };

        if !self.remembered.contains_key(entry_path) {
            let type_key = properties
                .get(keys::TYPE)
                .and_then(Value::as_str)
                .unwrap_or_default();
            let connection_type = ConnectionType::from_key(type_key);
            if !matches!(connection_type, ConnectionType::Wifi | ConnectionType::Vpn) {
                debug!("Not remembering {} entry {}", type_key, entry_path);
                return;
            }
            let Some(network) = Network::for_type(entry_path, connection_type) else {
                return;
            };
            self.remembered.insert(entry_path.to_string(), network);
            self.remembered_order.push(entry_path.to_string());
        }
        let Some(network) = self.remembered.get_mut(entry_path) else {
            return;
        };
        network.parse_info(properties);
        network.profile_path = profile_path.to_string();
        network.profile_type = ProfileType::for_profile_path(profile_path);

        let old_id = network.unique_id().to_string();
        network.calculate_unique_id();
        let new_id = network.unique_id().to_string();
        if old_id != new_id
            && self
                .remembered_unique_ids
                .get(&old_id)
                .is_some_and(|p| p == entry_path)
        {
            self.remembered_unique_ids.remove(&old_id);
        }
        self.remembered_unique_ids
            .insert(new_id.clone(), entry_path.to_string());

        if let Some(visible) = self
            .network_unique_ids
            .get(&new_id)
            .and_then(|path| self.networks.get_mut(path))
        {
            visible.copy_credentials_from_remembered(network);
        }

        self.rebuild_remembered_lists();
        self.notify_manager_observers();
    }

    fn remove_remembered(&mut self, entry_path: &str) {
        let Some(network) = self.remembered.remove(entry_path) else {
            return;
        };
        if self
            .remembered_unique_ids
            .get(network.unique_id())
            .is_some_and(|p| p == entry_path)
        {
            self.remembered_unique_ids.remove(network.unique_id());
        }
        self.remembered_order.retain(|p| p != entry_path);
        debug!("Dropped remembered network {}", network.name());
    }

    fn rebuild_remembered_lists(&mut self) {
        self.remembered_wifi_order = ordered_paths(
            &self.remembered_wifi_order,
            &self.remembered_order,
            &self.remembered,
            ConnectionType::Wifi,
        );
        self.remembered_virtual_order = ordered_paths(
            &self.remembered_virtual_order,
            &self.remembered_order,
            &self.remembered,
            ConnectionType::Vpn,
        );
    }

    // ========================================
    // IP Configs and Data Plans
    // ========================================

    fn update_ip_configs(&mut self, device_path: String, configs: &[PropertyDict]) {
        let configs: Vec<NetworkIpConfig> = configs
            .iter()
            .map(|config| NetworkIpConfig::from_properties(&device_path, config))
            .collect();
        let mut changed = Vec::new();
        for (path, network) in &mut self.networks {
            if network.device_path != device_path {
                continue;
            }
            let before = std::mem::take(&mut network.ip_address);
            network.apply_ip_configs(&configs);
            if network.ip_address != before {
                changed.push(path.clone());
            }
        }
        self.ip_configs.insert(device_path, configs);
        for path in changed {
            self.notify_network_observers(&path);
        }
    }

    /// Store new plans for a cellular service and reclassify its allowance.
    ///
    /// Plans with the same identifier are reported once.
    pub fn update_data_plans(&mut self, service_path: &str, plans: Vec<CellularDataPlan>) {
        let mut seen = HashSet::new();
        let plans: Vec<CellularDataPlan> = plans
            .into_iter()
            .filter(|plan| seen.insert(plan.unique_identifier()))
            .collect();
        let data_left = DataLeft::compute(significant_plan(&plans), &self.thresholds, Utc::now());
        self.data_plans.insert(service_path.to_string(), plans);

        let Some(network) = self.networks.get_mut(service_path) else {
            debug!("Data plans for unknown service {}", service_path);
            return;
        };
        let Some(cellular) = network.as_cellular_mut() else {
            warn!("Data plans for non-cellular service {}", service_path);
            return;
        };
        let changed = cellular.data_left != data_left;
        cellular.data_left = data_left;

        let observers = self.data_plan_observers.clone();
        if let (Some(network), Some(plans)) = (
            self.networks.get(service_path),
            self.data_plans.get(service_path),
        ) {
            for observer in &observers {
                observer.on_data_plans_changed(network, plans);
            }
        }
        if changed {
            self.notify_network_observers(service_path);
        }
    }

    pub fn data_plans(&self, service_path: &str) -> Option<&[CellularDataPlan]> {
        self.data_plans.get(service_path).map(Vec::as_slice)
    }

    /// The plan that best describes the current allowance of a service.
    pub fn significant_data_plan(&self, service_path: &str) -> Option<&CellularDataPlan> {
        self.data_plans
            .get(service_path)
            .and_then(|plans| significant_plan(plans))
    }

    /// Last known IP configurations of a device.
    pub fn ip_configs(&self, device_path: &str) -> &[NetworkIpConfig] {
        self.ip_configs
            .get(device_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn request_ip_configs(&self, device_path: &str) {
        self.client.request_ip_configs(device_path);
    }

    // ========================================
    // Connections
    // ========================================

    /// Connect to a visible network, resolving certificates first.
    pub fn connect_to_network(&mut self, service_path: &str) -> Result<ConnectOutcome> {
        let client = Rc::clone(&self.client);
        let network = self
            .networks
            .get_mut(service_path)
            .ok_or_else(|| Error::NetworkNotFound(service_path.to_string()))?;

        if network.requires_user_profile()
            && network.profile_path.is_empty()
            && !self.active_profile.is_empty()
            && self.active_profile != SHARED_PROFILE_PATH
        {
            network.set_profile_path(client.as_ref(), &self.active_profile);
        }

        match network.attempt_connection(client.as_ref(), &self.resolver) {
            AttemptOutcome::Ready => {
                self.start_connection(service_path);
                Ok(ConnectOutcome::Started)
            }
            AttemptOutcome::Enrolling(pending) => {
                info!("Waiting for certificate enrollment before connecting {}", service_path);
                self.pending_enrollments
                    .insert(service_path.to_string(), pending);
                Ok(ConnectOutcome::AwaitingEnrollment)
            }
        }
    }

    fn start_connection(&mut self, service_path: &str) {
        let Some(network) = self.networks.get_mut(service_path) else {
            return;
        };
        info!("Connecting to {}", network.name());
        network.set_connecting();
        self.client.connect_service(service_path);
        self.notify_network_observers(service_path);
    }

    /// Resume connections whose enrollment finished.
    ///
    /// Cancelled enrollments abandon their connection.
    pub fn process_pending_connections(&mut self) {
        let paths: Vec<String> = self.pending_enrollments.keys().cloned().collect();
        for path in paths {
            let status = match self.pending_enrollments.get_mut(&path) {
                Some(pending) => pending.poll(),
                None => continue,
            };
            match status {
                EnrollmentStatus::Pending => {}
                EnrollmentStatus::Cancelled => {
                    info!("Certificate enrollment for {} was cancelled", path);
                    self.pending_enrollments.remove(&path);
                }
                EnrollmentStatus::Completed => {
                    self.pending_enrollments.remove(&path);
                    self.resume_connection(&path);
                }
            }
        }
    }

    fn resume_connection(&mut self, service_path: &str) {
        let client = Rc::clone(&self.client);
        let resolver = self.resolver.clone().without_enrollment();
        let Some(network) = self.networks.get_mut(service_path) else {
            return;
        };
        // Without an enrollment handler the attempt is always ready.
        let _ = network.attempt_connection(client.as_ref(), &resolver);
        self.start_connection(service_path);
    }

    pub fn has_pending_enrollment(&self, service_path: &str) -> bool {
        self.pending_enrollments.contains_key(service_path)
    }

    pub fn disconnect_from_network(&mut self, service_path: &str) -> Result<()> {
        let network = self
            .networks
            .get(service_path)
            .ok_or_else(|| Error::NetworkNotFound(service_path.to_string()))?;
        info!("Disconnecting from {}", network.name());
        self.client.disconnect_service(service_path);
        Ok(())
    }

    /// Delete the profile entry of a remembered network.
    ///
    /// `path` is either a profile entry or a visible network with a
    /// remembered twin.
    pub fn forget_network(&mut self, path: &str) -> Result<()> {
        let entry_path = if self.remembered.contains_key(path) {
            path.to_string()
        } else {
            self.networks
                .get(path)
                .and_then(|network| self.remembered_unique_ids.get(network.unique_id()))
                .cloned()
                .ok_or_else(|| Error::NetworkNotFound(path.to_string()))?
        };
        let profile_path = self
            .remembered
            .get(&entry_path)
            .map(|network| network.profile_path.clone())
            .ok_or_else(|| Error::NetworkNotFound(entry_path.clone()))?;

        info!("Forgetting {} from {}", entry_path, profile_path);
        self.client.delete_profile_entry(&profile_path, &entry_path);
        self.remove_remembered(&entry_path);
        self.rebuild_remembered_lists();
        self.notify_manager_observers();
        Ok(())
    }

    /// Run `update` on a visible network with the manager client, then
    /// refresh indices and notify observers.
    pub fn update_network<R>(
        &mut self,
        service_path: &str,
        update: impl FnOnce(&mut Network, &dyn ManagerClient) -> R,
    ) -> Result<R> {
        let client = Rc::clone(&self.client);
        let network = self
            .networks
            .get_mut(service_path)
            .ok_or_else(|| Error::NetworkNotFound(service_path.to_string()))?;
        let previous_state = network.state();
        let result = update(network, client.as_ref());
        self.network_updated(service_path, previous_state);
        self.rebuild_ordered_lists();
        self.notify_network_observers(service_path);
        Ok(result)
    }

    // ========================================
    // Manager and Device Operations
    // ========================================

    /// Only radio technologies can scan.
    pub fn request_scan(&self, technology: ConnectionType) -> Result<()> {
        if !matches!(
            technology,
            ConnectionType::Wifi | ConnectionType::Wimax | ConnectionType::Cellular
        ) {
            return Err(Error::unsupported(technology_name(technology), "scan"));
        }
        debug!("Requesting {} scan", technology.as_key());
        self.client.request_scan(technology);
        Ok(())
    }

    /// VPN is not a device technology and cannot be switched on or off.
    pub fn enable_technology(&self, technology: ConnectionType, enable: bool) -> Result<()> {
        if matches!(technology, ConnectionType::Unknown | ConnectionType::Vpn) {
            return Err(Error::unsupported(
                technology_name(technology),
                if enable { "enable" } else { "disable" },
            ));
        }
        info!(
            "{} {}",
            if enable { "Enabling" } else { "Disabling" },
            technology.as_key()
        );
        self.client.enable_technology(technology, enable);
        Ok(())
    }

    pub fn set_offline_mode(&self, offline: bool) {
        self.client.set_offline_mode(offline);
    }

    pub fn set_cellular_data_roaming_allowed(&mut self, allowed: bool) -> Result<()> {
        let path = self.cellular_device_path()?;
        self.client
            .set_device_property(&path, keys::ALLOW_ROAMING, Value::Bool(allowed));
        if let Some(device) = self.devices.get_mut(&path) {
            device.data_roaming_allowed = allowed;
        }
        self.notify_device_observers(&path);
        Ok(())
    }

    pub fn enter_sim_pin(&self, pin: &str) -> Result<()> {
        self.sim_pin_operation(PinOperation::Enter {
            pin: SecretString::from(pin),
        })
    }

    pub fn change_sim_pin(&self, old_pin: &str, new_pin: &str) -> Result<()> {
        self.sim_pin_operation(PinOperation::Change {
            old_pin: SecretString::from(old_pin),
            new_pin: SecretString::from(new_pin),
        })
    }

    pub fn change_sim_pin_required(&self, require: bool, pin: &str) -> Result<()> {
        self.sim_pin_operation(PinOperation::Require {
            pin: SecretString::from(pin),
            require,
        })
    }

    pub fn unblock_sim_pin(&self, puk: &str, new_pin: &str) -> Result<()> {
        self.sim_pin_operation(PinOperation::Unblock {
            puk: SecretString::from(puk),
            new_pin: SecretString::from(new_pin),
        })
    }

    fn sim_pin_operation(&self, operation: PinOperation) -> Result<()> {
        let path = self.cellular_device_path()?;
        debug!("{} on {}", operation.method_name(), path);
        self.client.pin_operation(&path, operation);
        Ok(())
    }

    fn pin_operation_completed(&mut self, device_path: &str, result: PinOperationResult) {
        if result != PinOperationResult::Success {
            warn!("SIM PIN operation on {} failed: {:?}", device_path, result);
        }
        // Lock state and retries come back with the device properties.
        self.client.request_device_properties(device_path);

        let Some(device) = self.devices.get(device_path) else {
            return;
        };
        let observers = self
            .device_observers
            .get(device_path)
            .cloned()
            .unwrap_or_default();
        for observer in &observers {
            observer.on_pin_operation_completed(device, result);
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn offline_mode(&self) -> bool {
        self.offline_mode
    }

    pub fn technology_available(&self, technology: ConnectionType) -> bool {
        self.available_technologies.contains(&technology)
    }

    pub fn technology_enabled(&self, technology: ConnectionType) -> bool {
        self.enabled_technologies.contains(&technology)
    }

    pub fn technology_connected(&self, technology: ConnectionType) -> bool {
        self.connected_technologies.contains(&technology)
    }

    pub fn default_technology(&self) -> ConnectionType {
        self.default_technology
    }

    pub fn active_profile(&self) -> &str {
        &self.active_profile
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn portal_url(&self) -> &str {
        &self.portal_url
    }

    /// Devices in daemon order.
    pub fn devices(&self) -> impl Iterator<Item = &NetworkDevice> {
        self.device_order.iter().filter_map(|p| self.devices.get(p))
    }

    pub fn find_device(&self, device_path: &str) -> Option<&NetworkDevice> {
        self.devices.get(device_path)
    }

    pub fn cellular_device(&self) -> Option<&NetworkDevice> {
        self.devices().find(|device| device.is_cellular())
    }

    pub fn find_network_by_path(&self, service_path: &str) -> Option<&Network> {
        self.networks.get(service_path)
    }

    pub fn find_network_by_unique_id(&self, unique_id: &str) -> Option<&Network> {
        self.network_unique_ids
            .get(unique_id)
            .and_then(|path| self.networks.get(path))
    }

    pub fn find_remembered_network_by_path(&self, entry_path: &str) -> Option<&Network> {
        self.remembered.get(entry_path)
    }

    pub fn find_remembered_network_by_unique_id(&self, unique_id: &str) -> Option<&Network> {
        self.remembered_unique_ids
            .get(unique_id)
            .and_then(|entry| self.remembered.get(entry))
    }

    pub fn wifi_networks(&self) -> Vec<&Network> {
        resolve(&self.wifi_order, &self.networks)
    }

    pub fn cellular_networks(&self) -> Vec<&Network> {
        resolve(&self.cellular_order, &self.networks)
    }

    pub fn virtual_networks(&self) -> Vec<&Network> {
        resolve(&self.virtual_order, &self.networks)
    }

    pub fn remembered_wifi_networks(&self) -> Vec<&Network> {
        resolve(&self.remembered_wifi_order, &self.remembered)
    }

    pub fn remembered_virtual_networks(&self) -> Vec<&Network> {
        resolve(&self.remembered_virtual_order, &self.remembered)
    }

    /// The wired network, connected or not.
    pub fn ethernet_network(&self) -> Option<&Network> {
        self.active_network(ConnectionType::Ethernet).or_else(|| {
            self.service_order
                .iter()
                .filter_map(|p| self.networks.get(p))
                .find(|n| n.connection_type() == ConnectionType::Ethernet)
        })
    }

    pub fn wifi_network(&self) -> Option<&Network> {
        self.active_network(ConnectionType::Wifi)
    }

    pub fn cellular_network(&self) -> Option<&Network> {
        self.active_network(ConnectionType::Cellular)
    }

    pub fn virtual_network(&self) -> Option<&Network> {
        self.active_network(ConnectionType::Vpn)
    }

    /// First network of a type that is connecting or connected.
    fn active_network(&self, connection_type: ConnectionType) -> Option<&Network> {
        self.service_order
            .iter()
            .chain(self.retained.iter())
            .filter_map(|p| self.networks.get(p))
            .filter(|n| n.connection_type() == connection_type)
            .find(|n| n.connecting_or_connected())
    }

    pub fn connected(&self) -> bool {
        self.networks.values().any(Network::connected)
    }

    pub fn connecting(&self) -> bool {
        self.networks.values().any(Network::connecting)
    }

    // ========================================
    // Observer Registration
    // ========================================

    pub fn add_network_observer(&mut self, service_path: &str, observer: Rc<dyn NetworkObserver>) {
        self.network_observers
            .entry(service_path.to_string())
            .or_default()
            .push(observer);
    }

    pub fn remove_network_observer(&mut self, service_path: &str, observer: &Rc<dyn NetworkObserver>) {
        if let Some(observers) = self.network_observers.get_mut(service_path) {
            remove_observer(observers, observer);
            if observers.is_empty() {
                self.network_observers.remove(service_path);
            }
        }
    }

    /// Observe every network of one type.
    pub fn add_network_type_observer(
        &mut self,
        connection_type: ConnectionType,
        observer: Rc<dyn NetworkObserver>,
    ) {
        self.network_type_observers
            .entry(connection_type)
            .or_default()
            .push(observer);
    }

    pub fn remove_network_type_observer(
        &mut self,
        connection_type: ConnectionType,
        observer: &Rc<dyn NetworkObserver>,
    ) {
        if let Some(observers) = self.network_type_observers.get_mut(&connection_type) {
            remove_observer(observers, observer);
        }
    }

    pub fn add_device_observer(&mut self, device_path: &str, observer: Rc<dyn DeviceObserver>) {
        self.device_observers
            .entry(device_path.to_string())
            .or_default()
            .push(observer);
    }

    pub fn remove_device_observer(&mut self, device_path: &str, observer: &Rc<dyn DeviceObserver>) {
        if let Some(observers) = self.device_observers.get_mut(device_path) {
            remove_observer(observers, observer);
        }
    }

    pub fn add_network_manager_observer(&mut self, observer: Rc<dyn NetworkManagerObserver>) {
        self.manager_observers.push(observer);
    }

    pub fn remove_network_manager_observer(&mut self, observer: &Rc<dyn NetworkManagerObserver>) {
        remove_observer(&mut self.manager_observers, observer);
    }

    pub fn add_data_plan_observer(&mut self, observer: Rc<dyn DataPlanObserver>) {
        self.data_plan_observers.push(observer);
    }

    pub fn remove_data_plan_observer(&mut self, observer: &Rc<dyn DataPlanObserver>) {
        remove_observer(&mut self.data_plan_observers, observer);
    }

    // ========================================
    // Notification
    // ========================================

    fn notify_network_observers(&mut self, service_path: &str) {
        let Some(network) = self.networks.get(service_path) else {
            return;
        };
        let mut observers = self
            .network_observers
            .get(service_path)
            .cloned()
            .unwrap_or_default();
        if let Some(type_observers) = self.network_type_observers.get(&network.connection_type()) {
            observers.extend(type_observers.iter().cloned());
        }
        for observer in &observers {
            observer.on_network_changed(network);
        }
        if let Some(network) = self.networks.get_mut(service_path) {
            network.notify_failure = false;
        }
    }

    fn notify_device_observers(&self, device_path: &str) {
        let Some(device) = self.devices.get(device_path) else {
            return;
        };
        let observers = self
            .device_observers
            .get(device_path)
            .cloned()
            .unwrap_or_default();
        for observer in &observers {
            observer.on_device_changed(device);
        }
    }

    fn notify_manager_observers(&self) {
        let observers = self.manager_observers.clone();
        for observer in &observers {
            observer.on_network_manager_changed(self);
        }
    }
}

/// Whether applying `properties` would change any mirrored property.
fn properties_differ(network: &Network, properties: &PropertyDict) -> bool {
    properties.iter().any(|(key, value)| {
        PropertyIndex::from_key(key).is_some_and(|index| network.property(index) != Some(value))
    })
}

/// Paths of one type, most preferred first.
///
/// Starts from the previous order and appends new paths in daemon order;
/// the sort is stable, so ties keep their relative position.
fn ordered_paths(
    previous: &[String],
    listed: &[String],
    networks: &HashMap<String, Network>,
    connection_type: ConnectionType,
) -> Vec<String> {
    let of_type = |path: &String| {
        networks
            .get(path)
            .is_some_and(|n| n.connection_type() == connection_type)
    };
    let mut seen = HashSet::new();
    let mut paths: Vec<String> = previous
        .iter()
        .chain(listed.iter())
        .filter(|path| of_type(path) && seen.insert(path.as_str()))
        .cloned()
        .collect();
    paths.sort_by_key(|path| {
        Reverse(
            networks
                .get(path)
                .map(|n| (n.is_active, n.priority, n.strength()))
                .unwrap_or_default(),
        )
    });
    paths
}

fn resolve<'a>(paths: &[String], networks: &'a HashMap<String, Network>) -> Vec<&'a Network> {
    paths.iter().filter_map(|p| networks.get(p)).collect()
}

fn technology_name(technology: ConnectionType) -> &'static str {
    match technology {
        ConnectionType::Unknown => "unknown",
        other => other.as_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::stub::{ManagerCommand, StubManagerClient};
    use crate::models::DataPlanType;
    use crate::services::certificate::{
        EnrollmentHandler, EnrollmentTicket, InMemoryCertificateStore, IssuerSubjectPattern,
        StoredCertificate,
    };
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::sync::{Arc, Mutex};

    fn dict(value: Value) -> PropertyDict {
        match value {
            Value::Object(map) => map,
            _ => PropertyDict::new(),
        }
    }

    fn library_with(resolver: CertificateResolver) -> (NetworkLibrary, Rc<StubManagerClient>) {
        let client = Rc::new(StubManagerClient::new());
        let library = NetworkLibrary::new(client.clone(), resolver, DataPlanThresholds::default());
        (library, client)
    }

    fn library() -> (NetworkLibrary, Rc<StubManagerClient>) {
        let store = Arc::new(InMemoryCertificateStore::default());
        library_with(CertificateResolver::new(store))
    }

    fn add_service(library: &mut NetworkLibrary, path: &str, properties: Value) {
        library.handle_event(ManagerEvent::ServiceProperties {
            path: path.to_string(),
            properties: Some(dict(properties)),
        });
    }

    fn list_services(library: &mut NetworkLibrary, paths: &[&str]) {
        library.handle_event(ManagerEvent::ServiceListChanged(
            paths.iter().map(|p| p.to_string()).collect(),
        ));
    }

    #[derive(Default)]
    struct CountingObserver {
        count: Cell<usize>,
        last_failure: Cell<bool>,
    }

    impl NetworkObserver for CountingObserver {
        fn on_network_changed(&self, network: &Network) {
            self.count.set(self.count.get() + 1);
            self.last_failure.set(network.notify_failure);
        }
    }

    #[test]
    fn test_hex_ssid_network_is_indexed_by_unique_id() {
        let (mut library, client) = library();
        list_services(&mut library, &["/service/wep"]);
        assert!(client.commands().contains(&ManagerCommand::RequestServiceProperties {
            path: "/service/wep".into()
        }));

        add_service(
            &mut library,
            "/service/wep",
            json!({"Type": "wifi", "Security": "wep", "WiFi.HexSSID": "48656c6c6f"}),
        );
        let network = library.find_network_by_unique_id("WEP|Hello").unwrap();
        assert_eq!(network.name(), "Hello");
        assert_eq!(library.wifi_networks().len(), 1);
    }

    #[test]
    fn test_unlisted_properties_are_ignored() {
        let (mut library, _client) = library();
        add_service(&mut library, "/service/stray", json!({"Type": "wifi", "Name": "Stray"}));
        assert!(library.find_network_by_path("/service/stray").is_none());
    }

    #[test]
    fn test_relisting_keeps_network_and_refetches() {
        let (mut library, client) = library();
        list_services(&mut library, &["/service/eth0"]);
        add_service(&mut library, "/service/eth0", json!({"Type": "ethernet", "Name": "Wired"}));
        library.connect_to_network("/service/eth0").unwrap();

        client.take_commands();
        list_services(&mut library, &["/service/eth0"]);

        let network = library.find_network_by_path("/service/eth0").unwrap();
        assert_eq!(network.state(), ConnectionState::Association);
        assert!(network.connection_started);
        assert_eq!(
            client.commands(),
            vec![ManagerCommand::RequestServiceProperties {
                path: "/service/eth0".into()
            }]
        );
    }

    #[test]
    fn test_removed_network_is_dropped() {
        let (mut library, _client) = library();
        list_services(&mut library, &["/service/a", "/service/b"]);
        add_service(&mut library, "/service/a", json!({"Type": "wifi", "Name": "A", "Security": "none"}));
        add_service(&mut library, "/service/b", json!({"Type": "wifi", "Name": "B", "Security": "none"}));

        list_services(&mut library, &["/service/b"]);
        assert!(library.find_network_by_path("/service/a").is_none());
        assert!(library.find_network_by_unique_id("None|A").is_none());
        assert_eq!(library.wifi_networks().len(), 1);
    }

    #[test]
    fn test_removed_connecting_network_is_demoted_once() {
        let (mut library, _client) = library();
        list_services(&mut library, &["/service/a"]);
        add_service(&mut library, "/service/a", json!({"Type": "wifi", "Name": "A", "Security": "none"}));
        library.connect_to_network("/service/a").unwrap();

        let observer = Rc::new(CountingObserver::default());
        library.add_network_observer("/service/a", observer.clone());

        list_services(&mut library, &[]);
        let network = library.find_network_by_path("/service/a").unwrap();
        assert!(network.failed());
        assert_ne!(network.error, ConnectionError::NoError);
        assert_eq!(observer.count.get(), 1);
        assert!(observer.last_failure.get());
        assert!(!network.notify_failure);

        list_services(&mut library, &[]);
        assert!(library.find_network_by_path("/service/a").is_none());
    }

    #[test]
    fn test_ordering_is_stable_by_preference() {
        let (mut library, _client) = library();
        let paths = ["/service/1", "/service/2", "/service/3", "/service/4"];
        list_services(&mut library, &paths);
        add_service(&mut library, paths[0], json!({"Type": "wifi", "Name": "one", "Strength": 40}));
        add_service(&mut library, paths[1], json!({"Type": "wifi", "Name": "two", "Strength": 90}));
        add_service(&mut library, paths[2], json!({"Type": "wifi", "Name": "three", "Strength": 40}));
        add_service(
            &mut library,
            paths[3],
            json!({"Type": "wifi", "Name": "four", "Strength": 10, "IsActive": true}),
        );

        let names: Vec<&str> = library.wifi_networks().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["four", "two", "one", "three"]);

        // Equal keys keep their previous relative order.
        library.handle_event(ManagerEvent::ServicePropertyChanged {
            path: paths[1].into(),
            key: keys::STRENGTH.into(),
            value: json!(40),
        });
        let names: Vec<&str> = library.wifi_networks().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["four", "two", "one", "three"]);
    }

    #[test]
    fn test_unchanged_state_does_not_notify() {
        let (mut library, client) = library();
        list_services(&mut library, &["/service/eth0"]);
        add_service(
            &mut library,
            "/service/eth0",
            json!({"Type": "ethernet", "Name": "Wired", "Device": "/device/eth0", "State": "idle"}),
        );
        let observer = Rc::new(CountingObserver::default());
        library.add_network_observer("/service/eth0", observer.clone());
        client.take_commands();

        let online = ManagerEvent::ServicePropertyChanged {
            path: "/service/eth0".into(),
            key: keys::STATE.into(),
            value: json!("online"),
        };
        library.handle_event(online.clone());
        library.handle_event(online);

        assert_eq!(observer.count.get(), 1);
        let ip_requests = client
            .commands()
            .into_iter()
            .filter(|c| matches!(c, ManagerCommand::RequestIpConfigs { .. }))
            .count();
        assert_eq!(ip_requests, 1);
    }

    #[test]
    fn test_ip_configs_fill_address() {
        let (mut library, _client) = library();
        list_services(&mut library, &["/service/eth0"]);
        add_service(
            &mut library,
            "/service/eth0",
            json!({"Type": "ethernet", "Name": "Wired", "Device": "/device/eth0", "State": "online"}),
        );
        library.handle_event(ManagerEvent::IpConfigs {
            device_path: "/device/eth0".into(),
            configs: vec![dict(json!({"Address": "10.0.0.5", "Netmask": "255.255.255.0"}))],
        });

        let network = library.ethernet_network().unwrap();
        assert_eq!(network.ip_address, "10.0.0.5");
        assert_eq!(library.ip_configs("/device/eth0")[0].prefix_length(), 24);
        assert!(library.ip_configs("/device/none").is_empty());
    }

    #[test]
    fn test_cellular_failure_after_ready_notifies() {
        let (mut library, _client) = library();
        list_services(&mut library, &["/service/cell"]);
        add_service(
            &mut library,
            "/service/cell",
            json!({"Type": "cellular", "Name": "Carrier", "State": "ready"}),
        );
        let observer = Rc::new(CountingObserver::default());
        library.add_network_type_observer(ConnectionType::Cellular, observer.clone());

        library.handle_event(ManagerEvent::ServicePropertyChanged {
            path: "/service/cell".into(),
            key: keys::STATE.into(),
            value: json!("failure"),
        });
        let network = library.find_network_by_path("/service/cell").unwrap();
        assert_eq!(network.error, ConnectionError::Unknown);
        assert!(observer.last_failure.get());
        assert!(!network.notify_failure);
    }

    #[test]
    fn test_connect_unknown_network_fails() {
        let (mut library, client) = library();
        let err = library.connect_to_network("/service/missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(client.writes().is_empty());
    }

    #[test]
    fn test_connect_sends_connect() {
        let (mut library, client) = library();
        list_services(&mut library, &["/service/home"]);
        add_service(
            &mut library,
            "/service/home",
            json!({"Type": "wifi", "Name": "Home", "Security": "psk"}),
        );
        assert_eq!(
            library.connect_to_network("/service/home").unwrap(),
            ConnectOutcome::Started
        );
        assert!(client.writes().contains(&ManagerCommand::ConnectService {
            path: "/service/home".into()
        }));
        assert_eq!(library.wifi_network().unwrap().name(), "Home");
        assert!(library.connecting());
    }

    #[derive(Default)]
    struct RecordingEnrollment {
        tickets: Mutex<Vec<EnrollmentTicket>>,
    }

    impl EnrollmentHandler for RecordingEnrollment {
        fn enroll(&self, _uris: &[String], ticket: EnrollmentTicket) {
            self.tickets.lock().unwrap().push(ticket);
        }
    }

    fn add_pattern_network(library: &mut NetworkLibrary) {
        list_services(library, &["/service/corp"]);
        add_service(
            library,
            "/service/corp",
            json!({
                "Type": "wifi",
                "Name": "Corp",
                "Security": "802_1x",
                "EAP.EAP": "TLS",
                "UIData": {
                    "certificate_type": "pattern",
                    "certificate_pattern": {
                        "Issuer": {"CommonName": "Corp CA"},
                        "EnrollmentURI": ["https://enroll.example.com"]
                    }
                }
            }),
        );
    }

    #[test]
    fn test_enrollment_resumes_connection() {
        let store = Arc::new(InMemoryCertificateStore::default());
        let handler = Arc::new(RecordingEnrollment::default());
        let resolver = CertificateResolver::new(store.clone()).with_enrollment_handler(handler.clone());
        let (mut library, client) = library_with(resolver);
        add_pattern_network(&mut library);

        assert_eq!(
            library.connect_to_network("/service/corp").unwrap(),
            ConnectOutcome::AwaitingEnrollment
        );
        assert!(library.has_pending_enrollment("/service/corp"));
        library.process_pending_connections();
        assert!(!client.writes().iter().any(|c| matches!(c, ManagerCommand::ConnectService { .. })));

        store.add(StoredCertificate {
            pkcs11_id: "slot1-key".into(),
            issuer: IssuerSubjectPattern {
                common_name: "Corp CA".into(),
                ..IssuerSubjectPattern::default()
            },
            ..StoredCertificate::default()
        });
        handler.tickets.lock().unwrap().pop().unwrap().complete();
        library.process_pending_connections();

        let writes = client.writes();
        assert!(writes.contains(&ManagerCommand::SetServiceProperty {
            path: "/service/corp".into(),
            key: keys::EAP_CERT_ID.into(),
            value: json!("slot1-key"),
        }));
        assert!(writes.contains(&ManagerCommand::ConnectService {
            path: "/service/corp".into()
        }));
        assert!(!library.has_pending_enrollment("/service/corp"));
    }

    #[test]
    fn test_cancelled_enrollment_abandons_connection() {
        let store = Arc::new(InMemoryCertificateStore::default());
        let handler = Arc::new(RecordingEnrollment::default());
        let resolver = CertificateResolver::new(store).with_enrollment_handler(handler.clone());
        let (mut library, client) = library_with(resolver);
        add_pattern_network(&mut library);

        library.connect_to_network("/service/corp").unwrap();
        drop(handler.tickets.lock().unwrap().pop());
        library.process_pending_connections();

        assert!(!library.has_pending_enrollment("/service/corp"));
        assert!(!client.writes().iter().any(|c| matches!(c, ManagerCommand::ConnectService { .. })));
    }

    #[test]
    fn test_removed_network_cancels_enrollment() {
        let store = Arc::new(InMemoryCertificateStore::default());
        let handler = Arc::new(RecordingEnrollment::default());
        let resolver = CertificateResolver::new(store).with_enrollment_handler(handler.clone());
        let (mut library, _client) = library_with(resolver);
        add_pattern_network(&mut library);

        library.connect_to_network("/service/corp").unwrap();
        list_services(&mut library, &[]);
        let tickets = handler.tickets.lock().unwrap();
        assert!(tickets[0].is_cancelled());
    }

    fn load_remembered_vpn(library: &mut NetworkLibrary) {
        library.handle_event(ManagerEvent::ManagerPropertyChanged {
            key: keys::PROFILES.into(),
            value: json!(["/profile/user"]),
        });
        library.handle_event(ManagerEvent::ProfileEntries {
            profile_path: "/profile/user".into(),
            entries: vec!["vpn_corp".into()],
        });
        library.handle_event(ManagerEvent::RememberedServiceProperties {
            profile_path: "/profile/user".into(),
            entry_path: "vpn_corp".into(),
            properties: Some(dict(json!({
                "Type": "vpn",
                "Name": "Corp VPN",
                "Provider": {"Type": "openvpn", "Host": "vpn.example.com", "OpenVPN.User": "alice"}
            }))),
        });
    }

    #[test]
    fn test_remembered_vpn_credentials_are_copied() {
        let (mut library, client) = library();
        load_remembered_vpn(&mut library);
        assert!(client.commands().contains(&ManagerCommand::RequestRememberedServiceProperties {
            profile_path: "/profile/user".into(),
            entry_path: "vpn_corp".into(),
        }));
        assert_eq!(library.remembered_virtual_networks().len(), 1);

        list_services(&mut library, &["/service/vpn"]);
        add_service(
            &mut library,
            "/service/vpn",
            json!({"Type": "vpn", "Name": "Corp VPN", "Provider": {"Type": "openvpn", "Host": "vpn.example.com"}}),
        );
        let vpn = library.find_network_by_path("/service/vpn").unwrap();
        assert_eq!(vpn.as_vpn().unwrap().username, "alice");
        assert!(library
            .find_remembered_network_by_unique_id(vpn.unique_id())
            .is_some());
    }

    #[test]
    fn test_forget_network_deletes_entry() {
        let (mut library, client) = library();
        load_remembered_vpn(&mut library);
        list_services(&mut library, &["/service/vpn"]);
        add_service(
            &mut library,
            "/service/vpn",
            json!({"Type": "vpn", "Provider": {"Type": "openvpn", "Host": "vpn.example.com"}}),
        );

        library.forget_network("/service/vpn").unwrap();
        assert!(client.writes().contains(&ManagerCommand::DeleteProfileEntry {
            profile_path: "/profile/user".into(),
            entry_path: "vpn_corp".into(),
        }));
        assert!(library.remembered_virtual_networks().is_empty());
        assert!(library.forget_network("/service/vpn").is_err());
    }

    #[test]
    fn test_profile_entries_drop_stale_remembered() {
        let (mut library, _client) = library();
        load_remembered_vpn(&mut library);
        library.handle_event(ManagerEvent::ProfileEntries {
            profile_path: "/profile/user".into(),
            entries: vec![],
        });
        assert!(library.find_remembered_network_by_path("vpn_corp").is_none());
    }

    struct PlanObserver {
        plans: RefCell<Vec<usize>>,
    }

    impl DataPlanObserver for PlanObserver {
        fn on_data_plans_changed(&self, _network: &Network, plans: &[CellularDataPlan]) {
            self.plans.borrow_mut().push(plans.len());
        }
    }

    #[test]
    fn test_data_plans_are_deduplicated() {
        let (mut library, _client) = library();
        list_services(&mut library, &["/service/cell"]);
        add_service(&mut library, "/service/cell", json!({"Type": "cellular", "Name": "Carrier"}));
        let observer = Rc::new(PlanObserver {
            plans: RefCell::new(Vec::new()),
        });
        let as_dyn: Rc<dyn DataPlanObserver> = observer.clone();
        library.add_data_plan_observer(as_dyn.clone());

        let plan = CellularDataPlan {
            plan_name: "Daily".into(),
            plan_type: DataPlanType::MeteredPaid,
            plan_end_time: Utc::now() + chrono::Duration::days(1),
            plan_data_bytes: 100 * 1024 * 1024,
            data_bytes_used: 90 * 1024 * 1024,
            ..CellularDataPlan::default()
        };
        let mut updated = plan.clone();
        updated.data_bytes_used += 1;
        library.handle_event(ManagerEvent::DataPlans {
            service_path: "/service/cell".into(),
            plans: vec![plan, updated],
        });

        assert_eq!(library.data_plans("/service/cell").unwrap().len(), 1);
        assert_eq!(*observer.plans.borrow(), vec![1]);
        let network = library.find_network_by_path("/service/cell").unwrap();
        assert_eq!(network.as_cellular().unwrap().data_left, DataLeft::VeryLow);
        assert_eq!(
            library.significant_data_plan("/service/cell").unwrap().plan_name,
            "Daily"
        );

        library.remove_data_plan_observer(&as_dyn);
        library.update_data_plans("/service/cell", Vec::new());
        assert_eq!(observer.plans.borrow().len(), 1);
        let network = library.find_network_by_path("/service/cell").unwrap();
        assert_eq!(network.as_cellular().unwrap().data_left, DataLeft::None);
    }

    fn add_modem(library: &mut NetworkLibrary) {
        library.handle_event(ManagerEvent::DeviceListChanged(vec!["/device/modem".into()]));
        library.handle_event(ManagerEvent::DeviceProperties {
            path: "/device/modem".into(),
            properties: Some(dict(json!({"Type": "cellular", "Name": "modem0"}))),
        });
    }

    #[test]
    fn test_sim_pin_requires_cellular_device() {
        let (mut library, client) = library();
        assert!(library.enter_sim_pin("1234").is_err());

        add_modem(&mut library);
        library.enter_sim_pin("1234").unwrap();
        assert!(client.writes().contains(&ManagerCommand::PinOperation {
            device_path: "/device/modem".into(),
            operation: PinOperation::Enter {
                pin: SecretString::from("1234")
            },
        }));
    }

    #[test]
    fn test_technology_requests_reject_unsupported_types() {
        let (library, client) = library();
        library.request_scan(ConnectionType::Wifi).unwrap();
        library.enable_technology(ConnectionType::Cellular, false).unwrap();

        let err = library.request_scan(ConnectionType::Ethernet).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
        assert_eq!(err.to_string(), "Operation not supported for ethernet: scan");
        let err = library.enable_technology(ConnectionType::Vpn, true).unwrap_err();
        assert_eq!(err.to_string(), "Operation not supported for vpn: enable");
        assert!(library.enable_technology(ConnectionType::Unknown, true).is_err());

        assert_eq!(
            client.writes(),
            vec![
                ManagerCommand::RequestScan {
                    technology: ConnectionType::Wifi
                },
                ManagerCommand::EnableTechnology {
                    technology: ConnectionType::Cellular,
                    enable: false
                },
            ]
        );
    }

    #[test]
    fn test_data_roaming_is_written_to_device() {
        let (mut library, client) = library();
        add_modem(&mut library);
        library.set_cellular_data_roaming_allowed(true).unwrap();
        assert!(client.writes().contains(&ManagerCommand::SetDeviceProperty {
            path: "/device/modem".into(),
            key: keys::ALLOW_ROAMING.into(),
            value: json!(true),
        }));
        assert!(library.cellular_device().unwrap().data_roaming_allowed);
    }

    struct ManagerCounter(Cell<usize>);

    impl NetworkManagerObserver for ManagerCounter {
        fn on_network_manager_changed(&self, _library: &NetworkLibrary) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_manager_observer_removal() {
        let (mut library, _client) = library();
        let counter = Rc::new(ManagerCounter(Cell::new(0)));
        let observer: Rc<dyn NetworkManagerObserver> = counter.clone();
        library.add_network_manager_observer(observer.clone());

        library.handle_event(ManagerEvent::ManagerPropertyChanged {
            key: keys::OFFLINE_MODE.into(),
            value: json!(true),
        });
        assert!(library.offline_mode());
        assert_eq!(counter.0.get(), 1);

        library.remove_network_manager_observer(&observer);
        list_services(&mut library, &[]);
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn test_fixture_populates_library() {
        let (mut library, _client) = library();
        for event in StubManagerClient::fixture_events() {
            library.handle_event(event);
        }
        assert_eq!(library.devices().count(), 2);
        assert!(library.technology_enabled(ConnectionType::Wifi));
        assert_eq!(library.ethernet_network().unwrap().ip_address, "192.168.122.15");
        let names: Vec<&str> = library.wifi_networks().iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["Home", "Café"]);
    }
}
