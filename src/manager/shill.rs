// Network State - Shill D-Bus Client
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Async D-Bus client for the shill (flimflam) connection manager.
//!
//! Commands are issued on spawned tokio tasks. Replies and signals are
//! converted to [`ManagerEvent`]s and queued on an mpsc channel; this client
//! never touches library state directly.

use std::collections::HashMap;
use std::future::Future;

use futures::StreamExt;
use serde_json::{Map, Number};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, MatchRule, Message, MessageStream};

use super::{ManagerClient, ManagerEvent, PinOperation, PinOperationResult};
use crate::models::network::ConnectionType;
use crate::models::{
    CellularDataPlan, Error, ManagerConfig, PropertyDict, PropertyValue, Result,
};
use crate::parser::keys;

const DBUS_NAME: &str = "org.freedesktop.DBus";
const DBUS_PATH: &str = "/org/freedesktop/DBus";

type DbusDict = HashMap<String, OwnedValue>;

/// D-Bus client for the connection manager daemon.
#[derive(Clone)]
pub struct ShillClient {
    connection: Connection,
    service: String,
    manager_path: String,
    events: mpsc::Sender<ManagerEvent>,
}

impl ShillClient {
    /// Connect to the system bus and start watching for signals.
    pub async fn connect(config: &ManagerConfig) -> Result<(Self, mpsc::Receiver<ManagerEvent>)> {
        let connection = match Connection::system().await {
            Ok(conn) => {
                debug!("Connected to system D-Bus");
                conn
            }
            Err(e) => {
                error!("Failed to connect to system D-Bus: {}", e);
                return Err(Error::DbusConnectionFailed(e.to_string()));
            }
        };

        let running: bool = connection
            .call_method(Some(DBUS_NAME), DBUS_PATH, Some(DBUS_NAME), "NameHasOwner", &(config.service_name.as_str(),))
            .await?
            .body()
            .deserialize()?;
        if !running {
            return Err(Error::ManagerNotRunning);
        }

        let (events, receiver) = mpsc::channel(config.event_channel_capacity.max(1));
        let client = Self {
            connection,
            service: config.service_name.clone(),
            manager_path: config.manager_path.clone(),
            events,
        };
        client.start_signal_watchers().await?;
        info!("Watching connection manager {}", client.service);
        Ok((client, receiver))
    }

    async fn start_signal_watchers(&self) -> Result<()> {
        let dbus_proxy = zbus::fdo::DBusProxy::new(&self.connection).await?;

        let property_rule = MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .member(keys::PROPERTY_CHANGED_SIGNAL)?
            .build();
        dbus_proxy.add_match_rule(property_rule).await?;

        let plans_rule = MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .interface(keys::CASHEW_INTERFACE)?
            .member(keys::DATA_PLANS_UPDATE_SIGNAL)?
            .build();
        dbus_proxy.add_match_rule(plans_rule).await?;

        let mut stream = MessageStream::from(self.connection.clone());
        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                let message = match message {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Error receiving D-Bus message: {}", e);
                        continue;
                    }
                };
                let Some(event) = signal_event(&message) else {
                    continue;
                };
                if events.send(event).await.is_err() {
                    debug!("Event receiver closed, stopping signal watcher");
                    break;
                }
            }
        });
        Ok(())
    }

    /// Run `task` in the background, logging a failure.
    fn spawn<F>(&self, what: String, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = task.await {
                warn!("{} failed: {}", what, e);
            }
        });
    }

    /// Call a method whose reply carries nothing of interest.
    fn spawn_call<B>(&self, path: &str, interface: &'static str, method: &'static str, body: B)
    where
        B: serde::Serialize + zbus::zvariant::DynamicType + Send + Sync + 'static,
    {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let path = path.to_string();
        self.spawn(format!("{} on {}", method, path), async move {
            connection
                .call_method(Some(service.as_str()), path.as_str(), Some(interface), method, &body)
                .await?;
            Ok(())
        });
    }

    fn spawn_get_properties<F>(&self, path: &str, interface: &'static str, make_event: F)
    where
        F: FnOnce(Option<PropertyDict>) -> ManagerEvent + Send + 'static,
    {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let events = self.events.clone();
        let path = path.to_string();
        self.spawn(format!("GetProperties on {}", path), async move {
            let properties = match get_properties(&connection, &service, &path, interface).await {
                Ok(properties) => Some(properties),
                Err(e) => {
                    debug!("Properties of {} unavailable: {}", path, e);
                    None
                }
            };
            send(&events, make_event(properties)).await
        });
    }
}

impl ManagerClient for ShillClient {
    fn request_manager_properties(&self) {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let manager_path = self.manager_path.clone();
        let events = self.events.clone();
        self.spawn("Manager GetProperties".to_string(), async move {
            let properties = get_properties(&connection, &service, &manager_path, keys::MANAGER_INTERFACE).await?;
            send(&events, ManagerEvent::ManagerProperties(properties)).await
        });
    }

    fn request_service_properties(&self, service_path: &str) {
        let path = service_path.to_string();
        self.spawn_get_properties(service_path, keys::SERVICE_INTERFACE, move |properties| {
            ManagerEvent::ServiceProperties { path, properties }
        });
    }

    fn request_device_properties(&self, device_path: &str) {
        let path = device_path.to_string();
        self.spawn_get_properties(device_path, keys::DEVICE_INTERFACE, move |properties| {
            ManagerEvent::DeviceProperties { path, properties }
        });
    }

    fn request_profile_entries(&self, profile_path: &str) {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let events = self.events.clone();
        let profile_path = profile_path.to_string();
        self.spawn(format!("Entries of {}", profile_path), async move {
            let properties = get_properties(&connection, &service, &profile_path, keys::PROFILE_INTERFACE).await?;
            let entries = properties
                .get(keys::ENTRIES)
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            send(&events, ManagerEvent::ProfileEntries { profile_path, entries }).await
        });
    }

    fn request_remembered_service_properties(&self, profile_path: &str, entry_path: &str) {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let events = self.events.clone();
        let profile_path = profile_path.to_string();
        let entry_path = entry_path.to_string();
        self.spawn(format!("GetEntry {}", entry_path), async move {
            let reply = connection
                .call_method(
                    Some(service.as_str()),
                    profile_path.as_str(),
                    Some(keys::PROFILE_INTERFACE),
                    "GetEntry",
                    &(entry_path.as_str(),),
                )
                .await;
            let properties = match reply {
                Ok(reply) => Some(to_property_dict(&reply.body().deserialize::<DbusDict>()?)),
                Err(e) => {
                    debug!("Profile entry {} unavailable: {}", entry_path, e);
                    None
                }
            };
            send(
                &events,
                ManagerEvent::RememberedServiceProperties {
                    profile_path,
                    entry_path,
                    properties,
                },
            )
            .await
        });
    }

    fn request_ip_configs(&self, device_path: &str) {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let events = self.events.clone();
        let device_path = device_path.to_string();
        self.spawn(format!("IP configs of {}", device_path), async move {
            let device = get_properties(&connection, &service, &device_path, keys::DEVICE_INTERFACE).await?;
            let paths: Vec<String> = device
                .get(keys::IP_CONFIGS)
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            let mut configs = Vec::with_capacity(paths.len());
            for path in paths {
                match get_properties(&connection, &service, &path, keys::IPCONFIG_INTERFACE).await {
                    Ok(config) => configs.push(config),
                    Err(e) => debug!("IPConfig {} unavailable: {}", path, e),
                }
            }
            send(&events, ManagerEvent::IpConfigs { device_path, configs }).await
        });
    }

    fn request_data_plan_update(&self, service_path: &str) {
        let connection = self.connection.clone();
        let service_path = service_path.to_string();
        self.spawn(format!("Data plan update for {}", service_path), async move {
            connection
                .call_method(
                    Some(keys::CASHEW_SERVICE),
                    keys::CASHEW_PATH,
                    Some(keys::CASHEW_INTERFACE),
                    "RequestDataPlansUpdate",
                    &(service_path.as_str(),),
                )
                .await?;
            Ok(())
        });
    }

    fn set_service_property(&self, service_path: &str, key: &str, value: PropertyValue) {
        let body = (key.to_string(), to_dbus_value(&value));
        self.spawn_call(service_path, keys::SERVICE_INTERFACE, "SetProperty", body);
    }

    fn clear_service_property(&self, service_path: &str, key: &str) {
        self.spawn_call(service_path, keys::SERVICE_INTERFACE, "ClearProperty", (key.to_string(),));
    }

    fn connect_service(&self, service_path: &str) {
        info!("Connecting service {}", service_path);
        self.spawn_call(service_path, keys::SERVICE_INTERFACE, "Connect", ());
    }

    fn disconnect_service(&self, service_path: &str) {
        info!("Disconnecting service {}", service_path);
        self.spawn_call(service_path, keys::SERVICE_INTERFACE, "Disconnect", ());
    }

    fn delete_profile_entry(&self, profile_path: &str, entry_path: &str) {
        self.spawn_call(profile_path, keys::PROFILE_INTERFACE, "DeleteEntry", (entry_path.to_string(),));
    }

    fn activate_cellular_modem(&self, service_path: &str, carrier: &str) -> bool {
        if self.events.is_closed() {
            return false;
        }
        self.spawn_call(
            service_path,
            keys::SERVICE_INTERFACE,
            "ActivateCellularModem",
            (carrier.to_string(),),
        );
        true
    }

    fn request_scan(&self, technology: ConnectionType) {
        let manager_path = self.manager_path.clone();
        self.spawn_call(&manager_path, keys::MANAGER_INTERFACE, "RequestScan", (technology.as_key().to_string(),));
    }

    fn enable_technology(&self, technology: ConnectionType, enable: bool) {
        let method = if enable { "EnableTechnology" } else { "DisableTechnology" };
        let manager_path = self.manager_path.clone();
        self.spawn_call(&manager_path, keys::MANAGER_INTERFACE, method, (technology.as_key().to_string(),));
    }

    fn set_offline_mode(&self, offline: bool) {
        let manager_path = self.manager_path.clone();
        let body = (keys::OFFLINE_MODE.to_string(), Value::Bool(offline));
        self.spawn_call(&manager_path, keys::MANAGER_INTERFACE, "SetProperty", body);
    }

    fn set_device_property(&self, device_path: &str, key: &str, value: PropertyValue) {
        let body = (key.to_string(), to_dbus_value(&value));
        self.spawn_call(device_path, keys::DEVICE_INTERFACE, "SetProperty", body);
    }

    fn pin_operation(&self, device_path: &str, operation: PinOperation) {
        let connection = self.connection.clone();
        let service = self.service.clone();
        let events = self.events.clone();
        let device_path = device_path.to_string();
        self.spawn(format!("{} on {}", operation.method_name(), device_path), async move {
            let method = operation.method_name();
            let reply = match &operation {
                PinOperation::Enter { pin } => {
                    device_call(&connection, &service, &device_path, method, &(pin.as_str(),)).await
                }
                PinOperation::Require { pin, require } => {
                    let body = (pin.as_str(), *require);
                    device_call(&connection, &service, &device_path, method, &body).await
                }
                PinOperation::Change { old_pin, new_pin } => {
                    let body = (old_pin.as_str(), new_pin.as_str());
                    device_call(&connection, &service, &device_path, method, &body).await
                }
                PinOperation::Unblock { puk, new_pin } => {
                    let body = (puk.as_str(), new_pin.as_str());
                    device_call(&connection, &service, &device_path, method, &body).await
                }
            };
            let result = match reply {
                Ok(_) => PinOperationResult::Success,
                Err(zbus::Error::MethodError(name, _, _)) => {
                    PinOperationResult::from_error_name(name.as_str())
                }
                Err(e) => {
                    warn!("{} failed: {}", method, e);
                    PinOperationResult::Error
                }
            };
            send(&events, ManagerEvent::PinOperationCompleted { device_path, result }).await
        });
    }
}

async fn device_call<B>(
    connection: &Connection,
    service: &str,
    device_path: &str,
    method: &str,
    body: &B,
) -> zbus::Result<Message>
where
    B: serde::Serialize + zbus::zvariant::DynamicType,
{
    connection
        .call_method(Some(service), device_path, Some(keys::DEVICE_INTERFACE), method, body)
        .await
}

async fn get_properties(connection: &Connection, service: &str, path: &str, interface: &str) -> Result<PropertyDict> {
    let reply = connection
        .call_method(Some(service), path, Some(interface), "GetProperties", &())
        .await?;
    let properties: DbusDict = reply.body().deserialize()?;
    Ok(to_property_dict(&properties))
}

async fn send(events: &mpsc::Sender<ManagerEvent>, event: ManagerEvent) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| Error::Internal("event receiver closed".to_string()))
}

/// Translate a PropertyChanged or DataPlansUpdate signal.
fn signal_event(message: &Message) -> Option<ManagerEvent> {
    let header = message.header();
    let interface = header.interface().map(|i| i.as_str().to_string())?;
    let member = header.member().map(|m| m.as_str().to_string())?;
    let path = header.path().map(|p| p.as_str().to_string()).unwrap_or_default();

    if member == keys::DATA_PLANS_UPDATE_SIGNAL && interface == keys::CASHEW_INTERFACE {
        let (service_path, plans): (String, Vec<DbusDict>) = match message.body().deserialize() {
            Ok(body) => body,
            Err(e) => {
                warn!("Malformed {} signal: {}", member, e);
                return None;
            }
        };
        let plans = plans
            .iter()
            .map(|plan| CellularDataPlan::from_dict(&to_property_dict(plan)))
            .collect();
        return Some(ManagerEvent::DataPlans { service_path, plans });
    }

    if member != keys::PROPERTY_CHANGED_SIGNAL {
        return None;
    }
    let (key, value): (String, OwnedValue) = match message.body().deserialize() {
        Ok(body) => body,
        Err(e) => {
            debug!("Ignoring {} with unexpected body: {}", member, e);
            return None;
        }
    };
    property_changed_event(&interface, &path, key, to_property_value(&value))
}

/// Map a PropertyChanged signal onto an event.
pub(crate) fn property_changed_event(
    interface: &str,
    path: &str,
    key: String,
    value: PropertyValue,
) -> Option<ManagerEvent> {
    let string_list = |value: &PropertyValue| -> Vec<String> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    };
    match interface {
        keys::MANAGER_INTERFACE => Some(match key.as_str() {
            keys::SERVICES => ManagerEvent::ServiceListChanged(string_list(&value)),
            keys::DEVICES => ManagerEvent::DeviceListChanged(string_list(&value)),
            _ => ManagerEvent::ManagerPropertyChanged { key, value },
        }),
        keys::SERVICE_INTERFACE => Some(ManagerEvent::ServicePropertyChanged {
            path: path.to_string(),
            key,
            value,
        }),
        keys::DEVICE_INTERFACE => Some(ManagerEvent::DevicePropertyChanged {
            path: path.to_string(),
            key,
            value,
        }),
        _ => None,
    }
}

// ========================================
// Value conversion
// ========================================

fn to_property_dict(dict: &DbusDict) -> PropertyDict {
    dict.iter()
        .map(|(key, value)| (key.clone(), to_property_value(value)))
        .collect()
}

/// Convert a D-Bus value into a property value.
pub(crate) fn to_property_value(value: &Value<'_>) -> PropertyValue {
    match value {
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::U8(n) => PropertyValue::from(*n),
        Value::I16(n) => PropertyValue::from(*n),
        Value::U16(n) => PropertyValue::from(*n),
        Value::I32(n) => PropertyValue::from(*n),
        Value::U32(n) => PropertyValue::from(*n),
        Value::I64(n) => PropertyValue::from(*n),
        Value::U64(n) => PropertyValue::from(*n),
        Value::F64(n) => Number::from_f64(*n).map(PropertyValue::Number).unwrap_or(PropertyValue::Null),
        Value::Str(s) => PropertyValue::String(s.as_str().to_string()),
        Value::ObjectPath(p) => PropertyValue::String(p.as_str().to_string()),
        Value::Signature(s) => PropertyValue::String(s.as_str().to_string()),
        Value::Value(inner) => to_property_value(inner),
        Value::Array(array) => PropertyValue::Array(array.inner().iter().map(to_property_value).collect()),
        Value::Dict(dict) => {
            let mut map = Map::new();
            for (key, value) in dict.iter() {
                let key = match key {
                    Value::Str(s) => s.as_str().to_string(),
                    other => to_property_value(other).to_string(),
                };
                map.insert(key, to_property_value(value));
            }
            PropertyValue::Object(map)
        }
        Value::Structure(fields) => {
            PropertyValue::Array(fields.fields().iter().map(to_property_value).collect())
        }
        _ => PropertyValue::Null,
    }
}

/// Convert a property value into a D-Bus value for SetProperty.
///
/// Integers use the narrowest of `i` or `x`; string arrays become `as` and
/// objects become `a{sv}`.
pub(crate) fn to_dbus_value(value: &PropertyValue) -> Value<'static> {
    match value {
        PropertyValue::Null => Value::from(String::new()),
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Value::I32(small),
                    Err(_) => Value::I64(i),
                }
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else {
                Value::F64(n.as_f64().unwrap_or_default())
            }
        }
        PropertyValue::String(s) => Value::from(s.clone()),
        PropertyValue::Array(items) => {
            if items.iter().all(|i| i.is_string()) {
                let strings: Vec<String> = items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect();
                Value::from(strings)
            } else {
                let values: Vec<Value<'static>> = items.iter().map(to_dbus_value).collect();
                Value::from(values)
            }
        }
        PropertyValue::Object(map) => {
            let dict: HashMap<String, Value<'static>> = map
                .iter()
                .map(|(key, value)| (key.clone(), to_dbus_value(value)))
                .collect();
            Value::from(dict)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_property_value_scalars() {
        assert_eq!(to_property_value(&Value::Bool(true)), json!(true));
        assert_eq!(to_property_value(&Value::U8(200)), json!(200));
        assert_eq!(to_property_value(&Value::I32(-4)), json!(-4));
        assert_eq!(to_property_value(&Value::from("online")), json!("online"));
        assert_eq!(
            to_property_value(&Value::Value(Box::new(Value::from("nested")))),
            json!("nested")
        );
    }

    #[test]
    fn test_dict_round_trip_through_dbus_value() {
        let apn = json!({"apn": "internet", "username": "guest"});
        let dbus = to_dbus_value(&apn);
        assert_eq!(to_property_value(&dbus), apn);

        let list = json!(["/service/1", "/service/2"]);
        assert_eq!(to_property_value(&to_dbus_value(&list)), list);
    }

    #[test]
    fn test_integer_width() {
        assert!(matches!(to_dbus_value(&json!(7)), Value::I32(7)));
        assert!(matches!(to_dbus_value(&json!(1_i64 << 40)), Value::I64(_)));
    }

    #[test]
    fn test_property_changed_routing() {
        assert_eq!(
            property_changed_event(
                keys::MANAGER_INTERFACE,
                "/",
                keys::SERVICES.to_string(),
                json!(["/service/1"])
            ),
            Some(ManagerEvent::ServiceListChanged(vec!["/service/1".into()]))
        );
        assert_eq!(
            property_changed_event(
                keys::MANAGER_INTERFACE,
                "/",
                keys::OFFLINE_MODE.to_string(),
                json!(true)
            ),
            Some(ManagerEvent::ManagerPropertyChanged {
                key: keys::OFFLINE_MODE.into(),
                value: json!(true)
            })
        );
        assert_eq!(
            property_changed_event(
                keys::SERVICE_INTERFACE,
                "/service/1",
                keys::STATE.to_string(),
                json!("ready")
            ),
            Some(ManagerEvent::ServicePropertyChanged {
                path: "/service/1".into(),
                key: keys::STATE.into(),
                value: json!("ready")
            })
        );
        assert_eq!(
            property_changed_event("org.example.Other", "/", "X".into(), json!(1)),
            None
        );
    }
}
