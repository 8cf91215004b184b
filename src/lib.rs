// Network State - Library Root
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Network State
//!
//! Keeps a consistent, typed view of the devices and services exposed by a
//! shill (flimflam) connection manager.
//!
//! - **models**: Devices, networks, data plans and their property stores
//! - **parser**: Translation of daemon property keys into typed fields
//! - **services**: Client certificate matching and enrollment
//! - **manager**: Command and event interface to the daemon
//! - **network_library**: The coordinator owning all entities

pub mod manager;
pub mod models;
pub mod network_library;
pub mod parser;
pub mod services;

pub use models::{Error, Network, NetworkDevice, Result};
pub use network_library::{ConnectOutcome, NetworkLibrary};
