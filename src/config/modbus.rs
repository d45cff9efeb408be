// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server configuration
//!
//! This module defines the structures for configuring the Modbus TCP server
//! component of the simulator.

use serde::{Deserialize, Serialize};

/// Configuration for the Modbus TCP server component.
///
/// Controls the network binding of the protocol server and the unit (slave)
/// identifier the simulated device answers under.
///
/// # Example
///
/// ```
/// use modbus_slave_sim::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     enabled: true,
///     port: 1502,
///     address: "0.0.0.0".to_string(),
///     unit_id: 1,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Flag to enable or disable the Modbus server.
    ///
    /// When disabled, the simulator still runs its update scheduler but no
    /// TCP listener is started; useful for embedding and tests.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// The TCP port the Modbus server will listen on.
    ///
    /// Valid range is 1-65534. Default value is 502, which is the standard
    /// Modbus TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the Modbus server will bind to.
    ///
    /// Can be an IPv4/IPv6 address or a hostname. Default is "127.0.0.1".
    /// Use "0.0.0.0" to bind to all IPv4 interfaces.
    #[serde(default = "default_address")]
    pub address: String,

    /// The unit (slave) identifier of the simulated device. Default is 1.
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    502
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_unit_id() -> u8 {
    1
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            unit_id: default_unit_id(),
        }
    }
}
