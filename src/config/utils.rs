// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation.

use anyhow::Result;
use log::debug;

use super::Config;
use crate::simulator::RegisterClass;

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
///
/// ### Arguments
///
/// * `addr` - The address string to validate
///
/// ### Returns
///
/// `true` if the address is valid, `false` otherwise
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against rules serde typing cannot express.
///
/// ### Arguments
///
/// * `config` - The configuration object to validate
///
/// ### Returns
///
/// * `Ok(())` if all validations pass
/// * `Err(anyhow::Error)` with descriptive message if any validation fails
///
/// ### Validation Rules
///
/// This function validates:
///
/// - **Port Range**: the Modbus port is within a valid range (1-65534)
/// - **Bind Address**: the Modbus address is a valid IP address or special value
/// - **Tick Interval**: the update interval is finite and strictly positive
/// - **Register Windows**: every area has at least one cell after padding and
///   its window fits within the 16-bit address space
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.port == 0 || config.modbus.port == 65535 {
        anyhow::bail!(
            "Modbus port {} is out of the valid range (1-65534)",
            config.modbus.port
        );
    }

    if !is_valid_ip_address(&config.modbus.address) {
        anyhow::bail!("Invalid Modbus bind address: {}", config.modbus.address);
    }

    let interval = config.simulation.update_interval;
    if !interval.is_finite() || interval <= 0.0 {
        anyhow::bail!("Update interval must be a positive number of seconds, got {interval}");
    }

    for class in RegisterClass::ALL {
        let window = config.simulation.window(class);
        if window.count == 0 {
            anyhow::bail!("{class}: register count must be at least 1");
        }
        if u32::from(window.base) + u32::from(window.count) > 0x1_0000 {
            anyhow::bail!(
                "{class}: window {window} reaches past the 16-bit address space"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = Config::default();
        assert!(validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = Config::default();
        config.simulation.update_interval = 0.0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn oversized_window_is_rejected() {
        let mut config = Config::default();
        config.simulation.coils.start_address = 65535;
        config.simulation.coils.count = 2;
        config.simulation.pad_counts = false;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let mut config = Config::default();
        config.modbus.address = "not-an-address".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }
}
