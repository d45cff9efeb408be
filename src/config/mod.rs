// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the Modbus slave simulator
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file; every
//! field has a default, so a missing file or a minimal file both work.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `simulation`: register area sizes and addresses, tick interval,
//!   generation mode and incremental parameters
//! - `modbus`: network binding and unit id of the Modbus TCP server
//!
//! ## Usage
//!
//! ```no_run
//! use modbus_slave_sim::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(Some(true), Some("0.0.0.0".to_string()), Some(1502), None, None);
//!
//! println!("Serving on port {}", config.modbus.port);
//! ```

pub mod modbus;
pub mod simulation;
pub mod utils;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::simulator::Mode;

// Re-export all types for public API
pub use modbus::ModbusConfig;
pub use simulation::{RegisterAreaConfig, SimulationConfig};
pub use utils::{is_valid_ip_address, validate_specific_rules};

/// Root configuration structure for the simulator.
///
/// Deserialized from and serialized to YAML with serde; each section falls
/// back to its defaults when absent, and non-numeric input for a numeric
/// field fails deserialization with context before any state is touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Register areas, tick interval and generation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Network binding and unit id of the Modbus TCP server.
    #[serde(default)]
    pub modbus: ModbusConfig,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// When the file does not exist, a default configuration is written to
    /// the path and returned, so a first run produces an editable template.
    /// The loaded configuration is validated with
    /// [`validate_specific_rules`] before it is returned.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let config: Config = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        validate_specific_rules(&config)?;

        Ok(config)
    }

    /// Save the configuration to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;
        fs::write(path, yaml)
            .with_context(|| format!("Failed to write configuration file at {:?}", path))?;
        debug!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Apply command line overrides on top of the loaded configuration.
    ///
    /// Each `Some` value replaces the corresponding file setting; `None`
    /// leaves the file setting untouched.
    pub fn apply_args(
        &mut self,
        modbus_enabled: Option<bool>,
        modbus_address: Option<String>,
        modbus_port: Option<u16>,
        update_interval: Option<f64>,
        initial_mode: Option<Mode>,
    ) {
        if let Some(enabled) = modbus_enabled {
            self.modbus.enabled = enabled;
        }
        if let Some(address) = modbus_address {
            self.modbus.address = address;
        }
        if let Some(port) = modbus_port {
            self.modbus.port = port;
        }
        if let Some(interval) = update_interval {
            self.simulation.update_interval = interval;
        }
        if let Some(mode) = initial_mode {
            self.simulation.initial_mode = mode;
        }
    }
}
