// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register simulation configuration
//!
//! Defines the sizes and starting addresses of the four register areas, the
//! update scheduler's tick interval, the initial generation mode and the
//! incremental-mode parameters.

use serde::{Deserialize, Serialize};

use crate::simulator::{AddressWindow, BankLayout, Mode, RegisterClass};

/// Size and starting address of one register area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegisterAreaConfig {
    /// Number of cells in the area. Default is 1.
    #[serde(default = "default_count")]
    pub count: u16,

    /// First address of the area. Default is 0.
    #[serde(default)]
    pub start_address: u16,
}

fn default_count() -> u16 {
    1
}

impl Default for RegisterAreaConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            start_address: 0,
        }
    }
}

/// Configuration for the register simulation.
///
/// The four area sections plus the scheduler and generation parameters. All
/// of this is fixed for the lifetime of a running simulator; changing it
/// requires a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Coils area (single-bit, function code 0x01).
    #[serde(default)]
    pub coils: RegisterAreaConfig,

    /// Discrete inputs area (single-bit, function code 0x02).
    #[serde(default)]
    pub discrete_inputs: RegisterAreaConfig,

    /// Holding registers area (16-bit, function code 0x03).
    #[serde(default)]
    pub holding_registers: RegisterAreaConfig,

    /// Input registers area (16-bit, function code 0x04).
    #[serde(default)]
    pub input_registers: RegisterAreaConfig,

    /// Seconds between update ticks; fractional values are permitted.
    /// Default is 1.0.
    #[serde(default = "default_update_interval")]
    pub update_interval: f64,

    /// Generation mode the simulator starts in. Default is random.
    #[serde(default)]
    pub initial_mode: Mode,

    /// Amount added to each incremental offset per tick. Default is 1.
    #[serde(default = "default_increment_step")]
    pub increment_step: i64,

    /// Base value of incremental generation. Default is 0.
    #[serde(default)]
    pub increment_base: i64,

    /// When set, one extra cell is added to every area's count before the
    /// bank is created, so a client reading `count` cells from the start
    /// address never hits the window edge. Default is true.
    #[serde(default = "default_pad_counts")]
    pub pad_counts: bool,
}

fn default_update_interval() -> f64 {
    1.0
}

fn default_increment_step() -> i64 {
    1
}

fn default_pad_counts() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            coils: RegisterAreaConfig::default(),
            discrete_inputs: RegisterAreaConfig::default(),
            holding_registers: RegisterAreaConfig::default(),
            input_registers: RegisterAreaConfig::default(),
            update_interval: default_update_interval(),
            initial_mode: Mode::default(),
            increment_step: default_increment_step(),
            increment_base: 0,
            pad_counts: default_pad_counts(),
        }
    }
}

impl SimulationConfig {
    /// The effective address window of one class, with `pad_counts` applied.
    pub fn window(&self, class: RegisterClass) -> AddressWindow {
        let area = match class {
            RegisterClass::Coils => &self.coils,
            RegisterClass::DiscreteInputs => &self.discrete_inputs,
            RegisterClass::HoldingRegisters => &self.holding_registers,
            RegisterClass::InputRegisters => &self.input_registers,
        };
        let count = if self.pad_counts {
            area.count.saturating_add(1)
        } else {
            area.count
        };
        AddressWindow {
            base: area.start_address,
            count,
        }
    }

    /// The full bank layout the simulator is created from.
    pub fn layout(&self) -> BankLayout {
        BankLayout {
            coils: self.window(RegisterClass::Coils),
            discrete_inputs: self.window(RegisterClass::DiscreteInputs),
            holding_registers: self.window(RegisterClass::HoldingRegisters),
            input_registers: self.window(RegisterClass::InputRegisters),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_counts_adds_one_cell_to_every_area() {
        let mut config = SimulationConfig::default();
        config.holding_registers.count = 10;
        config.holding_registers.start_address = 100;

        let window = config.window(RegisterClass::HoldingRegisters);
        assert_eq!(window.base, 100);
        assert_eq!(window.count, 11);

        config.pad_counts = false;
        let window = config.window(RegisterClass::HoldingRegisters);
        assert_eq!(window.count, 10);
    }
}
