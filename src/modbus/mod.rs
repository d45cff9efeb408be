// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Modbus Module
//!
//! Protocol adapter between tokio-modbus and the simulator's register bank.

pub mod modbus_server;

pub use modbus_server::{SimulatorModbusServer, SlaveTable};
