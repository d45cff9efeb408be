// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP slave simulator
//!
//! Simulates the addressable register space of a Modbus slave device for
//! testing client software against controllable, continuously changing data.
//! Four register areas (coils, discrete inputs, holding registers, input
//! registers) are served to any number of TCP clients while a background
//! scheduler rewrites their contents once per configurable interval under one
//! of three generation modes (random, incremental or injected), with
//! optional per-address operator overrides.
//!
//! The [`simulator`] module is the core: register storage, value generation,
//! overrides and the tick logic. The [`modbus`] module adapts it to
//! tokio-modbus; the [`daemon`] module runs the scheduler and the TCP
//! listener as background tasks; [`config`] holds the YAML-backed settings.

pub mod config;
pub mod daemon;
pub mod modbus;
pub mod simulator;
