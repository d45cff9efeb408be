// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types for the simulator core

use thiserror::Error;

use super::registers::{AddressWindow, RegisterClass};

/// Errors surfaced by the register store and the control surface.
///
/// `OutOfRange` is the read-path error the Modbus adapter translates into the
/// protocol's illegal-address exception. `Validation` covers malformed control
/// input (wrong value kind for a register class, bad publish length); it never
/// mutates any state.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A read addressed registers outside the configured window.
    #[error("{class}: range [{address}, {address}+{count}) is outside the configured window {window}")]
    OutOfRange {
        class: RegisterClass,
        address: u16,
        count: u16,
        window: AddressWindow,
    },

    /// Malformed input on the control or publish path.
    #[error("validation failed: {0}")]
    Validation(String),
}
