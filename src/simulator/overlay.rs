// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Operator-supplied register overrides
//!
//! The [`InjectionOverlay`] keeps one address-to-value map per register class.
//! Entries are created only through [`InjectionOverlay::set`], persist across
//! ticks while injected mode is active, and are cleared in full when the mode
//! transitions away from injected.
//!
//! An override is stored unconditionally, even when its address lies outside
//! the configured window of its class; the window check happens at apply time
//! on every tick, where out-of-window entries are silently skipped. A window
//! sized smaller than a previously confirmed injection is therefore harmless.

use std::collections::HashMap;

use super::error::SimulatorError;
use super::registers::{AddressWindow, RegisterClass, RegisterValue};

/// Per-class override maps, independently populated.
#[derive(Debug, Default, Clone)]
pub struct InjectionOverlay {
    coils: HashMap<u16, bool>,
    discrete_inputs: HashMap<u16, bool>,
    holding_registers: HashMap<u16, u16>,
    input_registers: HashMap<u16, u16>,
}

impl InjectionOverlay {
    /// Store an override for one address.
    ///
    /// Fails with [`SimulatorError::Validation`] when the value kind does not
    /// match the class (a word for a coil, a bit for a holding register); in
    /// that case nothing is stored. The address is accepted regardless of
    /// whether it currently falls inside the class's window.
    pub fn set(
        &mut self,
        class: RegisterClass,
        address: u16,
        value: RegisterValue,
    ) -> Result<(), SimulatorError> {
        match (class, value) {
            (RegisterClass::Coils, RegisterValue::Bit(v)) => {
                self.coils.insert(address, v);
            }
            (RegisterClass::DiscreteInputs, RegisterValue::Bit(v)) => {
                self.discrete_inputs.insert(address, v);
            }
            (RegisterClass::HoldingRegisters, RegisterValue::Word(v)) => {
                self.holding_registers.insert(address, v);
            }
            (RegisterClass::InputRegisters, RegisterValue::Word(v)) => {
                self.input_registers.insert(address, v);
            }
            (class, RegisterValue::Bit(_)) => {
                return Err(SimulatorError::Validation(format!(
                    "{class} take word overrides, got a bit"
                )));
            }
            (class, RegisterValue::Word(_)) => {
                return Err(SimulatorError::Validation(format!(
                    "{class} take bit overrides, got a word"
                )));
            }
        }
        Ok(())
    }

    /// Drop every entry in all four maps. Runs when the mode leaves injected.
    pub fn clear_all(&mut self) {
        self.coils.clear();
        self.discrete_inputs.clear();
        self.holding_registers.clear();
        self.input_registers.clear();
    }

    /// Whether all four maps are empty.
    pub fn is_empty(&self) -> bool {
        self.coils.is_empty()
            && self.discrete_inputs.is_empty()
            && self.holding_registers.is_empty()
            && self.input_registers.is_empty()
    }

    /// Lay the overrides of a bit class over a freshly generated array.
    ///
    /// `cells` is the full area array, indexed from `window.base`. Entries
    /// outside the window are ignored.
    pub fn apply_bits(&self, class: RegisterClass, window: AddressWindow, cells: &mut [bool]) {
        let map = match class {
            RegisterClass::Coils => &self.coils,
            RegisterClass::DiscreteInputs => &self.discrete_inputs,
            _ => return,
        };
        for (&address, &value) in map {
            if window.contains_range(address, 1) {
                cells[window.offset(address)] = value;
            }
        }
    }

    /// Lay the overrides of a word class over a freshly generated array.
    pub fn apply_words(&self, class: RegisterClass, window: AddressWindow, cells: &mut [u16]) {
        let map = match class {
            RegisterClass::HoldingRegisters => &self.holding_registers,
            RegisterClass::InputRegisters => &self.input_registers,
            _ => return,
        };
        for (&address, &value) in map {
            if window.contains_range(address, 1) {
                cells[window.offset(address)] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_generated_cells_in_window() {
        let mut overlay = InjectionOverlay::default();
        overlay
            .set(
                RegisterClass::HoldingRegisters,
                12,
                RegisterValue::Word(999),
            )
            .unwrap();

        let window = AddressWindow { base: 10, count: 5 };
        let mut cells = vec![0u16; 5];
        overlay.apply_words(RegisterClass::HoldingRegisters, window, &mut cells);
        assert_eq!(cells, vec![0, 0, 999, 0, 0]);
    }

    #[test]
    fn out_of_window_overrides_are_stored_but_not_applied() {
        let mut overlay = InjectionOverlay::default();
        // address 42 is outside the window below; insertion still succeeds
        overlay
            .set(RegisterClass::Coils, 42, RegisterValue::Bit(true))
            .unwrap();
        assert!(!overlay.is_empty());

        let window = AddressWindow { base: 0, count: 8 };
        let mut cells = vec![false; 8];
        overlay.apply_bits(RegisterClass::Coils, window, &mut cells);
        assert_eq!(cells, vec![false; 8]);
    }

    #[test]
    fn value_kind_must_match_the_class() {
        let mut overlay = InjectionOverlay::default();
        let err = overlay
            .set(RegisterClass::Coils, 0, RegisterValue::Word(1))
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Validation(_)));

        let err = overlay
            .set(RegisterClass::InputRegisters, 0, RegisterValue::Bit(true))
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Validation(_)));

        // nothing was stored by the failed calls
        assert!(overlay.is_empty());
    }

    #[test]
    fn clear_all_empties_every_class() {
        let mut overlay = InjectionOverlay::default();
        overlay
            .set(RegisterClass::Coils, 0, RegisterValue::Bit(true))
            .unwrap();
        overlay
            .set(RegisterClass::DiscreteInputs, 1, RegisterValue::Bit(false))
            .unwrap();
        overlay
            .set(RegisterClass::HoldingRegisters, 2, RegisterValue::Word(7))
            .unwrap();
        overlay
            .set(RegisterClass::InputRegisters, 3, RegisterValue::Word(8))
            .unwrap();

        overlay.clear_all();
        assert!(overlay.is_empty());
    }
}
