// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register storage for the simulated Modbus slave
//!
//! The [`RegisterBank`] holds the four addressable areas of a Modbus device:
//! coils and discrete inputs as boolean cells, holding and input registers as
//! 16-bit word cells. Each area is a fixed-size array behind its own `RwLock`,
//! so the background updater can atomically replace a whole area while any
//! number of protocol connections read it concurrently. A reader always sees
//! either the pre-tick or the post-tick contents of an area, never a mix.
//!
//! Addressing follows the configured [`AddressWindow`] of each area: a read of
//! `count` cells starting at `address` succeeds only when the whole range
//! `[address, address + count)` lies inside the window.

use std::fmt;
use std::sync::RwLock;

use rand::RngExt;
use serde::{Deserialize, Serialize};

use super::error::SimulatorError;
use super::generation::WORD_MAX;

/// The four addressable register classes of a Modbus device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterClass {
    /// Single-bit read/write outputs (function code 0x01).
    Coils,
    /// Single-bit read-only inputs (function code 0x02).
    DiscreteInputs,
    /// 16-bit read/write registers (function code 0x03).
    HoldingRegisters,
    /// 16-bit read-only registers (function code 0x04).
    InputRegisters,
}

impl RegisterClass {
    /// All four classes, in function-code order.
    pub const ALL: [RegisterClass; 4] = [
        RegisterClass::Coils,
        RegisterClass::DiscreteInputs,
        RegisterClass::HoldingRegisters,
        RegisterClass::InputRegisters,
    ];

    /// The two boolean classes.
    pub const BIT_CLASSES: [RegisterClass; 2] =
        [RegisterClass::Coils, RegisterClass::DiscreteInputs];

    /// The two 16-bit word classes.
    pub const WORD_CLASSES: [RegisterClass; 2] = [
        RegisterClass::HoldingRegisters,
        RegisterClass::InputRegisters,
    ];

    /// Whether this class holds single-bit cells.
    pub fn is_bit(self) -> bool {
        matches!(self, RegisterClass::Coils | RegisterClass::DiscreteInputs)
    }
}

impl fmt::Display for RegisterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegisterClass::Coils => "coils",
            RegisterClass::DiscreteInputs => "discrete inputs",
            RegisterClass::HoldingRegisters => "holding registers",
            RegisterClass::InputRegisters => "input registers",
        };
        f.write_str(name)
    }
}

/// The fixed address range of one register area: `[base, base + count)`.
///
/// Windows are created once from configuration when the simulator starts and
/// never change while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWindow {
    /// First valid address.
    pub base: u16,
    /// Number of cells in the area.
    pub count: u16,
}

impl AddressWindow {
    /// Whether the whole range `[address, address + count)` lies inside this window.
    ///
    /// Widens to `u32` so that ranges reaching past address 65535 are rejected
    /// instead of wrapping.
    pub fn contains_range(&self, address: u16, count: u16) -> bool {
        let start = u32::from(address);
        let end = start + u32::from(count);
        start >= u32::from(self.base) && end <= u32::from(self.base) + u32::from(self.count)
    }

    /// Index of `address` within the backing array. Caller must have checked
    /// containment first.
    pub(crate) fn offset(&self, address: u16) -> usize {
        usize::from(address - self.base)
    }
}

impl fmt::Display for AddressWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.base,
            u32::from(self.base) + u32::from(self.count)
        )
    }
}

/// A single register cell value, class-agnostic.
///
/// Used on the control surface (`add_override`, `snapshot`) where callers deal
/// with all four classes through one API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterValue {
    /// Value of a coil or discrete input cell.
    Bit(bool),
    /// Value of a holding or input register cell.
    Word(u16),
}

/// The address layout of all four areas, derived from configuration.
#[derive(Debug, Clone, Copy)]
pub struct BankLayout {
    pub coils: AddressWindow,
    pub discrete_inputs: AddressWindow,
    pub holding_registers: AddressWindow,
    pub input_registers: AddressWindow,
}

impl BankLayout {
    /// The window of one class.
    pub fn window(&self, class: RegisterClass) -> AddressWindow {
        match class {
            RegisterClass::Coils => self.coils,
            RegisterClass::DiscreteInputs => self.discrete_inputs,
            RegisterClass::HoldingRegisters => self.holding_registers,
            RegisterClass::InputRegisters => self.input_registers,
        }
    }
}

/// One boolean register area.
struct BitArea {
    window: AddressWindow,
    cells: RwLock<Vec<bool>>,
}

impl BitArea {
    fn new(window: AddressWindow) -> Self {
        Self {
            window,
            cells: RwLock::new(vec![false; usize::from(window.count)]),
        }
    }
}

/// One 16-bit register area.
struct WordArea {
    window: AddressWindow,
    cells: RwLock<Vec<u16>>,
}

impl WordArea {
    fn new(window: AddressWindow, initial: Vec<u16>) -> Self {
        debug_assert_eq!(initial.len(), usize::from(window.count));
        Self {
            window,
            cells: RwLock::new(initial),
        }
    }
}

/// The four register areas of the simulated slave.
///
/// The only write path is [`publish_bits`](RegisterBank::publish_bits) /
/// [`publish_words`](RegisterBank::publish_words), used exclusively by the
/// update scheduler; every replacement swaps a complete area under its write
/// lock, so per-cell tearing is never observable within one read.
pub struct RegisterBank {
    coils: BitArea,
    discrete_inputs: BitArea,
    holding_registers: WordArea,
    input_registers: WordArea,
}

impl RegisterBank {
    /// Create a bank with the given layout.
    ///
    /// Initial contents mirror a freshly started device: both bit areas all
    /// `false`, input registers all zero, holding registers seeded with
    /// uniform random words in `[0, 32767]`.
    pub fn new(layout: &BankLayout) -> Self {
        let mut rng = rand::rng();
        let holding_seed: Vec<u16> = (0..layout.holding_registers.count)
            .map(|_| rng.random_range(0..=WORD_MAX))
            .collect();

        Self {
            coils: BitArea::new(layout.coils),
            discrete_inputs: BitArea::new(layout.discrete_inputs),
            holding_registers: WordArea::new(layout.holding_registers, holding_seed),
            input_registers: WordArea::new(
                layout.input_registers,
                vec![0; usize::from(layout.input_registers.count)],
            ),
        }
    }

    /// The configured window of one class.
    pub fn window(&self, class: RegisterClass) -> AddressWindow {
        match class {
            RegisterClass::Coils => self.coils.window,
            RegisterClass::DiscreteInputs => self.discrete_inputs.window,
            RegisterClass::HoldingRegisters => self.holding_registers.window,
            RegisterClass::InputRegisters => self.input_registers.window,
        }
    }

    /// Read `count` boolean cells starting at `address` from a bit class.
    ///
    /// Fails with [`SimulatorError::OutOfRange`] when the range is not fully
    /// contained in the class's window; a partial read is never served. Fails
    /// with [`SimulatorError::Validation`] when called on a word class.
    pub fn read_bits(
        &self,
        class: RegisterClass,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, SimulatorError> {
        let area = self.bit_area(class)?;
        check_range(class, area.window, address, count)?;
        let cells = area.cells.read().unwrap();
        let start = area.window.offset(address);
        Ok(cells[start..start + usize::from(count)].to_vec())
    }

    /// Read `count` word cells starting at `address` from a word class.
    ///
    /// Same containment contract as [`read_bits`](Self::read_bits).
    pub fn read_words(
        &self,
        class: RegisterClass,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, SimulatorError> {
        let area = self.word_area(class)?;
        check_range(class, area.window, address, count)?;
        let cells = area.cells.read().unwrap();
        let start = area.window.offset(address);
        Ok(cells[start..start + usize::from(count)].to_vec())
    }

    /// Atomically replace the whole array of a bit class.
    ///
    /// The replacement must have exactly `window.count` elements.
    pub fn publish_bits(
        &self,
        class: RegisterClass,
        values: Vec<bool>,
    ) -> Result<(), SimulatorError> {
        let area = self.bit_area(class)?;
        check_publish_len(class, area.window, values.len())?;
        *area.cells.write().unwrap() = values;
        Ok(())
    }

    /// Atomically replace the whole array of a word class.
    pub fn publish_words(
        &self,
        class: RegisterClass,
        values: Vec<u16>,
    ) -> Result<(), SimulatorError> {
        let area = self.word_area(class)?;
        check_publish_len(class, area.window, values.len())?;
        *area.cells.write().unwrap() = values;
        Ok(())
    }

    /// Ordered `(address, value)` pairs of one class, for display and
    /// inspection surfaces.
    pub fn snapshot(&self, class: RegisterClass) -> Vec<(u16, RegisterValue)> {
        match class {
            RegisterClass::Coils => snapshot_bits(&self.coils),
            RegisterClass::DiscreteInputs => snapshot_bits(&self.discrete_inputs),
            RegisterClass::HoldingRegisters => snapshot_words(&self.holding_registers),
            RegisterClass::InputRegisters => snapshot_words(&self.input_registers),
        }
    }

    fn bit_area(&self, class: RegisterClass) -> Result<&BitArea, SimulatorError> {
        match class {
            RegisterClass::Coils => Ok(&self.coils),
            RegisterClass::DiscreteInputs => Ok(&self.discrete_inputs),
            _ => Err(SimulatorError::Validation(format!(
                "{class} hold word values, not bits"
            ))),
        }
    }

    fn word_area(&self, class: RegisterClass) -> Result<&WordArea, SimulatorError> {
        match class {
            RegisterClass::HoldingRegisters => Ok(&self.holding_registers),
            RegisterClass::InputRegisters => Ok(&self.input_registers),
            _ => Err(SimulatorError::Validation(format!(
                "{class} hold bit values, not words"
            ))),
        }
    }
}

fn snapshot_bits(area: &BitArea) -> Vec<(u16, RegisterValue)> {
    let cells = area.cells.read().unwrap();
    cells
        .iter()
        .enumerate()
        .map(|(i, v)| (area.window.base + i as u16, RegisterValue::Bit(*v)))
        .collect()
}

fn snapshot_words(area: &WordArea) -> Vec<(u16, RegisterValue)> {
    let cells = area.cells.read().unwrap();
    cells
        .iter()
        .enumerate()
        .map(|(i, v)| (area.window.base + i as u16, RegisterValue::Word(*v)))
        .collect()
}

fn check_range(
    class: RegisterClass,
    window: AddressWindow,
    address: u16,
    count: u16,
) -> Result<(), SimulatorError> {
    if window.contains_range(address, count) {
        Ok(())
    } else {
        Err(SimulatorError::OutOfRange {
            class,
            address,
            count,
            window,
        })
    }
}

fn check_publish_len(
    class: RegisterClass,
    window: AddressWindow,
    len: usize,
) -> Result<(), SimulatorError> {
    if len == usize::from(window.count) {
        Ok(())
    } else {
        Err(SimulatorError::Validation(format!(
            "{class}: published array has {len} cells, window {window} requires {}",
            window.count
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(base: u16, count: u16) -> BankLayout {
        let window = AddressWindow { base, count };
        BankLayout {
            coils: window,
            discrete_inputs: window,
            holding_registers: window,
            input_registers: window,
        }
    }

    #[test]
    fn read_returns_exactly_count_cells() {
        let bank = RegisterBank::new(&layout(0, 8));
        let words = bank
            .read_words(RegisterClass::InputRegisters, 2, 4)
            .unwrap();
        assert_eq!(words, vec![0, 0, 0, 0]);
        let bits = bank.read_bits(RegisterClass::Coils, 0, 8).unwrap();
        assert_eq!(bits.len(), 8);
    }

    #[test]
    fn read_past_window_end_is_rejected() {
        let bank = RegisterBank::new(&layout(10, 5));
        let err = bank
            .read_words(RegisterClass::HoldingRegisters, 13, 3)
            .unwrap_err();
        assert!(matches!(err, SimulatorError::OutOfRange { .. }));
        // below the base too
        let err = bank
            .read_words(RegisterClass::HoldingRegisters, 9, 1)
            .unwrap_err();
        assert!(matches!(err, SimulatorError::OutOfRange { .. }));
    }

    #[test]
    fn window_end_does_not_wrap_at_u16_max() {
        let window = AddressWindow {
            base: 65530,
            count: 6,
        };
        assert!(window.contains_range(65530, 6));
        assert!(!window.contains_range(65535, 2));
    }

    #[test]
    fn publish_requires_full_length() {
        let bank = RegisterBank::new(&layout(0, 4));
        let err = bank
            .publish_words(RegisterClass::HoldingRegisters, vec![1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Validation(_)));

        bank.publish_words(RegisterClass::HoldingRegisters, vec![1, 2, 3, 4])
            .unwrap();
        assert_eq!(
            bank.read_words(RegisterClass::HoldingRegisters, 0, 4)
                .unwrap(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn class_kind_is_enforced() {
        let bank = RegisterBank::new(&layout(0, 4));
        assert!(bank
            .read_bits(RegisterClass::HoldingRegisters, 0, 1)
            .is_err());
        assert!(bank.read_words(RegisterClass::Coils, 0, 1).is_err());
    }
}
