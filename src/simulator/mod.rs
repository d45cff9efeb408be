// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Simulator Module
//!
//! The simulated Modbus slave device: four register areas whose contents are
//! recomputed once per tick by the update scheduler under one of three
//! generation modes, with per-address operator overrides.
//!
//! ## Components
//!
//! * **[`RegisterBank`]**: the four addressable value arrays with atomic bulk
//!   replace and bounded reads
//! * **[`generation`]**: pure value generation per mode
//! * **[`InjectionOverlay`]**: operator-supplied per-address overrides
//! * **[`Simulator`]**: the single object owning all of the above plus the
//!   mode and increment state
//!
//! All mutable state lives inside [`Simulator`]; the daemon's scheduler task
//! and the Modbus connection handlers each hold an `Arc<Simulator>` and never
//! touch shared globals.

pub mod error;
pub mod generation;
pub mod overlay;
pub mod registers;

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::config::SimulationConfig;

pub use error::SimulatorError;
pub use generation::{IncrementState, Mode, WORD_MAX};
pub use overlay::InjectionOverlay;
pub use registers::{AddressWindow, BankLayout, RegisterBank, RegisterClass, RegisterValue};

/// The simulated slave device.
///
/// Owns every piece of mutable simulation state: the register bank, the
/// active mode, the incremental-generation offsets and the injection overlay.
/// The update scheduler calls [`tick`](Simulator::tick); control surfaces
/// (CLI, test harness, an embedding GUI) call [`set_mode`](Simulator::set_mode),
/// [`add_override`](Simulator::add_override) and
/// [`snapshot`](Simulator::snapshot); the Modbus adapter reads through
/// [`bank`](Simulator::bank).
///
/// ### Thread Safety
///
/// The bank carries its own per-area locks; mode, increment state, overlay
/// and the last-tick timestamp sit behind `Mutex`es. Control operations are
/// O(1) and a tick is O(total configured register count), so no lock is held
/// for unbounded time.
pub struct Simulator {
    bank: RegisterBank,
    mode: Mutex<Mode>,
    increment: Mutex<IncrementState>,
    overlay: Mutex<InjectionOverlay>,
    last_tick: Mutex<Option<DateTime<Utc>>>,

    /// Configured increment parameters, captured on every transition into
    /// incremental mode.
    increment_base: i64,
    increment_step: i64,
}

impl Simulator {
    /// Build a simulator from configuration.
    ///
    /// Creates the four address windows (with the optional count padding
    /// applied), seeds the register bank and arms the increment state with
    /// both offsets at zero. The bank is fully initialized when this returns,
    /// so the protocol server can start accepting reads immediately.
    pub fn new(config: &SimulationConfig) -> Self {
        let layout = config.layout();
        Self {
            bank: RegisterBank::new(&layout),
            mode: Mutex::new(config.initial_mode),
            increment: Mutex::new(IncrementState::new(
                config.increment_base,
                config.increment_step,
            )),
            overlay: Mutex::new(InjectionOverlay::default()),
            last_tick: Mutex::new(None),
            increment_base: config.increment_base,
            increment_step: config.increment_step,
        }
    }

    /// The register bank, for the protocol read path.
    pub fn bank(&self) -> &RegisterBank {
        &self.bank
    }

    /// The currently active generation mode.
    pub fn mode(&self) -> Mode {
        *self.mode.lock().unwrap()
    }

    /// Switch the generation mode.
    ///
    /// Side effects run synchronously as part of this call:
    /// * leaving [`Mode::Injected`] clears all four override maps;
    /// * entering [`Mode::Incremental`] resets both offsets to zero and
    ///   re-captures the configured base value and step size;
    /// * entering [`Mode::Injected`] resets nothing; a fresh injected period
    ///   starts empty only because of the clear-on-exit rule.
    ///
    /// Setting the already-active mode is a no-op.
    pub fn set_mode(&self, new_mode: Mode) {
        let mut mode = self.mode.lock().unwrap();
        let previous = *mode;
        if previous == new_mode {
            return;
        }

        if previous == Mode::Injected {
            self.overlay.lock().unwrap().clear_all();
            debug!("cleared injection overrides on leaving injected mode");
        }
        if new_mode == Mode::Incremental {
            self.increment
                .lock()
                .unwrap()
                .reset(self.increment_base, self.increment_step);
        }

        *mode = new_mode;
        info!("generation mode changed: {previous} -> {new_mode}");
    }

    /// Store an operator override for one address.
    ///
    /// The value kind must match the class; the address is accepted whether
    /// or not it currently lies inside the class's window (out-of-window
    /// entries are skipped at apply time). The entry takes effect on the next
    /// tick and persists until the mode leaves injected.
    pub fn add_override(
        &self,
        class: RegisterClass,
        address: u16,
        value: RegisterValue,
    ) -> Result<(), SimulatorError> {
        self.overlay.lock().unwrap().set(class, address, value)?;
        debug!("override confirmed: {class} address {address} = {value:?}");
        Ok(())
    }

    /// Ordered `(address, value)` pairs of one class, for display surfaces.
    pub fn snapshot(&self, class: RegisterClass) -> Vec<(u16, RegisterValue)> {
        self.bank.snapshot(class)
    }

    /// When the last successful tick ran, if any.
    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self.last_tick.lock().unwrap()
    }

    /// Run one update tick.
    ///
    /// The mode is snapshotted once and the overlay cloned under its lock at
    /// tick start, so all four areas of a single tick see a consistent view
    /// even when a control operation runs concurrently. Each area is then
    /// generated, overlaid and atomically published; the increment offsets
    /// advance once at the end of an incremental tick.
    pub fn tick(&self) -> Result<(), SimulatorError> {
        let mode = self.mode();
        let overlay = self.overlay.lock().unwrap().clone();
        let increment = *self.increment.lock().unwrap();
        let mut rng = rand::rng();

        for class in RegisterClass::BIT_CLASSES {
            let window = self.bank.window(class);
            let mut cells = generation::generate_bits(mode, window.count, &mut rng);
            overlay.apply_bits(class, window, &mut cells);
            self.bank.publish_bits(class, cells)?;
        }

        for class in RegisterClass::WORD_CLASSES {
            let window = self.bank.window(class);
            let mut cells =
                generation::generate_words(mode, class, window.count, &increment, &mut rng);
            overlay.apply_words(class, window, &mut cells);
            self.bank.publish_words(class, cells)?;
        }

        if mode == Mode::Incremental {
            self.increment.lock().unwrap().advance();
        }

        let now = Utc::now();
        *self.last_tick.lock().unwrap() = Some(now);
        debug!("updated registers at {}", now.format("%Y-%m-%d %H:%M:%S"));
        Ok(())
    }
}
