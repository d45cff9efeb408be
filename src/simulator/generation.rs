// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-slave-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Value generation for the background updater
//!
//! Pure functions that compute a full replacement array for one register area
//! given the active [`Mode`] and, for incremental generation, the running
//! [`IncrementState`]. Randomness comes from an explicit `Rng` handed in by
//! the caller, which keeps the functions deterministic for a given source.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

use super::registers::RegisterClass;

/// Largest word value the generator produces in random mode.
///
/// The conventional signed-16-bit ceiling, so the values stay readable as
/// non-negative numbers on clients that decode words as `i16`. Overrides may
/// still carry the full `u16` range.
pub const WORD_MAX: u16 = 32767;

/// Process-wide generation policy for register contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every cell independently drawn: uniform booleans for the bit classes,
    /// uniform words in `[0, 32767]` for the word classes.
    #[default]
    Random,
    /// Word areas carry `base_value + offset`, identical across an area, with
    /// the offset advancing by `step_size` each tick. Bit areas stay random.
    Incremental,
    /// Everything bases to `false`/`0`; operator overrides are laid on top.
    Injected,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Random => "random",
            Mode::Incremental => "incremental",
            Mode::Injected => "injected",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Mode::Random),
            "incremental" => Ok(Mode::Incremental),
            "injected" => Ok(Mode::Injected),
            other => Err(format!(
                "unknown mode '{other}' (expected random, incremental or injected)"
            )),
        }
    }
}

/// Running state of incremental generation.
///
/// Each word class carries its own offset; both start at 0 when the simulator
/// is created and whenever the mode transitions into [`Mode::Incremental`],
/// and advance by `step_size` once per tick while that mode is active. The
/// offsets themselves grow without bound; the published word is the value
/// truncated to 16 bits (see [`IncrementState::value_for`]).
#[derive(Debug, Clone, Copy)]
pub struct IncrementState {
    pub base_value: i64,
    pub step_size: i64,
    pub offset_holding: i64,
    pub offset_input: i64,
}

impl IncrementState {
    /// Fresh state with both offsets at zero.
    pub fn new(base_value: i64, step_size: i64) -> Self {
        Self {
            base_value,
            step_size,
            offset_holding: 0,
            offset_input: 0,
        }
    }

    /// Re-arm for a transition into incremental mode.
    pub fn reset(&mut self, base_value: i64, step_size: i64) {
        *self = Self::new(base_value, step_size);
    }

    /// Advance both offsets by one step. Called once per tick.
    pub fn advance(&mut self) {
        self.offset_holding = self.offset_holding.wrapping_add(self.step_size);
        self.offset_input = self.offset_input.wrapping_add(self.step_size);
    }

    /// The word published to every cell of `class` this tick.
    ///
    /// The logical value `base_value + offset` is truncated to its low 16 bits
    /// with a wrapping cast, so the register always carries a representable
    /// word even after the offset has grown past the 16-bit range.
    pub fn value_for(&self, class: RegisterClass) -> u16 {
        let offset = match class {
            RegisterClass::HoldingRegisters => self.offset_holding,
            RegisterClass::InputRegisters => self.offset_input,
            RegisterClass::Coils | RegisterClass::DiscreteInputs => 0,
        };
        self.base_value.wrapping_add(offset) as u16
    }
}

/// Compute a full replacement array for a bit area.
pub fn generate_bits<R: Rng>(mode: Mode, count: u16, rng: &mut R) -> Vec<bool> {
    match mode {
        // Injection bases everything to false; overrides are applied by the caller.
        Mode::Injected => vec![false; usize::from(count)],
        // Bit areas are random in both random and incremental mode.
        Mode::Random | Mode::Incremental => (0..count).map(|_| rng.random::<bool>()).collect(),
    }
}

/// Compute a full replacement array for a word area.
pub fn generate_words<R: Rng>(
    mode: Mode,
    class: RegisterClass,
    count: u16,
    increment: &IncrementState,
    rng: &mut R,
) -> Vec<u16> {
    match mode {
        Mode::Random => (0..count).map(|_| rng.random_range(0..=WORD_MAX)).collect(),
        Mode::Incremental => vec![increment.value_for(class); usize::from(count)],
        Mode::Injected => vec![0; usize::from(count)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_words_stay_within_the_conventional_range() {
        let mut rng = rand::rng();
        let increment = IncrementState::new(0, 1);
        for _ in 0..20 {
            let words = generate_words(
                Mode::Random,
                RegisterClass::HoldingRegisters,
                64,
                &increment,
                &mut rng,
            );
            assert_eq!(words.len(), 64);
            assert!(words.iter().all(|w| *w <= WORD_MAX));
        }
    }

    #[test]
    fn incremental_words_are_identical_across_an_area() {
        let mut rng = rand::rng();
        let mut increment = IncrementState::new(100, 5);
        let words = generate_words(
            Mode::Incremental,
            RegisterClass::HoldingRegisters,
            4,
            &increment,
            &mut rng,
        );
        assert_eq!(words, vec![100, 100, 100, 100]);

        increment.advance();
        let words = generate_words(
            Mode::Incremental,
            RegisterClass::HoldingRegisters,
            4,
            &increment,
            &mut rng,
        );
        assert_eq!(words, vec![105, 105, 105, 105]);
    }

    #[test]
    fn word_classes_advance_independently_of_each_other() {
        let increment = IncrementState {
            base_value: 10,
            step_size: 2,
            offset_holding: 6,
            offset_input: 4,
        };
        assert_eq!(increment.value_for(RegisterClass::HoldingRegisters), 16);
        assert_eq!(increment.value_for(RegisterClass::InputRegisters), 14);
    }

    #[test]
    fn overflowing_values_truncate_to_sixteen_bits() {
        let increment = IncrementState {
            base_value: 65536 + 7,
            step_size: 1,
            offset_holding: 0,
            offset_input: 0,
        };
        assert_eq!(increment.value_for(RegisterClass::HoldingRegisters), 7);
    }

    #[test]
    fn injected_mode_bases_to_zero() {
        let mut rng = rand::rng();
        let increment = IncrementState::new(42, 1);
        assert_eq!(generate_bits(Mode::Injected, 3, &mut rng), vec![false; 3]);
        assert_eq!(
            generate_words(
                Mode::Injected,
                RegisterClass::InputRegisters,
                3,
                &increment,
                &mut rng
            ),
            vec![0; 3]
        );
    }
}
