//! Pin allocation by number
//!
//! The board pin map comes from `controller.toml` as plain GPIO numbers.
//! [`PinBank`] holds every general-purpose pin as an `AnyPin` and hands
//! them out by number, so each pin is claimed at most once. Fixed-function
//! pins (bus, ADC) are kept out of the bank by the board code and report
//! [`PinError::Reserved`].

use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_rp::Peri;

use crate::gpio::{InputLine, OutputLine, GPIO_COUNT};

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for a fixed function
    Reserved,
}

/// General-purpose pins available for config-driven assignment
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
    /// Bit `n` set once pin `n` has been handed out
    taken: u32,
}

impl PinBank {
    /// Create a bank from the pins the board leaves free
    ///
    /// Entries that are `None` are treated as reserved.
    pub fn new(pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT]) -> Self {
        Self { pins, taken: 0 }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        let slot = self
            .pins
            .get_mut(usize::from(pin))
            .ok_or(PinError::InvalidPin)?;
        match slot.take() {
            Some(taken) => {
                self.taken |= 1 << pin;
                Ok(taken)
            }
            None if self.taken & (1 << pin) != 0 => Err(PinError::AlreadyTaken),
            None => Err(PinError::Reserved),
        }
    }

    /// Take a pin as an output driven to `level`
    pub fn output(&mut self, pin: u8, level: Level) -> Result<OutputLine<'static>, PinError> {
        Ok(OutputLine::new(Output::new(self.take(pin)?, level)))
    }

    /// Take a pin as an input with the given pull
    pub fn input(&mut self, pin: u8, pull: Pull) -> Result<InputLine<'static>, PinError> {
        Ok(InputLine::new(Input::new(self.take(pin)?, pull)))
    }
}
