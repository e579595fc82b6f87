//! RP2040 HAL for the input bank firmware
//!
//! Implements the shared `ctlbank-hal` traits on top of embassy-rp, plus
//! RP2040-specific helpers:
//!
//! - GPIO line wrappers for matrix rows, columns and the change line
//! - Pin allocation by number for config-driven board setup
//! - ADC channel map and a blocking analog input bank
//! - Millisecond clock backed by the embassy time driver

#![no_std]

pub mod adc;
pub mod clock;
pub mod gpio;
pub mod pins;

pub use adc::{AdcChannel, AnalogBank};
pub use clock::EmbassyClock;
pub use gpio::{InputLine, OutputLine};
pub use pins::{PinBank, PinError};
