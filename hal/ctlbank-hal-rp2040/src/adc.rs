//! ADC channel map and analog input bank
//!
//! RP2040 has a single 12-bit ADC with four external inputs:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29

use embassy_rp::adc::{self, Adc, Blocking, Channel};
use heapless::Vec;

use ctlbank_hal::AnalogInput;

/// External ADC inputs on RP2040
pub const MAX_ANALOG_INPUTS: usize = 4;

/// ADC channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
}

impl AdcChannel {
    /// GPIO pin for this channel
    pub fn gpio(&self) -> u8 {
        match self {
            AdcChannel::Adc0 => 26,
            AdcChannel::Adc1 => 27,
            AdcChannel::Adc2 => 28,
            AdcChannel::Adc3 => 29,
        }
    }

    /// ADC channel from GPIO pin
    pub fn from_gpio(gpio: u8) -> Option<Self> {
        match gpio {
            26 => Some(AdcChannel::Adc0),
            27 => Some(AdcChannel::Adc1),
            28 => Some(AdcChannel::Adc2),
            29 => Some(AdcChannel::Adc3),
            _ => None,
        }
    }
}

/// Analog bank errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogError {
    /// Input index beyond the configured channels
    NoSuchInput,
    /// Converter reported an error
    Conversion(adc::Error),
}

/// Potentiometer inputs sampled with blocking conversions
///
/// A conversion takes about 2 µs, so blocking reads keep the acquisition
/// pass simple without starving the bus task.
pub struct AnalogBank<'d> {
    adc: Adc<'d, Blocking>,
    channels: Vec<Channel<'d>, MAX_ANALOG_INPUTS>,
}

impl<'d> AnalogBank<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channels: Vec<Channel<'d>, MAX_ANALOG_INPUTS>) -> Self {
        Self { adc, channels }
    }
}

impl AnalogInput for AnalogBank<'_> {
    type Error = AnalogError;
    const FULL_BITS: u8 = 12;

    fn inputs(&self) -> u8 {
        self.channels.len() as u8
    }

    fn sample(&mut self, input: u8) -> Result<u16, AnalogError> {
        let channel = self
            .channels
            .get_mut(usize::from(input))
            .ok_or(AnalogError::NoSuchInput)?;
        self.adc.blocking_read(channel).map_err(AnalogError::Conversion)
    }
}
