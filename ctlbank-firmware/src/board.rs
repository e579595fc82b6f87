//! Board pin map
//!
//! I2C0 runs on GPIO4 (SDA) and GPIO5 (SCL), potentiometers on the ADC
//! pins GPIO26-29. Every other pin goes into a [`PinBank`] and is claimed
//! by number for the roles listed in `controller.toml`.

use defmt::*;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::gpio::{AnyPin, Level, Pull};
use embassy_rp::peripherals::{ADC, I2C0, PIN_26, PIN_27, PIN_28, PIN_29, PIN_4, PIN_5};
use embassy_rp::{Peri, Peripherals};
use heapless::Vec;

use ctlbank_core::scheduler::{Acquisition, Inputs, Matrix, Multiplexer};
use ctlbank_hal_rp2040::gpio::GPIO_COUNT;
use ctlbank_hal_rp2040::{AdcChannel, AnalogBank, InputLine, OutputLine, PinBank, PinError};

use crate::config::{
    ADC_PINS, ENCODER_COLUMN_PINS, ENCODER_ROW_PINS, MUX_SELECT_PINS, SWITCH_COLUMN_PINS,
    SWITCH_ROW_PINS,
};

/// Input hardware as wired on this board
pub type BoardInputs = Inputs<AnalogBank<'static>, OutputLine<'static>, InputLine<'static>>;

/// Acquisition loop over [`BoardInputs`]
pub type BoardAcquisition = Acquisition<AnalogBank<'static>, OutputLine<'static>, InputLine<'static>>;

/// Host bus peripheral and pins
pub struct BusPins {
    pub i2c: Peri<'static, I2C0>,
    pub sda: Peri<'static, PIN_4>,
    pub scl: Peri<'static, PIN_5>,
}

/// Converter and the pins wired to it
pub struct AnalogPins {
    adc: Peri<'static, ADC>,
    pin26: Option<Peri<'static, PIN_26>>,
    pin27: Option<Peri<'static, PIN_27>>,
    pin28: Option<Peri<'static, PIN_28>>,
    pin29: Option<Peri<'static, PIN_29>>,
}

impl AnalogPins {
    /// Blocking analog bank on the listed ADC pins, in order
    pub fn into_bank(mut self, pins: &[u8]) -> AnalogBank<'static> {
        let converter = Adc::new_blocking(self.adc, adc::Config::default());
        let mut channels = Vec::new();

        for &pin in pins {
            let channel = match AdcChannel::from_gpio(pin) {
                Some(AdcChannel::Adc0) => self.pin26.take().map(|p| Channel::new_pin(p, Pull::None)),
                Some(AdcChannel::Adc1) => self.pin27.take().map(|p| Channel::new_pin(p, Pull::None)),
                Some(AdcChannel::Adc2) => self.pin28.take().map(|p| Channel::new_pin(p, Pull::None)),
                Some(AdcChannel::Adc3) => self.pin29.take().map(|p| Channel::new_pin(p, Pull::None)),
                None => None,
            };
            match channel {
                Some(channel) => {
                    if channels.push(channel).is_err() {
                        warn!("Too many ADC inputs, gpio{} dropped", pin);
                    }
                }
                None => warn!("gpio{} is not a free ADC pin", pin),
            }
        }

        AnalogBank::new(converter, channels)
    }
}

/// RP2040 peripherals split by role
pub struct Board {
    pub pins: PinBank,
    pub bus: BusPins,
    pub analog: AnalogPins,
}

impl Board {
    pub fn new(p: Peripherals) -> Self {
        let pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT] = [
            Some(p.PIN_0.into()),
            Some(p.PIN_1.into()),
            Some(p.PIN_2.into()),
            Some(p.PIN_3.into()),
            None, // I2C0 SDA
            None, // I2C0 SCL
            Some(p.PIN_6.into()),
            Some(p.PIN_7.into()),
            Some(p.PIN_8.into()),
            Some(p.PIN_9.into()),
            Some(p.PIN_10.into()),
            Some(p.PIN_11.into()),
            Some(p.PIN_12.into()),
            Some(p.PIN_13.into()),
            Some(p.PIN_14.into()),
            Some(p.PIN_15.into()),
            Some(p.PIN_16.into()),
            Some(p.PIN_17.into()),
            Some(p.PIN_18.into()),
            Some(p.PIN_19.into()),
            Some(p.PIN_20.into()),
            Some(p.PIN_21.into()),
            Some(p.PIN_22.into()),
            Some(p.PIN_23.into()),
            Some(p.PIN_24.into()),
            Some(p.PIN_25.into()),
            None, // ADC0
            None, // ADC1
            None, // ADC2
            None, // ADC3
        ];

        Self {
            pins: PinBank::new(pins),
            bus: BusPins {
                i2c: p.I2C0,
                sda: p.PIN_4,
                scl: p.PIN_5,
            },
            analog: AnalogPins {
                adc: p.ADC,
                pin26: Some(p.PIN_26),
                pin27: Some(p.PIN_27),
                pin28: Some(p.PIN_28),
                pin29: Some(p.PIN_29),
            },
        }
    }
}

/// Build the input hardware from the configured pin map
///
/// A pin map the bank rejects leaves the digital inputs unwired; the
/// potentiometers still work.
pub fn inputs(pins: &mut PinBank, analog: AnalogPins) -> BoardInputs {
    let analog = analog.into_bank(ADC_PINS);

    match digital_inputs(pins) {
        Ok((multiplexer, switches, encoders)) => Inputs {
            analog,
            multiplexer,
            switches,
            encoders,
        },
        Err(e) => {
            error!("Pin map rejected: {}", e);
            Inputs {
                analog,
                multiplexer: None,
                switches: Matrix::empty(),
                encoders: Matrix::empty(),
            }
        }
    }
}

type BoardMatrix = Matrix<OutputLine<'static>, InputLine<'static>>;

fn digital_inputs(
    pins: &mut PinBank,
) -> Result<(Option<Multiplexer<OutputLine<'static>>>, BoardMatrix, BoardMatrix), PinError> {
    let multiplexer = if MUX_SELECT_PINS.is_empty() {
        None
    } else {
        Some(Multiplexer::new(outputs(pins, MUX_SELECT_PINS)?))
    };
    let switches = Matrix::new(outputs(pins, SWITCH_ROW_PINS)?, columns(pins, SWITCH_COLUMN_PINS)?);
    let encoders = Matrix::new(outputs(pins, ENCODER_ROW_PINS)?, columns(pins, ENCODER_COLUMN_PINS)?);
    Ok((multiplexer, switches, encoders))
}

fn outputs<const N: usize>(bank: &mut PinBank, pins: &[u8]) -> Result<Vec<OutputLine<'static>, N>, PinError> {
    pins.iter().take(N).map(|&pin| bank.output(pin, Level::Low)).collect()
}

/// Columns idle low and read high through a closed contact on a driven row
fn columns<const N: usize>(bank: &mut PinBank, pins: &[u8]) -> Result<Vec<InputLine<'static>, N>, PinError> {
    pins.iter().take(N).map(|&pin| bank.input(pin, Pull::Down)).collect()
}
